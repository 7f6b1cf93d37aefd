//! Execute-phase strategies, selected by agent id.

use async_trait::async_trait;
use chrono::Utc;
use relaycore::{AgentDefinition, GenerationRequest, StepError, TextGenerator};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const EXECUTE_TOKENS: u32 = 2000;

/// Produces the execute-phase deliverable for an agent
#[async_trait]
pub trait ExecuteStrategy: Send + Sync {
    async fn execute(
        &self,
        input: &Value,
        agent: &AgentDefinition,
        generator: &dyn TextGenerator,
    ) -> Result<Value, StepError>;
}

/// Default strategy: ask for the deliverable described by the plan.
pub struct DeliverableStrategy;

#[async_trait]
impl ExecuteStrategy for DeliverableStrategy {
    async fn execute(
        &self,
        input: &Value,
        agent: &AgentDefinition,
        generator: &dyn TextGenerator,
    ) -> Result<Value, StepError> {
        let prompt = format!("EXECUTE this plan: {}. Create the deliverable.", input);
        let deliverable = generator
            .generate(GenerationRequest::new(&agent.system_prompt, prompt, EXECUTE_TOKENS))
            .await?;

        Ok(json!({
            "deliverable": deliverable,
            "type": agent.id,
            "ready_for_integration": true,
            "timestamp": Utc::now(),
        }))
    }
}

const FOLLOW_UP_QUESTIONS: [&str; 4] = [
    "How did your child respond to this approach?",
    "What specific situations trigger these challenges?",
    "How can we involve the community in supporting your family?",
    "What has worked well for your family in the past?",
];

const SUPPORT_RESOURCES: [&str; 4] = [
    "Connect with local Somali Muslim families",
    "Reach out to Islamic family counselors",
    "Join online Somali parenting communities",
    "Consult with your local imam for Islamic guidance",
];

/// Family guidance for the parenting coach: honours a language preference
/// and a free-form family context, and returns follow-up questions and
/// resource suggestions with the answer.
pub struct FamilyGuidanceStrategy;

impl FamilyGuidanceStrategy {
    /// Look for `field` in the plan output, then in the original task, then
    /// at the top level of the input.
    fn lookup<'a>(input: &'a Value, field: &str) -> Option<&'a Value> {
        [
            input.get("plan"),
            input.get("context").and_then(|c| c.get("context")),
            Some(input),
        ]
        .into_iter()
        .flatten()
        .find_map(|scope| scope.get(field).filter(|v| !v.is_null()))
    }

    fn language_name(language: &str) -> &'static str {
        match language {
            "somali" => "Somali",
            "arabic" => "Arabic",
            _ => "English",
        }
    }

    fn prompt(request: &str, language: &str, family_context: &Value) -> String {
        format!(
            "You are providing personalized parenting guidance for a Somali Muslim family.\n\n\
             CONTEXT:\n\
             - Parent's question: \"{request}\"\n\
             - Language preference: {language}\n\
             - Family context: {family_context}\n\n\
             Provide guidance that includes:\n\
             1. Empathetic understanding of their specific challenge\n\
             2. Islamic wisdom with relevant Quranic verses or Hadith\n\
             3. Cultural bridge advice for Somali families in the West\n\
             4. Specific action steps they can take\n\
             5. Follow-up questions to deepen support\n\n\
             Respond in {}.\n\
             Start with \"Assalamu Alaikum\" and be warm, understanding, and practical.",
            Self::language_name(language),
        )
    }
}

#[async_trait]
impl ExecuteStrategy for FamilyGuidanceStrategy {
    async fn execute(
        &self,
        input: &Value,
        agent: &AgentDefinition,
        generator: &dyn TextGenerator,
    ) -> Result<Value, StepError> {
        let request = Self::lookup(input, "request")
            .or_else(|| Self::lookup(input, "message"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let family_context = Self::lookup(input, "familyContext")
            .cloned()
            .unwrap_or_else(|| json!({}));
        let language = Self::lookup(input, "language")
            .and_then(Value::as_str)
            .unwrap_or("english")
            .to_string();

        let request_body = GenerationRequest::new(
            &agent.system_prompt,
            Self::prompt(&request, &language, &family_context),
            EXECUTE_TOKENS,
        )
        .with_temperature(0.8);
        let response = generator.generate(request_body).await?;

        Ok(json!({
            "deliverable": response,
            "type": "parenting-guidance",
            "language": language,
            "familyContext": family_context,
            "guidance": {
                "response": response,
                "followUp": FOLLOW_UP_QUESTIONS,
                "resources": SUPPORT_RESOURCES,
            },
            "ready_for_integration": true,
            "timestamp": Utc::now(),
        }))
    }
}

/// Agent id to execute strategy, with a fallback for every other agent.
#[derive(Clone)]
pub struct StrategyTable {
    fallback: Arc<dyn ExecuteStrategy>,
    by_agent: HashMap<String, Arc<dyn ExecuteStrategy>>,
}

impl StrategyTable {
    pub fn new(fallback: Arc<dyn ExecuteStrategy>) -> Self {
        Self {
            fallback,
            by_agent: HashMap::new(),
        }
    }

    pub fn register(&mut self, agent_id: impl Into<String>, strategy: Arc<dyn ExecuteStrategy>) {
        self.by_agent.insert(agent_id.into(), strategy);
    }

    pub fn for_agent(&self, agent_id: &str) -> Arc<dyn ExecuteStrategy> {
        self.by_agent
            .get(agent_id)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for StrategyTable {
    /// Deliverable strategy for everyone, family guidance for the parenting coach.
    fn default() -> Self {
        let mut table = Self::new(Arc::new(DeliverableStrategy));
        table.register("waalid-legacy-parenting", Arc::new(FamilyGuidanceStrategy));
        table
    }
}
