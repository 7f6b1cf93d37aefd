use async_trait::async_trait;
use chrono::Utc;
use relaycore::{StepContext, StepError, StepHandler, StepTemplate, StepTemplateKind};
use relayruntime::substitute;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

/// Template step that stands in for a generation call: the prompt is
/// filled from variables and earlier results and echoed back.
pub struct AiGenerationHandler {
    delay: Duration,
}

impl AiGenerationHandler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl StepHandler for AiGenerationHandler {
    fn kind(&self) -> StepTemplateKind {
        StepTemplateKind::AiGeneration
    }

    async fn run(&self, step: &StepTemplate, ctx: StepContext) -> Result<Value, StepError> {
        let template = ctx
            .require_config(step, "prompt")?
            .as_str()
            .ok_or_else(|| StepError::InvalidInputType {
                field: "prompt".to_string(),
                expected: "string".to_string(),
            })?;
        let prompt = substitute(template, &ctx.variables, &ctx.results);
        ctx.events.info(format!("Generating: {}", prompt));

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        Ok(json!({
            "content": format!("AI generated content for: {}", prompt),
            "model": step.config.get("model"),
            "timestamp": Utc::now(),
        }))
    }
}
