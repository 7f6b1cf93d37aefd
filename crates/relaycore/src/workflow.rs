use crate::agent::{generate_run_id, RunStatus};
use crate::WorkflowError;
use chrono::{DateTime, Utc};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Declarative multi-step process definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Variable defaults, overlaid by caller-supplied values at run time.
    pub variables: Map<String, Value>,
    pub steps: Vec<StepTemplate>,
    pub triggers: Vec<TriggerKind>,
}

impl WorkflowTemplate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            variables: Map::new(),
            steps: Vec::new(),
            triggers: vec![TriggerKind::Manual],
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, default: Value) -> Self {
        self.variables.insert(name.into(), default);
        self
    }

    pub fn with_triggers(mut self, triggers: Vec<TriggerKind>) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn add_step(mut self, step: StepTemplate) -> Self {
        self.steps.push(step);
        self
    }

    pub fn find_step(&self, id: &str) -> Option<&StepTemplate> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn first_step(&self) -> Option<&StepTemplate> {
        self.steps.first()
    }

    /// Check that every successor resolves inside this template and that
    /// the successor graph has no cycles.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.steps.is_empty() {
            return Err(WorkflowError::Invalid(format!(
                "template {} has no steps",
                self.id
            )));
        }

        let mut graph = DiGraph::<&str, ()>::new();
        let mut index = HashMap::new();
        for step in &self.steps {
            if index.insert(step.id.as_str(), graph.add_node(step.id.as_str())).is_some() {
                return Err(WorkflowError::Invalid(format!("duplicate step id {}", step.id)));
            }
        }

        for step in &self.steps {
            for next in &step.next_steps {
                let to = index.get(next.as_str()).ok_or_else(|| {
                    WorkflowError::Invalid(format!(
                        "step {} points at unknown successor {}",
                        step.id, next
                    ))
                })?;
                graph.add_edge(index[step.id.as_str()], *to, ());
            }
        }

        if toposort(&graph, None).is_err() {
            return Err(WorkflowError::CyclicSuccessors);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepTemplateKind {
    AiGeneration,
    Integration,
    Condition,
    Loop,
    Wait,
    Transform,
}

impl StepTemplateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepTemplateKind::AiGeneration => "ai-generation",
            StepTemplateKind::Integration => "integration",
            StepTemplateKind::Condition => "condition",
            StepTemplateKind::Loop => "loop",
            StepTemplateKind::Wait => "wait",
            StepTemplateKind::Transform => "transform",
        }
    }
}

impl std::fmt::Display for StepTemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step specification in a workflow template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTemplate {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StepTemplateKind,
    pub config: Map<String, Value>,
    /// Successor ids. Only the first entry is ever followed.
    pub next_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Map<String, Value>>,
}

impl StepTemplate {
    pub fn new(id: impl Into<String>, kind: StepTemplateKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            config: Map::new(),
            next_steps: Vec::new(),
            conditions: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn then(mut self, next: impl Into<String>) -> Self {
        self.next_steps.push(next.into());
        self
    }

    pub fn with_conditions(mut self, conditions: Map<String, Value>) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerKind {
    Manual,
    Scheduled,
    ContentCalendar,
    CrmTrigger,
}

/// One run of a workflow template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    pub id: String,
    pub template_id: String,
    pub user_id: String,
    pub status: RunStatus,
    pub current_step: String,
    pub variables: Map<String, Value>,
    /// Step id to step output.
    pub results: Map<String, Value>,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowExecution {
    /// Start a run: template defaults overlaid with the caller's values.
    pub fn new(
        template: &WorkflowTemplate,
        overrides: Map<String, Value>,
        user_id: impl Into<String>,
    ) -> Self {
        let mut variables = template.variables.clone();
        variables.extend(overrides);
        Self {
            id: generate_run_id("workflow"),
            template_id: template.id.clone(),
            user_id: user_id.into(),
            status: RunStatus::Running,
            current_step: template
                .first_step()
                .map(|s| s.id.clone())
                .unwrap_or_default(),
            variables,
            results: Map::new(),
            start_time: Utc::now(),
            end_time: None,
            error: None,
        }
    }

    /// Same one-way transition rule as agent executions.
    pub fn finish(&mut self, outcome: Result<(), String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        match outcome {
            Ok(()) => self.status = RunStatus::Completed,
            Err(error) => {
                self.status = RunStatus::Failed;
                self.error = Some(error);
            }
        }
        self.end_time = Some(Utc::now());
        true
    }

    pub fn progress(&self, total_steps: usize) -> u32 {
        let total = total_steps.max(1);
        (self.results.len() as f64 / total as f64 * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain() -> WorkflowTemplate {
        WorkflowTemplate::new("t", "Test")
            .add_step(StepTemplate::new("a", StepTemplateKind::Transform).then("b"))
            .add_step(StepTemplate::new("b", StepTemplateKind::Transform).then("c"))
            .add_step(StepTemplate::new("c", StepTemplateKind::Transform))
    }

    #[test]
    fn linear_chain_is_valid() {
        assert!(chain().validate().is_ok());
    }

    #[test]
    fn dangling_successor_is_rejected() {
        let template = chain().add_step(StepTemplate::new("d", StepTemplateKind::Wait).then("zz"));
        assert!(matches!(template.validate(), Err(WorkflowError::Invalid(_))));
    }

    #[test]
    fn cycle_is_rejected() {
        let template = WorkflowTemplate::new("t", "Loop")
            .add_step(StepTemplate::new("a", StepTemplateKind::Transform).then("b"))
            .add_step(StepTemplate::new("b", StepTemplateKind::Transform).then("a"));
        assert!(matches!(template.validate(), Err(WorkflowError::CyclicSuccessors)));
    }

    #[test]
    fn caller_variables_overlay_defaults() {
        let template = chain()
            .with_variable("topic", json!(""))
            .with_variable("audience", json!("devs"));
        let mut overrides = Map::new();
        overrides.insert("topic".into(), json!("rust"));
        let run = WorkflowExecution::new(&template, overrides, "u1");
        assert_eq!(run.variables["topic"], json!("rust"));
        assert_eq!(run.variables["audience"], json!("devs"));
        assert_eq!(run.current_step, "a");
    }

    #[test]
    fn step_kinds_use_kebab_case() {
        let s = serde_json::to_value(StepTemplateKind::AiGeneration).unwrap();
        assert_eq!(s, json!("ai-generation"));
    }
}
