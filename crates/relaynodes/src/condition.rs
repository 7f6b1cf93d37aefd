use async_trait::async_trait;
use chrono::Utc;
use relaycore::{StepContext, StepError, StepHandler, StepTemplate, StepTemplateKind};
use serde_json::{json, Value};

/// Reports the step's conditions as met without evaluating them.
// TODO: evaluate `conditions` against the run's variables and results once
// the runner can branch on a condition outcome.
pub struct ConditionHandler;

#[async_trait]
impl StepHandler for ConditionHandler {
    fn kind(&self) -> StepTemplateKind {
        StepTemplateKind::Condition
    }

    async fn run(&self, step: &StepTemplate, _ctx: StepContext) -> Result<Value, StepError> {
        Ok(json!({
            "conditions_met": true,
            "evaluated_conditions": step.conditions.clone().unwrap_or_default(),
            "timestamp": Utc::now(),
        }))
    }
}
