use async_trait::async_trait;
use chrono::Utc;
use relaycore::{StepContext, StepError, StepHandler, StepTemplate, StepTemplateKind};
use serde_json::{json, Value};

pub struct TransformHandler;

#[async_trait]
impl StepHandler for TransformHandler {
    fn kind(&self) -> StepTemplateKind {
        StepTemplateKind::Transform
    }

    async fn run(&self, _step: &StepTemplate, _ctx: StepContext) -> Result<Value, StepError> {
        Ok(json!({
            "transformed": true,
            "timestamp": Utc::now(),
        }))
    }
}
