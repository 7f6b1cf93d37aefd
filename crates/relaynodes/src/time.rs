use async_trait::async_trait;
use chrono::Utc;
use relaycore::{StepContext, StepError, StepHandler, StepTemplate, StepTemplateKind};
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

/// Wait step. The configured duration is recorded, but the step only
/// pauses for the fixed delay it was built with.
pub struct WaitHandler {
    delay: Duration,
}

impl WaitHandler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl StepHandler for WaitHandler {
    fn kind(&self) -> StepTemplateKind {
        StepTemplateKind::Wait
    }

    async fn run(&self, step: &StepTemplate, ctx: StepContext) -> Result<Value, StepError> {
        ctx.events.info(format!("Waiting for {}ms", self.delay.as_millis()));
        sleep(self.delay).await;

        Ok(json!({
            "waited": true,
            "duration": step.config.get("duration"),
            "condition": step.config.get("condition"),
            "timestamp": Utc::now(),
        }))
    }
}
