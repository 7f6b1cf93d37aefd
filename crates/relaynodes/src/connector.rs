use async_trait::async_trait;
use chrono::Utc;
use relaycore::{StepContext, StepError, StepHandler, StepTemplate, StepTemplateKind};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

/// Template integration step. The call is simulated and always succeeds.
pub struct IntegrationStepHandler {
    delay: Duration,
}

impl IntegrationStepHandler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl StepHandler for IntegrationStepHandler {
    fn kind(&self) -> StepTemplateKind {
        StepTemplateKind::Integration
    }

    async fn run(&self, step: &StepTemplate, ctx: StepContext) -> Result<Value, StepError> {
        let integration = step.config_str("integration").unwrap_or_default();
        let action = step.config_str("action");
        ctx.events.info(format!("Calling {}", integration));

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let summary = match action {
            Some(action) => format!("{} {} completed successfully", integration, action),
            None => format!("{} completed successfully", integration),
        };

        Ok(json!({
            "integration": integration,
            "action": action,
            "success": true,
            "result": summary,
            "timestamp": Utc::now(),
        }))
    }
}
