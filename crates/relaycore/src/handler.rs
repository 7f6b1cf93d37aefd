use crate::{EventEmitter, StepError, StepTemplate, StepTemplateKind};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Handler for one kind of workflow template step
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// The step kind this handler serves
    fn kind(&self) -> StepTemplateKind;

    /// Run the step and return the output stored under its id
    async fn run(&self, step: &StepTemplate, ctx: StepContext) -> Result<Value, StepError>;
}

/// Execution context passed to each template step
#[derive(Clone)]
pub struct StepContext {
    pub execution_id: String,

    /// Variable bindings of the run
    pub variables: Map<String, Value>,

    /// Outputs of the steps that already ran, keyed by step id
    pub results: Map<String, Value>,

    /// Event emitter for progress notes
    pub events: EventEmitter,
}

impl StepContext {
    /// Get required config value or return error
    pub fn require_config<'a>(
        &self,
        step: &'a StepTemplate,
        name: &str,
    ) -> Result<&'a Value, StepError> {
        step.config
            .get(name)
            .ok_or_else(|| StepError::Configuration(format!("Missing config: {}", name)))
    }
}
