use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Step error: {0}")]
    Step(#[from] StepError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone)]
pub enum StepError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid input type for '{field}': expected {expected}")]
    InvalidInputType { field: String, expected: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Generation(#[from] GenerationError),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

#[derive(Error, Debug, Clone)]
pub enum WorkflowError {
    #[error("Workflow template {0} not found")]
    TemplateNotFound(String),

    #[error("Step {0} not found in template")]
    StepNotFound(String),

    #[error("Unknown step type: {0}")]
    UnknownStepType(String),

    #[error("Invalid workflow: {0}")]
    Invalid(String),

    #[error("Cyclic successor chain detected")]
    CyclicSuccessors,
}

/// Failure raised inside an integration adapter. The registry turns these
/// into failed `IntegrationResult`s; they never escape `dispatch`.
#[derive(Error, Debug, Clone)]
pub enum IntegrationError {
    #[error("{0}")]
    MissingContent(String),

    #[error("{0}")]
    Credentials(String),

    #[error("{0}")]
    Delivery(String),
}

#[derive(Error, Debug, Clone)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    Request(String),

    #[error("Generation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),
}
