//! Core abstractions for the agent relay
//!
//! Records for agent runs and workflow template runs, the error taxonomy,
//! the seam traits that other crates implement (text generation,
//! integration adapters, template step handlers) and the event bus.

mod agent;
mod error;
mod events;
mod generation;
mod handler;
mod integration;
mod workflow;

pub use agent::{
    generate_run_id, AgentDefinition, Execution, RunStatus, Step, StepKind, StepStatus,
    STANDARD_PHASES,
};
pub use error::{GenerationError, IntegrationError, RelayError, StepError, WorkflowError};
pub use events::{EventBus, EventEmitter, ExecutionEvent, RunKind, StepEvent};
pub use generation::{GenerationRequest, TextGenerator};
pub use handler::{StepContext, StepHandler};
pub use integration::{
    Credentials, IntegrationAdapter, IntegrationCategory, IntegrationConfig, IntegrationResult,
};
pub use workflow::{StepTemplate, StepTemplateKind, TriggerKind, WorkflowExecution, WorkflowTemplate};

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
