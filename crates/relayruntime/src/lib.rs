//! Execution runtime for the agent relay
//!
//! Drives agent runs through their fixed phases, walks workflow templates,
//! dispatches integrations and keeps run records in a bounded store.

mod catalog;
mod coordinator;
mod executor;
mod integrations;
mod registry;
mod runner;
mod runtime;
mod store;
mod strategy;
mod substitute;

pub use catalog::{builtin_agents, builtin_templates, sample_input};
pub use coordinator::AgentCoordinator;
pub use executor::{RunContext, StepExecutor, PLAN_TOKENS, THINK_TOKENS};
pub use integrations::IntegrationRegistry;
pub use registry::StepHandlerRegistry;
pub use runner::WorkflowRunner;
pub use runtime::{RelayRuntime, RuntimeConfig, StepTimings, SystemStatus};
pub use store::{ExecutionStore, MemoryStore, RetentionPolicy, Tracked};
pub use strategy::{
    DeliverableStrategy, ExecuteStrategy, FamilyGuidanceStrategy, StrategyTable, EXECUTE_TOKENS,
};
pub use substitute::substitute;
