//! Standard adapter and handler library
//!
//! Integration adapters for the supported services, content shaping
//! helpers, the workflow template step handlers and an OpenAI-compatible
//! text generator.

mod ai;
mod condition;
mod connector;
pub mod content;
mod integrations;
mod openai;
mod time;
mod transform;

pub use ai::AiGenerationHandler;
pub use condition::ConditionHandler;
pub use connector::IntegrationStepHandler;
pub use integrations::{
    FacebookAdapter, GmailAdapter, HubSpotAdapter, LinkedInAdapter, StripeAdapter, TwitterAdapter,
    WordPressAdapter,
};
pub use openai::{extract_content, GenerationConfig, OpenAiGenerator};
pub use time::WaitHandler;
pub use transform::TransformHandler;
use relaycore::{RelayError, StepError, TextGenerator};
use relayruntime::{IntegrationRegistry, RelayRuntime, RuntimeConfig, StepHandlerRegistry, StepTimings};

use std::sync::Arc;
use std::time::Duration;

/// Register every built-in integration adapter with a registry
pub fn register_all_integrations(registry: &mut IntegrationRegistry, latency: Duration) {
    registry.register(Arc::new(GmailAdapter::new(latency)));
    registry.register(Arc::new(LinkedInAdapter::new(latency)));
    registry.register(Arc::new(FacebookAdapter::new(latency)));
    registry.register(Arc::new(TwitterAdapter::new(latency)));
    registry.register(Arc::new(StripeAdapter::new(latency)));
    registry.register(Arc::new(HubSpotAdapter::new(latency)));
    registry.register(Arc::new(WordPressAdapter::new(latency)));
}

/// Register the template step handlers. `loop` has no handler.
pub fn register_all_handlers(registry: &mut StepHandlerRegistry, timings: StepTimings) {
    registry.register(Arc::new(AiGenerationHandler::new(timings.ai_generation)));
    registry.register(Arc::new(IntegrationStepHandler::new(timings.integration)));
    registry.register(Arc::new(ConditionHandler));
    registry.register(Arc::new(WaitHandler::new(timings.wait)));
    registry.register(Arc::new(TransformHandler));
}

/// Runtime with every built-in adapter and handler. Without a generation
/// config the agents run in degraded mode.
pub async fn standard_runtime(
    config: &RuntimeConfig,
    generation: Option<GenerationConfig>,
) -> Result<RelayRuntime, RelayError> {
    let mut integrations = IntegrationRegistry::new();
    register_all_integrations(&mut integrations, config.integration_latency);

    let mut handlers = StepHandlerRegistry::new();
    register_all_handlers(&mut handlers, config.timings);

    let generator = match generation {
        Some(generation) => {
            let generator = OpenAiGenerator::new(generation).map_err(StepError::from)?;
            Some(Arc::new(generator) as Arc<dyn TextGenerator>)
        }
        None => None,
    };

    Ok(RelayRuntime::new(config, integrations, handlers, generator).await?)
}
