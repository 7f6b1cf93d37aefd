use crate::catalog::{builtin_agents, builtin_templates};
use crate::coordinator::AgentCoordinator;
use crate::executor::StepExecutor;
use crate::integrations::IntegrationRegistry;
use crate::registry::StepHandlerRegistry;
use crate::runner::WorkflowRunner;
use crate::store::{MemoryStore, RetentionPolicy};
use relaycore::{EventBus, ExecutionEvent, TextGenerator, WorkflowError};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Artificial pauses used by template step handlers
#[derive(Debug, Clone, Copy)]
pub struct StepTimings {
    pub ai_generation: Duration,
    pub integration: Duration,
    pub wait: Duration,
}

impl StepTimings {
    pub fn zero() -> Self {
        Self {
            ai_generation: Duration::ZERO,
            integration: Duration::ZERO,
            wait: Duration::ZERO,
        }
    }
}

impl Default for StepTimings {
    fn default() -> Self {
        Self {
            ai_generation: Duration::from_millis(2000),
            integration: Duration::from_millis(1500),
            wait: Duration::from_millis(5000),
        }
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Pause between workflow steps
    pub step_delay: Duration,
    pub timings: StepTimings,
    /// Simulated latency of integration adapters
    pub integration_latency: Duration,
    pub retention: RetentionPolicy,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(1000),
            timings: StepTimings::default(),
            integration_latency: Duration::from_millis(1000),
            retention: RetentionPolicy::default(),
            event_buffer_size: 1000,
        }
    }
}

impl RuntimeConfig {
    /// No artificial delays anywhere
    pub fn immediate() -> Self {
        Self {
            step_delay: Duration::ZERO,
            timings: StepTimings::zero(),
            integration_latency: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Defaults overridden by environment variables. Unparseable values are
    /// logged and ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let ttl = match env_parse::<u64>("EXECUTION_TTL_SECS") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.retention.ttl,
        };

        Self {
            step_delay: env_millis("STEP_DELAY_MS").unwrap_or(defaults.step_delay),
            timings: StepTimings {
                ai_generation: env_millis("AI_STEP_DELAY_MS")
                    .unwrap_or(defaults.timings.ai_generation),
                integration: env_millis("INTEGRATION_STEP_DELAY_MS")
                    .unwrap_or(defaults.timings.integration),
                wait: env_millis("WAIT_STEP_DELAY_MS").unwrap_or(defaults.timings.wait),
            },
            integration_latency: env_millis("INTEGRATION_LATENCY_MS")
                .unwrap_or(defaults.integration_latency),
            retention: RetentionPolicy {
                max_records: env_parse("EXECUTION_RETENTION")
                    .unwrap_or(defaults.retention.max_records),
                ttl,
            },
            event_buffer_size: env_parse("EVENT_BUFFER_SIZE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.event_buffer_size),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}: {:?}", name, raw);
            None
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_millis)
}

/// Assembled agent coordinator and workflow runner sharing one event bus
#[derive(Clone)]
pub struct RelayRuntime {
    coordinator: AgentCoordinator,
    runner: WorkflowRunner,
    integrations: Arc<IntegrationRegistry>,
    events: Arc<EventBus>,
}

impl RelayRuntime {
    /// Wire the built-in agents and templates over the given registries.
    pub async fn new(
        config: &RuntimeConfig,
        integrations: IntegrationRegistry,
        handlers: StepHandlerRegistry,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Result<Self, WorkflowError> {
        let events = Arc::new(EventBus::new(config.event_buffer_size));
        let integrations = Arc::new(integrations);

        let executor = StepExecutor::new(generator, integrations.clone());
        let coordinator = AgentCoordinator::new(
            builtin_agents(),
            executor,
            Arc::new(MemoryStore::new(config.retention.clone())),
            events.clone(),
        );

        let runner = WorkflowRunner::new(
            Arc::new(handlers),
            Arc::new(MemoryStore::new(config.retention.clone())),
            events.clone(),
        )
        .with_step_delay(config.step_delay);
        for template in builtin_templates() {
            runner.register_template(template).await?;
        }

        if coordinator.generation_available() {
            tracing::info!("Text generation configured");
        } else {
            tracing::warn!("Text generation not configured, agents will return mock output");
        }

        Ok(Self {
            coordinator,
            runner,
            integrations,
            events,
        })
    }

    pub fn coordinator(&self) -> &AgentCoordinator {
        &self.coordinator
    }

    pub fn runner(&self) -> &WorkflowRunner {
        &self.runner
    }

    pub fn integrations(&self) -> &Arc<IntegrationRegistry> {
        &self.integrations
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Readiness summary for status endpoints
    pub fn system_status(&self) -> SystemStatus {
        let generation = self.coordinator.generation_available();
        SystemStatus {
            generation,
            integrations: !self.integrations.list().is_empty(),
            message: if generation {
                "All systems operational".to_string()
            } else {
                "Running in degraded mode: text generation is not configured".to_string()
            },
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SystemStatus {
    pub generation: bool,
    pub integrations: bool,
    pub message: String,
}
