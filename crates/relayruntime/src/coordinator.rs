use crate::executor::{RunContext, StepExecutor};
use crate::store::ExecutionStore;
use chrono::Utc;
use relaycore::{
    AgentDefinition, Credentials, EventBus, Execution, ExecutionEvent, RelayError, RunKind, Step,
    StepKind,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Runs agents through the fixed phase sequence:
/// think, plan, execute, one integrate per declared integration, verify.
///
/// Each step is appended to the execution and stored before it runs, so
/// pollers can watch a run progress. Any step error ends the run as
/// failed; a failed integration is data, not an error.
#[derive(Clone)]
pub struct AgentCoordinator {
    agents: Arc<Vec<AgentDefinition>>,
    executor: StepExecutor,
    store: Arc<dyn ExecutionStore<Execution>>,
    events: Arc<EventBus>,
}

impl AgentCoordinator {
    pub fn new(
        agents: Vec<AgentDefinition>,
        executor: StepExecutor,
        store: Arc<dyn ExecutionStore<Execution>>,
        events: Arc<EventBus>,
    ) -> Self {
        for agent in &agents {
            info!("Agent registered: {}", agent.name);
        }
        Self {
            agents: Arc::new(agents),
            executor,
            store,
            events,
        }
    }

    pub fn agent(&self, id: &str) -> Option<&AgentDefinition> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn agents(&self) -> &[AgentDefinition] {
        &self.agents
    }

    pub fn generation_available(&self) -> bool {
        self.executor.generation_available()
    }

    pub async fn get_execution(&self, id: &str) -> Option<Execution> {
        self.store.get(id).await
    }

    pub async fn executions_by_user(&self, user_id: &str) -> Vec<Execution> {
        self.store.list_by_owner(user_id).await
    }

    /// Register a running execution and drive it on a background task.
    /// Returns the execution id immediately.
    pub async fn start(
        &self,
        agent_id: &str,
        user_id: &str,
        input: Value,
        credentials: Credentials,
    ) -> Result<String, RelayError> {
        let (agent, execution) = self.register(agent_id, user_id).await?;
        let execution_id = execution.id.clone();

        let this = self.clone();
        tokio::spawn(async move {
            this.supervise(execution, agent, input, credentials).await;
        });

        Ok(execution_id)
    }

    /// Run an agent to completion on the current task.
    pub async fn execute(
        &self,
        agent_id: &str,
        user_id: &str,
        input: Value,
        credentials: Credentials,
    ) -> Result<Execution, RelayError> {
        let (agent, execution) = self.register(agent_id, user_id).await?;
        let execution_id = execution.id.clone();
        self.supervise(execution, agent, input, credentials)
            .await
            .ok_or_else(|| RelayError::Execution(format!("Execution {} was lost", execution_id)))
    }

    async fn register(
        &self,
        agent_id: &str,
        user_id: &str,
    ) -> Result<(AgentDefinition, Execution), RelayError> {
        let agent = self
            .agent(agent_id)
            .cloned()
            .ok_or_else(|| RelayError::AgentNotFound(agent_id.to_string()))?;

        let execution = Execution::new(agent_id, user_id);
        self.store.put(execution.clone()).await;
        self.events.emit(ExecutionEvent::RunStarted {
            execution_id: execution.id.clone(),
            kind: RunKind::Agent,
            source: agent.id.clone(),
            timestamp: Utc::now(),
        });
        info!(execution_id = %execution.id, agent = %agent.id, "Starting agent execution");

        Ok((agent, execution))
    }

    /// Drive the phases on their own task and record the outcome. A panic
    /// inside the phases is recorded as a failure against the last stored
    /// snapshot of the execution.
    async fn supervise(
        &self,
        execution: Execution,
        agent: AgentDefinition,
        input: Value,
        credentials: Credentials,
    ) -> Option<Execution> {
        let execution_id = execution.id.clone();
        let started = Instant::now();

        let this = self.clone();
        let body = tokio::spawn(async move {
            let mut execution = execution;
            let ctx = RunContext {
                agent: &agent,
                credentials: &credentials,
            };
            let outcome = this.run_phases(&mut execution, &ctx, input).await;
            (execution, outcome)
        });

        let (mut execution, outcome) = match body.await {
            Ok(finished) => finished,
            Err(join_error) => {
                let Some(mut snapshot) = self.store.get(&execution_id).await else {
                    error!(execution_id = %execution_id, "Execution vanished after task failure");
                    return None;
                };
                let reason = format!("Execution task aborted: {}", join_error);
                for step in snapshot.steps.iter_mut().filter(|s| !s.is_terminal()) {
                    step.fail(reason.clone());
                }
                (snapshot, Err(reason))
            }
        };

        self.finish(&mut execution, outcome, started).await;
        Some(execution)
    }

    async fn run_phases(
        &self,
        execution: &mut Execution,
        ctx: &RunContext<'_>,
        input: Value,
    ) -> Result<Value, String> {
        let id = execution.id.clone();

        let analysis = self
            .run_step(
                execution,
                Step::new(&id, StepKind::Think, "Analyzing task and gathering context", input.clone()),
                ctx,
            )
            .await?;

        let plan = self
            .run_step(
                execution,
                Step::new(
                    &id,
                    StepKind::Plan,
                    "Creating detailed execution plan",
                    json!({ "context": analysis, "task": input }),
                ),
                ctx,
            )
            .await?;

        let deliverable = self
            .run_step(
                execution,
                Step::new(
                    &id,
                    StepKind::Execute,
                    "Executing main workflow",
                    json!({ "plan": plan, "context": analysis }),
                ),
                ctx,
            )
            .await?;

        for integration in &ctx.agent.integrations {
            self.run_step(
                execution,
                Step::integrate(&id, integration, json!({ "result": deliverable })),
                ctx,
            )
            .await?;
        }

        let results = execution.integration_outputs();
        self.run_step(
            execution,
            Step::new(
                &id,
                StepKind::Verify,
                "Verifying workflow completion",
                json!({ "results": results }),
            ),
            ctx,
        )
        .await
    }

    async fn run_step(
        &self,
        execution: &mut Execution,
        step: Step,
        ctx: &RunContext<'_>,
    ) -> Result<Value, String> {
        let index = execution.begin_step(step);
        self.store.put(execution.clone()).await;

        let step_id = execution.steps[index].id.clone();
        self.events.emit(ExecutionEvent::StepStarted {
            execution_id: execution.id.clone(),
            step_id: step_id.clone(),
            step_type: execution.steps[index].kind.to_string(),
            timestamp: Utc::now(),
        });

        let started = Instant::now();
        let result = self.executor.run(&execution.steps[index], ctx).await;

        match result {
            Ok(output) => {
                execution.steps[index].complete(output.clone());
                self.store.put(execution.clone()).await;
                let duration_ms = started.elapsed().as_millis() as u64;
                self.events.emit(ExecutionEvent::StepCompleted {
                    execution_id: execution.id.clone(),
                    step_id,
                    duration_ms,
                    timestamp: Utc::now(),
                });
                info!("Step completed: {}", execution.steps[index].description);
                Ok(output)
            }
            Err(e) => {
                let message = e.to_string();
                execution.steps[index].fail(message.clone());
                self.store.put(execution.clone()).await;
                self.events.emit(ExecutionEvent::StepFailed {
                    execution_id: execution.id.clone(),
                    step_id,
                    error: message.clone(),
                    timestamp: Utc::now(),
                });
                error!("Step failed: {}: {}", execution.steps[index].description, message);
                Err(message)
            }
        }
    }

    /// Single place where a run leaves `running`, for success and failure alike.
    async fn finish(&self, execution: &mut Execution, outcome: Result<Value, String>, started: Instant) {
        let error = outcome.as_ref().err().cloned();
        if !execution.finish(outcome) {
            warn!(execution_id = %execution.id, "Execution already finished");
            return;
        }
        self.store.put(execution.clone()).await;

        self.events.emit(ExecutionEvent::RunFinished {
            execution_id: execution.id.clone(),
            success: error.is_none(),
            error: error.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        match error {
            None => info!(execution_id = %execution.id, "Agent execution completed"),
            Some(e) => error!(execution_id = %execution.id, "Agent execution failed: {}", e),
        }
    }
}
