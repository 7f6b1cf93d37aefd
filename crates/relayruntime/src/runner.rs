use crate::registry::StepHandlerRegistry;
use crate::store::ExecutionStore;
use chrono::Utc;
use relaycore::{
    EventBus, ExecutionEvent, RunKind, StepContext, WorkflowError, WorkflowExecution,
    WorkflowTemplate,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Walks workflow templates step by step.
///
/// Starting at the first step, each step's handler runs, its output is
/// stored under the step id, and the walk continues with the first listed
/// successor until a step has none.
#[derive(Clone)]
pub struct WorkflowRunner {
    templates: Arc<RwLock<HashMap<String, WorkflowTemplate>>>,
    handlers: Arc<StepHandlerRegistry>,
    store: Arc<dyn ExecutionStore<WorkflowExecution>>,
    events: Arc<EventBus>,
    step_delay: Duration,
}

impl WorkflowRunner {
    pub fn new(
        handlers: Arc<StepHandlerRegistry>,
        store: Arc<dyn ExecutionStore<WorkflowExecution>>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            templates: Arc::new(RwLock::new(HashMap::new())),
            handlers,
            store,
            events,
            step_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive steps
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub async fn register_template(&self, template: WorkflowTemplate) -> Result<(), WorkflowError> {
        template.validate()?;
        info!("Workflow template registered: {}", template.name);
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template);
        Ok(())
    }

    /// All registered templates, sorted by id
    pub async fn templates(&self) -> Vec<WorkflowTemplate> {
        let mut templates: Vec<_> = self.templates.read().await.values().cloned().collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    pub async fn template(&self, id: &str) -> Option<WorkflowTemplate> {
        self.templates.read().await.get(id).cloned()
    }

    pub async fn get_execution(&self, id: &str) -> Option<WorkflowExecution> {
        self.store.get(id).await
    }

    pub async fn executions_by_user(&self, user_id: &str) -> Vec<WorkflowExecution> {
        self.store.list_by_owner(user_id).await
    }

    /// Start a registered template on a background task and return the run id.
    pub async fn start(
        &self,
        template_id: &str,
        variables: Map<String, Value>,
        user_id: &str,
    ) -> Result<String, WorkflowError> {
        let template = self
            .template(template_id)
            .await
            .ok_or_else(|| WorkflowError::TemplateNotFound(template_id.to_string()))?;

        let execution = self.register(&template, variables, user_id).await;
        let execution_id = execution.id.clone();

        let this = self.clone();
        tokio::spawn(async move {
            this.supervise(execution, template).await;
        });

        Ok(execution_id)
    }

    /// Run a template to completion on the current task. The template does
    /// not need to be registered.
    pub async fn execute(
        &self,
        template: &WorkflowTemplate,
        variables: Map<String, Value>,
        user_id: &str,
    ) -> WorkflowExecution {
        let execution = self.register(template, variables, user_id).await;
        self.supervise(execution, template.clone()).await
    }

    async fn register(
        &self,
        template: &WorkflowTemplate,
        variables: Map<String, Value>,
        user_id: &str,
    ) -> WorkflowExecution {
        let execution = WorkflowExecution::new(template, variables, user_id);
        self.store.put(execution.clone()).await;
        self.events.emit(ExecutionEvent::RunStarted {
            execution_id: execution.id.clone(),
            kind: RunKind::Workflow,
            source: template.id.clone(),
            timestamp: Utc::now(),
        });
        info!(execution_id = %execution.id, template = %template.id, "Starting workflow execution");
        execution
    }

    async fn supervise(&self, execution: WorkflowExecution, template: WorkflowTemplate) -> WorkflowExecution {
        let execution_id = execution.id.clone();
        let started = Instant::now();

        let this = self.clone();
        let body = tokio::spawn(async move {
            let mut execution = execution;
            let outcome = this.walk(&mut execution, &template).await;
            (execution, outcome)
        });

        let (mut execution, outcome) = match body.await {
            Ok(finished) => finished,
            Err(join_error) => {
                let snapshot = self.store.get(&execution_id).await;
                match snapshot {
                    Some(snapshot) => (snapshot, Err(format!("Execution task aborted: {}", join_error))),
                    None => {
                        error!(execution_id = %execution_id, "Workflow execution vanished after task failure");
                        return self.orphan(&execution_id, join_error.to_string());
                    }
                }
            }
        };

        self.finish(&mut execution, outcome, started).await;
        execution
    }

    /// Minimal failed record for a run whose snapshot is gone
    fn orphan(&self, execution_id: &str, reason: String) -> WorkflowExecution {
        let mut execution = WorkflowExecution::new(&WorkflowTemplate::new("", ""), Map::new(), "");
        execution.id = execution_id.to_string();
        execution.finish(Err(format!("Execution task aborted: {}", reason)));
        execution
    }

    async fn walk(
        &self,
        execution: &mut WorkflowExecution,
        template: &WorkflowTemplate,
    ) -> Result<(), String> {
        let mut current = template.first_step().map(|s| s.id.clone());
        let mut hops = 0;

        while let Some(step_id) = current {
            hops += 1;
            if hops > template.steps.len() {
                return Err(WorkflowError::CyclicSuccessors.to_string());
            }

            let step = template
                .find_step(&step_id)
                .ok_or_else(|| WorkflowError::StepNotFound(step_id.clone()).to_string())?;
            execution.current_step = step.id.clone();
            self.store.put(execution.clone()).await;

            let handler = self
                .handlers
                .get(step.kind)
                .ok_or_else(|| WorkflowError::UnknownStepType(step.kind.to_string()).to_string())?;

            self.events.emit(ExecutionEvent::StepStarted {
                execution_id: execution.id.clone(),
                step_id: step.id.clone(),
                step_type: step.kind.to_string(),
                timestamp: Utc::now(),
            });
            info!("Executing step: {}", step.name);

            let ctx = StepContext {
                execution_id: execution.id.clone(),
                variables: execution.variables.clone(),
                results: execution.results.clone(),
                events: self.events.create_emitter(&execution.id, &step.id),
            };

            let started = Instant::now();
            match handler.run(step, ctx).await {
                Ok(output) => {
                    execution.results.insert(step.id.clone(), output);
                    self.store.put(execution.clone()).await;
                    self.events.emit(ExecutionEvent::StepCompleted {
                        execution_id: execution.id.clone(),
                        step_id: step.id.clone(),
                        duration_ms: started.elapsed().as_millis() as u64,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    let message = e.to_string();
                    self.events.emit(ExecutionEvent::StepFailed {
                        execution_id: execution.id.clone(),
                        step_id: step.id.clone(),
                        error: message.clone(),
                        timestamp: Utc::now(),
                    });
                    error!("Step failed: {}: {}", step.name, message);
                    return Err(message);
                }
            }

            current = step.next_steps.first().cloned();
            if current.is_some() && !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
        }

        Ok(())
    }

    async fn finish(&self, execution: &mut WorkflowExecution, outcome: Result<(), String>, started: Instant) {
        let error = outcome.as_ref().err().cloned();
        if !execution.finish(outcome) {
            warn!(execution_id = %execution.id, "Workflow execution already finished");
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
            None => info!(execution_id = %execution.id, "Workflow execution completed"),
            Some(e) => error!(execution_id = %execution.id, "Workflow execution failed: {}", e),
        }
    }
}
