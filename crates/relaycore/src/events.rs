use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Agent,
    Workflow,
}

/// Events emitted while agent and workflow runs progress
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    RunStarted {
        execution_id: String,
        kind: RunKind,
        /// Agent id or template id.
        source: String,
        timestamp: DateTime<Utc>,
    },
    RunFinished {
        execution_id: String,
        success: bool,
        error: Option<String>,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    StepStarted {
        execution_id: String,
        step_id: String,
        step_type: String,
        timestamp: DateTime<Utc>,
    },
    StepCompleted {
        execution_id: String,
        step_id: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    StepFailed {
        execution_id: String,
        step_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    StepEvent {
        execution_id: String,
        step_id: String,
        event: StepEvent,
        timestamp: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    pub fn execution_id(&self) -> &str {
        match self {
            ExecutionEvent::RunStarted { execution_id, .. }
            | ExecutionEvent::RunFinished { execution_id, .. }
            | ExecutionEvent::StepStarted { execution_id, .. }
            | ExecutionEvent::StepCompleted { execution_id, .. }
            | ExecutionEvent::StepFailed { execution_id, .. }
            | ExecutionEvent::StepEvent { execution_id, .. } => execution_id,
        }
    }
}

/// Free-form notes a step handler reports while it runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum StepEvent {
    Info { message: String },
    Warning { message: String },
}

/// Event emitter handed to a single step
#[derive(Clone)]
pub struct EventEmitter {
    execution_id: String,
    step_id: String,
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventEmitter {
    pub fn new(
        execution_id: impl Into<String>,
        step_id: impl Into<String>,
        sender: broadcast::Sender<ExecutionEvent>,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            step_id: step_id.into(),
            sender,
        }
    }

    pub fn emit(&self, event: StepEvent) {
        let _ = self.sender.send(ExecutionEvent::StepEvent {
            execution_id: self.execution_id.clone(),
            step_id: self.step_id.clone(),
            event,
            timestamp: Utc::now(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(StepEvent::Info {
            message: message.into(),
        });
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(StepEvent::Warning {
            message: message.into(),
        });
    }
}

/// Process-wide event bus. Sending never fails a run, even with no subscribers.
pub struct EventBus {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }

    pub fn create_emitter(&self, execution_id: &str, step_id: &str) -> EventEmitter {
        EventEmitter::new(execution_id, step_id, self.sender.clone())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}
