use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Number of phases the progress figure is measured against.
pub const STANDARD_PHASES: usize = 5;

/// Immutable agent profile executed by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    pub tools: Vec<String>,
    /// Integrations invoked, in order, during the integrate phase.
    pub integrations: Vec<String>,
    /// Declared step budget. Not enforced by the run loop.
    pub max_steps: u32,
    /// Declared timeout in milliseconds. Not enforced by the run loop.
    pub timeout_ms: u64,
}

impl AgentDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            system_prompt: String::new(),
            tools: Vec::new(),
            integrations: Vec::new(),
            max_steps: 10,
            timeout_ms: 300_000,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_integrations<I, S>(mut self, integrations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.integrations = integrations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limits(mut self, max_steps: u32, timeout_ms: u64) -> Self {
        self.max_steps = max_steps;
        self.timeout_ms = timeout_ms;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Paused,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Think,
    Plan,
    Execute,
    Integrate,
    Verify,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Think => "think",
            StepKind::Plan => "plan",
            StepKind::Execute => "execute",
            StepKind::Integrate => "integrate",
            StepKind::Verify => "verify",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One unit of work inside an agent execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    pub status: StepStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Step {
    pub fn new(
        execution_id: &str,
        kind: StepKind,
        description: impl Into<String>,
        input: Value,
    ) -> Self {
        Self {
            id: format!("{}_{}", execution_id, kind),
            kind,
            description: description.into(),
            integration: None,
            input,
            output: None,
            status: StepStatus::Pending,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Integrate step bound to a single integration id.
    pub fn integrate(execution_id: &str, integration: impl Into<String>, input: Value) -> Self {
        let integration = integration.into();
        Self {
            id: format!("{}_integrate_{}", execution_id, integration),
            description: format!("Integrating with {}", integration),
            integration: Some(integration),
            ..Self::new(execution_id, StepKind::Integrate, "", input)
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, StepStatus::Completed | StepStatus::Failed)
    }

    pub fn complete(&mut self, output: Value) {
        self.output = Some(output);
        self.status = StepStatus::Completed;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.status = StepStatus::Failed;
    }
}

/// One run of an agent. Mutated in place as its steps progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: String,
    pub agent_id: String,
    pub user_id: String,
    pub status: RunStatus,
    pub steps: Vec<Step>,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Execution {
    pub fn new(agent_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: generate_run_id("exec"),
            agent_id: agent_id.into(),
            user_id: user_id.into(),
            status: RunStatus::Running,
            steps: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            result: None,
            error: None,
        }
    }

    /// Append a step as `running`. The step is visible before its handler runs.
    pub fn begin_step(&mut self, mut step: Step) -> usize {
        step.status = StepStatus::Running;
        step.timestamp = Utc::now();
        self.steps.push(step);
        self.steps.len() - 1
    }

    pub fn step_output(&self, kind: StepKind) -> Option<&Value> {
        self.steps
            .iter()
            .find(|s| s.kind == kind)
            .and_then(|s| s.output.as_ref())
    }

    /// Outputs of every integrate step, in execution order.
    pub fn integration_outputs(&self) -> Vec<Value> {
        self.steps
            .iter()
            .filter(|s| s.kind == StepKind::Integrate)
            .map(|s| s.output.clone().unwrap_or(Value::Null))
            .collect()
    }

    /// The single state transition out of `running`.
    ///
    /// Returns `false` (and changes nothing) when the execution is already
    /// terminal.
    pub fn finish(&mut self, outcome: Result<Value, String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        match outcome {
            Ok(result) => {
                self.status = RunStatus::Completed;
                self.result = Some(result);
            }
            Err(error) => {
                self.status = RunStatus::Failed;
                self.error = Some(error);
            }
        }
        self.end_time = Some(Utc::now());
        true
    }

    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count()
    }

    /// Percent complete measured against the five standard phases.
    pub fn progress(&self) -> u32 {
        let pct = (self.completed_steps() as f64 / STANDARD_PHASES as f64 * 100.0).round();
        pct.min(100.0) as u32
    }

    pub fn current_step_description(&self) -> &str {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::Running)
            .map(|s| s.description.as_str())
            .unwrap_or("Preparing...")
    }
}

/// Opaque run id: `<prefix>_<unix millis>_<9 random chars>`.
pub fn generate_run_id(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), &random[..9])
}
