use async_trait::async_trait;
use relaycore::{
    AgentDefinition, Credentials, EventBus, Execution, ExecutionEvent, GenerationError,
    GenerationRequest, IntegrationAdapter, IntegrationCategory, IntegrationConfig,
    IntegrationError, RelayError, RunStatus, StepKind, StepStatus, TextGenerator,
};
use relayruntime::{AgentCoordinator, IntegrationRegistry, MemoryStore, StepExecutor};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

struct CannedGenerator {
    fail: bool,
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    fn model(&self) -> &str {
        "canned"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        if self.fail {
            return Err(GenerationError::Api {
                status: 401,
                body: "invalid api key".to_string(),
            });
        }
        Ok(format!("canned reply ({} tokens)", request.max_tokens))
    }
}

/// Holds every generation until the gate opens.
struct GatedGenerator {
    open: AtomicBool,
    release: Notify,
}

#[async_trait]
impl TextGenerator for GatedGenerator {
    fn model(&self) -> &str {
        "gated"
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<String, GenerationError> {
        if !self.open.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        Ok("released".to_string())
    }
}

/// Echoes the deliverable back; requires `<id>_key`.
struct EchoAdapter {
    id: &'static str,
}

#[async_trait]
impl IntegrationAdapter for EchoAdapter {
    fn config(&self) -> IntegrationConfig {
        IntegrationConfig::new(self.id, self.id, IntegrationCategory::Social)
            .require(format!("{}_key", self.id))
    }

    async fn deliver(&self, input: &Value, _credentials: &Credentials) -> Result<Value, IntegrationError> {
        let deliverable = input
            .pointer("/result/deliverable")
            .cloned()
            .ok_or_else(|| IntegrationError::MissingContent("No content provided".to_string()))?;
        Ok(json!({ "posted": deliverable }))
    }
}

struct PanickingAdapter;

#[async_trait]
impl IntegrationAdapter for PanickingAdapter {
    fn config(&self) -> IntegrationConfig {
        IntegrationConfig::new("explode", "Explode", IntegrationCategory::Storage)
    }

    async fn deliver(&self, _input: &Value, _credentials: &Credentials) -> Result<Value, IntegrationError> {
        panic!("adapter blew up");
    }
}

fn agent(id: &str, integrations: &[&str]) -> AgentDefinition {
    AgentDefinition::new(id, id)
        .with_system_prompt("You are a test agent.")
        .with_integrations(integrations.iter().copied())
}

fn coordinator(generator: Option<Arc<dyn TextGenerator>>, agents: Vec<AgentDefinition>) -> AgentCoordinator {
    let mut integrations = IntegrationRegistry::new();
    for id in ["wordpress", "linkedin", "facebook"] {
        integrations.register(Arc::new(EchoAdapter { id }));
    }
    integrations.register(Arc::new(PanickingAdapter));

    let executor = StepExecutor::new(generator, Arc::new(integrations));
    AgentCoordinator::new(
        agents,
        executor,
        Arc::new(MemoryStore::<Execution>::default()),
        Arc::new(EventBus::new(100)),
    )
}

fn canned() -> Option<Arc<dyn TextGenerator>> {
    Some(Arc::new(CannedGenerator { fail: false }))
}

fn keys(pairs: &[(&str, &str)]) -> Credentials {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<HashMap<_, _>>()
}

#[tokio::test]
async fn test_blog_publisher_runs_all_phases() {
    let coordinator = coordinator(canned(), vec![agent("blog-publisher", &["wordpress", "linkedin"])]);
    let credentials = keys(&[("wordpress_key", "wp"), ("linkedin_key", "li")]);

    let execution = coordinator
        .execute("blog-publisher", "alice", json!({"topic": "rust"}), credentials)
        .await
        .expect("agent exists");

    assert_eq!(execution.status, RunStatus::Completed);
    assert!(execution.end_time.is_some());

    let kinds: Vec<_> = execution.steps.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StepKind::Think,
            StepKind::Plan,
            StepKind::Execute,
            StepKind::Integrate,
            StepKind::Integrate,
            StepKind::Verify,
        ]
    );
    assert!(execution.steps.iter().all(|s| s.status == StepStatus::Completed));
    assert_eq!(execution.steps[3].id, format!("{}_integrate_wordpress", execution.id));

    let result = execution.result.as_ref().expect("completed run has a result");
    assert_eq!(result["integrations_successful"], json!(2));
    assert_eq!(result["total_integrations"], json!(2));
    assert_eq!(execution.progress(), 100);
}

#[tokio::test]
async fn test_step_count_follows_integration_count() {
    let integrations = ["wordpress", "linkedin", "facebook"];
    for n in 0..=integrations.len() {
        let coordinator = coordinator(None, vec![agent("a", &integrations[..n])]);
        let execution = coordinator
            .execute("a", "u", json!("task"), Credentials::new())
            .await
            .expect("agent exists");
        assert_eq!(execution.steps.len(), 4 + n, "with {} integrations", n);
        assert_eq!(execution.status, RunStatus::Completed);
    }
}

#[tokio::test]
async fn test_degraded_mode_completes_with_mock_output() {
    let coordinator = coordinator(None, vec![agent("a", &[])]);
    assert!(!coordinator.generation_available());

    let execution = coordinator
        .execute("a", "u", json!({"topic": "x"}), Credentials::new())
        .await
        .expect("agent exists");

    assert_eq!(execution.status, RunStatus::Completed);
    for kind in [StepKind::Think, StepKind::Plan, StepKind::Execute] {
        let output = execution.step_output(kind).expect("phase ran");
        assert_eq!(output["mock"], json!(true), "{} output", kind);
    }
}

#[tokio::test]
async fn test_failed_integration_does_not_fail_run() {
    let coordinator = coordinator(canned(), vec![agent("a", &["wordpress", "linkedin"])]);
    // linkedin_key missing
    let execution = coordinator
        .execute("a", "u", json!("task"), keys(&[("wordpress_key", "wp")]))
        .await
        .expect("agent exists");

    assert_eq!(execution.status, RunStatus::Completed);
    let linkedin = &execution.steps[4];
    assert_eq!(linkedin.status, StepStatus::Completed);
    let output = linkedin.output.as_ref().expect("integrate output");
    assert_eq!(output["success"], json!(false));
    assert_eq!(output["error"], json!("Missing required API key: linkedin_key"));

    let result = execution.result.as_ref().expect("result");
    assert_eq!(result["integrations_successful"], json!(1));
    assert_eq!(result["total_integrations"], json!(2));
}

#[tokio::test]
async fn test_unknown_integration_is_recorded_as_failure() {
    let coordinator = coordinator(canned(), vec![agent("a", &["mailchimp"])]);
    let execution = coordinator
        .execute("a", "u", json!("task"), Credentials::new())
        .await
        .expect("agent exists");

    assert_eq!(execution.status, RunStatus::Completed);
    let output = execution.steps[3].output.as_ref().expect("integrate output");
    assert_eq!(output["error"], json!("Integration mailchimp not found"));
}

#[tokio::test]
async fn test_generator_error_fails_run() {
    let failing: Option<Arc<dyn TextGenerator>> = Some(Arc::new(CannedGenerator { fail: true }));
    let coordinator = coordinator(failing, vec![agent("a", &["wordpress"])]);

    let execution = coordinator
        .execute("a", "u", json!("task"), Credentials::new())
        .await
        .expect("agent exists");

    assert_eq!(execution.status, RunStatus::Failed);
    assert!(execution.end_time.is_some());
    assert!(execution.result.is_none());
    assert_eq!(execution.steps.len(), 1);
    assert_eq!(execution.steps[0].status, StepStatus::Failed);

    let error = execution.error.as_deref().unwrap_or_default();
    assert!(error.contains("401"), "unexpected error: {}", error);
    assert_eq!(execution.steps[0].error.as_deref(), Some(error));
}

#[tokio::test]
async fn test_unknown_agent_is_rejected() {
    let coordinator = coordinator(None, vec![agent("a", &[])]);
    let err = coordinator
        .start("missing", "u", json!({}), Credentials::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::AgentNotFound(id) if id == "missing"));
    assert!(coordinator.executions_by_user("u").await.is_empty());
}

#[tokio::test]
async fn test_started_run_is_observable_until_completion() {
    let coordinator = coordinator(None, vec![agent("a", &["wordpress"])]);
    let id = coordinator
        .start("a", "bob", json!("task"), keys(&[("wordpress_key", "wp")]))
        .await
        .expect("agent exists");
    assert!(id.starts_with("exec_"));

    let mut finished = None;
    for _ in 0..200 {
        let execution = coordinator.get_execution(&id).await.expect("registered");
        if execution.status.is_terminal() {
            finished = Some(execution);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let execution = finished.expect("run should finish");
    assert_eq!(execution.status, RunStatus::Completed);
    let listed = coordinator.executions_by_user("bob").await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

#[tokio::test]
async fn test_credentials_never_reach_the_record() {
    let coordinator = coordinator(canned(), vec![agent("a", &["wordpress"])]);
    let execution = coordinator
        .execute("a", "u", json!("task"), keys(&[("wordpress_key", "super-secret-token")]))
        .await
        .expect("agent exists");

    let stored = coordinator.get_execution(&execution.id).await.expect("stored");
    let serialized = serde_json::to_string(&stored).expect("serializable");
    assert!(!serialized.contains("super-secret-token"));
}

#[tokio::test]
async fn test_panicking_adapter_is_recorded_as_failed_integration() {
    let coordinator = coordinator(canned(), vec![agent("a", &["explode", "wordpress"])]);
    let execution = coordinator
        .execute("a", "u", json!("task"), keys(&[("wordpress_key", "wp")]))
        .await
        .expect("agent exists");

    assert_eq!(execution.status, RunStatus::Completed);
    let explode = &execution.steps[3];
    assert_eq!(explode.status, StepStatus::Completed);
    let output = explode.output.as_ref().expect("integrate output");
    assert_eq!(output["success"], json!(false));
    assert_eq!(output["integration"], json!("explode"));
    assert!(output["error"]
        .as_str()
        .is_some_and(|e| e.contains("adapter blew up")));

    // later integrations still run
    let wordpress = execution.steps[4].output.as_ref().expect("integrate output");
    assert_eq!(wordpress["success"], json!(true));

    let stored = coordinator.get_execution(&execution.id).await.expect("stored");
    assert_eq!(stored.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_events_bracket_the_run() {
    let events = Arc::new(EventBus::new(100));
    let mut rx = events.subscribe();
    let executor = StepExecutor::new(None, Arc::new(IntegrationRegistry::new()));
    let coordinator = AgentCoordinator::new(
        vec![agent("a", &[])],
        executor,
        Arc::new(MemoryStore::<Execution>::default()),
        events,
    );

    let execution = coordinator
        .execute("a", "u", json!("task"), Credentials::new())
        .await
        .expect("agent exists");

    let mut received = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.execution_id(), execution.id);
        received.push(event);
    }

    assert!(matches!(received.first(), Some(ExecutionEvent::RunStarted { .. })));
    assert!(matches!(
        received.last(),
        Some(ExecutionEvent::RunFinished { success: true, .. })
    ));
    let started = received
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::StepStarted { .. }))
        .count();
    assert_eq!(started, 4);
}

#[tokio::test]
async fn test_step_is_stored_running_before_it_executes() {
    let gate = Arc::new(GatedGenerator {
        open: AtomicBool::new(false),
        release: Notify::new(),
    });
    let generator: Arc<dyn TextGenerator> = gate.clone();
    let coordinator = coordinator(Some(generator), vec![agent("a", &[])]);
    let id = coordinator
        .start("a", "u", json!("task"), Credentials::new())
        .await
        .expect("agent exists");

    let mut held = None;
    for _ in 0..200 {
        let stored = coordinator.get_execution(&id).await.expect("stored");
        if stored.steps.first().is_some_and(|s| s.status == StepStatus::Running) {
            held = Some(stored);
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let held = held.expect("think step stored as running");
    assert_eq!(held.status, RunStatus::Running);
    assert_eq!(held.steps.len(), 1);
    assert_eq!(held.steps[0].kind, StepKind::Think);
    assert!(held.steps[0].output.is_none());
    assert_eq!(held.current_step_description(), "Analyzing task and gathering context");

    gate.open.store(true, Ordering::SeqCst);
    gate.release.notify_one();

    let mut finished = None;
    for _ in 0..200 {
        let stored = coordinator.get_execution(&id).await.expect("stored");
        if stored.status != RunStatus::Running {
            finished = Some(stored);
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let finished = finished.expect("run finishes once released");
    assert_eq!(finished.status, RunStatus::Completed);
    assert_eq!(finished.current_step_description(), "Preparing...");
}
