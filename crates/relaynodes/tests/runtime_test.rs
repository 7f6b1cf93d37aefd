use relaycore::{Credentials, RunStatus, StepKind};
use relaynodes::standard_runtime;
use relayruntime::RuntimeConfig;
use serde_json::{json, Map, Value};

fn vars(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_builtin_templates_run_to_completion() {
    let runtime = standard_runtime(&RuntimeConfig::immediate(), None)
        .await
        .expect("runtime assembles");
    let runner = runtime.runner();

    let templates = runner.templates().await;
    let ids: Vec<_> = templates.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["blog-publishing", "lead-generation", "product-launch"]);

    for template in &templates {
        let execution = runner
            .execute(template, vars(json!({"topic": "rust"})), "tester")
            .await;
        assert_eq!(execution.status, RunStatus::Completed, "{}: {:?}", template.id, execution.error);
        assert_eq!(execution.results.len(), template.steps.len());
    }
}

#[tokio::test]
async fn test_blog_publishing_substitutes_variables() {
    let runtime = standard_runtime(&RuntimeConfig::immediate(), None)
        .await
        .expect("runtime assembles");
    let template = runtime
        .runner()
        .template("blog-publishing")
        .await
        .expect("built in");

    let execution = runtime
        .runner()
        .execute(
            &template,
            vars(json!({"topic": "Tokio", "target_audience": "devs", "keywords": ["async"]})),
            "tester",
        )
        .await;

    assert_eq!(
        execution.results["research"]["content"],
        json!("AI generated content for: Research the topic: Tokio for audience: devs")
    );
    assert_eq!(
        execution.results["content-creation"]["content"],
        json!(r#"AI generated content for: Write SEO-optimized blog post about Tokio using keywords: ["async"]"#)
    );
    assert_eq!(execution.results["wordpress-publish"]["success"], json!(true));
}

#[tokio::test]
async fn test_degraded_blog_publisher_reaches_every_integration() {
    let runtime = standard_runtime(&RuntimeConfig::immediate(), None)
        .await
        .expect("runtime assembles");
    assert!(!runtime.system_status().generation);

    let credentials: Credentials = [("linkedin_access_token", "t")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let execution = runtime
        .coordinator()
        .execute("blog-publisher", "tester", json!({"topic": "rust"}), credentials)
        .await
        .expect("built-in agent");

    assert_eq!(execution.status, RunStatus::Completed);
    assert_eq!(execution.steps.len(), 9);

    let outputs: Vec<&Value> = execution
        .steps
        .iter()
        .filter(|s| s.kind == StepKind::Integrate)
        .filter_map(|s| s.output.as_ref())
        .collect();
    let succeeded: Vec<_> = outputs
        .iter()
        .filter(|o| o["success"] == json!(true))
        .map(|o| o["integration"].clone())
        .collect();
    assert_eq!(succeeded, vec![json!("linkedin")]);

    let result = execution.result.expect("result");
    assert_eq!(result["integrations_successful"], json!(1));
    assert_eq!(result["total_integrations"], json!(5));
}
