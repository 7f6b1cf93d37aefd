use actix_web::http::{header, StatusCode};
use actix_web::middleware::from_fn;
use actix_web::{test, web, App};
use relaynodes::standard_runtime;
use relayruntime::RuntimeConfig;
use relayserver::{configure, rate_limit, AppState, Quota, RateLimiter};
use serde_json::{json, Value};
use std::time::Duration;

async fn state(limiter: Option<RateLimiter>) -> web::Data<AppState> {
    let runtime = standard_runtime(&RuntimeConfig::immediate(), None)
        .await
        .expect("runtime assembles");
    web::Data::new(AppState::new(runtime, limiter))
}

#[actix_web::test]
async fn test_health_check() {
    let app = test::init_service(App::new().app_data(state(None).await).configure(configure)).await;

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["service"], json!("relayserver"));
}

#[actix_web::test]
async fn test_agent_catalog() {
    let app = test::init_service(App::new().app_data(state(None).await).configure(configure)).await;

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/agents").to_request())
            .await;
    assert_eq!(body["count"], json!(4));

    let agent: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/agents/blog-publisher").to_request(),
    )
    .await;
    assert_eq!(agent["integrations"].as_array().map(Vec::len), Some(5));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/agents/nobody").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Agent not found" }));
}

#[actix_web::test]
async fn test_execute_agent_and_poll_until_complete() {
    let app = test::init_service(App::new().app_data(state(None).await).configure(configure)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/agents/email-campaign/execute")
            .insert_header(("x-user-id", "user-42"))
            .set_json(json!({ "input": { "subject": "Hello" }, "apiKeys": { "unused_key": "secret-token-value" } }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let started: Value = test::read_body_json(resp).await;
    let execution_id = started["executionId"].as_str().expect("execution id").to_string();
    assert!(execution_id.starts_with("exec_"));

    let mut record = Value::Null;
    for _ in 0..100 {
        record = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/agents/execution/{}", execution_id))
                .to_request(),
        )
        .await;
        if record["status"] == json!("completed") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(record["status"], json!("completed"));
    assert_eq!(record["userId"], json!("user-42"));
    assert_eq!(record["progress"], json!(100));
    assert!(record["currentStep"].is_string());
    assert!(!record.to_string().contains("secret-token-value"));

    let page: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/agents/executions/user/user-42?limit=10")
            .to_request(),
    )
    .await;
    assert_eq!(page["pagination"]["total"], json!(1));
    assert_eq!(page["executions"][0]["id"], json!(execution_id));
}

#[actix_web::test]
async fn test_bad_request_bodies() {
    let app = test::init_service(App::new().app_data(state(None).await).configure(configure)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/agents/blog-publisher/execute")
            .set_json(json!({ "apiKeys": {} }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("Input is required"));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/workflows/execute")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|e| e.starts_with("Invalid request body")));
}

#[actix_web::test]
async fn test_unknown_workflow_template() {
    let app = test::init_service(App::new().app_data(state(None).await).configure(configure)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/workflows/execute")
            .set_json(json!({ "templateId": "nope", "variables": {} }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("Workflow template nope not found"));
}

#[actix_web::test]
async fn test_workflow_execution_reports_step_progress() {
    let app = test::init_service(App::new().app_data(state(None).await).configure(configure)).await;

    let started: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/workflows/execute")
            .set_json(json!({ "templateId": "lead-generation", "variables": { "industry": "fintech" } }))
            .to_request(),
    )
    .await;
    let execution_id = started["executionId"].as_str().expect("execution id").to_string();
    assert!(execution_id.starts_with("workflow_"));

    let mut record = Value::Null;
    for _ in 0..100 {
        record = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/workflows/execution/{}", execution_id))
                .to_request(),
        )
        .await;
        if record["status"] == json!("completed") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(record["status"], json!("completed"));
    assert_eq!(record["progress"], json!(100));
    assert_eq!(record["completedSteps"], record["totalSteps"]);
    assert_eq!(record["variables"]["industry"], json!("fintech"));
}

#[actix_web::test]
async fn test_stripe_integration_with_empty_keys() {
    let app = test::init_service(App::new().app_data(state(None).await).configure(configure)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/integrations/stripe/test")
            .set_json(json!({ "apiKeys": {} }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Missing required API key: stripe_secret_key"));
    assert_eq!(body["integration"], json!("stripe"));
}

#[actix_web::test]
async fn test_integration_catalog_and_key_validation() {
    let app = test::init_service(App::new().app_data(state(None).await).configure(configure)).await;

    let social: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/integrations/categories/social")
            .to_request(),
    )
    .await;
    assert_eq!(social["count"], json!(3));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/integrations/validate-keys")
            .set_json(json!({ "integrationId": "twitter", "apiKeys": { "twitter_api_key": "k" } }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["missingKeys"], json!(["twitter_access_token"]));

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/integrations/validate-keys")
            .set_json(json!({
                "integrationId": "twitter",
                "apiKeys": { "twitter_api_key": "k", "twitter_access_token": "t" },
            }))
            .to_request(),
    )
    .await;
    assert_eq!(body["valid"], json!(true));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/integrations/validate-keys")
            .set_json(json!({ "integrationId": "twitter" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_rate_limit_rejects_with_retry_after() {
    let limiter = RateLimiter::new(
        Quota {
            points: 1,
            window: Duration::from_secs(60),
            block: Duration::from_secs(60),
        },
        Quota {
            points: 100,
            window: Duration::from_secs(60),
            block: Duration::from_secs(30),
        },
    );
    let app = test::init_service(
        App::new()
            .app_data(state(Some(limiter)).await)
            .wrap(from_fn(rate_limit))
            .configure(configure),
    )
    .await;

    let request = || {
        test::TestRequest::post()
            .uri("/api/integrations/stripe/test")
            .set_json(json!({ "apiKeys": {} }))
            .to_request()
    };

    let first = test::call_service(&app, request()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = test::call_service(&app, request()).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        second
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok()),
        Some("60")
    );
    let body: Value = test::read_body_json(second).await;
    assert_eq!(body["retryAfter"], json!(60));

    // general tier is unaffected
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_dashboard_aggregates_agent_and_workflow_runs() {
    let state = state(None).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let runtime = &state.runtime;
    for agent in ["product-launch", "product-launch", "email-campaign"] {
        runtime
            .coordinator()
            .execute(agent, "analyst", json!("launch week"), Default::default())
            .await
            .expect("agent exists");
    }
    let template = runtime
        .runner()
        .template("lead-generation")
        .await
        .expect("template exists");
    runtime.runner().execute(&template, Default::default(), "analyst").await;
    // another user's run is not counted
    runtime
        .coordinator()
        .execute("blog-publisher", "someone-else", json!("post"), Default::default())
        .await
        .expect("agent exists");

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/analytics/dashboard?timeframe=7d")
            .insert_header(("x-user-id", "analyst"))
            .to_request(),
    )
    .await;

    let overview = &body["overview"];
    assert_eq!(overview["totalExecutions"], json!(4));
    assert_eq!(overview["successfulExecutions"], json!(4));
    assert_eq!(overview["failedExecutions"], json!(0));
    assert_eq!(overview["successRate"], json!(100));
    assert_eq!(overview["activeAgents"], json!(4));
    assert_eq!(body["popularAgents"][0]["agentId"], json!("product-launch"));
    assert_eq!(body["popularAgents"][0]["executions"], json!(2));
    assert_eq!(body["popularAgents"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["timeframe"], json!("7d"));
    assert!(body.get("integrationStats").is_none());

    let empty: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/analytics/dashboard").to_request(),
    )
    .await;
    assert_eq!(empty["overview"]["totalExecutions"], json!(0));
    assert_eq!(empty["overview"]["successRate"], json!(0));
    assert_eq!(empty["timeframe"], json!("30d"));
}
