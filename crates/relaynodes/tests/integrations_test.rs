use relaycore::{Credentials, IntegrationCategory};
use relaynodes::register_all_integrations;
use relayruntime::IntegrationRegistry;
use serde_json::{json, Value};
use std::time::Duration;

fn registry() -> IntegrationRegistry {
    let mut registry = IntegrationRegistry::new();
    register_all_integrations(&mut registry, Duration::ZERO);
    registry
}

fn keys(pairs: &[(&str, &str)]) -> Credentials {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn with_deliverable(text: &str) -> Value {
    json!({ "result": { "deliverable": text } })
}

#[tokio::test]
async fn test_stripe_with_empty_credentials() {
    let result = registry()
        .dispatch("stripe", &with_deliverable("A product"), &Credentials::new())
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Missing required API key: stripe_secret_key"));
    assert_eq!(result.integration, "stripe");
    assert!(result.data.is_none());
}

#[tokio::test]
async fn test_first_missing_key_is_reported_in_declared_order() {
    let registry = registry();
    let result = registry
        .dispatch(
            "wordpress",
            &with_deliverable("Post"),
            &keys(&[("wordpress_app_password", "pw")]),
        )
        .await;
    assert_eq!(result.error.as_deref(), Some("Missing required API key: wordpress_url"));

    let result = registry
        .dispatch(
            "wordpress",
            &with_deliverable("Post"),
            &keys(&[("wordpress_url", "https://blog.example"), ("wordpress_username", "")]),
        )
        .await;
    assert_eq!(result.error.as_deref(), Some("Missing required API key: wordpress_username"));
}

#[tokio::test]
async fn test_unknown_integration() {
    let result = registry()
        .dispatch("myspace", &with_deliverable("x"), &Credentials::new())
        .await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Integration myspace not found"));
}

#[tokio::test]
async fn test_missing_deliverable_is_a_failed_result() {
    let result = registry()
        .dispatch(
            "wordpress",
            &json!({ "result": {} }),
            &keys(&[
                ("wordpress_url", "https://blog.example"),
                ("wordpress_username", "me"),
                ("wordpress_app_password", "pw"),
            ]),
        )
        .await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("No blog content provided"));
}

#[tokio::test]
async fn test_wordpress_publishes_with_slug() {
    let result = registry()
        .dispatch(
            "wordpress",
            &with_deliverable("Rust in Production\n\nBody text."),
            &keys(&[
                ("wordpress_url", "https://blog.example/"),
                ("wordpress_username", "me"),
                ("wordpress_app_password", "pw"),
            ]),
        )
        .await;

    assert!(result.success, "{:?}", result.error);
    let data = result.data.expect("data on success");
    assert_eq!(data["title"], json!("Rust in Production"));
    assert_eq!(data["status"], json!("published"));
    assert_eq!(data["url"], json!("https://blog.example/rust-in-production"));
}

#[tokio::test]
async fn test_twitter_truncates_to_limit() {
    let long = "x".repeat(500);
    let result = registry()
        .dispatch(
            "twitter",
            &with_deliverable(&long),
            &keys(&[("twitter_api_key", "k"), ("twitter_access_token", "t")]),
        )
        .await;

    let data = result.data.expect("data on success");
    assert_eq!(data["text"].as_str().map(|s| s.chars().count()), Some(280));
}

#[tokio::test]
async fn test_gmail_extracts_subject_and_recipients() {
    let body = "Subject: Launch day\nHi team,\nPlease forward to ana@example.org and bo@example.net.";
    let result = registry()
        .dispatch(
            "gmail",
            &with_deliverable(body),
            &keys(&[("gmail_email", "me@gmail.com"), ("gmail_app_password", "app")]),
        )
        .await;

    assert!(result.success, "{:?}", result.error);
    let data = result.data.expect("data on success");
    assert_eq!(data["subject"], json!("Launch day"));
    assert_eq!(data["to"], json!(["ana@example.org", "bo@example.net"]));
    assert_eq!(data["sent"], json!(true));
}

#[tokio::test]
async fn test_stripe_and_hubspot_shapes() {
    let registry = registry();

    let stripe = registry
        .dispatch("stripe", &with_deliverable("Widget"), &keys(&[("stripe_secret_key", "sk")]))
        .await;
    let data = stripe.data.expect("stripe data");
    assert_eq!(data["name"], json!("Generated Product"));
    assert_eq!(data["price"], json!(1999));

    let hubspot = registry
        .dispatch("hubspot", &with_deliverable("No address here"), &keys(&[("hubspot_api_key", "hk")]))
        .await;
    let data = hubspot.data.expect("hubspot data");
    assert_eq!(data["email"], json!("lead@example.com"));
}

#[test]
fn test_catalog_listing() {
    let registry = registry();
    let ids: Vec<_> = registry.list().into_iter().map(|c| c.id).collect();
    assert_eq!(
        ids,
        vec!["facebook", "gmail", "hubspot", "linkedin", "stripe", "twitter", "wordpress"]
    );

    let social: Vec<_> = registry
        .by_category(IntegrationCategory::Social)
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(social, vec!["facebook", "linkedin", "twitter"]);

    let missing = registry.missing_keys("facebook", &keys(&[("facebook_page_id", "1")]));
    assert_eq!(missing, Some(vec!["facebook_access_token".to_string()]));
    assert_eq!(registry.missing_keys("nope", &Credentials::new()), None);
}
