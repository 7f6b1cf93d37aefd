use super::{deliverable, remote_id, simulate_call};
use crate::content::parse_blog;
use async_trait::async_trait;
use chrono::Utc;
use relaycore::{Credentials, IntegrationAdapter, IntegrationCategory, IntegrationConfig, IntegrationError};
use serde_json::{json, Value};
use std::time::Duration;

/// Publishes the deliverable as a post on the caller's WordPress site.
pub struct WordPressAdapter {
    latency: Duration,
}

impl WordPressAdapter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl IntegrationAdapter for WordPressAdapter {
    fn config(&self) -> IntegrationConfig {
        IntegrationConfig::new("wordpress", "WordPress", IntegrationCategory::Communication)
            .require("wordpress_url")
            .require("wordpress_username")
            .require("wordpress_app_password")
            .endpoint("posts", "{wordpress_url}/wp-json/wp/v2/posts")
            .endpoint("media", "{wordpress_url}/wp-json/wp/v2/media")
    }

    async fn deliver(&self, input: &Value, credentials: &Credentials) -> Result<Value, IntegrationError> {
        let post = parse_blog(&deliverable(input, "No blog content provided")?);
        let site = credentials
            .get("wordpress_url")
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or_default();
        simulate_call(self.latency).await;

        Ok(json!({
            "postId": remote_id("wp"),
            "title": post.title,
            "status": "published",
            "url": format!("{}/{}", site, post.slug),
            "timestamp": Utc::now(),
        }))
    }
}
