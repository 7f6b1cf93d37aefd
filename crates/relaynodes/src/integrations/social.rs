use super::{deliverable, remote_id, simulate_call};
use crate::content::{truncate, FACEBOOK_LIMIT, LINKEDIN_LIMIT, TWITTER_LIMIT};
use async_trait::async_trait;
use chrono::Utc;
use relaycore::{Credentials, IntegrationAdapter, IntegrationCategory, IntegrationConfig, IntegrationError};
use serde_json::{json, Value};
use std::time::Duration;

pub struct LinkedInAdapter {
    latency: Duration,
}

impl LinkedInAdapter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl IntegrationAdapter for LinkedInAdapter {
    fn config(&self) -> IntegrationConfig {
        IntegrationConfig::new("linkedin", "LinkedIn", IntegrationCategory::Social)
            .require("linkedin_access_token")
            .endpoint("post", "https://api.linkedin.com/v2/ugcPosts")
            .endpoint("profile", "https://api.linkedin.com/v2/people/~")
    }

    async fn deliver(&self, input: &Value, _credentials: &Credentials) -> Result<Value, IntegrationError> {
        let text = truncate(&deliverable(input, "No LinkedIn content provided")?, LINKEDIN_LIMIT);
        simulate_call(self.latency).await;

        Ok(json!({
            "postId": remote_id("linkedin"),
            "content": text,
            "published": true,
            "visibility": "PUBLIC",
            "timestamp": Utc::now(),
        }))
    }
}

pub struct FacebookAdapter {
    latency: Duration,
}

impl FacebookAdapter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl IntegrationAdapter for FacebookAdapter {
    fn config(&self) -> IntegrationConfig {
        IntegrationConfig::new("facebook", "Facebook", IntegrationCategory::Social)
            .require("facebook_access_token")
            .require("facebook_page_id")
            .endpoint("post", "https://graph.facebook.com/v18.0/{page-id}/feed")
            .endpoint("pages", "https://graph.facebook.com/v18.0/me/accounts")
    }

    async fn deliver(&self, input: &Value, credentials: &Credentials) -> Result<Value, IntegrationError> {
        let text = truncate(&deliverable(input, "No Facebook content provided")?, FACEBOOK_LIMIT);
        simulate_call(self.latency).await;

        Ok(json!({
            "postId": remote_id("facebook"),
            "pageId": credentials.get("facebook_page_id"),
            "message": text,
            "published": true,
            "timestamp": Utc::now(),
        }))
    }
}

pub struct TwitterAdapter {
    latency: Duration,
}

impl TwitterAdapter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl IntegrationAdapter for TwitterAdapter {
    fn config(&self) -> IntegrationConfig {
        IntegrationConfig::new("twitter", "Twitter", IntegrationCategory::Social)
            .require("twitter_api_key")
            .require("twitter_access_token")
            .endpoint("tweet", "https://api.twitter.com/2/tweets")
            .endpoint("user", "https://api.twitter.com/2/users/me")
    }

    async fn deliver(&self, input: &Value, _credentials: &Credentials) -> Result<Value, IntegrationError> {
        let text = truncate(&deliverable(input, "No Twitter content provided")?, TWITTER_LIMIT);
        simulate_call(self.latency).await;

        Ok(json!({
            "tweetId": remote_id("twitter"),
            "text": text,
            "published": true,
            "timestamp": Utc::now(),
        }))
    }
}
