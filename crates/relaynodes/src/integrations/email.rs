use super::{deliverable, remote_id, simulate_call};
use crate::content::parse_email;
use async_trait::async_trait;
use relaycore::{Credentials, IntegrationAdapter, IntegrationCategory, IntegrationConfig, IntegrationError};
use serde_json::{json, Value};
use std::time::Duration;

/// Sends the deliverable as an email from the caller's Gmail account.
pub struct GmailAdapter {
    latency: Duration,
}

impl GmailAdapter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl IntegrationAdapter for GmailAdapter {
    fn config(&self) -> IntegrationConfig {
        IntegrationConfig::new("gmail", "Gmail", IntegrationCategory::Email)
            .require("gmail_email")
            .require("gmail_app_password")
            .endpoint("smtp", "smtp.gmail.com")
    }

    async fn deliver(&self, input: &Value, credentials: &Credentials) -> Result<Value, IntegrationError> {
        let content = deliverable(input, "No email content provided")?;
        let sender = credentials
            .get("gmail_email")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                IntegrationError::Credentials(
                    "Gmail credentials missing. Need gmail_email and gmail_app_password".to_string(),
                )
            })?;

        let message = parse_email(&content);
        tracing::info!(from = %sender, recipients = message.to.len(), "Sending email via Gmail");
        simulate_call(self.latency).await;

        Ok(json!({
            "messageId": remote_id("gmail"),
            "from": sender,
            "to": message.to,
            "subject": message.subject,
            "sent": true,
            "provider": "Gmail SMTP",
            "timestamp": chrono::Utc::now(),
        }))
    }
}
