//! Integration adapters for the external services agents publish to.
//!
//! Every adapter validates its input, shapes the deliverable with the
//! helpers in [`crate::content`] and then performs a simulated call that
//! only waits for the configured latency.

mod commerce;
mod crm;
mod email;
mod publishing;
mod social;

pub use commerce::StripeAdapter;
pub use crm::HubSpotAdapter;
pub use email::GmailAdapter;
pub use publishing::WordPressAdapter;
pub use social::{FacebookAdapter, LinkedInAdapter, TwitterAdapter};

use chrono::Utc;
use relaycore::IntegrationError;
use serde_json::Value;
use std::time::Duration;

/// The generated text an agent handed over, from `input.result.deliverable`.
pub(crate) fn deliverable(input: &Value, missing: &str) -> Result<String, IntegrationError> {
    match input.get("result").and_then(|r| r.get("deliverable")) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            Err(IntegrationError::MissingContent(missing.to_string()))
        }
        Some(other) => Ok(other.to_string()),
    }
}

/// Stand-in for the remote call.
pub(crate) async fn simulate_call(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

pub(crate) fn remote_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Utc::now().timestamp_millis())
}
