use super::{deliverable, remote_id, simulate_call};
use crate::content::parse_lead;
use async_trait::async_trait;
use chrono::Utc;
use relaycore::{Credentials, IntegrationAdapter, IntegrationCategory, IntegrationConfig, IntegrationError};
use serde_json::{json, Value};
use std::time::Duration;

pub struct HubSpotAdapter {
    latency: Duration,
}

impl HubSpotAdapter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl IntegrationAdapter for HubSpotAdapter {
    fn config(&self) -> IntegrationConfig {
        IntegrationConfig::new("hubspot", "HubSpot", IntegrationCategory::Crm)
            .require("hubspot_api_key")
            .endpoint("contacts", "https://api.hubapi.com/crm/v3/objects/contacts")
            .endpoint("deals", "https://api.hubapi.com/crm/v3/objects/deals")
            .endpoint("companies", "https://api.hubapi.com/crm/v3/objects/companies")
    }

    async fn deliver(&self, input: &Value, _credentials: &Credentials) -> Result<Value, IntegrationError> {
        let lead = parse_lead(&deliverable(input, "No HubSpot data provided")?);
        simulate_call(self.latency).await;

        Ok(json!({
            "contactId": remote_id("hubspot"),
            "email": lead.email,
            "name": lead.name,
            "created": true,
            "timestamp": Utc::now(),
        }))
    }
}
