use crate::IntegrationError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Caller-supplied credential map. Never persisted.
pub type Credentials = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationCategory {
    Email,
    Social,
    Payment,
    Crm,
    Storage,
    Communication,
}

impl std::str::FromStr for IntegrationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "social" => Ok(Self::Social),
            "payment" => Ok(Self::Payment),
            "crm" => Ok(Self::Crm),
            "storage" => Ok(Self::Storage),
            "communication" => Ok(Self::Communication),
            other => Err(format!("unknown integration category: {}", other)),
        }
    }
}

/// Static registry entry describing one external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: IntegrationCategory,
    /// Checked in this order before the adapter runs.
    pub required_keys: Vec<String>,
    /// Logical endpoint name to URL template.
    pub endpoints: HashMap<String, String>,
}

impl IntegrationConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: IntegrationCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            required_keys: Vec::new(),
            endpoints: HashMap::new(),
        }
    }

    pub fn require(mut self, key: impl Into<String>) -> Self {
        self.required_keys.push(key.into());
        self
    }

    pub fn endpoint(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.endpoints.insert(name.into(), url.into());
        self
    }

    /// Required keys that are absent or empty in `credentials`, in declared order.
    pub fn missing_keys(&self, credentials: &Credentials) -> Vec<String> {
        self.required_keys
            .iter()
            .filter(|key| credentials.get(*key).map_or(true, |v| v.is_empty()))
            .cloned()
            .collect()
    }
}

/// Uniform outcome of every adapter invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub integration: String,
}

impl IntegrationResult {
    pub fn ok(integration: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
            integration: integration.into(),
        }
    }

    pub fn failure(integration: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
            integration: integration.into(),
        }
    }
}

/// An external service the integrate phase can deliver content to.
#[async_trait]
pub trait IntegrationAdapter: Send + Sync {
    /// Static description, including the credential keys checked before `deliver`.
    fn config(&self) -> IntegrationConfig;

    /// Perform the delivery. `input` is the integrate step input, whose
    /// `result.deliverable` field carries the generated text.
    async fn deliver(
        &self,
        input: &Value,
        credentials: &Credentials,
    ) -> Result<Value, IntegrationError>;
}
