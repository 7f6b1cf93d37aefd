use futures::FutureExt;
use relaycore::{
    Credentials, IntegrationAdapter, IntegrationCategory, IntegrationConfig, IntegrationResult,
};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

struct Entry {
    config: IntegrationConfig,
    adapter: Arc<dyn IntegrationAdapter>,
}

/// Registry of available integrations
///
/// Maps an integration id to its static config and adapter. `dispatch` is
/// the only way adapters are invoked and always yields an
/// `IntegrationResult`.
pub struct IntegrationRegistry {
    entries: HashMap<String, Entry>,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn IntegrationAdapter>) {
        let config = adapter.config();
        tracing::info!("Registering integration: {}", config.id);
        self.entries
            .insert(config.id.clone(), Entry { config, adapter });
    }

    pub fn resolve(&self, id: &str) -> Option<&IntegrationConfig> {
        self.entries.get(id).map(|e| &e.config)
    }

    /// All registered configs, sorted by id
    pub fn list(&self) -> Vec<IntegrationConfig> {
        let mut configs: Vec<_> = self.entries.values().map(|e| e.config.clone()).collect();
        configs.sort_by(|a, b| a.id.cmp(&b.id));
        configs
    }

    pub fn by_category(&self, category: IntegrationCategory) -> Vec<IntegrationConfig> {
        self.list()
            .into_iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// Every required key missing from `credentials`, or `None` for an unknown id
    pub fn missing_keys(&self, id: &str, credentials: &Credentials) -> Option<Vec<String>> {
        self.resolve(id).map(|c| c.missing_keys(credentials))
    }

    /// Validate credentials and run the adapter.
    ///
    /// Only the first missing key is reported. Adapter errors and panics
    /// become failed results carrying the message.
    pub async fn dispatch(
        &self,
        id: &str,
        input: &Value,
        credentials: &Credentials,
    ) -> IntegrationResult {
        let Some(entry) = self.entries.get(id) else {
            return IntegrationResult::failure(id, format!("Integration {} not found", id));
        };

        if let Some(missing) = entry.config.missing_keys(credentials).into_iter().next() {
            tracing::warn!(integration = %id, key = %missing, "Missing integration credential");
            return IntegrationResult::failure(id, format!("Missing required API key: {}", missing));
        }

        let delivery = AssertUnwindSafe(entry.adapter.deliver(input, credentials)).catch_unwind();
        match delivery.await {
            Ok(Ok(data)) => IntegrationResult::ok(id, data),
            Ok(Err(e)) => {
                tracing::error!(integration = %id, "Integration failed: {}", e);
                IntegrationResult::failure(id, e.to_string())
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                tracing::error!(integration = %id, "Integration panicked: {}", message);
                IntegrationResult::failure(id, format!("Integration {} panicked: {}", id, message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

impl Default for IntegrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
