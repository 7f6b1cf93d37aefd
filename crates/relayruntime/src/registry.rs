use relaycore::{StepHandler, StepTemplateKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of template step handlers, keyed by step kind.
///
/// A kind with no registered handler fails the run that reaches it.
pub struct StepHandlerRegistry {
    handlers: HashMap<StepTemplateKind, Arc<dyn StepHandler>>,
}

impl StepHandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any previous one for the same kind
    pub fn register(&mut self, handler: Arc<dyn StepHandler>) {
        let kind = handler.kind();
        tracing::info!("Registering step handler: {}", kind);
        self.handlers.insert(kind, handler);
    }

    pub fn get(&self, kind: StepTemplateKind) -> Option<Arc<dyn StepHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<StepTemplateKind> {
        self.handlers.keys().copied().collect()
    }
}

impl Default for StepHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
