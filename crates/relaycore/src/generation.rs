use crate::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single chat-style completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Text-generation backend used by the think, plan and execute phases.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier reported in logs and outputs.
    fn model(&self) -> &str;

    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}
