use async_trait::async_trait;
use relaycore::{GenerationError, GenerationRequest, TextGenerator};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Settings for an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl GenerationConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// `None` when `OPENAI_API_KEY` is unset or blank.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())?;

        let mut config = Self::new(api_key);
        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            config.model = model;
        }
        if let Some(secs) = env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        Some(config)
    }
}

/// Text generator backed by `POST {base_url}/chat/completions`
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl OpenAiGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Request(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn body(&self, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "max_tokens": request.max_tokens,
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.config.model, max_tokens = request.max_tokens, "Calling chat completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.body(&request))
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Request(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_content(&text)
    }
}

/// First choice's message content from a chat completions response body
pub fn extract_content(body: &str) -> Result<String, GenerationError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    json.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GenerationError::MalformedResponse("missing choices[0].message.content".to_string()))
}
