use std::env;

/// HTTP server settings read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Allowed CORS origin. Any origin when unset.
    pub frontend_url: Option<String>,
    pub rate_limit: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            frontend_url: None,
            rate_limit: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            frontend_url: env::var("FRONTEND_URL")
                .ok()
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            rate_limit: !env::var("RATE_LIMIT_DISABLED")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}
