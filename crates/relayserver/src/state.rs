use crate::limiter::RateLimiter;
use relayruntime::RelayRuntime;

/// Application state shared across handlers
pub struct AppState {
    pub runtime: RelayRuntime,
    /// `None` disables rate limiting.
    pub limiter: Option<RateLimiter>,
}

impl AppState {
    pub fn new(runtime: RelayRuntime, limiter: Option<RateLimiter>) -> Self {
        Self { runtime, limiter }
    }
}
