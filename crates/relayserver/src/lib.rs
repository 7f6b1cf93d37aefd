//! HTTP surface for the agent relay
//!
//! Agent, workflow and integration routes, an event websocket and a
//! per-client rate limiter, mounted with [`configure`].

mod config;
mod error;
mod limiter;
mod routes;
mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorResponse};
pub use limiter::{rate_limit, Quota, RateLimiter, Tier};
pub use routes::configure;
pub use state::AppState;
