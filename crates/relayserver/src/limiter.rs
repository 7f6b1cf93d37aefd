//! Per-client fixed-window rate limiting with a block penalty.

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpResponse};
use serde_json::json;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::state::AppState;

/// Buckets are swept once the table grows past this many entries.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Endpoints that start runs or tests
    Execution,
    General,
}

impl Tier {
    /// Execution when the last path segment is `execute` or `test`.
    pub fn for_path(path: &str) -> Self {
        let path = path.trim_end_matches('/');
        if path.ends_with("/execute") || path.ends_with("/test") {
            Tier::Execution
        } else {
            Tier::General
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub points: u32,
    pub window: Duration,
    /// How long a client stays rejected after exceeding the quota.
    pub block: Duration,
}

#[derive(Debug)]
struct Bucket {
    count: u32,
    window_start: Instant,
    blocked_until: Option<Instant>,
}

pub struct RateLimiter {
    execution: Quota,
    general: Quota,
    buckets: Mutex<HashMap<(Tier, String), Bucket>>,
}

impl RateLimiter {
    pub fn new(execution: Quota, general: Quota) -> Self {
        Self {
            execution,
            general,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// 10 runs a minute with a one minute block, 100 other requests a
    /// minute with a 30 second block.
    pub fn standard() -> Self {
        Self::new(
            Quota {
                points: 10,
                window: Duration::from_secs(60),
                block: Duration::from_secs(60),
            },
            Quota {
                points: 100,
                window: Duration::from_secs(60),
                block: Duration::from_secs(30),
            },
        )
    }

    pub fn quota(&self, tier: Tier) -> Quota {
        match tier {
            Tier::Execution => self.execution,
            Tier::General => self.general,
        }
    }

    /// Ok if allowed, Err(retry after in whole seconds) if rejected.
    pub async fn check(&self, tier: Tier, client: &str) -> Result<(), u64> {
        self.check_at(tier, client, Instant::now()).await
    }

    pub async fn check_at(&self, tier: Tier, client: &str, now: Instant) -> Result<(), u64> {
        let quota = self.quota(tier);
        let mut buckets = self.buckets.lock().await;

        if buckets.len() > SWEEP_THRESHOLD {
            Self::sweep(&mut buckets, now, |t| self.quota(t));
        }

        let bucket = buckets
            .entry((tier, client.to_string()))
            .or_insert_with(|| Bucket {
                count: 0,
                window_start: now,
                blocked_until: None,
            });

        if let Some(until) = bucket.blocked_until {
            if now < until {
                return Err(whole_seconds(until - now));
            }
            bucket.blocked_until = None;
            bucket.count = 0;
            bucket.window_start = now;
        }

        let elapsed = now.saturating_duration_since(bucket.window_start);
        if elapsed >= quota.window {
            bucket.count = 0;
            bucket.window_start = now;
        }

        bucket.count += 1;
        if bucket.count <= quota.points {
            return Ok(());
        }

        if quota.block.is_zero() {
            let remaining = quota
                .window
                .saturating_sub(now.saturating_duration_since(bucket.window_start));
            return Err(whole_seconds(remaining));
        }
        bucket.blocked_until = Some(now + quota.block);
        Err(whole_seconds(quota.block))
    }

    fn sweep(
        buckets: &mut HashMap<(Tier, String), Bucket>,
        now: Instant,
        quota: impl Fn(Tier) -> Quota,
    ) {
        buckets.retain(|(tier, _), bucket| {
            let blocked = bucket.blocked_until.is_some_and(|until| now < until);
            blocked || now.saturating_duration_since(bucket.window_start) < quota(*tier).window
        });
    }
}

/// At least one second, rounded up.
fn whole_seconds(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}

/// Rate limiting middleware keyed by the client address.
pub async fn rate_limit(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    if let Some(limiter) = state.as_ref().and_then(|s| s.limiter.as_ref()) {
        let client = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let tier = Tier::for_path(req.path());

        if let Err(retry_after) = limiter.check(tier, &client).await {
            tracing::warn!(client = %client, path = %req.path(), "Rate limit exceeded");
            let response = HttpResponse::TooManyRequests()
                .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                .json(json!({
                    "success": false,
                    "error": format!("Rate limit exceeded. Try again in {} seconds.", retry_after),
                    "retryAfter": retry_after,
                }));
            return Ok(req.into_response(response));
        }
    }

    next.call(req).await.map(ServiceResponse::map_into_boxed_body)
}
