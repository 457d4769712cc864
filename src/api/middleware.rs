//! API Middleware (Rate Limiting, Logging)
//!
//! Two fixed-window limiters: one per client IP in front of every route,
//! and one per ledger account that the write handlers consult.

use alloy_primitives::Address;
use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::utils::constants::{
    ACCOUNT_WRITES_PER_WINDOW, IP_REQUESTS_PER_WINDOW, RATE_WINDOW_SECS,
};

/// Result of one `RateLimiter::check`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Fixed-window counter per key
pub struct RateLimiter<K: Eq + Hash> {
    windows: DashMap<K, (u32, Instant)>,
    limit: u32,
    window: Duration,
}

impl<K: Eq + Hash> RateLimiter<K> {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn check(&self, key: K) -> Admission {
        let now = Instant::now();
        let mut entry = self.windows.entry(key).or_insert((0, now));
        if now.duration_since(entry.1) > self.window {
            *entry = (0, now);
        }
        if entry.0 >= self.limit {
            let retry_after_secs = self.window.saturating_sub(now.duration_since(entry.1)).as_secs();
            return Admission::Limited { retry_after_secs };
        }
        entry.0 += 1;
        Admission::Allowed {
            remaining: self.limit - entry.0,
        }
    }

    /// Drop windows that expired twice over. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, (_, opened)| now.duration_since(*opened) < self.window * 2);
        before.saturating_sub(self.windows.len())
    }
}

/// Writes per sending account
pub type AccountLimiter = RateLimiter<Address>;

impl Default for AccountLimiter {
    fn default() -> Self {
        Self::new(ACCOUNT_WRITES_PER_WINDOW, Duration::from_secs(RATE_WINDOW_SECS))
    }
}

lazy_static::lazy_static! {
    pub static ref IP_LIMITER: RateLimiter<String> =
        RateLimiter::new(IP_REQUESTS_PER_WINDOW, Duration::from_secs(RATE_WINDOW_SECS));
}

/// Periodic cleanup of both limiters
pub fn start_cleanup_task(accounts: Arc<AccountLimiter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(RATE_WINDOW_SECS));
        loop {
            interval.tick().await;
            let removed = IP_LIMITER.cleanup() + accounts.cleanup();
            if removed > 0 {
                debug!("🧹 Rate limiter cleanup: {} stale keys removed", removed);
            }
        }
    });
}

fn is_health(request: &Request) -> bool {
    matches!(request.uri().path(), "/health" | "/v1/health")
}

/// Per-IP limit on every route but health
pub async fn rate_limit_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if is_health(&request) {
        return Ok(next.run(request).await);
    }

    // Forwarded IP, falling back to a shared bucket
    let client = headers
        .get("X-Forwarded-For")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    match IP_LIMITER.check(client.clone()) {
        Admission::Allowed { remaining } => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert("X-RateLimit-Remaining", remaining.into());
            Ok(response)
        }
        Admission::Limited { .. } => {
            warn!(client = %client, "Rate limit exceeded");
            Err(StatusCode::TOO_MANY_REQUESTS)
        }
    }
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        latency_ms = %start.elapsed().as_millis(),
        "Request completed"
    );

    response
}
