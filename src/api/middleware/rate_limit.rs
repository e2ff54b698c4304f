//! In-process fixed-window rate limiting.
//!
//! Counters are keyed by client address and kept in a `DashMap`; under a
//! multi-process deployment they are per-process unless backed by a shared
//! store. That is a scaling limitation, not a correctness one, for a
//! single process.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use crate::domain::errors::AppError;

#[derive(Debug)]
struct Window {
    count: u32,
    started_at: Instant,
}

/// Fixed-window counter set shared across requests.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Arc<DashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Count one hit for `key`; reject once the window is full.
    pub fn check(&self, key: &str) -> Result<(), AppError> {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started_at: now,
        });

        if now.duration_since(entry.started_at) >= self.window {
            entry.count = 0;
            entry.started_at = now;
        }

        if entry.count >= self.max_requests {
            return Err(AppError::too_many_requests(
                "Too many requests, please try again later",
            ));
        }

        entry.count += 1;
        Ok(())
    }
}

/// Best-effort client address: first `x-forwarded-for` hop, then
/// `x-real-ip`, then a shared bucket.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Fixed-window limiter middleware; health probes are exempt.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path().starts_with("/health") {
        return next.run(request).await;
    }

    match limiter.check(&client_key(request.headers())) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
