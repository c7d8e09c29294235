//! Per-client rate limiting over a rolling window.
//!
//! The store is an explicit value owned by `AppState`, not process-global, so each
//! router (and each test) gets an isolated instance. Counting is a sliding log:
//! every accepted request records its timestamp, and a client is rejected while it
//! has `max_requests` timestamps younger than `window`.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: usize },
    Limited { retry_after: Duration },
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    /// Records a hit for `client` at `now` unless the client is over the limit.
    /// Rejected requests are not recorded.
    pub fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut hits = self.lock();
        let log = hits.entry(client.to_string()).or_default();
        self.expire(log, now);

        if log.len() >= self.max_requests {
            let retry_after = log
                .front()
                .map(|&oldest| self.window.saturating_sub(now.saturating_duration_since(oldest)))
                .unwrap_or(self.window);
            return RateDecision::Limited { retry_after };
        }

        log.push_back(now);
        RateDecision::Allowed {
            remaining: self.max_requests - log.len(),
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Drops clients with no hits left inside the window. Returns how many were removed.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut hits = self.lock();
        let before = hits.len();
        hits.retain(|_, log| {
            self.expire(log, now);
            !log.is_empty()
        });
        before - hits.len()
    }

    #[cfg(test)]
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    fn expire(&self, log: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = log.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }
    }

    // Poisoning is recovered: the map stays valid if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Client identity used as the counting key: the peer IP address.
fn client_identity(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware applied to every `/api` route. Rejects before the handler runs.
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_identity(&request);

    match state.limiter.check(&client) {
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                "x-ratelimit-limit",
                HeaderValue::from(state.limiter.max_requests()),
            );
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            Ok(response)
        }
        RateDecision::Limited { retry_after } => {
            warn!(client = %client, "Rate limit exceeded");
            Err(AppError::RateLimited { retry_after })
        }
    }
}
