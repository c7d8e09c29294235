use std::sync::Arc;

use crate::rate_limit::RateLimiter;
use crate::transform::gateway::TransformGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub gateway: TransformGateway,
    /// Rolling-window counters keyed by client IP. The only shared mutable state.
    pub limiter: Arc<RateLimiter>,
}
