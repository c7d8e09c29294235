mod config;
mod errors;
mod llm_client;
mod rate_limit;
mod routes;
mod state;
mod transform;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{GeminiClient, TextGenerator};
use crate::rate_limit::RateLimiter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::transform::gateway::TransformGateway;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Transform API v{}", env!("CARGO_PKG_VERSION"));

    // A missing key is not fatal: transform requests report it individually.
    let generator: Option<Arc<dyn TextGenerator>> = match &config.google_api_key {
        Some(key) => {
            let client = GeminiClient::new(key.clone(), config.google_api_base_url.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(client))
        }
        None => {
            warn!("GOOGLE_API_KEY is not set; /api/transform will return configuration errors");
            None
        }
    };

    let window = Duration::from_secs(config.rate_limit_window_secs);
    let limiter = Arc::new(RateLimiter::new(config.rate_limit_max_requests, window));
    info!(
        "Rate limit: {} requests per {}s per client",
        limiter.max_requests(),
        limiter.window().as_secs()
    );
    spawn_limiter_sweeper(limiter.clone());

    let state = AppState {
        gateway: TransformGateway::new(generator),
        limiter,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");
    info!("API endpoint: http://localhost:{}/api/transform", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Periodically drops idle clients so the limiter's map does not grow without bound.
fn spawn_limiter_sweeper(limiter: Arc<RateLimiter>) {
    // tokio's interval panics on a zero period.
    let period = limiter.window().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.purge_expired();
            if removed > 0 {
                debug!("Rate limiter purged {removed} idle client(s)");
            }
        }
    });
}
