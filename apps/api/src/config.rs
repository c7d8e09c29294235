use anyhow::{Context, Result};

const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Application configuration loaded from environment variables.
///
/// The provider key is optional: a missing key fails each transform request
/// with a configuration error instead of stopping the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: Option<String>,
    pub google_api_base_url: String,
    pub port: u16,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            google_api_key: optional_env("GOOGLE_API_KEY"),
            google_api_base_url: optional_env("GOOGLE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            port: parse_env("PORT", 3001).context("PORT must be a valid port number")?,
            rate_limit_max_requests: parse_env("RATE_LIMIT_MAX_REQUESTS", 50)
                .context("RATE_LIMIT_MAX_REQUESTS must be a non-negative integer")?,
            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", 15 * 60)
                .context("RATE_LIMIT_WINDOW_SECS must be a positive number of seconds")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Returns the variable's value, treating unset and blank as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for environment variable '{key}'")),
        None => Ok(default),
    }
}
