use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::transform::prompts::TransformKind;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Text must be at most {max} characters (got {actual})")]
    TextTooLong { max: usize, actual: usize },

    #[error("Invalid transform type: {0}")]
    InvalidTransformKind(String),

    #[error("Too many requests")]
    RateLimited { retry_after: Duration },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider rejected the API credential: {0}")]
    ProviderAuth(String),

    #[error("Provider rate limit reached: {0}")]
    ProviderRateLimited(String),

    #[error("Provider returned an empty response")]
    EmptyProviderResponse,

    #[error("Transformation failed: {0}")]
    Unclassified(String),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Auth(msg) => AppError::ProviderAuth(msg),
            LlmError::RateLimited(msg) => AppError::ProviderRateLimited(msg),
            other => AppError::Unclassified(other.to_string()),
        }
    }
}

impl AppError {
    /// Short machine-readable tag placed in the `error` field of the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::TextTooLong { .. } => "TEXT_TOO_LONG",
            AppError::InvalidTransformKind(_) => "INVALID_TRANSFORM_TYPE",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::ProviderAuth(_) => "PROVIDER_AUTH_ERROR",
            AppError::ProviderRateLimited(_) => "PROVIDER_RATE_LIMITED",
            AppError::EmptyProviderResponse => "EMPTY_PROVIDER_RESPONSE",
            AppError::Unclassified(_) => "TRANSFORMATION_FAILED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_)
            | AppError::TextTooLong { .. }
            | AppError::InvalidTransformKind(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } | AppError::ProviderRateLimited(_) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            AppError::Configuration(_)
            | AppError::ProviderAuth(_)
            | AppError::EmptyProviderResponse
            | AppError::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable message returned to the client.
    /// Provider details stay in the logs; only the unclassified case echoes them.
    fn public_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::TextTooLong { max, .. } => {
                format!("Text must be at most {max} characters")
            }
            AppError::InvalidTransformKind(_) => format!(
                "Transform type must be one of: {}",
                TransformKind::identifiers().join(", ")
            ),
            AppError::RateLimited { .. } => {
                "Too many requests from this IP, please try again later.".to_string()
            }
            AppError::Configuration(msg) => msg.clone(),
            AppError::ProviderAuth(_) => {
                "Invalid Google API key. Please check your configuration.".to_string()
            }
            AppError::ProviderRateLimited(_) => {
                "Google API rate limit reached. Please try again later.".to_string()
            }
            AppError::EmptyProviderResponse => "No response from Google Gemini".to_string(),
            AppError::Unclassified(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "{self}");
        }

        let body = Json(json!({
            "error": self.code(),
            "message": self.public_message(),
        }));

        let mut response = (status, body).into_response();

        if let AppError::RateLimited { retry_after } = &self {
            // Round up so clients never retry a fraction of a second early.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}
