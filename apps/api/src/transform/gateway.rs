//! Transform Gateway: validates a request, builds the prompt, calls the model
//! capability once, and normalizes the outcome.
//!
//! Validation order (first failure wins):
//!   1. `text` present, a string, and not blank  → `InvalidInput`
//!   2. `text` at most `MAX_TEXT_CHARS` chars     → `TextTooLong`
//!   3. `transformType` present and known        → `InvalidTransformKind`
//!   4. provider credential configured           → `Configuration`
//!
//! No retries: a provider failure is returned to the caller immediately.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{GenerationConfig, TextGenerator, MODEL};
use crate::transform::models::{TransformRequest, TransformResult, TokensUsed};
use crate::transform::prompts::{build_prompt, TransformKind};

pub const MAX_TEXT_CHARS: usize = 5000;

#[derive(Clone)]
pub struct TransformGateway {
    /// `None` when no provider credential is configured.
    generator: Option<Arc<dyn TextGenerator>>,
}

impl TransformGateway {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Model that serves (or would serve) transform requests.
    pub fn model(&self) -> &str {
        self.generator.as_deref().map_or(MODEL, |g| g.model())
    }

    pub async fn transform(&self, body: &Value) -> Result<TransformResult, AppError> {
        let request = validate(body).map_err(|e| failed("validation", e))?;

        let generator = self.generator.as_deref().ok_or_else(|| {
            failed(
                "configuration",
                AppError::Configuration("Google API key is not configured".to_string()),
            )
        })?;

        let prompt = build_prompt(request.kind, &request.text);

        let generation = generator
            .generate(&prompt, &GenerationConfig::TRANSFORM)
            .await
            .map_err(|e| failed("provider", AppError::from(e)))?;

        let transformed_text = generation.text.trim();
        if transformed_text.is_empty() {
            return Err(failed("normalization", AppError::EmptyProviderResponse));
        }

        info!(
            kind = %request.kind,
            input_chars = request.text.chars().count(),
            output_chars = transformed_text.chars().count(),
            "Transform succeeded"
        );

        Ok(TransformResult {
            success: true,
            transformed_text: transformed_text.to_string(),
            original_text: request.text,
            transform_type: request.kind,
            model: generator.model().to_string(),
            tokens_used: TokensUsed::from(generation.total_tokens),
        })
    }
}

/// Checks a raw JSON body against the request invariants.
pub fn validate(body: &Value) -> Result<TransformRequest, AppError> {
    let text = match body.get("text") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        _ => {
            return Err(AppError::InvalidInput(
                "Text is required and must be a string".to_string(),
            ))
        }
    };

    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(AppError::TextTooLong {
            max: MAX_TEXT_CHARS,
            actual: chars,
        });
    }

    let kind = match body.get("transformType") {
        Some(Value::String(s)) => s
            .parse::<TransformKind>()
            .map_err(|e| AppError::InvalidTransformKind(e.0))?,
        Some(other) => return Err(AppError::InvalidTransformKind(other.to_string())),
        None => return Err(AppError::InvalidTransformKind("<missing>".to_string())),
    };

    Ok(TransformRequest {
        text: text.clone(),
        kind,
    })
}

fn failed(stage: &'static str, err: AppError) -> AppError {
    warn!(stage, code = err.code(), "Transform failed: {err}");
    err
}
