//! LLM Client: the single point of entry for all model calls in the transform API.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! Everything goes through the `TextGenerator` capability defined here.
//!
//! Model: gemini-pro (hardcoded, not configurable)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

/// The model used for all LLM calls.
pub const MODEL: &str = "gemini-pro";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Sampling policy sent with every request. Callers never tune these per request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
}

impl GenerationConfig {
    pub const TRANSFORM: GenerationConfig = GenerationConfig {
        temperature: 0.7,
        max_output_tokens: 1000,
        top_p: 1.0,
    };
}

/// Raw provider output. `text` is passed through untrimmed and may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub total_tokens: Option<u32>,
}

/// The external model capability: one instruction string in, generated text out.
///
/// Carried in `AppState` as `Arc<dyn TextGenerator>` so tests can swap in a stub.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier of the model that produces the output.
    fn model(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Generation, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    fn into_generation(self) -> Generation {
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Generation {
            text,
            total_tokens: self.usage_metadata.and_then(|u| u.total_token_count),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Classifies a non-success provider response into the capability's error contract.
fn classify_api_error(status: StatusCode, body: &str) -> LlmError {
    let (message, provider_status) = match serde_json::from_str::<GeminiError>(body) {
        Ok(e) => (e.error.message, e.error.status),
        Err(_) => (body.to_string(), String::new()),
    };
    let lowered = message.to_lowercase();

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || lowered.contains("api key")
    {
        return LlmError::Auth(message);
    }

    if status == StatusCode::TOO_MANY_REQUESTS
        || provider_status == "RESOURCE_EXHAUSTED"
        || lowered.contains("quota")
        || lowered.contains("rate limit")
    {
        return LlmError::RateLimited(message);
    }

    LlmError::Api {
        status: status.as_u16(),
        message,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Gemini `generateContent` client. Performs exactly one call per request; no retries.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, MODEL)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        MODEL
    }

    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Generation, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: config,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_api_error(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        let generation = parsed.into_generation();

        debug!(
            "Gemini call succeeded: chars={}, total_tokens={:?}",
            generation.text.len(),
            generation.total_tokens
        );

        Ok(generation)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn test_generation_config_serializes_camel_case() {
        let value = serde_json::to_value(GenerationConfig::TRANSFORM).unwrap();
        assert_eq!(value["maxOutputTokens"], 1000);
        assert_eq!(value["topP"], 1.0);
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_into_generation_joins_first_candidate_parts() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "Hello, "}, {"text": "world."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"totalTokenCount": 42}
        }))
        .unwrap();
        let generation = parsed.into_generation();
        assert_eq!(generation.text, "Hello, world.");
        assert_eq!(generation.total_tokens, Some(42));
    }

    #[test]
    fn test_into_generation_blocked_prompt_is_empty() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let generation = parsed.into_generation();
        assert_eq!(generation.text, "");
        assert_eq!(generation.total_tokens, None);
    }

    #[test]
    fn test_classify_invalid_api_key_as_auth() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            classify_api_error(StatusCode::BAD_REQUEST, body),
            LlmError::Auth(_)
        ));
    }

    #[test]
    fn test_classify_forbidden_as_auth() {
        assert!(matches!(
            classify_api_error(StatusCode::FORBIDDEN, "denied"),
            LlmError::Auth(_)
        ));
    }

    #[test]
    fn test_classify_resource_exhausted_as_rate_limited() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            classify_api_error(StatusCode::TOO_MANY_REQUESTS, body),
            LlmError::RateLimited(_)
        ));
    }

    #[test]
    fn test_classify_quota_message_as_rate_limited() {
        let body = r#"{"error":{"code":400,"message":"Quota exceeded for this project","status":"FAILED_PRECONDITION"}}"#;
        assert!(matches!(
            classify_api_error(StatusCode::BAD_REQUEST, body),
            LlmError::RateLimited(_)
        ));
    }

    #[test]
    fn test_classify_other_errors_keep_status() {
        match classify_api_error(StatusCode::SERVICE_UNAVAILABLE, "upstream down") {
            LlmError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    /// Spawns a local stand-in for the Gemini endpoint and returns its base URL.
    async fn spawn_fake_gemini(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_config_and_key() {
        let app = Router::new().route(
            "/v1beta/models/:target",
            post(|Path(target): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(target, format!("{MODEL}:generateContent"));
                assert_eq!(headers["x-goog-api-key"], "test-key");
                assert_eq!(body["contents"][0]["role"], "user");
                assert_eq!(body["contents"][0]["parts"][0]["text"], "Say hi");
                assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
                Json(json!({
                    "candidates": [{"content": {"parts": [{"text": "  hi  "}]}}]
                }))
            }),
        );
        let base_url = spawn_fake_gemini(app).await;

        let client = GeminiClient::new("test-key".into(), format!("{base_url}/")).unwrap();
        let generation = client
            .generate("Say hi", &GenerationConfig::TRANSFORM)
            .await
            .unwrap();

        assert_eq!(generation.text, "  hi  ");
        assert_eq!(client.model(), MODEL);
    }

    #[tokio::test]
    async fn test_generate_surfaces_provider_rate_limit() {
        let app = Router::new().route(
            "/v1beta/models/:target",
            post(|| async {
                (
                    axum::http::StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"error": {"code": 429, "message": "slow down", "status": "RESOURCE_EXHAUSTED"}})),
                )
            }),
        );
        let base_url = spawn_fake_gemini(app).await;

        let client = GeminiClient::new("test-key".into(), base_url).unwrap();
        let err = client
            .generate("anything", &GenerationConfig::TRANSFORM)
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::RateLimited(msg) if msg == "slow down"));
    }
}
