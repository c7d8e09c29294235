use serde::{Serialize, Serializer};

use crate::transform::prompts::TransformKind;

/// Validated transform request. Only the gateway constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub text: String,
    pub kind: TransformKind,
}

/// Token count as reported by the provider.
/// Serializes to the number, or to the string `"unavailable"` when not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokensUsed {
    Reported(u32),
    Unavailable,
}

impl From<Option<u32>> for TokensUsed {
    fn from(value: Option<u32>) -> Self {
        value.map_or(TokensUsed::Unavailable, TokensUsed::Reported)
    }
}

impl Serialize for TokensUsed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TokensUsed::Reported(n) => serializer.serialize_u32(*n),
            TokensUsed::Unavailable => serializer.serialize_str("unavailable"),
        }
    }
}

/// Successful transformation, serialized straight into the 200 response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    pub success: bool,
    pub original_text: String,
    pub transformed_text: String,
    pub transform_type: TransformKind,
    pub model: String,
    pub tokens_used: TokensUsed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_serializes_wire_shape() {
        let result = TransformResult {
            success: true,
            original_text: "Hello world".into(),
            transformed_text: "Greetings, world.".into(),
            transform_type: TransformKind::FormalTone,
            model: "gemini-pro".into(),
            tokens_used: TokensUsed::Unavailable,
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": true,
                "originalText": "Hello world",
                "transformedText": "Greetings, world.",
                "transformType": "formal-tone",
                "model": "gemini-pro",
                "tokensUsed": "unavailable"
            })
        );
    }

    #[test]
    fn test_reported_tokens_serialize_as_number() {
        let tokens = TokensUsed::from(Some(321));
        assert_eq!(serde_json::to_value(tokens).unwrap(), json!(321));
        assert_eq!(TokensUsed::from(None), TokensUsed::Unavailable);
    }
}
