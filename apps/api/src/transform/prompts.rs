//! Prompt Builder: maps a transform kind and raw text to the instruction string.
//!
//! Each template carries a persona, output constraints, the verbatim input after a
//! labeled delimiter, and a closing cue where the model's answer begins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::llm_client::prompts::TRANSFORM_SYSTEM;

/// The closed set of supported transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    SummarizeCeo,
    ExpandJobDescription,
    FormalTone,
}

impl TransformKind {
    pub const ALL: [TransformKind; 3] = [
        TransformKind::SummarizeCeo,
        TransformKind::ExpandJobDescription,
        TransformKind::FormalTone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransformKind::SummarizeCeo => "summarize-ceo",
            TransformKind::ExpandJobDescription => "expand-job-description",
            TransformKind::FormalTone => "formal-tone",
        }
    }

    pub fn identifiers() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.as_str()).collect()
    }

    fn template(self) -> &'static str {
        match self {
            TransformKind::SummarizeCeo => SUMMARIZE_CEO_TEMPLATE,
            TransformKind::ExpandJobDescription => EXPAND_JOB_DESCRIPTION_TEMPLATE,
            TransformKind::FormalTone => FORMAL_TONE_TEMPLATE,
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTransformKind(pub String);

impl fmt::Display for UnknownTransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown transform kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownTransformKind {}

impl FromStr for TransformKind {
    type Err = UnknownTransformKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownTransformKind(s.to_string()))
    }
}

/// Executive summary template. Replace `{text}` before sending.
pub const SUMMARIZE_CEO_TEMPLATE: &str = "\
You are an executive communication specialist. Transform the following text into a concise, \
high-level executive summary suitable for a CEO. Focus on key insights, strategic implications, \
and actionable points. Use professional business language, bullet points where appropriate, \
and keep it under 150 words.

Text to summarize:
{text}

Executive Summary:";

/// Job description expansion template. Replace `{text}` before sending.
pub const EXPAND_JOB_DESCRIPTION_TEMPLATE: &str = "\
You are a professional HR content writer. Transform the following brief notes or bullet points \
into a comprehensive, well-structured job description. Include sections for: Overview, \
Key Responsibilities, Required Qualifications, Preferred Qualifications, and What We Offer. \
Use professional, engaging language that attracts top talent.

Input notes:
{text}

Complete Job Description:";

/// Formal tone template. Replace `{text}` before sending.
pub const FORMAL_TONE_TEMPLATE: &str = "\
You are a professional business communication editor. Transform the following text to have a \
formal, professional tone suitable for corporate communication. Maintain the original meaning \
and key points, but elevate the language, remove casual expressions, and ensure it follows \
professional writing standards.

Original text:
{text}

Formal version:";

/// Builds the full instruction string: system preamble, blank line, then the
/// kind's template with `text` inserted verbatim.
pub fn build_prompt(kind: TransformKind, text: &str) -> String {
    // Split on the placeholder instead of `str::replace` so the input is
    // inserted exactly once and never rescanned.
    let (before, after) = kind
        .template()
        .split_once("{text}")
        .unwrap_or((kind.template(), ""));

    let mut prompt = String::with_capacity(
        TRANSFORM_SYSTEM.len() + 2 + before.len() + text.len() + after.len(),
    );
    prompt.push_str(TRANSFORM_SYSTEM);
    prompt.push_str("\n\n");
    prompt.push_str(before);
    prompt.push_str(text);
    prompt.push_str(after);
    prompt
}
