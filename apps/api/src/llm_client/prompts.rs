// Shared prompt fragments used by every transform.
// Per-transform templates live in transform/prompts.rs.

/// System preamble prepended to every instruction string sent to the model.
pub const TRANSFORM_SYSTEM: &str = "You are an expert content transformation assistant. \
    Provide high-quality, professional transformations of text based on the specific \
    requirements given.";
