// Text transformation: prompt templates, request validation, and the gateway
// that relays prompts to the model capability.
// All model calls go through llm_client, never directly provider calls here.

pub mod gateway;
pub mod handlers;
pub mod models;
pub mod prompts;
