// Resume analysis pipeline.
// Extraction stage → formatter → match analysis stage, plus the HTTP handlers
// that sequence them. All LLM calls go through llm_client.

pub mod extraction;
pub mod formatter;
pub mod handlers;
pub mod matcher;
pub mod models;
pub mod pipeline;
pub mod prompts;
