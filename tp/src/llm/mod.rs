//! LLM Client module for Tripplan
//!
//! Provides the generation call used to produce itineraries.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod gemini;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use gemini::GeminiClient;
pub use types::{CompletionRequest, CompletionResponse, FinishReason, GenerationConfig, TokenUsage};

use crate::config::LlmConfig;

/// Create the LLM client described by config
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(model = %config.model, "create_client: called");
    Ok(Arc::new(GeminiClient::from_config(config)?))
}
