//! LLM request/response types for Tripplan
//!
//! Provider-agnostic shapes; the Gemini client maps them onto the wire format.

use serde::Serialize;
use tracing::debug;

use crate::config::LlmConfig;

/// Sampling parameters sent with every generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl From<&LlmConfig> for GenerationConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Fully rendered prompt
    pub prompt: String,

    /// Sampling parameters
    pub generation: GenerationConfig,
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub finish_reason: FinishReason,

    /// Token usage
    pub usage: TokenUsage,
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other(String),
}

impl FinishReason {
    /// Parse from Gemini API finishReason string
    pub fn from_gemini(s: &str) -> Self {
        debug!(%s, "FinishReason::from_gemini: called");
        match s {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            "RECITATION" => FinishReason::Recitation,
            other => FinishReason::Other(other.to_string()),
        }
    }

    /// A reply cut short is almost certainly truncated JSON
    pub fn is_truncated(&self) -> bool {
        matches!(self, FinishReason::MaxTokens)
    }
}

/// Token usage as reported by the provider
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub output_tokens: u64,
}
