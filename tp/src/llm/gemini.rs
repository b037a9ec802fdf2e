//! Google Gemini API client implementation
//!
//! Implements the LlmClient trait for the `generateContent` REST endpoint.
//! One HTTP request per completion; there is no retry loop.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, FinishReason, GenerationConfig, LlmClient, LlmError, TokenUsage};
use crate::config::LlmConfig;

/// Gemini API client
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable or file specified in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::MissingCredentials(e.to_string()))?;

        let timeout = Duration::from_millis(config.timeout_ms);

        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the request body for the Gemini API
    fn build_request_body(&self, request: &CompletionRequest) -> GeminiRequest {
        debug!(%self.model, prompt_len = request.prompt.len(), "build_request_body: called");
        GeminiRequest {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: request.generation.clone(),
        }
    }

    /// Parse the Gemini API response
    fn parse_response(&self, api_response: GeminiResponse) -> Result<CompletionResponse, LlmError> {
        debug!(candidate_count = api_response.candidates.len(), "parse_response: called");

        let Some(candidate) = api_response.candidates.into_iter().next() else {
            return Err(match api_response.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => LlmError::Blocked { reason },
                None => LlmError::InvalidResponse("No candidates in response".to_string()),
            });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let finish_reason = candidate
            .finish_reason
            .as_deref()
            .map(FinishReason::from_gemini)
            .unwrap_or(FinishReason::Stop);

        let usage = api_response
            .usage_metadata
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: if text.is_empty() { None } else { Some(text) },
            finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, "complete: called");
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Network(e)
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("complete: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            debug!(%status, "complete: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let text = response.text().await?;
        let api_response: GeminiResponse = serde_json::from_str(&text)?;
        let parsed = self.parse_response(api_response)?;
        debug!(
            prompt_tokens = parsed.usage.prompt_tokens,
            output_tokens = parsed.usage.output_tokens,
            finish_reason = ?parsed.finish_reason,
            "complete: success"
        );
        Ok(parsed)
    }
}

// Gemini API wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient {
            model: "gemini-1.5-flash".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            http: Client::new(),
            timeout: Duration::from_secs(120),
        }
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            client().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_build_request_body() {
        let request = CompletionRequest {
            prompt: "Plan a trip".to_string(),
            generation: GenerationConfig::default(),
        };

        let body = serde_json::to_value(client().build_request_body(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Plan a trip");
        assert_eq!(body["generationConfig"]["topK"], 64);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 12000);
    }

    #[test]
    fn test_parse_response_joins_text_parts() {
        let raw = r#"{
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "```json\n{" }, { "text": "}\n```" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 420, "candidatesTokenCount": 1337 }
        }"#;

        let response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let parsed = client().parse_response(response).unwrap();

        assert_eq!(parsed.content.as_deref(), Some("```json\n{}\n```"));
        assert_eq!(parsed.finish_reason, FinishReason::Stop);
        assert_eq!(parsed.usage.prompt_tokens, 420);
        assert_eq!(parsed.usage.output_tokens, 1337);
    }

    #[test]
    fn test_parse_response_blocked_prompt() {
        let raw = r#"{ "promptFeedback": { "blockReason": "SAFETY" } }"#;

        let response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let err = client().parse_response(response).unwrap_err();

        assert!(matches!(err, LlmError::Blocked { ref reason } if reason == "SAFETY"));
        assert_eq!(err.to_string(), "Prompt blocked: SAFETY");
    }

    #[test]
    fn test_from_config_without_key_is_missing_credentials() {
        let config = LlmConfig {
            api_key_env: "TRIPPLAN_TEST_UNSET_GEMINI_KEY".to_string(),
            api_key_file: None,
            ..Default::default()
        };

        let err = GeminiClient::from_config(&config).err().unwrap();
        assert!(matches!(err, LlmError::MissingCredentials(_)));
        assert!(err.to_string().contains("TRIPPLAN_TEST_UNSET_GEMINI_KEY"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_response_empty_candidate() {
        let raw = r#"{ "candidates": [{ "finishReason": "MAX_TOKENS" }] }"#;

        let response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let parsed = client().parse_response(response).unwrap();

        assert!(parsed.content.is_none());
        assert!(parsed.finish_reason.is_truncated());
    }
}
