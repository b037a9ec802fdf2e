//! Generation error types

use std::time::Duration;
use thiserror::Error;

/// Errors from the Gemini generation call
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// `promptFeedback.blockReason` set and no candidates returned
    #[error("Prompt blocked: {reason}")]
    Blocked { reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether resubmitting the same request could succeed
    ///
    /// Nothing retries automatically; this only drives the hint shown to the user.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) | Self::Timeout(_) => true,
            Self::ApiError { status, .. } => *status >= 500,
            Self::MissingCredentials(_) | Self::Blocked { .. } | Self::InvalidResponse(_) | Self::Json(_) => false,
        }
    }

    /// Whether the fix is in the user's configuration rather than the request
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials(_) | Self::ApiError { status: 401 | 403, .. }
        )
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(
            LlmError::ApiError {
                status: 503,
                message: "Overloaded".to_string()
            }
            .is_retryable()
        );

        // Bad API key, malformed request
        assert!(
            !LlmError::ApiError {
                status: 400,
                message: "API key not valid".to_string()
            }
            .is_retryable()
        );

        assert!(LlmError::Timeout(Duration::from_secs(120)).is_retryable());
        assert!(
            !LlmError::Blocked {
                reason: "SAFETY".to_string()
            }
            .is_retryable()
        );
        assert!(!LlmError::MissingCredentials("GEMINI_API_KEY".to_string()).is_retryable());
    }

    #[test]
    fn test_is_config_error() {
        assert!(LlmError::MissingCredentials("GEMINI_API_KEY".to_string()).is_config_error());
        assert!(
            LlmError::ApiError {
                status: 403,
                message: "Permission denied".to_string()
            }
            .is_config_error()
        );
        assert!(
            !LlmError::ApiError {
                status: 500,
                message: "internal".to_string()
            }
            .is_config_error()
        );
        assert!(!LlmError::Timeout(Duration::from_secs(1)).is_config_error());
    }

    #[test]
    fn test_retry_after() {
        let err = LlmError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(LlmError::Timeout(Duration::from_secs(1)).retry_after(), None);
    }
}
