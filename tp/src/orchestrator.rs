//! Request orchestration
//!
//! Turns a validated [`TripRequest`] into a prompt, makes the generation call
//! once, and hands the raw reply to whoever renders it. At most one request
//! is in flight: a submission made while another is pending is rejected,
//! not queued.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{RawModelResponse, TripRequest};
use crate::llm::{CompletionRequest, GenerationConfig, LlmClient, LlmError};
use crate::prompts::PromptLoader;

/// Lifecycle of the current (or last) submission
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Pending {
        request_id: Uuid,
    },
    Succeeded {
        request_id: Uuid,
    },
    Failed {
        request_id: Uuid,
        reason: String,
    },
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// What the request side passes to the detail view
#[derive(Debug, Clone)]
pub struct Handoff {
    pub request_id: Uuid,
    pub raw: RawModelResponse,
}

/// Errors that can occur during a submission
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Request {0} is already in progress")]
    Busy(Uuid),

    #[error("Failed to build prompt: {0}")]
    Prompt(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

impl SubmitError {
    /// Whether resubmitting the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Busy(_) | Self::EmptyResponse => true,
            Self::Prompt(_) => false,
            Self::Llm(e) => e.is_retryable(),
        }
    }
}

/// Single-flight itinerary request orchestrator
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    generation: GenerationConfig,
    currency: String,
    timeout: Duration,
    state: Mutex<RequestState>,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: PromptLoader,
        generation: GenerationConfig,
        currency: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            prompts,
            generation,
            currency: currency.into(),
            timeout,
            state: Mutex::new(RequestState::Idle),
        }
    }

    pub fn from_config(llm: Arc<dyn LlmClient>, config: &Config) -> Self {
        debug!("Orchestrator::from_config: called");
        Self::new(
            llm,
            PromptLoader::new(&config.prompts.dir),
            GenerationConfig::from(&config.llm),
            config.budget.currency.clone(),
            Duration::from_millis(config.llm.timeout_ms),
        )
    }

    /// Snapshot of the current state
    pub fn state(&self) -> RequestState {
        self.lock_state().clone()
    }

    /// Render the prompt for a request without sending it
    pub fn prompt_for(&self, request: &TripRequest) -> Result<String, SubmitError> {
        self.prompts
            .itinerary_prompt(request, &self.currency)
            .map_err(|e| SubmitError::Prompt(e.to_string()))
    }

    /// Generate an itinerary for `request`
    ///
    /// Returns `SubmitError::Busy` without calling the model if another
    /// submission is pending. On any failure no handoff is produced and the
    /// orchestrator is ready for a retry.
    pub async fn submit(&self, request: &TripRequest) -> Result<Handoff, SubmitError> {
        let mut in_flight = self.begin()?;
        let request_id = in_flight.request_id;
        info!(%request_id, origin = %request.origin(), destination = %request.destination(), days = request.duration_days(), budget = %request.budget(), "submit: generating itinerary");

        let result = self.generate(request).await;
        match &result {
            Ok(raw) => {
                info!(%request_id, response_len = raw.as_str().len(), "submit: itinerary generated");
                in_flight.finish(RequestState::Succeeded { request_id });
            }
            Err(e) => {
                error!(%request_id, error = %e, "submit: itinerary request failed");
                in_flight.finish(RequestState::Failed {
                    request_id,
                    reason: e.to_string(),
                });
            }
        }

        result.map(|raw| Handoff { request_id, raw })
    }

    fn begin(&self) -> Result<InFlight<'_>, SubmitError> {
        let mut state = self.lock_state();
        if let RequestState::Pending { request_id } = *state {
            warn!(%request_id, "begin: submission rejected, request already in flight");
            return Err(SubmitError::Busy(request_id));
        }

        let request_id = Uuid::now_v7();
        *state = RequestState::Pending { request_id };
        debug!(%request_id, "begin: pending");
        Ok(InFlight {
            orchestrator: self,
            request_id,
            finished: false,
        })
    }

    async fn generate(&self, request: &TripRequest) -> Result<RawModelResponse, SubmitError> {
        let prompt = self.prompt_for(request)?;
        debug!(prompt_len = prompt.len(), "generate: prompt rendered");

        let completion = CompletionRequest {
            prompt,
            generation: self.generation.clone(),
        };

        let response = tokio::time::timeout(self.timeout, self.llm.complete(completion))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;

        if response.finish_reason.is_truncated() {
            warn!("generate: response hit the output token limit and is likely truncated");
        }

        match response.content {
            Some(text) if !text.trim().is_empty() => Ok(RawModelResponse::new(text)),
            _ => Err(SubmitError::EmptyResponse),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RequestState> {
        // State is replaced wholesale, so a poisoned value is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Marks the pending request failed if the submit future is dropped early
struct InFlight<'a> {
    orchestrator: &'a Orchestrator,
    request_id: Uuid,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(&mut self, state: RequestState) {
        *self.orchestrator.lock_state() = state;
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(request_id = %self.request_id, "InFlight::drop: submission cancelled");
            *self.orchestrator.lock_state() = RequestState::Failed {
                request_id: self.request_id,
                reason: "cancelled".to_string(),
            };
        }
    }
}
