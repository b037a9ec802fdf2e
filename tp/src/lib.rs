//! Tripplan - day-by-day travel itineraries from a language model
//!
//! A trip form is validated into a [`TripRequest`], rendered into a prompt,
//! and sent to a generative model once. The model's loosely formatted reply
//! is sanitized, validated into a typed [`Itinerary`], and rendered.
//!
//! # Modules
//!
//! - [`form`] - Trip form and per-field validation
//! - [`prompts`] - Prompt templates
//! - [`llm`] - Generation client trait and Gemini implementation
//! - [`orchestrator`] - Single-flight request state machine
//! - [`sanitize`] - Fence stripping and JSON decoding of model replies
//! - [`render`] - Itinerary detail view
//! - [`geocode`] - Place autocomplete
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod form;
pub mod geocode;
pub mod interactive;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod render;
pub mod sanitize;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use domain::{BudgetRange, Itinerary, RawModelResponse, TripRequest};
pub use form::{Field, FormErrors, TripForm};
pub use geocode::{Autocomplete, AutocompleteOutcome, GeocodeError, Geocoder, PlaceSuggestion};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
pub use orchestrator::{Handoff, Orchestrator, RequestState, SubmitError};
pub use render::{DetailState, Screen, ScreenBody};
