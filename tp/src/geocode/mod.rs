//! Place lookup for autocomplete
//!
//! A [`Geocoder`] turns a free-text query into candidate places; the
//! [`Autocomplete`] front end decides which queries are sent and which
//! responses are allowed to reach the display.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod autocomplete;
mod opencage;

pub use autocomplete::{Autocomplete, AutocompleteOutcome};
pub use opencage::OpenCageClient;

/// A candidate place offered to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    /// Stable identifier (the formatted address for OpenCage)
    pub id: String,
    /// Display title
    pub title: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl PlaceSuggestion {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: title.clone(),
            title,
            latitude: None,
            longitude: None,
        }
    }
}

/// Errors that can occur during geocoding
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Free-text place search
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up places matching `query`
    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodeError>;
}
