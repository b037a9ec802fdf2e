//! Trip request and raw model response types

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Selected budget range (inclusive), in the configured currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: u64,
    pub max: u64,
}

impl BudgetRange {
    /// Create a range, returning None when `min > max`
    pub fn new(min: u64, max: u64) -> Option<Self> {
        if min > max {
            debug!(%min, %max, "BudgetRange::new: inverted range");
            return None;
        }
        Some(Self { min, max })
    }
}

impl std::fmt::Display for BudgetRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

/// Validated trip parameters
///
/// Only constructed by form validation, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRequest {
    origin: String,
    destination: String,
    duration_days: u32,
    budget: BudgetRange,
}

impl TripRequest {
    pub(crate) fn new(origin: String, destination: String, duration_days: u32, budget: BudgetRange) -> Self {
        debug!(%origin, %destination, %duration_days, "TripRequest::new: called");
        Self {
            origin,
            destination,
            duration_days,
            budget,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    pub fn budget(&self) -> BudgetRange {
        self.budget
    }
}

/// Unprocessed text returned by the generation call
///
/// Expected, but not guaranteed, to contain an itinerary JSON document,
/// possibly wrapped in a code fence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawModelResponse(String);

impl RawModelResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for RawModelResponse {
    fn from(text: String) -> Self {
        Self(text)
    }
}
