//! Model response sanitizer
//!
//! Models like to wrap JSON in a markdown code fence even when told not to.
//! The fence is stripped only at the very start and end of the reply so that
//! backticks inside legitimate content survive untouched.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{Itinerary, RawModelResponse};

/// Leading fence with an optional `json` language tag
static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A```(?i:json)?\s*").expect("valid regex"));

/// Trailing fence
static FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```\z").expect("valid regex"));

/// Remove a leading byte-order mark, a surrounding code fence and whitespace
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim().trim_start_matches('\u{feff}').trim_start();
    let start = FENCE_OPEN.find(trimmed).map(|m| m.end()).unwrap_or(0);
    let body = &trimmed[start..];
    let end = FENCE_CLOSE.find(body).map(|m| m.start()).unwrap_or(body.len());
    body[..end].trim()
}

/// Strip fences and decode the remainder as JSON
///
/// Returns None (never panics) when the remainder is empty or not valid JSON.
/// The caller still has to check the decoded value has the shape it expects.
pub fn sanitize(raw: &str) -> Option<Value> {
    debug!(raw_len = raw.len(), "sanitize: called");
    let cleaned = strip_fences(raw);
    if cleaned.is_empty() {
        warn!("sanitize: model response is empty after stripping fences");
        return None;
    }

    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => {
            debug!("sanitize: decoded JSON");
            Some(value)
        }
        Err(e) => {
            warn!(error = %e, preview = %preview(cleaned), "sanitize: invalid JSON in model response");
            None
        }
    }
}

/// Sanitize a raw model response and validate it into an Itinerary
pub fn parse_itinerary(raw: &RawModelResponse) -> Option<Itinerary> {
    debug!("parse_itinerary: called");
    let value = sanitize(raw.as_str())?;
    match Itinerary::from_value(&value) {
        Ok(itinerary) => Some(itinerary),
        Err(e) => {
            warn!(path = %e.path, reason = %e.reason, "parse_itinerary: response does not match itinerary shape");
            None
        }
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
