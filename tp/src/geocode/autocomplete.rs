//! Autocomplete with out-of-order response suppression
//!
//! Every query sent to the geocoder is tagged with a sequence number. A
//! response may only replace the displayed suggestions if its number is still
//! the latest issued when it arrives; anything older is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use super::{GeocodeError, Geocoder, PlaceSuggestion};
use crate::config::GeocodeConfig;

/// What happened to one keystroke's worth of input
#[derive(Debug)]
pub enum AutocompleteOutcome {
    /// Query below the minimum length; nothing was sent and the display was cleared
    TooShort,
    /// Response accepted and displayed
    Updated(Vec<PlaceSuggestion>),
    /// A newer query was issued while this one was in flight; response dropped
    Stale { seq: u64 },
    /// The lookup failed; the display is left as it was
    Failed(GeocodeError),
}

#[derive(Debug, Default)]
struct Displayed {
    query: Option<String>,
    suggestions: Vec<PlaceSuggestion>,
}

/// Sequenced autocomplete over a [`Geocoder`]
pub struct Autocomplete {
    geocoder: Arc<dyn Geocoder>,
    min_chars: usize,
    timeout: Duration,
    latest: AtomicU64,
    displayed: Mutex<Displayed>,
}

impl Autocomplete {
    pub fn new(geocoder: Arc<dyn Geocoder>, min_chars: usize, timeout: Duration) -> Self {
        debug!(%min_chars, ?timeout, "Autocomplete::new: called");
        Self {
            geocoder,
            min_chars,
            timeout,
            latest: AtomicU64::new(0),
            displayed: Mutex::new(Displayed::default()),
        }
    }

    pub fn from_config(geocoder: Arc<dyn Geocoder>, config: &GeocodeConfig) -> Self {
        Self::new(geocoder, config.min_query_chars, Duration::from_millis(config.timeout_ms))
    }

    /// Handle new field input
    pub async fn on_input(&self, text: &str) -> AutocompleteOutcome {
        let query = text.trim();
        // Any input supersedes whatever is still in flight, even when too short to send
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(%seq, %query, "Autocomplete::on_input: called");

        if query.chars().count() < self.min_chars {
            debug!(%seq, "Autocomplete::on_input: query too short, not sending");
            *self.lock_displayed() = Displayed::default();
            return AutocompleteOutcome::TooShort;
        }

        let result = match tokio::time::timeout(self.timeout, self.geocoder.search(query)).await {
            Ok(result) => result,
            Err(_) => Err(GeocodeError::Timeout(self.timeout)),
        };

        let mut displayed = self.lock_displayed();
        if self.latest.load(Ordering::SeqCst) != seq {
            debug!(%seq, latest = self.latest.load(Ordering::SeqCst), "Autocomplete::on_input: stale response dropped");
            return AutocompleteOutcome::Stale { seq };
        }

        match result {
            Ok(suggestions) => {
                debug!(%seq, count = suggestions.len(), "Autocomplete::on_input: displaying suggestions");
                *displayed = Displayed {
                    query: Some(query.to_string()),
                    suggestions: suggestions.clone(),
                };
                AutocompleteOutcome::Updated(suggestions)
            }
            Err(e) => {
                warn!(%seq, %query, error = %e, "Autocomplete::on_input: place lookup failed");
                AutocompleteOutcome::Failed(e)
            }
        }
    }

    /// Suggestions currently on display
    pub fn suggestions(&self) -> Vec<PlaceSuggestion> {
        self.lock_displayed().suggestions.clone()
    }

    /// The query the displayed suggestions belong to
    pub fn displayed_query(&self) -> Option<String> {
        self.lock_displayed().query.clone()
    }

    fn lock_displayed(&self) -> std::sync::MutexGuard<'_, Displayed> {
        // Displayed is replaced wholesale, so a poisoned value is still consistent
        self.displayed.lock().unwrap_or_else(|e| e.into_inner())
    }
}
