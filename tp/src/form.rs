//! Trip form and field validation
//!
//! Holds raw user input exactly as typed. Validation either produces a
//! [`TripRequest`] or a per-field error list; it never produces both.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::config::BudgetConfig;
use crate::domain::{BudgetRange, TripRequest};

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));

/// Form fields, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Origin,
    Destination,
    Duration,
    Budget,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Origin => "Starting Place",
            Self::Destination => "Destination",
            Self::Duration => "Duration (in days)",
            Self::Budget => "Budget",
        }
    }
}

/// A validation message attached to one field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", .field.label())]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// All validation failures for one submission attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_errors(.errors))]
pub struct FormErrors {
    pub errors: Vec<FieldError>,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl FormErrors {
    /// First message for a field, for inline display
    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Raw trip form state
#[derive(Debug, Clone)]
pub struct TripForm {
    pub origin: String,
    pub destination: String,
    pub duration: String,
    pub budget_min: u64,
    pub budget_max: u64,
    bounds: BudgetConfig,
}

impl TripForm {
    /// Empty form with the budget slider at its configured defaults
    pub fn new(bounds: BudgetConfig) -> Self {
        Self {
            origin: String::new(),
            destination: String::new(),
            duration: String::new(),
            budget_min: bounds.default_min,
            budget_max: bounds.default_max,
            bounds,
        }
    }

    pub fn bounds(&self) -> &BudgetConfig {
        &self.bounds
    }

    /// Check one field in isolation
    pub fn validate_field(&self, field: Field) -> Option<String> {
        match field {
            Field::Origin => required(&self.origin, "Starting place is required"),
            Field::Destination => required(&self.destination, "Destination is required"),
            Field::Duration => self.parse_duration().err(),
            Field::Budget => self.parse_budget().err(),
        }
    }

    /// Validate every field, building the request only if all pass
    pub fn validate(&self) -> Result<TripRequest, FormErrors> {
        debug!(?self, "TripForm::validate: called");
        let errors: Vec<FieldError> = [Field::Origin, Field::Destination, Field::Duration, Field::Budget]
            .into_iter()
            .filter_map(|field| self.validate_field(field).map(|message| FieldError { field, message }))
            .collect();

        if !errors.is_empty() {
            debug!(error_count = errors.len(), "TripForm::validate: invalid");
            return Err(FormErrors { errors });
        }

        // Every field validated above
        let duration = self.parse_duration().map_err(|m| single(Field::Duration, m))?;
        let budget = self.parse_budget().map_err(|m| single(Field::Budget, m))?;

        Ok(TripRequest::new(
            self.origin.trim().to_string(),
            self.destination.trim().to_string(),
            duration,
            budget,
        ))
    }

    fn parse_duration(&self) -> Result<u32, String> {
        let raw = self.duration.trim();
        if raw.is_empty() {
            return Err("Duration is required".to_string());
        }
        if !DURATION_PATTERN.is_match(raw) {
            return Err("Duration must be a number".to_string());
        }
        let days: u32 = raw.parse().map_err(|_| "Duration is too long".to_string())?;
        if days == 0 {
            return Err("Duration must be at least 1 day".to_string());
        }
        Ok(days)
    }

    fn parse_budget(&self) -> Result<BudgetRange, String> {
        let bounds = &self.bounds;
        if self.budget_min < bounds.min || self.budget_max > bounds.max {
            return Err(format!("Budget must be between {} and {}", bounds.min, bounds.max));
        }
        BudgetRange::new(self.budget_min, self.budget_max)
            .ok_or_else(|| "Minimum budget cannot exceed maximum budget".to_string())
    }
}

fn required(value: &str, message: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(message.to_string())
    } else {
        None
    }
}

fn single(field: Field, message: String) -> FormErrors {
    FormErrors {
        errors: vec![FieldError { field, message }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> TripForm {
        let mut form = TripForm::new(BudgetConfig::default());
        form.origin = " Mumbai ".to_string();
        form.destination = "Goa".to_string();
        form.duration = "3".to_string();
        form
    }

    #[test]
    fn test_valid_form_builds_request() {
        let request = filled().validate().unwrap();

        assert_eq!(request.origin(), "Mumbai");
        assert_eq!(request.destination(), "Goa");
        assert_eq!(request.duration_days(), 3);
        assert_eq!(request.budget(), BudgetRange { min: 5_000, max: 20_000 });
    }

    #[test]
    fn test_empty_form_reports_every_required_field() {
        let form = TripForm::new(BudgetConfig::default());
        let errors = form.validate().unwrap_err();

        assert_eq!(errors.for_field(Field::Origin), Some("Starting place is required"));
        assert_eq!(errors.for_field(Field::Destination), Some("Destination is required"));
        assert_eq!(errors.for_field(Field::Duration), Some("Duration is required"));
        assert_eq!(errors.for_field(Field::Budget), None);
        assert_eq!(errors.errors.len(), 3);
    }

    #[test]
    fn test_non_numeric_duration() {
        for bad in ["three", "3.5", "-2", "3 days"] {
            let mut form = filled();
            form.duration = bad.to_string();
            let errors = form.validate().unwrap_err();
            assert_eq!(errors.for_field(Field::Duration), Some("Duration must be a number"), "{}", bad);
        }
    }

    #[test]
    fn test_zero_duration() {
        let mut form = filled();
        form.duration = "0".to_string();
        assert_eq!(
            form.validate_field(Field::Duration).as_deref(),
            Some("Duration must be at least 1 day")
        );
    }

    #[test]
    fn test_overflowing_duration() {
        let mut form = filled();
        form.duration = "99999999999".to_string();
        assert_eq!(form.validate_field(Field::Duration).as_deref(), Some("Duration is too long"));
    }

    #[test]
    fn test_budget_out_of_bounds() {
        let mut form = filled();
        form.budget_max = 500_000;
        assert_eq!(
            form.validate().unwrap_err().for_field(Field::Budget),
            Some("Budget must be between 1000 and 100000")
        );
    }

    #[test]
    fn test_budget_inverted() {
        let mut form = filled();
        form.budget_min = 30_000;
        form.budget_max = 10_000;
        assert_eq!(
            form.validate_field(Field::Budget).as_deref(),
            Some("Minimum budget cannot exceed maximum budget")
        );
    }

    #[test]
    fn test_form_errors_display() {
        let form = TripForm::new(BudgetConfig::default());
        let errors = form.validate().unwrap_err();
        let message = errors.to_string();
        assert!(message.starts_with("Starting Place: Starting place is required; Destination: "));
        assert_eq!(message.matches("; ").count(), errors.errors.len() - 1);
        assert_eq!(errors.errors[0].to_string(), "Starting Place: Starting place is required");

        let boxed: Box<dyn std::error::Error> = Box::new(errors);
        assert!(boxed.to_string().starts_with("Starting Place"));
    }
}
