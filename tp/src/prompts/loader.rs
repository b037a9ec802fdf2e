//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::PathBuf;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::TripRequest;

/// Context for rendering the itinerary prompt
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub origin: String,
    pub destination: String,
    pub duration_days: u32,
    pub budget_min: u64,
    pub budget_max: u64,
    pub currency: String,
}

impl PromptContext {
    pub fn from_request(request: &TripRequest, currency: &str) -> Self {
        debug!(%currency, "PromptContext::from_request: called");
        let budget = request.budget();
        Self {
            origin: request.origin().to_string(),
            destination: request.destination().to_string(),
            duration_days: request.duration_days(),
            budget_min: budget.min,
            budget_max: budget.max,
            currency: currency.to_string(),
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory (e.g., `.tripplan/prompts/`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers `{dir}/{name}.pmt` over the embedded template
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let exists = dir.is_dir();
        debug!(?dir, %exists, "PromptLoader::new: called");
        Self {
            hbs: Self::engine(),
            override_dir: if exists { Some(dir) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; HTML escaping would mangle "&" in place names
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.set_strict_mode(true);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `{dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!(
            "Rendering template '{}' for {} -> {} ({} days)",
            template_name, context.origin, context.destination, context.duration_days
        );

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the itinerary prompt for a trip
    pub fn itinerary_prompt(&self, request: &TripRequest, currency: &str) -> Result<String> {
        self.render("itinerary", &PromptContext::from_request(request, currency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BudgetRange;

    fn request() -> TripRequest {
        TripRequest::new(
            "Mumbai".to_string(),
            "Goa & Gokarna".to_string(),
            4,
            BudgetRange::new(5_000, 20_000).unwrap(),
        )
    }

    #[test]
    fn test_itinerary_prompt_interpolates_fields() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.itinerary_prompt(&request(), "INR").unwrap();

        assert!(prompt.contains("Starting Place: Mumbai"));
        assert!(prompt.contains("Destination: Goa & Gokarna"));
        assert!(prompt.contains("Duration: 4 days"));
        assert!(prompt.contains("Budget: 5000 - 20000 INR"));
        assert!(prompt.contains("\"Day 1\" through \"Day 4\""));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_override_directory_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("itinerary.pmt"), "Trip to {{destination}} in {{currency}}").unwrap();

        let loader = PromptLoader::new(dir.path());
        let prompt = loader.itinerary_prompt(&request(), "USD").unwrap();
        assert_eq!(prompt, "Trip to Goa & Gokarna in USD");
    }

    #[test]
    fn test_missing_override_directory_falls_back() {
        let loader = PromptLoader::new("/nonexistent/prompts");
        assert!(loader.itinerary_prompt(&request(), "INR").is_ok());
    }

    #[test]
    fn test_strict_mode_rejects_unknown_variable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("itinerary.pmt"), "{{hotel_budget}}").unwrap();

        let loader = PromptLoader::new(dir.path());
        assert!(loader.itinerary_prompt(&request(), "INR").is_err());
    }

    #[test]
    fn test_prompt_loader_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}
