//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files.
//!
//! Template loading chain:
//! 1. `.tripplan/prompts/{name}.pmt` (user override, directory configurable)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader};
