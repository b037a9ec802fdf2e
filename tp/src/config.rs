//! Tripplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main Tripplan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generative language model configuration
    pub llm: LlmConfig,

    /// Geocoding (place autocomplete) configuration
    pub geocode: GeocodeConfig,

    /// Budget slider bounds and defaults
    pub budget: BudgetConfig,

    /// Prompt template configuration
    pub prompts: PromptsConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .tripplan.yml
        let local_config = PathBuf::from(".tripplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/tripplan/tripplan.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".tripplan.yml")];
                paths.extend(user_config_path());
                paths
            }
        };

        candidates
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tripplan").join("tripplan.yml"))
}

/// Resolve a credential from a key file or environment variable
///
/// The file wins when both are configured. Credentials are never embedded in
/// the binary.
fn resolve_api_key(api_key_env: &str, api_key_file: Option<&PathBuf>) -> Result<String> {
    debug!(%api_key_env, ?api_key_file, "resolve_api_key: called");
    if let Some(path) = api_key_file {
        let path = expand_home(path);
        let key = fs::read_to_string(&path).context(format!("Failed to read API key file {}", path.display()))?;
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(eyre::eyre!("API key file {} is empty", path.display()));
        }
        return Ok(key);
    }

    match std::env::var(api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(eyre::eyre!("API key not found. Set the {} environment variable.", api_key_env)),
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Generative language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Optional file containing the API key (takes precedence over the env var)
    #[serde(rename = "api-key-file")]
    pub api_key_file: Option<PathBuf>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling threshold
    #[serde(rename = "top-p")]
    pub top_p: f32,

    /// Top-k sampling cutoff
    #[serde(rename = "top-k")]
    pub top_k: u32,

    /// Maximum tokens in the generated reply
    #[serde(rename = "max-output-tokens")]
    pub max_output_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key_file: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_ms: 120_000,
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 12_000,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from file or environment
    pub fn get_api_key(&self) -> Result<String> {
        resolve_api_key(&self.api_key_env, self.api_key_file.as_ref())
    }
}

/// Geocoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Optional file containing the API key (takes precedence over the env var)
    #[serde(rename = "api-key-file")]
    pub api_key_file: Option<PathBuf>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Queries shorter than this are never sent
    #[serde(rename = "min-query-chars")]
    pub min_query_chars: usize,

    /// Maximum number of suggestions per query
    pub limit: u32,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENCAGE_API_KEY".to_string(),
            api_key_file: None,
            base_url: "https://api.opencagedata.com".to_string(),
            timeout_ms: 10_000,
            min_query_chars: 3,
            limit: 5,
        }
    }
}

impl GeocodeConfig {
    /// Resolve the API key from file or environment
    pub fn get_api_key(&self) -> Result<String> {
        resolve_api_key(&self.api_key_env, self.api_key_file.as_ref())
    }
}

/// Budget slider bounds and defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Lowest selectable amount
    pub min: u64,

    /// Highest selectable amount
    pub max: u64,

    /// Slider step
    pub step: u64,

    /// Initially selected lower bound
    #[serde(rename = "default-min")]
    pub default_min: u64,

    /// Initially selected upper bound
    #[serde(rename = "default-max")]
    pub default_max: u64,

    /// Currency code interpolated into the prompt
    pub currency: String,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            min: 1_000,
            max: 100_000,
            step: 1_000,
            default_min: 5_000,
            default_max: 20_000,
            currency: "INR".to_string(),
        }
    }
}

/// Prompt template configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory searched for `{name}.pmt` overrides
    pub dir: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".tripplan/prompts"),
        }
    }
}
