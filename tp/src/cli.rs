//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::{GeocodeConfig, LlmConfig};

/// tripplan - day-by-day travel itineraries from a language model
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Generate day-by-day travel itineraries",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate an itinerary and print it
    Plan {
        #[command(flatten)]
        trip: TripArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Also write the model's raw reply to this file
        #[arg(long, value_name = "PATH")]
        save_raw: Option<PathBuf>,
    },

    /// Print the prompt that would be sent, without calling the model
    Prompt {
        #[command(flatten)]
        trip: TripArgs,
    },

    /// Look up place suggestions
    Suggest {
        /// Free-text place query
        query: String,
    },

    /// Sanitize and render a saved model reply (reads stdin if no file)
    Render {
        /// File containing the raw reply
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Fill in the trip form interactively
    Form,

    /// Show logs
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}

/// Trip parameters shared by `plan` and `prompt`
#[derive(Debug, Clone, Args)]
pub struct TripArgs {
    /// Starting place
    pub origin: String,

    /// Destination
    pub destination: String,

    /// Trip length in days
    #[arg(short, long)]
    pub days: String,

    /// Lowest budget (defaults to the configured slider default)
    #[arg(long)]
    pub budget_min: Option<u64>,

    /// Highest budget (defaults to the configured slider default)
    #[arg(long)]
    pub budget_max: Option<u64>,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplan")
        .join("logs")
        .join("tripplan.log");
    debug!(?path, "get_log_path: returning path");
    path
}

fn env_is_set(name: &str) -> bool {
    std::env::var(name).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Generate the after_help text with credential checks and the log path
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let credentials = [
        ("model", LlmConfig::default().api_key_env),
        ("geocoding", GeocodeConfig::default().api_key_env),
    ];

    let mut help = String::new();
    help.push_str("Credentials (default environment variables):\n");
    for (service, var) in &credentials {
        let icon = if env_is_set(var) {
            debug!(%var, "generate_after_help: credential set");
            "\u{2705}"
        } else {
            debug!(%var, "generate_after_help: credential missing");
            "\u{274C}"
        };
        help.push_str(&format!("  {} {:<10} {}\n", icon, service, var));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));

    debug!("generate_after_help: returning help text");
    help
}

/// Output format for rendered itineraries
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
