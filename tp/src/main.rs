//! Tripplan - day-by-day travel itineraries
//!
//! CLI entry point for planning trips, rendering saved replies and place lookup.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use tripplan::cli::{Cli, Command, OutputFormat, TripArgs, generate_after_help, get_log_path};
use tripplan::config::Config;
use tripplan::domain::{RawModelResponse, TripRequest};
use tripplan::form::TripForm;
use tripplan::geocode::{Autocomplete, AutocompleteOutcome, Geocoder, OpenCageClient};
use tripplan::interactive::{FormSession, print_screen};
use tripplan::llm::create_client;
use tripplan::orchestrator::Orchestrator;
use tripplan::prompts::PromptLoader;
use tripplan::render::{self, DetailState};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Build command with dynamic after_help that shows credential status
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("Tripplan loaded config: model={}", config.llm.model);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Plan { trip, format, save_raw }) => {
            debug!(?trip, %format, ?save_raw, "main: matched Plan command");
            cmd_plan(&config, &trip, format, save_raw.as_deref()).await
        }
        Some(Command::Prompt { trip }) => {
            debug!(?trip, "main: matched Prompt command");
            cmd_prompt(&config, &trip)
        }
        Some(Command::Suggest { query }) => {
            debug!(%query, "main: matched Suggest command");
            cmd_suggest(&config, &query).await
        }
        Some(Command::Render { file, format }) => {
            debug!(?file, %format, "main: matched Render command");
            cmd_render(file.as_deref(), format)
        }
        Some(Command::Logs { lines }) => {
            debug!(lines, "main: matched Logs command");
            cmd_logs(lines)
        }
        Some(Command::Form) | None => {
            debug!("main: launching interactive form");
            cmd_form(&config).await
        }
    }
}

/// Validate trip arguments the same way the interactive form does
fn trip_request(config: &Config, trip: &TripArgs) -> Result<TripRequest> {
    debug!(?trip, "trip_request: called");
    let mut form = TripForm::new(config.budget.clone());
    form.origin = trip.origin.clone();
    form.destination = trip.destination.clone();
    form.duration = trip.days.clone();
    if let Some(min) = trip.budget_min {
        form.budget_min = min;
    }
    if let Some(max) = trip.budget_max {
        form.budget_max = max;
    }
    form.validate().map_err(|errors| eyre!("Invalid trip: {}", errors))
}

/// Generate an itinerary and print it
async fn cmd_plan(config: &Config, trip: &TripArgs, format: OutputFormat, save_raw: Option<&Path>) -> Result<()> {
    debug!(%format, ?save_raw, "cmd_plan: called");
    let request = trip_request(config, trip)?;

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let orchestrator = Orchestrator::from_config(llm, config);

    if format == OutputFormat::Text {
        print_screen(&render::render(&DetailState::Loading));
        println!();
    }

    let handoff = orchestrator
        .submit(&request)
        .await
        .context("Failed to generate itinerary")?;
    info!(request_id = %handoff.request_id, "cmd_plan: itinerary received");

    if let Some(path) = save_raw {
        fs::write(path, handoff.raw.as_str())
            .with_context(|| format!("Failed to write raw response to {}", path.display()))?;
        info!(?path, "cmd_plan: raw response saved");
    }

    print_detail(&DetailState::resolve(&handoff.raw), format)
}

/// Print the rendered prompt without calling the model
fn cmd_prompt(config: &Config, trip: &TripArgs) -> Result<()> {
    debug!("cmd_prompt: called");
    let request = trip_request(config, trip)?;
    let prompt = PromptLoader::new(&config.prompts.dir).itinerary_prompt(&request, &config.budget.currency)?;
    println!("{}", prompt);
    Ok(())
}

/// Print place suggestions for a query
async fn cmd_suggest(config: &Config, query: &str) -> Result<()> {
    debug!(%query, "cmd_suggest: called");
    let geocoder: Arc<dyn Geocoder> =
        Arc::new(OpenCageClient::from_config(&config.geocode).context("Failed to create geocoding client")?);
    let autocomplete = Autocomplete::from_config(geocoder, &config.geocode);

    match autocomplete.on_input(query).await {
        AutocompleteOutcome::TooShort => {
            println!(
                "Type at least {} characters to search for places.",
                config.geocode.min_query_chars
            );
            Ok(())
        }
        AutocompleteOutcome::Updated(suggestions) => {
            if suggestions.is_empty() {
                println!("No places found for '{}'", query);
            }
            for (i, s) in suggestions.iter().enumerate() {
                match (s.latitude, s.longitude) {
                    (Some(lat), Some(lng)) => println!(
                        "{} {} {}",
                        format!("{}.", i + 1).cyan(),
                        s.title,
                        format!("({:.4}, {:.4})", lat, lng).dimmed()
                    ),
                    _ => println!("{} {}", format!("{}.", i + 1).cyan(), s.title),
                }
            }
            Ok(())
        }
        AutocompleteOutcome::Stale { seq } => Err(eyre!("Lookup {} was superseded", seq)),
        AutocompleteOutcome::Failed(e) => Err(eyre!("Place lookup failed: {}", e)),
    }
}

/// Sanitize and render a saved reply
fn cmd_render(file: Option<&Path>, format: OutputFormat) -> Result<()> {
    debug!(?file, %format, "cmd_render: called");
    let text = match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    print_detail(&DetailState::resolve(&RawModelResponse::new(text)), format)
}

fn print_detail(state: &DetailState, format: OutputFormat) -> Result<()> {
    match (format, state) {
        (OutputFormat::Json, DetailState::Ready(itinerary)) => {
            println!("{}", serde_json::to_string_pretty(itinerary)?);
            Ok(())
        }
        (OutputFormat::Json, _) => Err(eyre!(render::FALLBACK_MESSAGE)),
        (OutputFormat::Text, state) => {
            if *state == DetailState::Unavailable {
                warn!("print_detail: reply could not be read as an itinerary");
            }
            print_screen(&render::render(state));
            Ok(())
        }
    }
}

/// Run the interactive form
async fn cmd_form(config: &Config) -> Result<()> {
    debug!("cmd_form: called");
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let orchestrator = Arc::new(Orchestrator::from_config(llm, config));

    let autocomplete = match OpenCageClient::from_config(&config.geocode) {
        Ok(client) => {
            let geocoder: Arc<dyn Geocoder> = Arc::new(client);
            Some(Autocomplete::from_config(geocoder, &config.geocode))
        }
        Err(e) => {
            warn!(error = %e, "cmd_form: place suggestions disabled");
            println!("{} Place suggestions disabled: {}", "!".yellow(), e);
            None
        }
    };

    let mut session = FormSession::new(TripForm::new(config.budget.clone()), orchestrator, autocomplete);
    session.run().await
}

/// Show logs
fn cmd_logs(lines: usize) -> Result<()> {
    debug!(lines, "cmd_logs: called");
    let log_path: PathBuf = get_log_path();

    if !log_path.exists() {
        debug!(?log_path, "cmd_logs: log file does not exist");
        println!("No log file found at: {}", log_path.display());
        return Ok(());
    }

    let file = fs::File::open(&log_path).context("Failed to open log file")?;
    let reader = BufReader::new(file);
    let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

    let start = all_lines.len().saturating_sub(lines);
    for line in &all_lines[start..] {
        println!("{}", line);
    }

    Ok(())
}
