//! Interactive trip form
//!
//! Prompts for each field in turn with inline validation, offers place
//! suggestions as the user types a place name, then submits through the
//! orchestrator and prints the rendered itinerary.

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use crate::form::{Field, TripForm};
use crate::geocode::{Autocomplete, AutocompleteOutcome, PlaceSuggestion};
use crate::orchestrator::{Orchestrator, SubmitError};
use crate::render::{self, DetailState, Screen, ScreenBody};

/// Interactive form session
pub struct FormSession {
    form: TripForm,
    orchestrator: Arc<Orchestrator>,
    autocomplete: Option<Autocomplete>,
}

impl FormSession {
    /// Create a session; without an autocomplete front end place fields are free text
    pub fn new(form: TripForm, orchestrator: Arc<Orchestrator>, autocomplete: Option<Autocomplete>) -> Self {
        debug!(autocomplete = autocomplete.is_some(), "FormSession::new: called");
        Self {
            form,
            orchestrator,
            autocomplete,
        }
    }

    /// Run the form loop until the user quits
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            if !self.fill_form(&mut rl).await? {
                break;
            }
            if !self.submit_until_done(&mut rl).await? {
                break;
            }
            match read_line(&mut rl, &format!("{} ", "Plan another trip? [y/N]".bright_green()))? {
                Some(answer) if answer.trim().eq_ignore_ascii_case("y") => continue,
                _ => break,
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        let bounds = self.form.bounds();
        println!();
        println!("{}", "Trip Planner".bright_cyan().bold());
        println!(
            "Budget range {} - {} {} (step {}). Press {} to quit.",
            bounds.min,
            bounds.max,
            bounds.currency,
            bounds.step,
            "Ctrl+D".yellow()
        );
        println!();
    }

    /// Prompt for every field; returns false if the user quit
    async fn fill_form(&mut self, rl: &mut DefaultEditor) -> Result<bool> {
        for field in [Field::Origin, Field::Destination, Field::Duration, Field::Budget] {
            loop {
                let answered = match field {
                    Field::Origin | Field::Destination => self.ask_place(rl, field).await?,
                    Field::Duration => self.ask_duration(rl)?,
                    Field::Budget => self.ask_budget(rl)?,
                };
                if !answered {
                    return Ok(false);
                }
                match self.form.validate_field(field) {
                    Some(message) => println!("  {} {}", "✗".red(), message.red()),
                    None => break,
                }
            }
        }
        Ok(true)
    }

    async fn ask_place(&mut self, rl: &mut DefaultEditor, field: Field) -> Result<bool> {
        let Some(text) = read_line(rl, &format!("{}: ", field.label().bright_green()))? else {
            return Ok(false);
        };
        let _ = rl.add_history_entry(text.as_str());

        let chosen = match &self.autocomplete {
            Some(autocomplete) => match autocomplete.on_input(&text).await {
                AutocompleteOutcome::Updated(suggestions) if !suggestions.is_empty() => {
                    match pick_suggestion(rl, &suggestions)? {
                        Some(pick) => pick,
                        None => return Ok(false),
                    }
                }
                AutocompleteOutcome::Failed(e) => {
                    println!("  {} {}", "!".yellow(), format!("Place lookup failed: {}", e).dimmed());
                    text
                }
                _ => text,
            },
            None => text,
        };

        match field {
            Field::Origin => self.form.origin = chosen,
            _ => self.form.destination = chosen,
        }
        Ok(true)
    }

    fn ask_duration(&mut self, rl: &mut DefaultEditor) -> Result<bool> {
        let Some(text) = read_line(rl, &format!("{}: ", Field::Duration.label().bright_green()))? else {
            return Ok(false);
        };
        self.form.duration = text;
        Ok(true)
    }

    fn ask_budget(&mut self, rl: &mut DefaultEditor) -> Result<bool> {
        let step = self.form.bounds().step;
        for is_min in [true, false] {
            let (label, current) = if is_min {
                ("Minimum budget", self.form.budget_min)
            } else {
                ("Maximum budget", self.form.budget_max)
            };
            loop {
                let Some(text) = read_line(rl, &format!("{} [{}]: ", label.bright_green(), current))? else {
                    return Ok(false);
                };
                match parse_amount(&text, current, step) {
                    Ok(amount) => {
                        if is_min {
                            self.form.budget_min = amount;
                        } else {
                            self.form.budget_max = amount;
                        }
                        break;
                    }
                    Err(message) => println!("  {} {}", "✗".red(), message.red()),
                }
            }
        }
        Ok(true)
    }

    /// Submit the form, offering a retry on failure; returns false if the user quit
    async fn submit_until_done(&mut self, rl: &mut DefaultEditor) -> Result<bool> {
        let request = match self.form.validate() {
            Ok(request) => request,
            Err(errors) => {
                // Fields were checked one by one, so this only trips on a stale form
                println!("{} {}", "✗".red(), errors.to_string().red());
                return Ok(true);
            }
        };

        loop {
            print_screen(&render::render(&DetailState::Loading));
            match self.orchestrator.submit(&request).await {
                Ok(handoff) => {
                    info!(request_id = %handoff.request_id, "FormSession: rendering itinerary");
                    println!();
                    print_screen(&render::render(&DetailState::resolve(&handoff.raw)));
                    return Ok(true);
                }
                Err(SubmitError::Busy(id)) => {
                    println!("{} Request {} is still running", "!".yellow(), id);
                    return Ok(true);
                }
                Err(e) => {
                    println!("{} {}", "✗".red(), e.to_string().red());
                    if let SubmitError::Llm(llm) = &e {
                        if let Some(wait) = llm.retry_after() {
                            println!("  {}", format!("Rate limited, wait {}s before retrying", wait.as_secs()).dimmed());
                        }
                        if llm.is_config_error() {
                            println!("  {}", "Check the API key in your configuration.".dimmed());
                            return Ok(true);
                        }
                    }
                    if !e.is_retryable() {
                        println!("  {}", "Please change the trip and try again later.".dimmed());
                        return Ok(true);
                    }
                    match read_line(rl, &format!("{} ", "Try again? [Y/n]".bright_green()))? {
                        Some(answer) if answer.trim().eq_ignore_ascii_case("n") => return Ok(true),
                        Some(_) => continue,
                        None => return Ok(false),
                    }
                }
            }
        }
    }
}

/// Read one line; `None` means the user asked to quit
fn read_line(rl: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
            println!();
            Ok(None)
        }
        Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
    }
}

fn pick_suggestion(rl: &mut DefaultEditor, suggestions: &[PlaceSuggestion]) -> Result<Option<String>> {
    for (i, s) in suggestions.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).cyan(), s.title);
    }
    let prompt = format!("{} ", format!("Pick 1-{} or type a place:", suggestions.len()).bright_green());
    let Some(answer) = read_line(rl, &prompt)? else {
        return Ok(None);
    };
    Ok(Some(resolve_pick(&answer, suggestions)))
}

/// A number selects a suggestion; anything else is taken as typed
fn resolve_pick(answer: &str, suggestions: &[PlaceSuggestion]) -> String {
    let answer = answer.trim();
    match answer.parse::<usize>() {
        Ok(n) if (1..=suggestions.len()).contains(&n) => suggestions[n - 1].title.clone(),
        _ if answer.is_empty() => suggestions[0].title.clone(),
        _ => answer.to_string(),
    }
}

/// Parse a budget amount, snapping to the slider step; empty keeps `current`
fn parse_amount(text: &str, current: u64, step: u64) -> Result<u64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(current);
    }
    let value: u64 = text
        .replace(',', "")
        .parse()
        .map_err(|_| "Budget must be a number".to_string())?;
    if step == 0 {
        return Ok(value);
    }
    Ok(value.saturating_add(step / 2) / step * step)
}

/// Print a rendered screen with colour
pub fn print_screen(screen: &Screen) {
    println!("{}", screen.title.bright_cyan().bold());
    match &screen.body {
        ScreenBody::Spinner => println!("{}", render::LOADING_MESSAGE.dimmed()),
        ScreenBody::Fallback { message } => println!("{}", message.yellow()),
        ScreenBody::Days { route, sections } => {
            println!("{}", route.dimmed());
            for section in sections {
                println!();
                println!("{} {}", format!("{}:", section.heading).bright_green().bold(), section.title.bold());
                if !section.description.is_empty() {
                    println!("  {}", section.description);
                }
                print_list("Places", &section.locations);
                print_list("Food", &section.food);
                if let Some(hotel) = &section.hotel {
                    println!("  {} {}", "Hotel:".cyan(), hotel);
                }
                if let Some(transport) = &section.transport {
                    println!("  {} {}", "Transport:".cyan(), transport);
                }
                print_list("Cautions", &section.cautions);
            }
        }
    }
}

fn print_list(label: &str, items: &[String]) {
    println!("  {}", format!("{}:", label).cyan());
    if items.is_empty() {
        println!("    {}", "(none)".dimmed());
    }
    for item in items {
        println!("    - {}", item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestions() -> Vec<PlaceSuggestion> {
        vec![
            PlaceSuggestion::new("Jaipur, Rajasthan, India"),
            PlaceSuggestion::new("Jaipur Road, Odisha, India"),
        ]
    }

    #[test]
    fn test_resolve_pick_by_number() {
        assert_eq!(resolve_pick("2", &suggestions()), "Jaipur Road, Odisha, India");
    }

    #[test]
    fn test_resolve_pick_empty_takes_first() {
        assert_eq!(resolve_pick("  ", &suggestions()), "Jaipur, Rajasthan, India");
    }

    #[test]
    fn test_resolve_pick_free_text() {
        assert_eq!(resolve_pick("Jodhpur", &suggestions()), "Jodhpur");
        assert_eq!(resolve_pick("7", &suggestions()), "7");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("", 5_000, 1_000), Ok(5_000));
        assert_eq!(parse_amount("12,000", 5_000, 1_000), Ok(12_000));
        assert_eq!(parse_amount("12400", 5_000, 1_000), Ok(12_000));
        assert_eq!(parse_amount("12500", 5_000, 1_000), Ok(13_000));
        assert_eq!(parse_amount("777", 5_000, 0), Ok(777));
        assert_eq!(parse_amount("lots", 5_000, 1_000), Err("Budget must be a number".to_string()));
    }
}
