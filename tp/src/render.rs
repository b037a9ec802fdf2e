//! Itinerary detail view
//!
//! Maps a [`DetailState`] to a [`Screen`], a plain description of what to
//! show. Rendering never touches itinerary fields until the state is
//! `Ready`, and never fails: an unreadable reply becomes a fallback screen.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::domain::{DayEntry, Itinerary, Place, RawModelResponse};
use crate::sanitize;

pub const SCREEN_TITLE: &str = "Itinerary";
pub const LOADING_MESSAGE: &str = "Generating your itinerary...";
pub const FALLBACK_MESSAGE: &str = "Sorry, the itinerary could not be read. Please go back and try again.";

/// What the detail view currently knows
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// Request in flight or reply not yet parsed
    Loading,
    /// Reply could not be sanitized or validated
    Unavailable,
    Ready(Itinerary),
}

impl DetailState {
    /// Sanitize and validate a raw reply
    pub fn resolve(raw: &RawModelResponse) -> Self {
        debug!(len = raw.as_str().len(), "DetailState::resolve: called");
        match sanitize::parse_itinerary(raw) {
            Some(itinerary) => Self::Ready(itinerary),
            None => Self::Unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Screen {
    pub title: String,
    pub body: ScreenBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScreenBody {
    Spinner,
    Fallback { message: String },
    Days { route: String, sections: Vec<DaySection> },
}

/// One rendered day. Empty lists are kept so the section still shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySection {
    pub heading: String,
    pub title: String,
    pub description: String,
    pub locations: Vec<String>,
    pub food: Vec<String>,
    pub hotel: Option<String>,
    pub transport: Option<String>,
    pub cautions: Vec<String>,
}

pub fn render(state: &DetailState) -> Screen {
    let body = match state {
        DetailState::Loading => {
            debug!("render: loading");
            ScreenBody::Spinner
        }
        DetailState::Unavailable => {
            debug!("render: fallback");
            ScreenBody::Fallback {
                message: FALLBACK_MESSAGE.to_string(),
            }
        }
        DetailState::Ready(itinerary) => {
            debug!(day_count = itinerary.day_count(), "render: days");
            ScreenBody::Days {
                route: route(itinerary),
                sections: itinerary.days.iter().map(day_section).collect(),
            }
        }
    };

    Screen {
        title: SCREEN_TITLE.to_string(),
        body,
    }
}

fn route(itinerary: &Itinerary) -> String {
    format!(
        "{} -> {}",
        place(&itinerary.coordinates.starting_place),
        place(&itinerary.coordinates.destination)
    )
}

fn place(p: &Place) -> String {
    let coords = format!("{:.4}, {:.4}", p.latitude, p.longitude);
    if p.name.trim().is_empty() {
        format!("({})", coords)
    } else {
        format!("{} ({})", p.name, coords)
    }
}

fn day_section(entry: &DayEntry) -> DaySection {
    let plan = &entry.plan;
    DaySection {
        heading: entry.key.clone(),
        title: plan.title.clone(),
        description: plan.description.clone(),
        locations: plan
            .locations
            .iter()
            .map(|l| {
                let head = format!("{} ({:.4}, {:.4})", l.name, l.latitude, l.longitude);
                with_description(head, &l.description)
            })
            .collect(),
        food: plan
            .food
            .iter()
            .map(|f| with_description(f.name.clone(), &f.description))
            .filter(|line| !line.is_empty())
            .collect(),
        hotel: plan
            .hotel
            .as_ref()
            .map(|h| {
                let price = bracketed("[", &h.price, "]");
                with_description(join_nonblank(&[h.name.as_str(), price.as_str()]), &h.description)
            })
            .filter(|line| !line.is_empty()),
        transport: plan
            .transport
            .as_ref()
            .map(|t| join_nonblank(&[t.mode.as_str(), bracketed("(", &t.duration, ")").as_str()]))
            .filter(|line| !line.is_empty()),
        cautions: plan.cautions.clone(),
    }
}

fn with_description(head: String, description: &str) -> String {
    if description.trim().is_empty() {
        head
    } else if head.trim().is_empty() {
        description.to_string()
    } else {
        format!("{}: {}", head, description)
    }
}

fn bracketed(open: &str, text: &str, close: &str) -> String {
    if text.trim().is_empty() {
        String::new()
    } else {
        format!("{}{}{}", open, text, close)
    }
}

fn join_nonblank(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        match &self.body {
            ScreenBody::Spinner => writeln!(f, "{}", LOADING_MESSAGE),
            ScreenBody::Fallback { message } => writeln!(f, "{}", message),
            ScreenBody::Days { route, sections } => {
                writeln!(f, "{}", route)?;
                for section in sections {
                    writeln!(f)?;
                    write!(f, "{}", section)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for DaySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.heading, self.title)?;
        if !self.description.is_empty() {
            writeln!(f, "  {}", self.description)?;
        }
        write_list(f, "Places", &self.locations)?;
        write_list(f, "Food", &self.food)?;
        if let Some(hotel) = &self.hotel {
            writeln!(f, "  Hotel: {}", hotel)?;
        }
        if let Some(transport) = &self.transport {
            writeln!(f, "  Transport: {}", transport)?;
        }
        write_list(f, "Cautions", &self.cautions)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, label: &str, items: &[String]) -> fmt::Result {
    writeln!(f, "  {}:", label)?;
    if items.is_empty() {
        return writeln!(f, "    (none)");
    }
    for item in items {
        writeln!(f, "    - {}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_DAYS: &str = r#"```json
{
  "itinerary": {
    "Day 1": {
      "title": "Arrival in Goa",
      "description": "Settle in and head to the beach",
      "locations": [
        { "name": "Baga Beach", "description": "Sunset walk", "latitude": "15.5553", "longitude": "73.7517" }
      ],
      "food": [{ "name": "Fish thali", "description": "Lunch" }],
      "hotel": { "name": "Sea Breeze", "description": "Beachfront", "price": "2500/night" },
      "transport": { "mode": "Flight", "duration": "1h 15m" },
      "cautions": ["Strong currents after 6pm"]
    },
    "Day 2": {
      "title": "Old Goa"
    }
  },
  "coordinates": {
    "startingPlace": { "name": "Mumbai", "latitude": 19.076, "longitude": 72.8777 },
    "destination": { "name": "Goa", "latitude": 15.2993, "longitude": 74.124 }
  }
}
```"#;

    #[test]
    fn test_loading_shows_spinner() {
        let screen = render(&DetailState::Loading);
        assert_eq!(screen.body, ScreenBody::Spinner);
        assert!(screen.to_string().contains(LOADING_MESSAGE));
    }

    #[test]
    fn test_unreadable_reply_shows_fallback() {
        let state = DetailState::resolve(&RawModelResponse::new("I'm sorry, I can't help with that."));
        assert_eq!(state, DetailState::Unavailable);

        let screen = render(&state);
        assert!(matches!(screen.body, ScreenBody::Fallback { .. }));
        assert!(!screen.to_string().contains(LOADING_MESSAGE));
        assert!(screen.to_string().contains(FALLBACK_MESSAGE));
    }

    #[test]
    fn test_two_days_render_in_order() {
        let state = DetailState::resolve(&RawModelResponse::new(TWO_DAYS));
        let screen = render(&state);

        let ScreenBody::Days { route, sections } = &screen.body else {
            panic!("expected days, got {:?}", screen.body);
        };
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "Day 1");
        assert_eq!(sections[1].heading, "Day 2");
        assert_eq!(route, "Mumbai (19.0760, 72.8777) -> Goa (15.2993, 74.1240)");

        let text = screen.to_string();
        let first = text.find("Day 1: Arrival in Goa").unwrap();
        let second = text.find("Day 2: Old Goa").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_day_section_content() {
        let DetailState::Ready(itinerary) = DetailState::resolve(&RawModelResponse::new(TWO_DAYS)) else {
            panic!("expected itinerary");
        };
        let section = day_section(&itinerary.days[0]);

        assert_eq!(section.locations, vec!["Baga Beach (15.5553, 73.7517): Sunset walk".to_string()]);
        assert_eq!(section.food, vec!["Fish thali: Lunch".to_string()]);
        assert_eq!(section.hotel.as_deref(), Some("Sea Breeze [2500/night]: Beachfront"));
        assert_eq!(section.transport.as_deref(), Some("Flight (1h 15m)"));
        assert_eq!(section.cautions, vec!["Strong currents after 6pm".to_string()]);
    }

    #[test]
    fn test_missing_sections_render_empty() {
        let DetailState::Ready(itinerary) = DetailState::resolve(&RawModelResponse::new(TWO_DAYS)) else {
            panic!("expected itinerary");
        };
        let section = day_section(&itinerary.days[1]);

        assert!(section.cautions.is_empty());
        assert!(section.hotel.is_none());

        let text = section.to_string();
        assert!(text.contains("  Cautions:\n    (none)\n"));
        assert!(!text.contains("Hotel:"));
    }

    #[test]
    fn test_nameless_records_render_without_blank_heads() {
        let reply = r#"{
          "itinerary": {
            "Day 1": {
              "title": "x",
              "hotel": { "description": "d", "price": "1" },
              "transport": { "duration": "3h" },
              "food": [{ "description": "Chaat" }, {}]
            }
          },
          "coordinates": {
            "startingPlace": { "latitude": 28.6, "longitude": 77.2 },
            "destination": { "latitude": 26.9, "longitude": 75.8 }
          }
        }"#;
        let DetailState::Ready(itinerary) = DetailState::resolve(&RawModelResponse::new(reply)) else {
            panic!("expected itinerary");
        };
        let section = day_section(&itinerary.days[0]);

        assert_eq!(section.hotel.as_deref(), Some("[1]: d"));
        assert_eq!(section.transport.as_deref(), Some("(3h)"));
        assert_eq!(section.food, vec!["Chaat".to_string()]);
    }
}
