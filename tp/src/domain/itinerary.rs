//! Itinerary domain type
//!
//! The model is asked for a day-keyed document:
//!
//! ```json
//! {
//!   "itinerary": { "Day 1": { "title": "...", "locations": [...], ... } },
//!   "coordinates": { "startingPlace": {...}, "destination": {...} }
//! }
//! ```
//!
//! Parsing is two-step: decode each piece with serde, then check the value
//! ranges serde cannot express. An `Itinerary` only exists if both pass.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// A model reply that does not match the itinerary shape
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid itinerary at {path}: {reason}")]
pub struct ShapeError {
    /// Dotted path of the offending field (e.g. `itinerary.Day 1.locations`)
    pub path: String,
    pub reason: String,
}

impl ShapeError {
    fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A validated, day-by-day travel plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    /// Day entries in document order
    pub days: Vec<DayEntry>,
    pub coordinates: Coordinates,
}

/// One day of the plan together with the key the model gave it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayEntry {
    pub key: String,
    #[serde(flatten)]
    pub plan: DayPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<Location>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub food: Vec<Food>,
    #[serde(default, deserialize_with = "optional_section")]
    pub hotel: Option<Hotel>,
    #[serde(default, deserialize_with = "optional_section")]
    pub transport: Option<Transport>,
    #[serde(default, deserialize_with = "string_list")]
    pub cautions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Free-form estimate, e.g. "₹2500/night"
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
}

/// Start and end points of the trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub starting_place: Place,
    pub destination: Place,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub longitude: f64,
}

impl Itinerary {
    /// Validate a decoded JSON document into an Itinerary
    pub fn from_value(value: &Value) -> Result<Self, ShapeError> {
        debug!("Itinerary::from_value: called");
        let root = value
            .as_object()
            .ok_or_else(|| ShapeError::new("$", "expected an object"))?;

        let days_obj = root
            .get("itinerary")
            .ok_or_else(|| ShapeError::new("itinerary", "missing"))?
            .as_object()
            .ok_or_else(|| ShapeError::new("itinerary", "expected an object keyed by day"))?;

        if days_obj.is_empty() {
            return Err(ShapeError::new("itinerary", "no days"));
        }

        let mut days = Vec::with_capacity(days_obj.len());
        for (key, day_value) in days_obj {
            let path = format!("itinerary.{}", key);
            let plan: DayPlan =
                serde_json::from_value(day_value.clone()).map_err(|e| ShapeError::new(&path, e.to_string()))?;
            plan.check(&path)?;
            days.push(DayEntry { key: key.clone(), plan });
        }

        let coords_value = root
            .get("coordinates")
            .ok_or_else(|| ShapeError::new("coordinates", "missing"))?;
        let coordinates: Coordinates = serde_json::from_value(coords_value.clone())
            .map_err(|e| ShapeError::new("coordinates", e.to_string()))?;
        coordinates.starting_place.check("coordinates.startingPlace")?;
        coordinates.destination.check("coordinates.destination")?;

        debug!(day_count = days.len(), "Itinerary::from_value: valid");
        Ok(Self { days, coordinates })
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }
}

impl DayPlan {
    fn check(&self, path: &str) -> Result<(), ShapeError> {
        if self.title.trim().is_empty() {
            return Err(ShapeError::new(format!("{}.title", path), "empty"));
        }
        for (i, loc) in self.locations.iter().enumerate() {
            check_lat_lng(&format!("{}.locations[{}]", path, i), loc.latitude, loc.longitude)?;
        }
        Ok(())
    }
}

impl Place {
    fn check(&self, path: &str) -> Result<(), ShapeError> {
        check_lat_lng(path, self.latitude, self.longitude)
    }
}

fn check_lat_lng(path: &str, latitude: f64, longitude: f64) -> Result<(), ShapeError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ShapeError::new(
            format!("{}.latitude", path),
            format!("{} out of range", latitude),
        ));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ShapeError::new(
            format!("{}.longitude", path),
            format!("{} out of range", longitude),
        ));
    }
    Ok(())
}

// Lenient field decoders. Models are inconsistent about quoting numbers and
// about null vs missing, so accept the obvious variants and reject the rest.

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrString {
    List(Vec<String>),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, found {:?}", s)))?,
    };
    if !n.is_finite() {
        return Err(de::Error::custom("expected a finite number"));
    }
    Ok(n)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::Text(s)) => s,
        Some(StringOrNumber::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ListOrString>::deserialize(deserializer)? {
        Some(ListOrString::List(items)) => items,
        Some(ListOrString::Text(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

/// Decode an optional record; a malformed one is dropped instead of failing the day
fn optional_section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: de::DeserializeOwned,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(section) => Ok(Some(section)),
        Err(e) => {
            warn!(error = %e, "optional_section: dropping malformed section");
            Ok(None)
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coordinates() -> Value {
        json!({
            "startingPlace": { "name": "Mumbai", "latitude": 19.076, "longitude": 72.8777 },
            "destination": { "name": "Goa", "latitude": "15.2993", "longitude": "74.1240" }
        })
    }

    fn day(title: &str) -> Value {
        json!({
            "title": title,
            "description": "Beaches",
            "locations": [
                { "name": "Baga Beach", "description": "Nightlife", "latitude": 15.5553, "longitude": 73.7517 }
            ],
            "food": [{ "name": "Fish curry", "description": "Local staple" }],
            "hotel": { "name": "Sea View", "description": "Near the beach", "price": 3500 },
            "transport": { "mode": "Train", "duration": "12 hours" },
            "cautions": ["Carry sunscreen"]
        })
    }

    #[test]
    fn test_valid_itinerary_keeps_day_order() {
        let doc = json!({
            "itinerary": { "day2": day("Second"), "day1": day("First"), "day3": day("Third") },
            "coordinates": coordinates()
        });

        let itinerary = Itinerary::from_value(&doc).unwrap();
        let keys: Vec<&str> = itinerary.days.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["day2", "day1", "day3"]);
        assert_eq!(itinerary.day_count(), 3);
    }

    #[test]
    fn test_lenient_numbers_and_price() {
        let doc = json!({ "itinerary": { "day1": day("First") }, "coordinates": coordinates() });

        let itinerary = Itinerary::from_value(&doc).unwrap();
        assert!((itinerary.coordinates.destination.latitude - 15.2993).abs() < 1e-9);
        assert_eq!(itinerary.days[0].plan.hotel.as_ref().unwrap().price, "3500");
    }

    #[test]
    fn test_missing_optional_sections_are_empty() {
        let doc = json!({
            "itinerary": { "day1": { "title": "Arrival", "cautions": null, "food": null } },
            "coordinates": coordinates()
        });

        let itinerary = Itinerary::from_value(&doc).unwrap();
        let plan = &itinerary.days[0].plan;
        assert!(plan.cautions.is_empty());
        assert!(plan.food.is_empty());
        assert!(plan.locations.is_empty());
        assert!(plan.hotel.is_none());
        assert!(plan.transport.is_none());
        assert_eq!(plan.description, "");
    }

    #[test]
    fn test_hotel_without_name_keeps_the_day() {
        let doc = json!({
            "itinerary": {
                "Day 1": { "title": "x", "hotel": { "description": "d", "price": "1" } },
                "Day 2": day("Second")
            },
            "coordinates": coordinates()
        });

        let itinerary = Itinerary::from_value(&doc).unwrap();
        assert_eq!(itinerary.day_count(), 2);
        let hotel = itinerary.days[0].plan.hotel.as_ref().unwrap();
        assert_eq!(hotel.name, "");
        assert_eq!(hotel.price, "1");
        assert_eq!(itinerary.days[1].plan.hotel.as_ref().unwrap().name, "Sea View");
    }

    #[test]
    fn test_nameless_transport_and_food_are_kept() {
        let doc = json!({
            "itinerary": {
                "day1": {
                    "title": "Arrival",
                    "transport": { "duration": "2 hours" },
                    "food": [{ "description": "Street snacks" }, { "name": null }]
                }
            },
            "coordinates": coordinates()
        });

        let itinerary = Itinerary::from_value(&doc).unwrap();
        let plan = &itinerary.days[0].plan;
        assert_eq!(plan.transport.as_ref().unwrap().mode, "");
        assert_eq!(plan.transport.as_ref().unwrap().duration, "2 hours");
        assert_eq!(plan.food.len(), 2);
        assert_eq!(plan.food[0].description, "Street snacks");
    }

    #[test]
    fn test_malformed_hotel_and_transport_are_dropped() {
        let doc = json!({
            "itinerary": {
                "day1": { "title": "Arrival", "hotel": "Somewhere cheap", "transport": ["bus", "train"] },
                "day2": day("Second")
            },
            "coordinates": coordinates()
        });

        let itinerary = Itinerary::from_value(&doc).unwrap();
        assert!(itinerary.days[0].plan.hotel.is_none());
        assert!(itinerary.days[0].plan.transport.is_none());
        assert!(itinerary.days[1].plan.transport.is_some());
    }

    #[test]
    fn test_single_string_caution_becomes_list() {
        let doc = json!({
            "itinerary": { "day1": { "title": "Arrival", "cautions": "Monsoon season" } },
            "coordinates": coordinates()
        });

        let itinerary = Itinerary::from_value(&doc).unwrap();
        assert_eq!(itinerary.days[0].plan.cautions, vec!["Monsoon season".to_string()]);
    }

    #[test]
    fn test_rejects_non_object_root() {
        let err = Itinerary::from_value(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.path, "$");
    }

    #[test]
    fn test_rejects_missing_itinerary() {
        let err = Itinerary::from_value(&json!({ "coordinates": coordinates() })).unwrap_err();
        assert_eq!(err.path, "itinerary");
    }

    #[test]
    fn test_rejects_empty_itinerary() {
        let err = Itinerary::from_value(&json!({ "itinerary": {}, "coordinates": coordinates() })).unwrap_err();
        assert_eq!(err.reason, "no days");
    }

    #[test]
    fn test_rejects_nested_days_array_shape() {
        let doc = json!({
            "itinerary": { "days": [ { "day": 1, "places": [] } ] },
            "coordinates": coordinates()
        });

        let err = Itinerary::from_value(&doc).unwrap_err();
        assert_eq!(err.path, "itinerary.days");
    }

    #[test]
    fn test_rejects_type_mismatch() {
        let doc = json!({
            "itinerary": { "day1": { "title": "Arrival", "locations": "everywhere" } },
            "coordinates": coordinates()
        });

        let err = Itinerary::from_value(&doc).unwrap_err();
        assert_eq!(err.path, "itinerary.day1");
    }

    #[test]
    fn test_rejects_blank_title() {
        let doc = json!({ "itinerary": { "day1": { "title": "  " } }, "coordinates": coordinates() });

        let err = Itinerary::from_value(&doc).unwrap_err();
        assert_eq!(err.path, "itinerary.day1.title");
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let doc = json!({
            "itinerary": { "day1": { "title": "Arrival" } },
            "coordinates": {
                "startingPlace": { "latitude": 95.0, "longitude": 10.0 },
                "destination": { "latitude": 10.0, "longitude": 10.0 }
            }
        });

        let err = Itinerary::from_value(&doc).unwrap_err();
        assert_eq!(err.path, "coordinates.startingPlace.latitude");
    }

    #[test]
    fn test_rejects_unparseable_coordinate_string() {
        let doc = json!({
            "itinerary": { "day1": { "title": "Arrival" } },
            "coordinates": {
                "startingPlace": { "latitude": "", "longitude": "" },
                "destination": { "latitude": 10.0, "longitude": 10.0 }
            }
        });

        let err = Itinerary::from_value(&doc).unwrap_err();
        assert_eq!(err.path, "coordinates");
    }

    #[test]
    fn test_rejects_missing_coordinates() {
        let err = Itinerary::from_value(&json!({ "itinerary": { "day1": day("First") } })).unwrap_err();
        assert_eq!(err.path, "coordinates");
    }
}
