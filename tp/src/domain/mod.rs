//! Domain types for Tripplan
//!
//! Core domain types: TripRequest (what the user asked for), RawModelResponse
//! (what the model sent back) and Itinerary (the validated plan we render).

mod itinerary;
mod trip;

pub use itinerary::{
    Coordinates, DayEntry, DayPlan, Food, Hotel, Itinerary, Location, Place, ShapeError, Transport,
};
pub use trip::{BudgetRange, RawModelResponse, TripRequest};
