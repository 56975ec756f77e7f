//! Itinerary leg model and related types.
//!
//! This module defines the [`ItineraryLeg`] struct and the [`ModeOfTravel`]
//! enum describing a single origin-to-destination movement of a trip.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RegionId;

/// How a leg is travelled.
///
/// Stored as the capitalised label (`"Plane"`, `"Bus"`, ...) so existing
/// records stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeOfTravel {
    /// Air travel.
    Plane,
    /// Bus.
    Bus,
    /// Car.
    Car,
    /// Boat.
    Boat,
    /// Rail.
    Rail,
}

/// A single origin-to-destination movement with timestamps.
///
/// The DSA region is the region of the destination: the traveler is in that
/// region from `arrival_at` until the next leg departs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryLeg {
    /// Free-form origin label.
    pub origin: String,
    /// Free-form destination label.
    pub destination: String,
    /// When the leg departs.
    pub departure_at: DateTime<Utc>,
    /// When the leg arrives.
    pub arrival_at: DateTime<Utc>,
    /// The DSA region in effect after arrival.
    #[serde(default)]
    pub dsa_region: Option<RegionId>,
    /// Whether the traveler spends the night travelling on this leg.
    #[serde(default)]
    pub overnight_travel: bool,
    /// How the leg is travelled.
    #[serde(default)]
    pub mode_of_travel: Option<ModeOfTravel>,
}

impl ItineraryLeg {
    /// Returns how long the leg takes.
    ///
    /// # Examples
    ///
    /// ```
    /// use travel_cost_engine::models::ItineraryLeg;
    /// use chrono::{Duration, TimeZone, Utc};
    ///
    /// let leg = ItineraryLeg {
    ///     origin: "Nairobi".to_string(),
    ///     destination: "Kisumu".to_string(),
    ///     departure_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
    ///     arrival_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap(),
    ///     dsa_region: Some(2),
    ///     overnight_travel: false,
    ///     mode_of_travel: None,
    /// };
    /// assert_eq!(leg.duration(), Duration::minutes(150));
    /// ```
    pub fn duration(&self) -> Duration {
        self.arrival_at - self.departure_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_leg() -> ItineraryLeg {
        ItineraryLeg {
            origin: "Nairobi".to_string(),
            destination: "Kisumu".to_string(),
            departure_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            arrival_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            dsa_region: Some(2),
            overnight_travel: false,
            mode_of_travel: Some(ModeOfTravel::Plane),
        }
    }

    #[test]
    fn test_mode_of_travel_is_string_backed() {
        let json = serde_json::to_string(&ModeOfTravel::Rail).unwrap();
        assert_eq!(json, "\"Rail\"");
        let mode: ModeOfTravel = serde_json::from_str("\"Boat\"").unwrap();
        assert_eq!(mode, ModeOfTravel::Boat);
    }

    #[test]
    fn test_leg_deserialization_defaults() {
        let json = r#"{
            "origin": "Nairobi",
            "destination": "Kisumu",
            "departure_at": "2024-03-01T08:00:00Z",
            "arrival_at": "2024-03-01T10:00:00Z"
        }"#;

        let leg: ItineraryLeg = serde_json::from_str(json).unwrap();
        assert_eq!(leg.dsa_region, None);
        assert!(!leg.overnight_travel);
        assert_eq!(leg.mode_of_travel, None);
    }

    #[test]
    fn test_duration() {
        assert_eq!(make_leg().duration(), Duration::hours(2));
    }
}
