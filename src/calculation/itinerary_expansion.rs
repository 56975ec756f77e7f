//! Itinerary expansion into calendar days.
//!
//! Timestamps are cast to calendar dates in the workspace timezone; that
//! cast is the single place where timezone policy lives.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::config::RegionId;
use crate::error::{EngineError, EngineResult};
use crate::models::ItineraryLeg;

/// Casts a timestamp to the calendar date it falls on in `timezone`.
///
/// # Example
///
/// ```
/// use travel_cost_engine::calculation::cast_date;
/// use chrono::{NaiveDate, TimeZone, Utc};
///
/// // 22:30 UTC is already the next day in Nairobi (UTC+3)
/// let at = Utc.with_ymd_and_hms(2024, 3, 1, 22, 30, 0).unwrap();
/// assert_eq!(
///     cast_date(at, chrono_tz::Africa::Nairobi),
///     NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
/// );
/// assert_eq!(cast_date(at, chrono_tz::UTC), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
/// ```
pub fn cast_date(at: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    at.with_timezone(&timezone).date_naive()
}

/// One calendar day of an expanded itinerary.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedDay<'a> {
    /// The calendar date.
    pub date: NaiveDate,
    /// 1-based position of the day; past 60 the over-60 rates apply.
    pub day_index: u32,
    /// Region in effect on this date.
    pub region: Option<RegionId>,
    /// The leg the region was taken from.
    pub leg: &'a ItineraryLeg,
}

/// Orders legs by arrival and checks the timestamp invariants.
///
/// # Errors
///
/// Returns [`EngineError::InvalidItinerary`] when a leg arrives before it
/// departs or departs before the previous leg arrived.
pub fn ordered_legs<'a>(
    trip_reference: &str,
    legs: &'a [ItineraryLeg],
) -> EngineResult<Vec<&'a ItineraryLeg>> {
    let mut ordered: Vec<&ItineraryLeg> = legs.iter().collect();
    ordered.sort_by_key(|leg| leg.arrival_at);

    for (index, leg) in ordered.iter().enumerate() {
        if leg.arrival_at < leg.departure_at {
            return Err(EngineError::InvalidItinerary {
                trip_reference: trip_reference.to_string(),
                message: format!(
                    "leg {} ({} -> {}) arrives before it departs",
                    index + 1,
                    leg.origin,
                    leg.destination
                ),
            });
        }
    }

    for (index, pair) in ordered.windows(2).enumerate() {
        let (previous, next) = (pair[0], pair[1]);
        if next.departure_at < previous.arrival_at {
            return Err(EngineError::InvalidItinerary {
                trip_reference: trip_reference.to_string(),
                message: format!(
                    "leg {} departs at {} before leg {} arrives at {}",
                    index + 2,
                    next.departure_at,
                    index + 1,
                    previous.arrival_at
                ),
            });
        }
    }

    Ok(ordered)
}

/// Expands an itinerary into one entry per calendar day.
///
/// The first day is the arrival date of the first leg, the last day the
/// departure date of the final leg. Every date takes the region of the leg
/// arriving on it, or carries the previous day's region forward. On the
/// last date, if several legs depart, the region of the earliest departing
/// one applies.
///
/// Fewer than two legs expand to nothing.
///
/// # Errors
///
/// Returns [`EngineError::InvalidItinerary`] when the legs violate the
/// ordering invariants.
pub fn expand_itinerary<'a>(
    trip_reference: &str,
    legs: &'a [ItineraryLeg],
    timezone: Tz,
) -> EngineResult<Vec<ExpandedDay<'a>>> {
    let ordered = ordered_legs(trip_reference, legs)?;

    let (Some(first), Some(last)) = (ordered.first(), ordered.last()) else {
        return Ok(Vec::new());
    };
    if ordered.len() < 2 {
        return Ok(Vec::new());
    }

    // Later arrivals on the same date win
    let mut arrivals: BTreeMap<NaiveDate, &ItineraryLeg> = BTreeMap::new();
    for leg in &ordered[..ordered.len() - 1] {
        arrivals.insert(cast_date(leg.arrival_at, timezone), *leg);
    }

    let start_date = cast_date(first.arrival_at, timezone);
    let end_date = cast_date(last.departure_at, timezone);

    let mut days = Vec::new();
    let mut current: &ItineraryLeg = *first;
    let mut date = start_date;
    let mut day_index = 1;
    while date <= end_date {
        if let Some(leg) = arrivals.get(&date) {
            current = *leg;
        }
        days.push(ExpandedDay {
            date,
            day_index,
            region: current.dsa_region,
            leg: current,
        });
        date += Duration::days(1);
        day_index += 1;
    }

    if let Some(last_day) = days.last_mut() {
        let departing: Vec<&ItineraryLeg> = ordered
            .iter()
            .copied()
            .filter(|leg| cast_date(leg.departure_at, timezone) == last_day.date)
            .collect();
        if departing.len() > 1 {
            if let Some(earliest) = departing.iter().min_by_key(|leg| leg.departure_at) {
                last_day.region = earliest.dsa_region;
                last_day.leg = *earliest;
            }
        }
    }

    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0).unwrap()
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn leg(departure: DateTime<Utc>, arrival: DateTime<Utc>, region: u32) -> ItineraryLeg {
        ItineraryLeg {
            origin: "Origin".to_string(),
            destination: "Destination".to_string(),
            departure_at: departure,
            arrival_at: arrival,
            dsa_region: Some(region),
            overnight_travel: false,
            mode_of_travel: None,
        }
    }

    /// EXP-001: two legs over two days expand into two days in the first region
    #[test]
    fn test_two_day_trip() {
        let legs = vec![
            leg(at(3, 1, 8), at(3, 1, 10), 1),
            leg(at(3, 2, 16), at(3, 2, 18), 2),
        ];

        let days = expand_itinerary("2024/1", &legs, chrono_tz::UTC).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date(3, 1));
        assert_eq!(days[0].day_index, 1);
        assert_eq!(days[0].region, Some(1));
        assert_eq!(days[1].date, date(3, 2));
        assert_eq!(days[1].day_index, 2);
        assert_eq!(days[1].region, Some(1));
    }

    /// EXP-002: fewer than two legs expand to nothing
    #[test]
    fn test_single_leg_expands_to_nothing() {
        let legs = vec![leg(at(3, 1, 8), at(3, 1, 10), 1)];
        assert!(expand_itinerary("2024/1", &legs, chrono_tz::UTC).unwrap().is_empty());
        assert!(expand_itinerary("2024/1", &[], chrono_tz::UTC).unwrap().is_empty());
    }

    /// EXP-003: days without an arrival carry the previous region forward
    #[test]
    fn test_region_carried_forward() {
        let legs = vec![
            leg(at(3, 1, 8), at(3, 1, 10), 1),
            leg(at(3, 3, 8), at(3, 3, 10), 2),
            leg(at(3, 5, 16), at(3, 5, 18), 3),
        ];

        let days = expand_itinerary("2024/1", &legs, chrono_tz::UTC).unwrap();
        let regions: Vec<_> = days.iter().map(|d| d.region).collect();
        assert_eq!(
            regions,
            vec![Some(1), Some(1), Some(2), Some(2), Some(2)]
        );
    }

    /// EXP-004: the later arrival on the same date wins
    #[test]
    fn test_later_arrival_on_same_date_wins() {
        let legs = vec![
            leg(at(5, 10, 6), at(5, 10, 8), 2),
            leg(at(5, 10, 17), at(5, 10, 19), 1),
            leg(at(5, 11, 10), at(5, 11, 12), 3),
        ];

        let days = expand_itinerary("2024/1", &legs, chrono_tz::UTC).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].region, Some(1));
    }

    /// EXP-005: the last date is pinned to the earliest departing leg
    #[test]
    fn test_last_day_pinned_to_earliest_departure() {
        let legs = vec![
            leg(at(3, 1, 8), at(3, 1, 10), 1),
            leg(at(3, 3, 7), at(3, 3, 9), 2),
            leg(at(3, 3, 15), at(3, 3, 17), 3),
        ];

        let days = expand_itinerary("2024/1", &legs, chrono_tz::UTC).unwrap();
        let last = days.last().unwrap();
        assert_eq!(last.date, date(3, 3));
        assert_eq!(last.region, Some(2));
        assert_eq!(last.leg.departure_at, at(3, 3, 7));
    }

    /// EXP-006: dates are cast in the workspace timezone
    #[test]
    fn test_dates_cast_in_timezone() {
        let legs = vec![
            leg(at(3, 1, 22), at(3, 1, 23), 1),
            leg(at(3, 2, 22), at(3, 2, 23), 1),
        ];

        let days = expand_itinerary("2024/1", &legs, chrono_tz::Africa::Nairobi).unwrap();
        assert_eq!(days.first().unwrap().date, date(3, 2));
        assert_eq!(days.last().unwrap().date, date(3, 3));
    }

    #[test]
    fn test_leg_arriving_before_departure_is_rejected() {
        let legs = vec![
            leg(at(3, 1, 10), at(3, 1, 8), 1),
            leg(at(3, 2, 16), at(3, 2, 18), 1),
        ];

        let result = expand_itinerary("2024/7", &legs, chrono_tz::UTC);
        match result {
            Err(EngineError::InvalidItinerary { trip_reference, message }) => {
                assert_eq!(trip_reference, "2024/7");
                assert!(message.contains("arrives before it departs"));
            }
            other => panic!("Expected InvalidItinerary, got {:?}", other),
        }
    }

    #[test]
    fn test_overlapping_legs_are_rejected() {
        let legs = vec![
            leg(at(3, 1, 8), at(3, 1, 12), 1),
            leg(at(3, 1, 11), at(3, 1, 13), 2),
        ];

        assert!(matches!(
            expand_itinerary("2024/7", &legs, chrono_tz::UTC),
            Err(EngineError::InvalidItinerary { .. })
        ));
    }
}
