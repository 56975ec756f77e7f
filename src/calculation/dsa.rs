//! DSA calculation.
//!
//! Applies the per-day DSA rules to an expanded itinerary:
//!
//! 1. No DSA when no travel authorization is required or a leg has no region.
//! 2. No DSA for a one-day trip without an 8 hour stay between legs.
//! 3. The full daily rate, unless the day's leg is an overnight travel that
//!    departed that same day.
//! 4. A 40% top-up per other region visited during the day, when the stay
//!    there lasted at least 8 hours. Never on the last day.
//! 5. Deductions for meals and accommodation, capped on the last day.
//! 6. The last day keeps 40% of its amount.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::ReferenceData;
use crate::error::EngineResult;
use crate::models::{AuditTrace, AuditWarning, DetailedDsa, DsaDay, ItineraryLeg, LAST_DAY_FACTOR, Trip};

use super::itinerary_expansion::{ExpandedDay, cast_date, expand_itinerary, ordered_legs};
use super::rate_lookup::rate_for;

/// Share of another region's rate added for a same-day stay there.
pub const SAME_DAY_TRAVEL_MULTIPLIER: Decimal = Decimal::from_parts(4, 0, 0, false, 1);

/// Minimum stay between legs for it to count, in hours.
pub const MIN_STAY_HOURS: i64 = 8;

/// Number of days after which the over-60 rates apply.
pub const OVER_60_THRESHOLD: u32 = 60;

/// The outcome of a DSA calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DsaCalculation {
    /// Per-day records, ordered by date.
    pub days: Vec<DsaDay>,
    /// Σ corrected DSA amounts.
    pub total_dsa: Decimal,
    /// Σ deductions.
    pub total_deductions: Decimal,
    /// Σ final amounts.
    pub paid_to_traveler: Decimal,
    /// Days grouped per region run, split at day 60.
    pub detailed_dsa: Vec<DetailedDsa>,
    /// Steps and warnings recorded along the way.
    pub audit_trace: AuditTrace,
}

impl DsaCalculation {
    fn zeroed(mut audit_trace: AuditTrace, code: &str, message: String) -> Self {
        audit_trace.warnings.push(AuditWarning::low(code, message));
        Self {
            audit_trace,
            ..Self::default()
        }
    }
}

/// Calculates the DSA owed for a trip.
///
/// Rates are taken in USD when the trip currency is USD and in local
/// currency otherwise. Amounts are exact; quantization happens when the
/// cost summary is built.
///
/// # Errors
///
/// - [`crate::error::EngineError::InvalidItinerary`] when the legs violate the ordering invariants
/// - [`crate::error::EngineError::RegionNotFound`] when a leg references an unknown region
/// - [`crate::error::EngineError::MissingRate`] when no rate is in force for a day
pub fn calculate_dsa(
    trip: &Trip,
    reference_data: &ReferenceData,
    timezone: Tz,
) -> EngineResult<DsaCalculation> {
    let mut trace = AuditTrace::default();
    let ordered = ordered_legs(&trip.reference_number, &trip.itinerary)?;

    if !trip.ta_required {
        debug!(trip_reference = %trip.reference_number, "DSA zeroed: travel authorization not required");
        return Ok(DsaCalculation::zeroed(
            trace,
            "DSA_TA_NOT_REQUIRED",
            "No DSA is paid when a travel authorization is not required".to_string(),
        ));
    }

    if let Some(index) = ordered.iter().position(|leg| leg.dsa_region.is_none()) {
        debug!(trip_reference = %trip.reference_number, leg = index + 1, "DSA zeroed: leg without region");
        return Ok(DsaCalculation::zeroed(
            trace,
            "DSA_REGION_MISSING",
            format!("Leg {} has no DSA region assigned", index + 1),
        ));
    }

    let expanded = expand_itinerary(&trip.reference_number, &trip.itinerary, timezone)?;
    trace.record(
        "itinerary_expansion",
        "Itinerary Expansion",
        serde_json::json!({ "leg_count": ordered.len() }),
        serde_json::json!({
            "day_count": expanded.len(),
            "first_day": expanded.first().map(|d| d.date.to_string()),
            "last_day": expanded.last().map(|d| d.date.to_string()),
        }),
        format!("{} legs expand into {} days", ordered.len(), expanded.len()),
    );

    if expanded.is_empty() {
        debug!(trip_reference = %trip.reference_number, "DSA zeroed: fewer than two legs");
        return Ok(DsaCalculation::zeroed(
            trace,
            "DSA_SHORT_ITINERARY",
            "At least two legs are needed to calculate DSA".to_string(),
        ));
    }

    if expanded.len() == 1 && !has_long_stay(&ordered) {
        debug!(trip_reference = %trip.reference_number, "DSA zeroed: same-day trip without an 8 hour stay");
        return Ok(DsaCalculation::zeroed(
            trace,
            "DSA_SAME_DAY_SHORT_TRIP",
            format!("Same-day trip without a stay of at least {} hours", MIN_STAY_HOURS),
        ));
    }

    let deductions: HashMap<NaiveDate, Decimal> = trip
        .deductions
        .iter()
        .map(|d| (d.date, d.multiplier()))
        .collect();

    let last_day_cap = Decimal::ONE - LAST_DAY_FACTOR;
    let mut days = Vec::with_capacity(expanded.len());
    for (position, day) in expanded.iter().enumerate() {
        let last_day = position + 1 == expanded.len();
        let mut dsa_day = daily_amount(trip, day, last_day, reference_data, timezone, &mut trace)?;

        let mut multiplier = deductions.get(&day.date).copied().unwrap_or(Decimal::ZERO);
        if last_day && multiplier > last_day_cap {
            multiplier = last_day_cap;
        }
        dsa_day.deduction_multiplier = multiplier;
        days.push(dsa_day);
    }

    let total_dsa: Decimal = days.iter().map(DsaDay::corrected_dsa_amount).sum();
    let total_deductions: Decimal = days.iter().map(DsaDay::deduction).sum();
    let paid_to_traveler: Decimal = days.iter().map(DsaDay::final_amount).sum();
    let detailed_dsa = aggregate_detailed_dsa(&days, reference_data)?;

    trace.record(
        "dsa_totals",
        "DSA Totals",
        serde_json::json!({ "day_count": days.len() }),
        serde_json::json!({
            "total_dsa": total_dsa.to_string(),
            "total_deductions": total_deductions.to_string(),
            "paid_to_traveler": paid_to_traveler.to_string(),
        }),
        format!(
            "Total DSA {} less deductions {} leaves {} for the traveler",
            total_dsa, total_deductions, paid_to_traveler
        ),
    );

    info!(
        trip_reference = %trip.reference_number,
        days = days.len(),
        total_dsa = %total_dsa,
        paid_to_traveler = %paid_to_traveler,
        "DSA calculated"
    );

    Ok(DsaCalculation {
        days,
        total_dsa,
        total_deductions,
        paid_to_traveler,
        detailed_dsa,
        audit_trace: trace,
    })
}

/// Returns true when some gap between consecutive legs reaches the minimum stay.
fn has_long_stay(ordered: &[&ItineraryLeg]) -> bool {
    ordered
        .windows(2)
        .any(|pair| pair[1].departure_at - pair[0].arrival_at >= Duration::hours(MIN_STAY_HOURS))
}

/// Computes the base amount and same-day top-ups for one day.
fn daily_amount(
    trip: &Trip,
    day: &ExpandedDay<'_>,
    last_day: bool,
    reference_data: &ReferenceData,
    timezone: Tz,
    trace: &mut AuditTrace,
) -> EngineResult<DsaDay> {
    // Regions are checked before expansion
    let region_id = day.region.unwrap_or_default();
    let region = reference_data.region(region_id)?;
    let over_60 = day.day_index > OVER_60_THRESHOLD;
    let daily_rate = rate_for(region, day.date, over_60, &trip.currency)?;

    let left_overnight = cast_date(day.leg.departure_at, timezone) == day.date && day.leg.overnight_travel;
    let base = if left_overnight { Decimal::ZERO } else { daily_rate };

    let top_up = if last_day {
        Decimal::ZERO
    } else {
        same_day_top_up(trip, day, over_60, reference_data, timezone)?
    };

    let dsa_amount = base + top_up;

    trace.record(
        "daily_dsa",
        "Daily DSA",
        serde_json::json!({
            "date": day.date.to_string(),
            "day_index": day.day_index,
            "region": region_id,
            "over_60": over_60,
            "last_day": last_day,
        }),
        serde_json::json!({
            "daily_rate": daily_rate.to_string(),
            "base": base.to_string(),
            "same_day_top_up": top_up.to_string(),
            "dsa_amount": dsa_amount.to_string(),
        }),
        if left_overnight {
            format!("Overnight travel departed on {}, no full-day rate", day.date)
        } else {
            format!("Full-day rate {} in {}", daily_rate, region.label())
        },
    );

    Ok(DsaDay {
        date: day.date,
        day_index: day.day_index,
        region: region_id,
        daily_rate,
        dsa_amount,
        deduction_multiplier: Decimal::ZERO,
        last_day,
    })
}

/// Adds 40% of another region's rate for each long enough stay there.
///
/// The legs into other regions departing on the day are walked in departure
/// order, followed by the day's own leg; each pair with a gap of at least
/// [`MIN_STAY_HOURS`] between arrival and next departure counts.
fn same_day_top_up(
    trip: &Trip,
    day: &ExpandedDay<'_>,
    over_60: bool,
    reference_data: &ReferenceData,
    timezone: Tz,
) -> EngineResult<Decimal> {
    let mut same_day: Vec<&ItineraryLeg> = trip
        .itinerary
        .iter()
        .filter(|leg| leg.dsa_region != day.region)
        .filter(|leg| cast_date(leg.departure_at, timezone) == day.date)
        .collect();
    same_day.sort_by_key(|leg| leg.departure_at);
    same_day.push(day.leg);

    let mut top_up = Decimal::ZERO;
    for pair in same_day.windows(2) {
        let (stay, next) = (pair[0], pair[1]);
        if next.departure_at - stay.arrival_at < Duration::hours(MIN_STAY_HOURS) {
            continue;
        }
        let Some(region_id) = stay.dsa_region else {
            continue;
        };
        let region = reference_data.region(region_id)?;
        top_up += rate_for(region, day.date, over_60, &trip.currency)? * SAME_DAY_TRAVEL_MULTIPLIER;
    }

    Ok(top_up)
}

/// Groups consecutive days of the same region, splitting at day 60.
///
/// A group starting past day 60 carries the over-60 daily rate.
pub fn aggregate_detailed_dsa(
    days: &[DsaDay],
    reference_data: &ReferenceData,
) -> EngineResult<Vec<DetailedDsa>> {
    let mut detailed: Vec<DetailedDsa> = Vec::new();

    for (index, day) in days.iter().enumerate() {
        let starts_group = match detailed.last() {
            None => true,
            Some(current) => current.dsa_region_id != day.region || index == OVER_60_THRESHOLD as usize,
        };

        if starts_group {
            let region = reference_data.region(day.region)?;
            detailed.push(DetailedDsa {
                start_date: day.date,
                end_date: day.date,
                dsa_region_id: day.region,
                dsa_region_name: region.label(),
                daily_rate: day.daily_rate,
                night_count: 0,
                paid_to_traveler: Decimal::ZERO,
                total_amount: Decimal::ZERO,
                deduction: Decimal::ZERO,
            });
        } else if let Some(current) = detailed.last_mut() {
            current.night_count += 1;
        }

        if let Some(current) = detailed.last_mut() {
            current.end_date = day.date;
            current.paid_to_traveler += day.final_amount();
            current.total_amount += day.dsa_amount;
            current.deduction += day.deduction();
        }
    }

    Ok(detailed)
}
