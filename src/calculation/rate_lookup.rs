//! DSA rate lookup.
//!
//! A region carries a history of rates; the rate in force on a date is the
//! most recent one whose `effective_from` is on or before it.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{DsaRate, DsaRegion};
use crate::error::{EngineError, EngineResult};

/// Finds the rate record in force for a region on a date.
///
/// # Errors
///
/// Returns [`EngineError::MissingRate`] when every rate of the region
/// starts after `date`, or the region has no rates at all.
pub fn rate_in_force(region: &DsaRegion, date: NaiveDate) -> EngineResult<&DsaRate> {
    // Regions built outside the loader may carry unsorted histories
    region
        .rates
        .iter()
        .filter(|rate| rate.effective_from <= date)
        .max_by_key(|rate| rate.effective_from)
        .ok_or(EngineError::MissingRate {
            region_id: region.id,
            date,
        })
}

/// Returns the DSA daily rate for a region on a date.
///
/// Picks the column from the local/USD × normal/over-60 matrix: `USD` by
/// exact code match, any other currency code selects the local columns.
///
/// # Examples
///
/// ```
/// use travel_cost_engine::calculation::rate_for;
/// use travel_cost_engine::config::{DsaRate, DsaRegion};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let region = DsaRegion {
///     id: 1,
///     country: "Kenya".to_string(),
///     area_name: "Nairobi".to_string(),
///     area_code: "NBO".to_string(),
///     rates: vec![DsaRate {
///         effective_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         local: Decimal::new(13000, 0),
///         local_over60: Decimal::new(9750, 0),
///         usd: Decimal::new(100, 0),
///         usd_over60: Decimal::new(75, 0),
///     }],
/// };
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// assert_eq!(rate_for(&region, date, false, "USD").unwrap(), Decimal::new(100, 0));
/// assert_eq!(rate_for(&region, date, true, "KES").unwrap(), Decimal::new(9750, 0));
///
/// let before = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
/// assert!(rate_for(&region, before, false, "USD").is_err());
/// ```
pub fn rate_for(
    region: &DsaRegion,
    date: NaiveDate,
    over_60: bool,
    currency_code: &str,
) -> EngineResult<Decimal> {
    Ok(rate_in_force(region, date)?.amount(over_60, currency_code))
}
