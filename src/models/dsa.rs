//! Per-day DSA records and their grouped "detailed DSA" form.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::RegionId;

/// Share of the daily amount withheld on the last day of a trip.
pub const LAST_DAY_FACTOR: Decimal = Decimal::from_parts(6, 0, 0, false, 1);

/// The DSA computed for one calendar day of a trip.
///
/// Only the raw inputs are stored; deduction, corrected amount and final
/// amount are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsaDay {
    /// The calendar date.
    pub date: NaiveDate,
    /// 1-based position of the day in the trip.
    pub day_index: u32,
    /// The region in effect on this date.
    pub region: RegionId,
    /// The rate in force for the region on this date.
    pub daily_rate: Decimal,
    /// Base amount plus same-day top-ups.
    pub dsa_amount: Decimal,
    /// Deduction multiplier; already capped on the last day.
    pub deduction_multiplier: Decimal,
    /// Whether this is the final day of the trip.
    pub last_day: bool,
}

impl DsaDay {
    /// The amount withheld for meals and accommodation provided.
    pub fn deduction(&self) -> Decimal {
        self.dsa_amount * self.deduction_multiplier
    }

    /// The amount withheld because this is the last day.
    pub fn internal_last_day_deduction(&self) -> Decimal {
        if self.last_day {
            self.dsa_amount * LAST_DAY_FACTOR
        } else {
            Decimal::ZERO
        }
    }

    /// The DSA due for the day before deductions.
    pub fn corrected_dsa_amount(&self) -> Decimal {
        self.dsa_amount - self.internal_last_day_deduction()
    }

    /// The amount paid out for the day, never negative.
    pub fn final_amount(&self) -> Decimal {
        (self.dsa_amount - self.internal_last_day_deduction() - self.deduction()).max(Decimal::ZERO)
    }
}

/// A run of consecutive days in one region, split at the over-60 boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedDsa {
    /// First date of the run.
    pub start_date: NaiveDate,
    /// Last date of the run.
    pub end_date: NaiveDate,
    /// Region of the run.
    pub dsa_region_id: RegionId,
    /// Display label of the region.
    pub dsa_region_name: String,
    /// Daily rate for the run, over-60 variant for runs starting past day 60.
    pub daily_rate: Decimal,
    /// Days in the run minus one.
    pub night_count: u32,
    /// Sum of the final amounts.
    pub paid_to_traveler: Decimal,
    /// Sum of the uncorrected DSA amounts.
    pub total_amount: Decimal,
    /// Sum of the deductions.
    pub deduction: Decimal,
}
