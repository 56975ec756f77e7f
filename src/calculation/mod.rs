//! Calculation logic for the travel cost engine.
//!
//! This module contains the pure computations behind a cost summary: DSA
//! rate lookup, itinerary expansion into calendar days, the per-day DSA
//! rules with deductions and the over-60 split, expense aggregation with
//! threshold checks, and the summary that merges them.

mod cost_summary;
mod dsa;
mod expenses;
mod itinerary_expansion;
mod rate_lookup;

pub use cost_summary::summarize_costs;
pub use dsa::{
    DsaCalculation, MIN_STAY_HOURS, OVER_60_THRESHOLD, SAME_DAY_TRAVEL_MULTIPLIER,
    aggregate_detailed_dsa, calculate_dsa,
};
pub use expenses::{
    ExpenseAggregation, MONEY_DECIMAL_PLACES, aggregate_expenses, check_thresholds,
    expense_totals_by_side, quantize,
};
pub use itinerary_expansion::{ExpandedDay, cast_date, expand_itinerary, ordered_legs};
pub use rate_lookup::{rate_for, rate_in_force};
