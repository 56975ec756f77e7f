//! Expense aggregation and the approval threshold check.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use crate::config::{ReferenceData, WorkspaceConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{CurrencyTotal, ExpenseLine, Trip, VendorNumber};

/// Decimal places kept in published monetary figures.
pub const MONEY_DECIMAL_PLACES: u32 = 4;

/// Rounds to four decimal places, half-even, and pads the scale to four.
///
/// # Example
///
/// ```
/// use travel_cost_engine::calculation::quantize;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(quantize(Decimal::from_str("1.00005").unwrap()).to_string(), "1.0000");
/// assert_eq!(quantize(Decimal::from_str("1.00015").unwrap()).to_string(), "1.0002");
/// assert_eq!(quantize(Decimal::from(140)).to_string(), "140.0000");
/// ```
pub fn quantize(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_DECIMAL_PLACES);
    rounded
}

/// Expenses of a trip grouped for display and totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseAggregation {
    /// Per vendor and currency: traveler first, agencies by vendor number,
    /// non-invoiceable last.
    pub lines: Vec<ExpenseLine>,
    /// Totals per document currency, ordered by code.
    pub per_currency: Vec<CurrencyTotal>,
    /// Σ amounts in the trip currency.
    pub local_total: Decimal,
    /// Σ converted amounts of the other currencies.
    pub usd_total: Decimal,
    /// Σ amounts of expenses incurred by the traveler.
    pub traveler_total: Decimal,
}

/// Groups the filled-in expenses of a trip.
///
/// Expenses in the trip currency count toward the local total only; the
/// others are converted with their currency's most recent exchange rate and
/// count toward the USD total only. Figures are exact here; quantization
/// happens in the cost summary.
///
/// # Errors
///
/// - [`EngineError::CurrencyNotFound`] for an unknown foreign currency
/// - [`EngineError::MissingExchangeRate`] for a foreign currency without rates
pub fn aggregate_expenses(
    trip: &Trip,
    reference_data: &ReferenceData,
) -> EngineResult<ExpenseAggregation> {
    let mut by_vendor: BTreeMap<(VendorNumber, String), Decimal> = BTreeMap::new();
    let mut by_currency: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut local_total = Decimal::ZERO;
    let mut usd_total = Decimal::ZERO;
    let mut traveler_total = Decimal::ZERO;

    for expense in &trip.expenses {
        let Some(amount) = expense.amount else {
            continue;
        };

        *by_vendor
            .entry((expense.vendor_number().clone(), expense.currency.clone()))
            .or_default() += amount;
        *by_currency.entry(expense.currency.clone()).or_default() += amount;

        if expense.currency == trip.currency {
            local_total += amount;
        } else {
            usd_total += amount * reference_data.latest_x_rate(&expense.currency)?;
        }

        if *expense.vendor_number() == VendorNumber::Traveler {
            traveler_total += amount;
        }
    }

    // VendorNumber orders Traveler, then agencies by number, then non-invoiceable
    let lines = by_vendor
        .into_iter()
        .map(|((vendor_number, currency), amount)| ExpenseLine {
            vendor_number,
            currency,
            amount,
        })
        .collect();

    let per_currency = by_currency
        .into_iter()
        .map(|(currency, amount)| CurrencyTotal { currency, amount })
        .collect();

    Ok(ExpenseAggregation {
        lines,
        per_currency,
        local_total,
        usd_total,
        traveler_total,
    })
}

/// Sums the traveler and travel agency expenses of a trip.
///
/// Returns `(traveler, agencies)`; non-invoiceable expenses count toward
/// neither. These are the figures recorded as approved costs.
pub fn expense_totals_by_side(trip: &Trip) -> (Decimal, Decimal) {
    let mut traveler = Decimal::ZERO;
    let mut agencies = Decimal::ZERO;
    for expense in &trip.expenses {
        let amount = expense.amount.unwrap_or(Decimal::ZERO);
        match expense.vendor_number() {
            VendorNumber::Traveler => traveler += amount,
            VendorNumber::Agency(_) => agencies += amount,
            VendorNumber::NonInvoiceable => {}
        }
    }
    (traveler, agencies)
}

/// Checks current expenses against the costs approved by the supervisor.
///
/// The traveler delta is converted to USD with the trip currency's latest
/// exchange rate unless the trip is kept in USD. A side is skipped when its
/// approved cost or its threshold is unset.
///
/// # Errors
///
/// Returns [`EngineError::ThresholdExceeded`] naming the first side whose
/// delta exceeds its threshold.
pub fn check_thresholds(
    trip: &Trip,
    workspace: &WorkspaceConfig,
    reference_data: &ReferenceData,
) -> EngineResult<()> {
    let (traveler, agencies) = expense_totals_by_side(trip);

    if let (Some(approved), Some(threshold)) =
        (trip.approved_cost_traveler, workspace.threshold_traveler_usd)
    {
        let mut delta = traveler - approved;
        if !trip.is_usd() {
            delta *= reference_data.latest_x_rate(&trip.currency)?;
        }
        if delta > threshold {
            warn!(trip_reference = %trip.reference_number, delta = %delta, threshold = %threshold, "Traveler threshold exceeded");
            return Err(EngineError::ThresholdExceeded {
                side: "traveler".to_string(),
                delta,
                threshold,
            });
        }
    }

    if let (Some(approved), Some(threshold)) =
        (trip.approved_cost_agencies, workspace.threshold_agency_usd)
    {
        let delta = agencies - approved;
        if delta > threshold {
            warn!(trip_reference = %trip.reference_number, delta = %delta, threshold = %threshold, "Travel agency threshold exceeded");
            return Err(EngineError::ThresholdExceeded {
                side: "agency".to_string(),
                delta,
                threshold,
            });
        }
    }

    Ok(())
}
