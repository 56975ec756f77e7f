//! The cost summary of a trip.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuditTrace, DetailedDsa, VendorNumber};

/// Expense total in one document currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTotal {
    /// Currency code.
    pub currency: String,
    /// Sum of the expense amounts in that currency.
    pub amount: Decimal,
}

/// Expenses of one vendor in one currency, as shown in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseLine {
    /// Vendor bucket; the traveler shows up as `user`.
    pub vendor_number: VendorNumber,
    /// Currency code.
    pub currency: String,
    /// Sum of the amounts.
    pub amount: Decimal,
}

/// Combined DSA and expense figures for a trip.
///
/// All monetary figures are quantized to four decimal places, half-even.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSummary {
    /// Unique identifier for this summary.
    pub summary_id: Uuid,
    /// When the summary was computed.
    pub computed_at: DateTime<Utc>,
    /// The version of the engine that computed it.
    pub engine_version: String,
    /// Reference number of the trip.
    pub trip_reference: String,
    /// Trip currency code.
    pub currency: String,
    /// Σ corrected DSA amounts.
    pub dsa_total: Decimal,
    /// DSA grouped per region run.
    pub dsa: Vec<DetailedDsa>,
    /// Σ deductions.
    pub deductions_total: Decimal,
    /// Σ final DSA amounts.
    pub traveler_dsa: Decimal,
    /// Expense totals per currency.
    pub expenses_total: Vec<CurrencyTotal>,
    /// Σ expenses in the trip currency.
    pub expenses_local_total: Decimal,
    /// Σ expenses in other currencies, converted to USD.
    pub expenses_usd_total: Decimal,
    /// Local snapshot taken on the first send for payment.
    pub preserved_expenses_local: Option<Decimal>,
    /// USD snapshot taken on the first send for payment.
    pub preserved_expenses_usd: Option<Decimal>,
    /// Preserved minus current local total, zero without a snapshot.
    pub expenses_delta_local: Decimal,
    /// Preserved minus current USD total, zero without a snapshot.
    pub expenses_delta_usd: Decimal,
    /// Traveler first, agencies by vendor number, non-invoiceable last.
    pub expenses: Vec<ExpenseLine>,
    /// DSA paid plus expenses incurred by the traveler.
    pub paid_to_traveler: Decimal,
    /// Trace of the DSA rules applied.
    pub audit_trace: AuditTrace,
}
