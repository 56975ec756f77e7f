//! Trip model and its workflow status.
//!
//! A trip exclusively owns its itinerary, expenses, deductions and cost
//! shares. Invoices are owned by the trip as well but live in the
//! invoice store, keyed by the trip id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::USD_CODE;

use super::{CostShare, Deduction, Expense, ItineraryLeg};

/// Workflow states of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    /// Being drafted by the traveler.
    Planned,
    /// Waiting for supervisor approval.
    Submitted,
    /// Approved by the supervisor.
    Approved,
    /// Rejected by the supervisor.
    Rejected,
    /// Cancelled.
    Cancelled,
    /// Handed over to finance for payment.
    SentForPayment,
    /// Expenses certified after the trip.
    Certified,
    /// Closed.
    Completed,
}

impl TripStatus {
    /// Returns the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planned => "planned",
            TripStatus::Submitted => "submitted",
            TripStatus::Approved => "approved",
            TripStatus::Rejected => "rejected",
            TripStatus::Cancelled => "cancelled",
            TripStatus::SentForPayment => "sent_for_payment",
            TripStatus::Certified => "certified",
            TripStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The person travelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traveler {
    /// Identifier of the traveler.
    pub id: String,
    /// Vendor number the traveler is paid under.
    pub vendor_number: String,
}

/// A trip with everything the cost engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Opaque identifier.
    pub id: Uuid,
    /// Human reference of the form `YYYY/N`.
    pub reference_number: String,
    /// Workflow status.
    pub status: TripStatus,
    /// The traveler.
    pub traveler: Traveler,
    /// The supervisor approving the trip.
    #[serde(default)]
    pub supervisor: Option<String>,
    /// Planned start.
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    /// Planned end.
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    /// Trip currency code.
    pub currency: String,
    /// Whether a travel authorization (and so DSA) is required.
    pub ta_required: bool,
    /// Whether the trip crosses borders.
    #[serde(default)]
    pub international_travel: bool,
    /// Itinerary legs.
    #[serde(default)]
    pub itinerary: Vec<ItineraryLeg>,
    /// Expenses.
    #[serde(default)]
    pub expenses: Vec<Expense>,
    /// Per-date deductions.
    #[serde(default)]
    pub deductions: Vec<Deduction>,
    /// Cost share assignments.
    #[serde(default)]
    pub cost_shares: Vec<CostShare>,
    /// Local expense total captured on the first send for payment.
    #[serde(default)]
    pub preserved_expenses_local: Option<Decimal>,
    /// USD expense total captured on the first send for payment.
    #[serde(default)]
    pub preserved_expenses_usd: Option<Decimal>,
    /// Traveler expenses at approval time.
    #[serde(default)]
    pub approved_cost_traveler: Option<Decimal>,
    /// Travel agency expenses at approval time.
    #[serde(default)]
    pub approved_cost_agencies: Option<Decimal>,
    /// When the trip was last submitted for approval.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// When the trip was approved.
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    /// When the trip was completed.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Trip {
    /// Creates a planned trip requiring a travel authorization.
    ///
    /// # Examples
    ///
    /// ```
    /// use travel_cost_engine::models::{Traveler, Trip, TripStatus};
    ///
    /// let trip = Trip::new(
    ///     "2024/1",
    ///     Traveler { id: "t-1".to_string(), vendor_number: "V-T".to_string() },
    ///     "USD",
    /// );
    /// assert_eq!(trip.status, TripStatus::Planned);
    /// assert!(trip.ta_required);
    /// assert!(trip.is_usd());
    /// ```
    pub fn new(
        reference_number: impl Into<String>,
        traveler: Traveler,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference_number: reference_number.into(),
            status: TripStatus::Planned,
            traveler,
            supervisor: None,
            start_at: None,
            end_at: None,
            currency: currency.into(),
            ta_required: true,
            international_travel: false,
            itinerary: Vec::new(),
            expenses: Vec::new(),
            deductions: Vec::new(),
            cost_shares: Vec::new(),
            preserved_expenses_local: None,
            preserved_expenses_usd: None,
            approved_cost_traveler: None,
            approved_cost_agencies: None,
            submitted_at: None,
            approved_at: None,
            completed_at: None,
        }
    }

    /// Returns true when the trip is kept in USD.
    pub fn is_usd(&self) -> bool {
        self.currency == USD_CODE
    }

    /// Returns the itinerary ordered by arrival.
    pub fn itinerary_by_arrival(&self) -> Vec<&ItineraryLeg> {
        let mut legs: Vec<&ItineraryLeg> = self.itinerary.iter().collect();
        legs.sort_by_key(|leg| leg.arrival_at);
        legs
    }
}
