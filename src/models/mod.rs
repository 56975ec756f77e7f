//! Core data models for the travel cost engine.
//!
//! Plain serde structures: the trip and everything it owns, invoices, and
//! the records the calculations produce.

mod audit;
mod cost_share;
mod cost_summary;
mod deduction;
mod dsa;
mod expense;
mod invoice;
mod itinerary;
mod trip;

pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use cost_share::{BudgetKey, CostShare, total_share};
pub use cost_summary::{CostSummary, CurrencyTotal, ExpenseLine};
pub use deduction::{
    ACCOMMODATION_WEIGHT, BREAKFAST_WEIGHT, DINNER_WEIGHT, Deduction, LUNCH_WEIGHT, NO_DSA_WEIGHT,
};
pub use dsa::{DetailedDsa, DsaDay, LAST_DAY_FACTOR};
pub use expense::{Expense, ExpenseType, USER_VENDOR_PLACEHOLDER, VendorNumber};
pub use invoice::{Invoice, InvoiceLine, InvoiceStatus, PostingKey, invoice_reference_number};
pub use itinerary::{ItineraryLeg, ModeOfTravel};
pub use trip::{Traveler, Trip, TripStatus};
