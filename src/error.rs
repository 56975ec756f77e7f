//! Error types for the Travel Cost Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while costing and invoicing a trip.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the Travel Cost Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently up to the workflow boundary.
///
/// # Example
///
/// ```
/// use travel_cost_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/workspace.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/workspace.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but contains inconsistent data.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// A description of the inconsistency.
        message: String,
    },

    /// An itinerary leg references a DSA region unknown to the reference data.
    #[error("DSA region not found: {region_id}")]
    RegionNotFound {
        /// The region id that was not found.
        region_id: u32,
    },

    /// No DSA rate is in force for the region on the given date.
    #[error("No DSA rate for region {region_id} on date {date}")]
    MissingRate {
        /// The region id.
        region_id: u32,
        /// The date for which the rate was requested.
        date: NaiveDate,
    },

    /// A currency code is unknown to the reference data.
    #[error("Currency not found: {code}")]
    CurrencyNotFound {
        /// The currency code that was not found.
        code: String,
    },

    /// A currency has no exchange rate to convert with.
    #[error("No exchange rate available for currency {currency}")]
    MissingExchangeRate {
        /// The currency code.
        currency: String,
    },

    /// The trip's itinerary violates ordering invariants.
    #[error("Invalid itinerary for trip '{trip_reference}': {message}")]
    InvalidItinerary {
        /// The reference of the trip.
        trip_reference: String,
        /// A description of what made the itinerary invalid.
        message: String,
    },

    /// Expenses exceed the approved cost by more than the workspace threshold.
    #[error("Threshold exceeded for {side}: delta {delta} is above {threshold} USD")]
    ThresholdExceeded {
        /// Which side of the check failed ("traveler" or "agency").
        side: String,
        /// The computed delta.
        delta: Decimal,
        /// The configured threshold.
        threshold: Decimal,
    },

    /// Cost shares do not sum to 100 percent.
    #[error("Cost shares of trip '{trip_reference}' sum to {total}, expected 100")]
    SharesNot100 {
        /// The reference of the trip.
        trip_reference: String,
        /// The actual sum of shares.
        total: u64,
    },

    /// The requested transition is not allowed from the trip's current status.
    #[error("Transition '{transition}' is not allowed for trip '{trip_reference}' in status '{status}'")]
    InvalidTransition {
        /// The reference of the trip.
        trip_reference: String,
        /// The name of the transition.
        transition: String,
        /// The current status of the trip.
        status: String,
    },

    /// A transition guard refused the transition.
    #[error("Transition '{transition}' refused for trip '{trip_reference}': {reason}")]
    TransitionRefused {
        /// The reference of the trip.
        trip_reference: String,
        /// The name of the transition.
        transition: String,
        /// Why the guard refused.
        reason: String,
    },

    /// No invoice exists with the given reference number.
    #[error("Invoice not found: {reference_number}")]
    InvoiceNotFound {
        /// The invoice reference number.
        reference_number: String,
    },

    /// An invoice status update does not follow the posting lifecycle.
    #[error("Invoice '{reference_number}' cannot move from '{from}' to '{to}'")]
    InvalidInvoiceStatus {
        /// The invoice reference number.
        reference_number: String,
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
