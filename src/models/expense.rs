//! Expense model and vendor numbers.
//!
//! Expenses are grouped by the vendor number of their type. The placeholder
//! vendor stands for the traveler, an empty vendor number marks a bucket that
//! is never invoiced (parking money and the like).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vendor number stored on expense types incurred by the traveler.
pub const USER_VENDOR_PLACEHOLDER: &str = "user";

/// The payee of an expense.
///
/// Stored as a plain string: [`USER_VENDOR_PLACEHOLDER`] maps to
/// [`VendorNumber::Traveler`], the empty string to
/// [`VendorNumber::NonInvoiceable`], anything else to an agency.
///
/// # Example
///
/// ```
/// use travel_cost_engine::models::VendorNumber;
///
/// assert_eq!(VendorNumber::from("user"), VendorNumber::Traveler);
/// assert_eq!(VendorNumber::from(""), VendorNumber::NonInvoiceable);
/// assert_eq!(VendorNumber::from("a_nico"), VendorNumber::Agency("a_nico".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VendorNumber {
    /// The traveler themselves.
    Traveler,
    /// A travel agency or other external vendor.
    Agency(String),
    /// Not invoiceable.
    NonInvoiceable,
}

impl VendorNumber {
    /// Returns the stored string form.
    pub fn as_str(&self) -> &str {
        match self {
            VendorNumber::Traveler => USER_VENDOR_PLACEHOLDER,
            VendorNumber::Agency(number) => number.as_str(),
            VendorNumber::NonInvoiceable => "",
        }
    }

    /// Resolves the vendor that an invoice would be addressed to.
    ///
    /// The traveler placeholder is rebound to the traveler's own vendor
    /// number; non-invoiceable expenses have no invoice vendor.
    pub fn invoice_vendor<'a>(&'a self, traveler_vendor_number: &'a str) -> Option<&'a str> {
        match self {
            VendorNumber::Traveler => Some(traveler_vendor_number),
            VendorNumber::Agency(number) => Some(number.as_str()),
            VendorNumber::NonInvoiceable => None,
        }
    }
}

impl From<&str> for VendorNumber {
    fn from(value: &str) -> Self {
        match value {
            USER_VENDOR_PLACEHOLDER => VendorNumber::Traveler,
            "" => VendorNumber::NonInvoiceable,
            other => VendorNumber::Agency(other.to_string()),
        }
    }
}

impl From<String> for VendorNumber {
    fn from(value: String) -> Self {
        VendorNumber::from(value.as_str())
    }
}

impl From<VendorNumber> for String {
    fn from(value: VendorNumber) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for VendorNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type of an expense, carrying the vendor it is paid to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseType {
    /// Display title, e.g. "Food".
    pub title: String,
    /// Who the expense is paid to.
    pub vendor_number: VendorNumber,
}

/// An expense recorded on a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// The expense type.
    #[serde(rename = "type")]
    pub expense_type: ExpenseType,
    /// Document currency code of the amount.
    pub currency: String,
    /// The amount; `None` for expenses not filled in yet.
    pub amount: Option<Decimal>,
}

impl Expense {
    /// Returns the vendor number of the expense type.
    pub fn vendor_number(&self) -> &VendorNumber {
        &self.expense_type.vendor_number
    }
}
