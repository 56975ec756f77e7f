//! Invoice and invoice line models.
//!
//! Amount sign convention: positive is a credit, negative is a debit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BudgetKey;

/// Posting state of an invoice in the external finance system.
///
/// Only [`InvoiceStatus::Success`] invoices are part of the posted history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Created, not yet exported.
    Pending,
    /// Exported, waiting for acknowledgement.
    Processing,
    /// Posted.
    Success,
    /// Rejected by the finance system.
    Error,
}

impl InvoiceStatus {
    /// Returns the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Processing => "processing",
            InvoiceStatus::Success => "success",
            InvoiceStatus::Error => "error",
        }
    }

    /// Returns whether the external posting lifecycle allows moving to `next`.
    ///
    /// Pending invoices are picked up for export, exported invoices resolve
    /// to success or error. Posted invoices are final.
    pub fn can_move_to(&self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (InvoiceStatus::Pending, InvoiceStatus::Processing)
                | (InvoiceStatus::Processing, InvoiceStatus::Success)
                | (InvoiceStatus::Processing, InvoiceStatus::Error)
        )
    }
}

/// Direction of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingKey {
    /// Amount ≥ 0.
    Credit,
    /// Amount < 0.
    Debit,
}

impl PostingKey {
    fn of(amount: Decimal) -> Self {
        if amount >= Decimal::ZERO {
            PostingKey::Credit
        } else {
            PostingKey::Debit
        }
    }
}

/// One budget coordinate of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Work breakdown structure element.
    pub wbs: String,
    /// Grant.
    pub grant: String,
    /// Fund.
    pub fund: String,
    /// Signed amount.
    pub amount: Decimal,
}

impl InvoiceLine {
    /// Creates a line for a budget coordinate.
    pub fn new(key: &BudgetKey, amount: Decimal) -> Self {
        Self {
            wbs: key.wbs.clone(),
            grant: key.grant.clone(),
            fund: key.fund.clone(),
            amount,
        }
    }

    /// Returns the budget coordinate of this line.
    pub fn key(&self) -> BudgetKey {
        BudgetKey::new(self.wbs.as_str(), self.grant.as_str(), self.fund.as_str())
    }

    /// Returns whether the line credits or debits.
    pub fn posting_key(&self) -> PostingKey {
        PostingKey::of(self.amount)
    }

    /// Returns the absolute amount without trailing zeros.
    pub fn normalized_amount(&self) -> Decimal {
        self.amount.abs().normalize()
    }
}

/// A grouped financial posting request for one vendor of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Identifier.
    pub id: Uuid,
    /// The owning trip.
    pub trip_id: Uuid,
    /// `{businessArea}/{tripReference}/{NN}`, unique.
    pub reference_number: String,
    /// The `NN` part of the reference number.
    pub sequence: u32,
    /// Business area code of the workspace.
    pub business_area: String,
    /// Vendor the invoice is addressed to.
    pub vendor_number: String,
    /// Currency code.
    pub currency: String,
    /// Sum of the line amounts.
    pub amount: Decimal,
    /// Posting state.
    pub status: InvoiceStatus,
    /// Messages returned by the finance system.
    #[serde(default)]
    pub messages: Vec<String>,
    /// Identifier assigned by the finance system.
    #[serde(default)]
    pub external_id: Option<String>,
    /// Lines, one per budget coordinate.
    pub lines: Vec<InvoiceLine>,
}

impl Invoice {
    /// Returns whether the invoice credits or debits.
    pub fn posting_key(&self) -> PostingKey {
        PostingKey::of(self.amount)
    }

    /// Returns the absolute amount without trailing zeros.
    pub fn normalized_amount(&self) -> Decimal {
        self.amount.abs().normalize()
    }

    /// Returns true when the invoice counts as posted history.
    pub fn is_posted(&self) -> bool {
        self.status == InvoiceStatus::Success
    }
}

/// Formats an invoice reference number.
///
/// # Example
///
/// ```
/// use travel_cost_engine::models::invoice_reference_number;
///
/// assert_eq!(invoice_reference_number("0060", "2024/17", 3), "0060/2024/17/03");
/// ```
pub fn invoice_reference_number(business_area: &str, trip_reference: &str, sequence: u32) -> String {
    format!("{}/{}/{:02}", business_area, trip_reference, sequence)
}
