//! Delta invoice generation.
//!
//! Invoices are never edited once created. Each run compares the cost
//! share distribution of the current expenses with what posted invoices
//! already booked, and emits one pending invoice per vendor covering the
//! difference.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::WorkspaceConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BudgetKey, Invoice, InvoiceLine, InvoiceStatus, Trip, invoice_reference_number, total_share,
};

use super::store::InvoiceStore;

/// Amounts per vendor and budget coordinate.
pub type VendorDistribution = BTreeMap<String, BTreeMap<BudgetKey, Decimal>>;

/// Sums the lines of posted invoices per vendor and budget coordinate.
///
/// Only [`InvoiceStatus::Success`] invoices count.
pub fn historic_distribution(invoices: &[Invoice]) -> VendorDistribution {
    let mut historic = VendorDistribution::new();
    for invoice in invoices.iter().filter(|invoice| invoice.is_posted()) {
        let vendor = historic.entry(invoice.vendor_number.clone()).or_default();
        for line in &invoice.lines {
            *vendor.entry(line.key()).or_default() += line.amount;
        }
    }
    historic
}

/// Distributes the trip's expenses over its cost shares per vendor.
///
/// Traveler expenses are booked on the traveler's own vendor number;
/// non-invoiceable expenses and expenses without amount are left out.
pub fn current_distribution(trip: &Trip) -> VendorDistribution {
    let hundred = Decimal::ONE_HUNDRED;
    let mut current = VendorDistribution::new();
    for expense in &trip.expenses {
        let Some(amount) = expense.amount else {
            continue;
        };
        let Some(vendor_number) = expense
            .vendor_number()
            .invoice_vendor(&trip.traveler.vendor_number)
        else {
            continue;
        };

        let vendor = current.entry(vendor_number.to_string()).or_default();
        for cost_share in &trip.cost_shares {
            *vendor.entry(cost_share.key()).or_default() +=
                amount * Decimal::from(cost_share.share) / hundred;
        }
    }
    current
}

/// Computes `current − historic` per vendor and coordinate.
///
/// Vendors and coordinates present on only one side are kept; zero
/// amounts are dropped, and so are vendors left without any line.
pub fn delta_distribution(
    current: &VendorDistribution,
    historic: &VendorDistribution,
) -> VendorDistribution {
    let mut delta = VendorDistribution::new();

    for (vendor, lines) in current {
        let entry: &mut BTreeMap<BudgetKey, Decimal> = delta.entry(vendor.clone()).or_default();
        for (key, amount) in lines {
            *entry.entry(key.clone()).or_default() += *amount;
        }
    }
    for (vendor, lines) in historic {
        let entry = delta.entry(vendor.clone()).or_default();
        for (key, amount) in lines {
            *entry.entry(key.clone()).or_default() -= *amount;
        }
    }

    for lines in delta.values_mut() {
        lines.retain(|_, amount| !amount.is_zero());
    }
    delta.retain(|_, lines| !lines.is_empty());
    delta
}

/// Generates delta invoices for trips.
#[derive(Debug)]
pub struct InvoiceMaker<'a, S: InvoiceStore> {
    store: &'a S,
    workspace: &'a WorkspaceConfig,
}

impl<'a, S: InvoiceStore> InvoiceMaker<'a, S> {
    /// Creates an invoice maker writing to `store`.
    pub fn new(store: &'a S, workspace: &'a WorkspaceConfig) -> Self {
        Self { store, workspace }
    }

    /// Creates the pending invoices needed to bring posted history in line
    /// with the trip's current expenses and cost shares.
    ///
    /// Runs in a single store transaction under the trip lock. Pending
    /// invoices of earlier runs were never exported and are superseded:
    /// they are discarded before the delta is computed. Sequence numbers
    /// continue after the highest remaining one.
    ///
    /// Returns the created invoices; an empty list when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SharesNot100`] when the cost shares do not sum
    /// to 100; nothing is written in that case.
    pub fn generate_invoices(&self, trip: &Trip) -> EngineResult<Vec<Invoice>> {
        let total = total_share(&trip.cost_shares);
        if total != 100 {
            return Err(EngineError::SharesNot100 {
                trip_reference: trip.reference_number.clone(),
                total,
            });
        }

        self.store.transaction(trip.id, |invoices| {
            let before = invoices.len();
            invoices.retain(|invoice| invoice.status != InvoiceStatus::Pending);
            let superseded = before - invoices.len();
            if superseded > 0 {
                debug!(trip_reference = %trip.reference_number, superseded, "Discarded pending invoices");
            }

            let historic = historic_distribution(invoices.as_slice());
            let current = current_distribution(trip);
            let delta = delta_distribution(&current, &historic);

            let mut sequence = invoices.iter().map(|invoice| invoice.sequence).max().unwrap_or(0);
            let mut created = Vec::new();

            for (vendor_number, lines) in delta {
                sequence += 1;
                let currency = self.invoice_currency(trip, &vendor_number, invoices.as_slice());
                let lines: Vec<InvoiceLine> = lines
                    .iter()
                    .map(|(key, amount)| InvoiceLine::new(key, *amount))
                    .collect();
                let amount: Decimal = lines.iter().map(|line| line.amount).sum();

                let invoice = Invoice {
                    id: Uuid::new_v4(),
                    trip_id: trip.id,
                    reference_number: invoice_reference_number(
                        &self.workspace.business_area_code,
                        &trip.reference_number,
                        sequence,
                    ),
                    sequence,
                    business_area: self.workspace.business_area_code.clone(),
                    vendor_number,
                    currency,
                    amount,
                    status: InvoiceStatus::Pending,
                    messages: Vec::new(),
                    external_id: None,
                    lines,
                };

                info!(
                    trip_reference = %trip.reference_number,
                    reference_number = %invoice.reference_number,
                    vendor_number = %invoice.vendor_number,
                    amount = %invoice.amount,
                    lines = invoice.lines.len(),
                    "Invoice created"
                );
                created.push(invoice);
            }

            invoices.extend(created.iter().cloned());
            Ok(created)
        })
    }

    /// Picks the document currency of a vendor's invoice.
    ///
    /// The traveler is paid in the trip currency. An external vendor is
    /// invoiced in the currency of its expenses, or of its latest invoice
    /// when all its expenses are gone.
    fn invoice_currency(&self, trip: &Trip, vendor_number: &str, invoices: &[Invoice]) -> String {
        if vendor_number == trip.traveler.vendor_number {
            return trip.currency.clone();
        }

        let from_expense = trip.expenses.iter().find(|expense| {
            expense
                .vendor_number()
                .invoice_vendor(&trip.traveler.vendor_number)
                == Some(vendor_number)
        });
        if let Some(expense) = from_expense {
            return expense.currency.clone();
        }

        invoices
            .iter()
            .filter(|invoice| invoice.vendor_number == vendor_number)
            .max_by_key(|invoice| invoice.sequence)
            .map(|invoice| invoice.currency.clone())
            .unwrap_or_else(|| trip.currency.clone())
    }
}
