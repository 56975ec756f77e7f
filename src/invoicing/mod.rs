//! Delta invoicing.
//!
//! The [`InvoiceMaker`] turns the difference between a trip's current cost
//! distribution and its posted invoices into new pending invoices, writing
//! through an [`InvoiceStore`].

mod maker;
mod store;

pub use maker::{
    InvoiceMaker, VendorDistribution, current_distribution, delta_distribution,
    historic_distribution,
};
pub use store::{InMemoryInvoiceStore, InvoiceStore};
