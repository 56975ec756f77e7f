//! Invoice persistence seam.
//!
//! The invoice maker writes through [`InvoiceStore`]. Every write for a trip
//! happens inside [`InvoiceStore::transaction`], which holds an exclusive
//! lock on that trip and commits only when the closure succeeds. Different
//! trips never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Invoice, InvoiceStatus};

/// Storage for the invoices of trips.
pub trait InvoiceStore: Send + Sync {
    /// Runs `work` on the invoices of a trip under an exclusive trip lock.
    ///
    /// Changes made by `work` are committed when it returns `Ok` and
    /// discarded when it returns `Err`, leaving no invoice behind.
    fn transaction<T, F>(&self, trip_id: Uuid, work: F) -> EngineResult<T>
    where
        F: FnOnce(&mut Vec<Invoice>) -> EngineResult<T>;

    /// Returns a snapshot of the invoices of a trip, in creation order.
    fn invoices(&self, trip_id: Uuid) -> Vec<Invoice>;

    /// Records the outcome reported by the external finance system.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvoiceNotFound`] for an unknown reference number
    /// - [`EngineError::InvalidInvoiceStatus`] when the move breaks the
    ///   Pending → Processing → Success | Error lifecycle
    fn update_status(
        &self,
        reference_number: &str,
        status: InvoiceStatus,
        message: Option<String>,
        external_id: Option<String>,
    ) -> EngineResult<Invoice>;
}

type TripLedger = Arc<Mutex<Vec<Invoice>>>;

/// In-memory invoice store keyed by trip id.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    trips: RwLock<HashMap<Uuid, TripLedger>>,
}

impl InMemoryInvoiceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self, trip_id: Uuid) -> TripLedger {
        {
            let trips = self.trips.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ledger) = trips.get(&trip_id) {
                return Arc::clone(ledger);
            }
        }
        let mut trips = self.trips.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(trips.entry(trip_id).or_default())
    }

    fn ledgers(&self) -> Vec<TripLedger> {
        let trips = self.trips.read().unwrap_or_else(PoisonError::into_inner);
        trips.values().cloned().collect()
    }
}

impl InvoiceStore for InMemoryInvoiceStore {
    fn transaction<T, F>(&self, trip_id: Uuid, work: F) -> EngineResult<T>
    where
        F: FnOnce(&mut Vec<Invoice>) -> EngineResult<T>,
    {
        let ledger = self.ledger(trip_id);
        let mut committed = ledger.lock().unwrap_or_else(PoisonError::into_inner);

        let mut working = committed.clone();
        let result = work(&mut working)?;
        *committed = working;
        Ok(result)
    }

    fn invoices(&self, trip_id: Uuid) -> Vec<Invoice> {
        let ledger = self.ledger(trip_id);
        let invoices = ledger.lock().unwrap_or_else(PoisonError::into_inner);
        invoices.clone()
    }

    fn update_status(
        &self,
        reference_number: &str,
        status: InvoiceStatus,
        message: Option<String>,
        external_id: Option<String>,
    ) -> EngineResult<Invoice> {
        for ledger in self.ledgers() {
            let mut invoices = ledger.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(invoice) = invoices
                .iter_mut()
                .find(|invoice| invoice.reference_number == reference_number)
            else {
                continue;
            };

            if !invoice.status.can_move_to(status) {
                return Err(EngineError::InvalidInvoiceStatus {
                    reference_number: reference_number.to_string(),
                    from: invoice.status.as_str().to_string(),
                    to: status.as_str().to_string(),
                });
            }

            invoice.status = status;
            invoice.messages.extend(message);
            if external_id.is_some() {
                invoice.external_id = external_id;
            }
            debug!(reference_number = %reference_number, status = status.as_str(), "Invoice status updated");
            return Ok(invoice.clone());
        }

        Err(EngineError::InvoiceNotFound {
            reference_number: reference_number.to_string(),
        })
    }
}
