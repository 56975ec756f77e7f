//! Trip state machine.
//!
//! Each transition checks the source status, runs its guards, applies its
//! side effects and only then moves the trip. A refused transition leaves
//! the trip untouched.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::calculation::{aggregate_expenses, check_thresholds, expense_totals_by_side, quantize};
use crate::config::{ReferenceData, WorkspaceConfig};
use crate::error::{EngineError, EngineResult};
use crate::invoicing::{InvoiceMaker, InvoiceStore};
use crate::models::{Invoice, InvoiceStatus, Trip, TripStatus};

/// Outcome of [`TripWorkflow::send_for_payment`].
#[derive(Debug, Clone, PartialEq)]
pub enum SendForPaymentOutcome {
    /// The trip went to finance with these newly created invoices.
    SentForPayment {
        /// Invoices created by this send; empty when nothing changed.
        invoices: Vec<Invoice>,
    },
    /// Expenses grew past a threshold; the trip is back in `Submitted`.
    ReturnedForApproval {
        /// "traveler" or "agency".
        side: String,
        /// The delta that exceeded the threshold.
        delta: Decimal,
        /// The configured threshold.
        threshold: Decimal,
    },
}

/// Runs trip transitions against a workspace and an invoice store.
#[derive(Debug)]
pub struct TripWorkflow<'a, S: InvoiceStore> {
    store: &'a S,
    workspace: &'a WorkspaceConfig,
    reference_data: &'a ReferenceData,
}

impl<'a, S: InvoiceStore> TripWorkflow<'a, S> {
    /// Creates a workflow bound to a store and configuration.
    pub fn new(
        store: &'a S,
        workspace: &'a WorkspaceConfig,
        reference_data: &'a ReferenceData,
    ) -> Self {
        Self {
            store,
            workspace,
            reference_data,
        }
    }

    /// Sends a trip to its supervisor.
    ///
    /// Allowed from `Planned`, `Rejected` and `SentForPayment`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidTransition`] from any other status
    /// - [`EngineError::TransitionRefused`] while invoices await posting,
    ///   or when a trip requiring a travel authorization has fewer than two
    ///   legs or a leg without DSA region
    pub fn submit_for_approval(&self, trip: &mut Trip) -> EngineResult<()> {
        const TRANSITION: &str = "submit_for_approval";
        ensure_source(
            trip,
            TRANSITION,
            &[TripStatus::Planned, TripStatus::Rejected, TripStatus::SentForPayment],
        )?;
        self.ensure_no_unposted_invoices(trip, TRANSITION)?;

        if trip.ta_required {
            if trip.itinerary.len() < 2 {
                return Err(refused(trip, TRANSITION, "itinerary needs at least two legs"));
            }
            if trip.itinerary.iter().any(|leg| leg.dsa_region.is_none()) {
                return Err(refused(trip, TRANSITION, "every leg needs a DSA region"));
            }
        }

        trip.submitted_at = Some(Utc::now());
        move_to(trip, TRANSITION, TripStatus::Submitted);
        Ok(())
    }

    /// Approves a submitted trip and records the approved costs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] unless the trip is `Submitted`.
    pub fn approve(&self, trip: &mut Trip) -> EngineResult<()> {
        const TRANSITION: &str = "approve";
        ensure_source(trip, TRANSITION, &[TripStatus::Submitted])?;

        let (traveler, agencies) = expense_totals_by_side(trip);
        trip.approved_cost_traveler = Some(quantize(traveler));
        trip.approved_cost_agencies = Some(quantize(agencies));
        trip.approved_at = Some(Utc::now());
        move_to(trip, TRANSITION, TripStatus::Approved);
        Ok(())
    }

    /// Rejects a submitted trip.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] unless the trip is `Submitted`.
    pub fn reject(&self, trip: &mut Trip) -> EngineResult<()> {
        const TRANSITION: &str = "reject";
        ensure_source(trip, TRANSITION, &[TripStatus::Submitted])?;
        move_to(trip, TRANSITION, TripStatus::Rejected);
        Ok(())
    }

    /// Cancels a trip that has not been certified yet.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] from `Cancelled`,
    /// `Certified` and `Completed`.
    pub fn cancel(&self, trip: &mut Trip) -> EngineResult<()> {
        const TRANSITION: &str = "cancel";
        ensure_source(
            trip,
            TRANSITION,
            &[
                TripStatus::Planned,
                TripStatus::Submitted,
                TripStatus::Rejected,
                TripStatus::Approved,
                TripStatus::SentForPayment,
            ],
        )?;
        move_to(trip, TRANSITION, TripStatus::Cancelled);
        Ok(())
    }

    /// Reopens a cancelled or rejected trip for editing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] from any other status.
    pub fn plan(&self, trip: &mut Trip) -> EngineResult<()> {
        const TRANSITION: &str = "plan";
        ensure_source(trip, TRANSITION, &[TripStatus::Cancelled, TripStatus::Rejected])?;
        move_to(trip, TRANSITION, TripStatus::Planned);
        Ok(())
    }

    /// Hands an approved trip over to finance.
    ///
    /// When expenses grew past a workspace threshold since approval, the
    /// trip goes back to `Submitted` instead and nothing is invoiced.
    /// Otherwise the expense totals are preserved on the first send, delta
    /// invoices are generated, and the trip moves to `SentForPayment`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidTransition`] unless the trip is `Approved`
    /// - any error of [`aggregate_expenses`] or
    ///   [`InvoiceMaker::generate_invoices`]; the trip is left untouched
    pub fn send_for_payment(&self, trip: &mut Trip) -> EngineResult<SendForPaymentOutcome> {
        const TRANSITION: &str = "send_for_payment";
        ensure_source(trip, TRANSITION, &[TripStatus::Approved])?;

        match check_thresholds(trip, self.workspace, self.reference_data) {
            Ok(()) => {}
            Err(EngineError::ThresholdExceeded {
                side,
                delta,
                threshold,
            }) => {
                warn!(
                    trip_reference = %trip.reference_number,
                    side = %side,
                    "Send for payment refused, returning trip for approval"
                );
                trip.submitted_at = Some(Utc::now());
                move_to(trip, TRANSITION, TripStatus::Submitted);
                return Ok(SendForPaymentOutcome::ReturnedForApproval {
                    side,
                    delta,
                    threshold,
                });
            }
            Err(other) => return Err(other),
        }

        let snapshot = if trip.preserved_expenses_local.is_none() {
            let expenses = aggregate_expenses(trip, self.reference_data)?;
            Some((quantize(expenses.local_total), quantize(expenses.usd_total)))
        } else {
            None
        };

        let invoices = InvoiceMaker::new(self.store, self.workspace).generate_invoices(trip)?;

        if let Some((local, usd)) = snapshot {
            trip.preserved_expenses_local = Some(local);
            trip.preserved_expenses_usd = Some(usd);
        }
        move_to(trip, TRANSITION, TripStatus::SentForPayment);
        Ok(SendForPaymentOutcome::SentForPayment { invoices })
    }

    /// Certifies the expenses of a trip sent for payment.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidTransition`] unless the trip is `SentForPayment`
    /// - [`EngineError::TransitionRefused`] while invoices await posting
    pub fn mark_as_certified(&self, trip: &mut Trip) -> EngineResult<()> {
        const TRANSITION: &str = "mark_as_certified";
        ensure_source(trip, TRANSITION, &[TripStatus::SentForPayment])?;
        self.ensure_no_unposted_invoices(trip, TRANSITION)?;
        move_to(trip, TRANSITION, TripStatus::Certified);
        Ok(())
    }

    /// Closes a trip.
    ///
    /// Certified trips can always be completed. A submitted trip can be
    /// closed directly only when it is international.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidTransition`] unless the trip is `Certified`
    ///   or `Submitted`
    /// - [`EngineError::TransitionRefused`] for a submitted domestic trip
    pub fn mark_as_completed(&self, trip: &mut Trip) -> EngineResult<()> {
        const TRANSITION: &str = "mark_as_completed";
        ensure_source(trip, TRANSITION, &[TripStatus::Certified, TripStatus::Submitted])?;
        if trip.status == TripStatus::Submitted && !trip.international_travel {
            return Err(refused(
                trip,
                TRANSITION,
                "only international trips can be completed without certification",
            ));
        }
        trip.completed_at = Some(Utc::now());
        move_to(trip, TRANSITION, TripStatus::Completed);
        Ok(())
    }

    fn ensure_no_unposted_invoices(&self, trip: &Trip, transition: &str) -> EngineResult<()> {
        let waiting = self.store.invoices(trip.id).iter().any(|invoice| {
            matches!(invoice.status, InvoiceStatus::Pending | InvoiceStatus::Processing)
        });
        if waiting {
            return Err(refused(trip, transition, "invoices are waiting for posting"));
        }
        Ok(())
    }
}

fn ensure_source(trip: &Trip, transition: &str, allowed: &[TripStatus]) -> EngineResult<()> {
    if allowed.contains(&trip.status) {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition {
            trip_reference: trip.reference_number.clone(),
            transition: transition.to_string(),
            status: trip.status.to_string(),
        })
    }
}

fn refused(trip: &Trip, transition: &str, reason: &str) -> EngineError {
    EngineError::TransitionRefused {
        trip_reference: trip.reference_number.clone(),
        transition: transition.to_string(),
        reason: reason.to_string(),
    }
}

fn move_to(trip: &mut Trip, transition: &str, target: TripStatus) {
    info!(
        trip_reference = %trip.reference_number,
        transition = transition,
        from = %trip.status,
        to = %target,
        "Trip transition"
    );
    trip.status = target;
}
