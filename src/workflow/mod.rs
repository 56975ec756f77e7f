//! Trip workflow.
//!
//! The state machine transitions that drive the engine (approval records
//! the approved costs, sending for payment checks thresholds and invoices)
//! and the process-wide trip reference sequence.

mod reference;
mod transitions;

pub use reference::TripReferenceSequence;
pub use transitions::{SendForPaymentOutcome, TripWorkflow};
