//! Cost summary of a trip.
//!
//! Merges the DSA calculation and the expense aggregation into a single
//! record with all figures quantized.

use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::config::{ReferenceData, WorkspaceConfig};
use crate::error::EngineResult;
use crate::models::{CostSummary, CurrencyTotal, DetailedDsa, ExpenseLine, Trip};

use super::dsa::calculate_dsa;
use super::expenses::{aggregate_expenses, quantize};

/// Computes the cost summary of a trip.
///
/// `paid_to_traveler` is the DSA paid plus the expenses incurred by the
/// traveler. The expense deltas compare the preserved snapshot with the
/// current totals and are zero while no snapshot exists.
///
/// # Errors
///
/// Propagates every error of [`calculate_dsa`] and [`aggregate_expenses`];
/// no partial summary is produced.
pub fn summarize_costs(
    trip: &Trip,
    reference_data: &ReferenceData,
    workspace: &WorkspaceConfig,
) -> EngineResult<CostSummary> {
    let start_time = Instant::now();

    let dsa = calculate_dsa(trip, reference_data, workspace.timezone)?;
    let expenses = aggregate_expenses(trip, reference_data)?;

    let expenses_local_total = quantize(expenses.local_total);
    let expenses_usd_total = quantize(expenses.usd_total);
    let expenses_delta_local = trip
        .preserved_expenses_local
        .map(|preserved| quantize(preserved - expenses.local_total))
        .unwrap_or_else(|| quantize(Decimal::ZERO));
    let expenses_delta_usd = trip
        .preserved_expenses_usd
        .map(|preserved| quantize(preserved - expenses.usd_total))
        .unwrap_or_else(|| quantize(Decimal::ZERO));

    let paid_to_traveler = quantize(dsa.paid_to_traveler + expenses.traveler_total);

    let detailed: Vec<DetailedDsa> = dsa
        .detailed_dsa
        .into_iter()
        .map(|group| DetailedDsa {
            daily_rate: quantize(group.daily_rate),
            paid_to_traveler: quantize(group.paid_to_traveler),
            total_amount: quantize(group.total_amount),
            deduction: quantize(group.deduction),
            ..group
        })
        .collect();

    let expenses_total = expenses
        .per_currency
        .into_iter()
        .map(|total| CurrencyTotal {
            amount: quantize(total.amount),
            ..total
        })
        .collect();

    let expense_lines = expenses
        .lines
        .into_iter()
        .map(|line| ExpenseLine {
            amount: quantize(line.amount),
            ..line
        })
        .collect();

    let mut audit_trace = dsa.audit_trace;
    audit_trace.duration_us = start_time.elapsed().as_micros() as u64;

    let summary = CostSummary {
        summary_id: Uuid::new_v4(),
        computed_at: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        trip_reference: trip.reference_number.clone(),
        currency: trip.currency.clone(),
        dsa_total: quantize(dsa.total_dsa),
        dsa: detailed,
        deductions_total: quantize(dsa.total_deductions),
        traveler_dsa: quantize(dsa.paid_to_traveler),
        expenses_total,
        expenses_local_total,
        expenses_usd_total,
        preserved_expenses_local: trip.preserved_expenses_local,
        preserved_expenses_usd: trip.preserved_expenses_usd,
        expenses_delta_local,
        expenses_delta_usd,
        expenses: expense_lines,
        paid_to_traveler,
        audit_trace,
    };

    info!(
        trip_reference = %summary.trip_reference,
        dsa_total = %summary.dsa_total,
        paid_to_traveler = %summary.paid_to_traveler,
        duration_us = summary.audit_trace.duration_us,
        "Cost summary computed"
    );

    Ok(summary)
}
