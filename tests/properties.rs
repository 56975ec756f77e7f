//! Property-based tests for the calculation and invoicing invariants.
//!
//! These tests generate random itineraries, deductions, expenses and cost
//! share splits with proptest and check the relations every result must
//! satisfy.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use travel_cost_engine::calculation::{calculate_dsa, rate_in_force};
use travel_cost_engine::config::{DsaRate, DsaRegion, ReferenceData, WorkspaceConfig};
use travel_cost_engine::invoicing::{InMemoryInvoiceStore, InvoiceMaker, InvoiceStore};
use travel_cost_engine::models::{
    CostShare, Deduction, Expense, ExpenseType, InvoiceStatus, ItineraryLeg, LAST_DAY_FACTOR,
    Traveler, Trip, VendorNumber,
};

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn at(offset: u32, hour: u32) -> DateTime<Utc> {
    let date = start_date() + Duration::days(i64::from(offset));
    Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
}

fn region(id: u32, usd: i64, usd_over60: i64) -> DsaRegion {
    DsaRegion {
        id,
        country: "Kenya".to_string(),
        area_name: format!("Area {}", id),
        area_code: format!("A{}", id),
        rates: vec![DsaRate {
            effective_from: start_date(),
            local: Decimal::new(usd * 100, 0),
            local_over60: Decimal::new(usd_over60 * 100, 0),
            usd: Decimal::new(usd, 0),
            usd_over60: Decimal::new(usd_over60, 0),
        }],
    }
}

fn reference_data() -> ReferenceData {
    ReferenceData::new(vec![region(1, 100, 75), region(2, 200, 150)], vec![]).unwrap()
}

fn workspace() -> WorkspaceConfig {
    WorkspaceConfig {
        business_area_code: "BA".to_string(),
        timezone: chrono_tz::UTC,
        threshold_traveler_usd: None,
        threshold_agency_usd: None,
    }
}

fn leg(departure: DateTime<Utc>, arrival: DateTime<Utc>, region: u32) -> ItineraryLeg {
    ItineraryLeg {
        origin: "A".to_string(),
        destination: "B".to_string(),
        departure_at: departure,
        arrival_at: arrival,
        dsa_region: Some(region),
        overnight_travel: false,
        mode_of_travel: None,
    }
}

fn new_trip() -> Trip {
    Trip::new(
        "2024/1",
        Traveler {
            id: "t-1".to_string(),
            vendor_number: "V-T".to_string(),
        },
        "USD",
    )
}

/// Strategy for a trip of 2 to 90 days with region changes and deductions.
fn dsa_trip_strategy() -> impl Strategy<Value = Trip> {
    (2u32..=90)
        .prop_flat_map(|length| {
            (
                Just(length),
                1u32..=2,
                prop::collection::vec((0u32..1000, 1u32..=2), 0..5),
                prop::collection::vec(
                    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()),
                    length as usize,
                ),
            )
        })
        .prop_map(|(length, first_region, stops, flags)| {
            let mut trip = new_trip();
            // Stops fall strictly between the first and the last day
            let mut by_day = BTreeMap::new();
            if length > 2 {
                for (seed, region) in stops {
                    by_day.insert(1 + seed % (length - 2), region);
                }
            }

            trip.itinerary.push(leg(at(0, 8), at(0, 10), first_region));
            for (offset, region) in by_day {
                trip.itinerary.push(leg(at(offset, 8), at(offset, 10), region));
            }
            trip.itinerary
                .push(leg(at(length - 1, 16), at(length - 1, 18), first_region));

            for (offset, (breakfast, lunch, dinner, accommodation, no_dsa)) in
                flags.into_iter().enumerate()
            {
                let mut deduction = Deduction::new(start_date() + Duration::days(offset as i64));
                deduction.breakfast = breakfast;
                deduction.lunch = lunch;
                deduction.dinner = dinner;
                deduction.accommodation = accommodation;
                deduction.no_dsa = no_dsa;
                trip.deductions.push(deduction);
            }
            trip
        })
}

/// Strategy for cost shares summing to 100.
fn cost_shares_strategy() -> impl Strategy<Value = Vec<CostShare>> {
    prop::collection::btree_set(1u32..100, 0..4).prop_map(|cuts: BTreeSet<u32>| {
        let mut bounds: Vec<u32> = vec![0];
        bounds.extend(cuts);
        bounds.push(100);
        bounds
            .windows(2)
            .enumerate()
            .map(|(index, pair)| CostShare {
                wbs: format!("W{}", index + 1),
                grant: format!("G{}", index + 1),
                fund: format!("F{}", index + 1),
                share: pair[1] - pair[0],
            })
            .collect()
    })
}

/// Strategy for expenses across the traveler, two agencies and a
/// non-invoiceable bucket.
fn expenses_strategy() -> impl Strategy<Value = Vec<Expense>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["user", "a_nico", "a_torben", ""]),
            prop::option::weighted(0.9, 0i64..1_000_000),
        ),
        0..8,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(vendor, cents)| Expense {
                expense_type: ExpenseType {
                    title: "Expense".to_string(),
                    vendor_number: VendorNumber::from(vendor),
                },
                currency: "USD".to_string(),
                amount: cents.map(|cents| Decimal::new(cents, 2)),
            })
            .collect()
    })
}

fn post_all(store: &InMemoryInvoiceStore, trip: &Trip) {
    for invoice in store.invoices(trip.id) {
        if invoice.status == InvoiceStatus::Pending {
            store
                .update_status(&invoice.reference_number, InvoiceStatus::Processing, None, None)
                .unwrap();
            store
                .update_status(&invoice.reference_number, InvoiceStatus::Success, None, None)
                .unwrap();
        }
    }
}

proptest! {
    /// Property: no day pays out a negative amount.
    #[test]
    fn prop_final_amount_never_negative(trip in dsa_trip_strategy()) {
        let result = calculate_dsa(&trip, &reference_data(), chrono_tz::UTC).unwrap();
        for day in &result.days {
            prop_assert!(day.final_amount() >= Decimal::ZERO);
        }
    }

    /// Property: deductions never exceed the day's amount, and on the last
    /// day never exceed the part left after the last-day withholding.
    #[test]
    fn prop_deduction_capped(trip in dsa_trip_strategy()) {
        let result = calculate_dsa(&trip, &reference_data(), chrono_tz::UTC).unwrap();
        for day in &result.days {
            prop_assert!(day.deduction() <= day.dsa_amount);
            if day.last_day {
                prop_assert!(day.deduction() <= (Decimal::ONE - LAST_DAY_FACTOR) * day.dsa_amount);
            }
        }
    }

    /// Property: paid to traveler equals total DSA less total deductions.
    #[test]
    fn prop_aggregation_identity(trip in dsa_trip_strategy()) {
        let result = calculate_dsa(&trip, &reference_data(), chrono_tz::UTC).unwrap();
        let final_sum: Decimal = result.days.iter().map(|day| day.final_amount()).sum();
        prop_assert_eq!(result.paid_to_traveler, final_sum);
        prop_assert_eq!(result.paid_to_traveler, result.total_dsa - result.total_deductions);
    }

    /// Property: no detailed DSA group spans both sides of day 60.
    #[test]
    fn prop_over_60_boundary_respected(trip in dsa_trip_strategy()) {
        let result = calculate_dsa(&trip, &reference_data(), chrono_tz::UTC).unwrap();
        for group in &result.detailed_dsa {
            let indexes: Vec<u32> = result
                .days
                .iter()
                .filter(|day| day.date >= group.start_date && day.date <= group.end_date)
                .map(|day| day.day_index)
                .collect();
            let below = indexes.iter().all(|index| *index <= 60);
            let above = indexes.iter().all(|index| *index > 60);
            prop_assert!(below || above);
        }
    }

    /// Property: the rate in force is the latest one starting on or before the
    /// date, whatever the order of the history.
    #[test]
    fn prop_rate_selection(
        offsets in prop::collection::btree_set(0u32..400, 1..6)
            .prop_flat_map(|offsets| Just(offsets.into_iter().collect::<Vec<u32>>()).prop_shuffle()),
        query in 0u32..500,
    ) {
        let rates: Vec<DsaRate> = offsets
            .iter()
            .map(|offset| DsaRate {
                effective_from: start_date() + Duration::days(i64::from(*offset)),
                local: Decimal::from(*offset),
                local_over60: Decimal::from(*offset),
                usd: Decimal::from(*offset),
                usd_over60: Decimal::from(*offset),
            })
            .collect();
        let region = DsaRegion { rates, ..region(1, 100, 75) };
        let date = start_date() + Duration::days(i64::from(query));

        let expected = offsets.iter().filter(|offset| **offset <= query).max();
        match (rate_in_force(&region, date), expected) {
            (Ok(rate), Some(offset)) => {
                prop_assert_eq!(rate.effective_from, start_date() + Duration::days(i64::from(*offset)));
            }
            (Err(_), None) => {}
            (result, expected) => {
                prop_assert!(false, "rate lookup {:?} disagrees with {:?}", result, expected);
            }
        }
    }

    /// Property: a second run with no change in between creates nothing.
    #[test]
    fn prop_invoicing_idempotent(
        expenses in expenses_strategy(),
        cost_shares in cost_shares_strategy(),
    ) {
        let store = InMemoryInvoiceStore::new();
        let workspace = workspace();
        let maker = InvoiceMaker::new(&store, &workspace);
        let mut trip = new_trip();
        trip.expenses = expenses;
        trip.cost_shares = cost_shares;

        maker.generate_invoices(&trip).unwrap();
        post_all(&store, &trip);

        prop_assert!(maker.generate_invoices(&trip).unwrap().is_empty());
    }

    /// Property: the lines of a run add up to the invoiceable expenses not
    /// yet posted, and no invoice or line is zero.
    #[test]
    fn prop_share_conservation(
        before in expenses_strategy(),
        after in expenses_strategy(),
        cost_shares in cost_shares_strategy(),
    ) {
        let store = InMemoryInvoiceStore::new();
        let workspace = workspace();
        let maker = InvoiceMaker::new(&store, &workspace);
        let mut trip = new_trip();
        trip.cost_shares = cost_shares;

        let invoiceable = |expenses: &[Expense]| -> Decimal {
            expenses
                .iter()
                .filter(|expense| *expense.vendor_number() != VendorNumber::NonInvoiceable)
                .filter_map(|expense| expense.amount)
                .sum()
        };

        trip.expenses = before;
        maker.generate_invoices(&trip).unwrap();
        post_all(&store, &trip);
        let historic: Decimal = store
            .invoices(trip.id)
            .iter()
            .map(|invoice| invoice.amount)
            .sum();
        prop_assert_eq!(historic, invoiceable(&trip.expenses));

        trip.expenses = after;
        let created = maker.generate_invoices(&trip).unwrap();
        let created_sum: Decimal = created
            .iter()
            .flat_map(|invoice| invoice.lines.iter())
            .map(|line| line.amount)
            .sum();
        prop_assert_eq!(created_sum, invoiceable(&trip.expenses) - historic);

        for invoice in &created {
            prop_assert!(!invoice.lines.is_empty());
            prop_assert!(invoice.lines.iter().all(|line| !line.amount.is_zero()));
        }
    }
}
