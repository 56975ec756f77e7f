//! Travel Cost Engine
//!
//! This crate computes what a trip costs and what still has to be posted
//! for it: the Daily Subsistence Allowance (DSA) owed per calendar day, a
//! cost summary in local and USD currency, and delta invoices against the
//! invoices already posted, so a cost share is never paid twice or short.
//!
//! # Example
//!
//! ```no_run
//! use travel_cost_engine::calculation::summarize_costs;
//! use travel_cost_engine::config::ConfigLoader;
//! use travel_cost_engine::models::{Traveler, Trip};
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! let trip = Trip::new(
//!     "2024/1",
//!     Traveler { id: "t-1".to_string(), vendor_number: "V-T".to_string() },
//!     "USD",
//! );
//! let summary = summarize_costs(&trip, config.reference_data(), config.workspace()).unwrap();
//! println!("Paid to traveler: {}", summary.paid_to_traveler);
//! ```

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod invoicing;
pub mod models;
pub mod workflow;
