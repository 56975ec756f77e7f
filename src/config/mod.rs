//! Configuration loading and management for the travel cost engine.
//!
//! This module loads the workspace configuration (business area, timezone,
//! thresholds) and the shared reference data (DSA regions with their rate
//! history, currencies with their exchange rates) from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use travel_cost_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Timezone: {}", config.workspace().timezone);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    CurrenciesConfig, Currency, DsaRate, DsaRegion, ExchangeRate, ReferenceData, RegionId,
    RegionsConfig, USD_CODE, WorkspaceConfig,
};
