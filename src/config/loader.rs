//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the workspace
//! configuration and reference data from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{CurrenciesConfig, ReferenceData, RegionsConfig, WorkspaceConfig};

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/default/
/// ├── workspace.yaml     # Business area, timezone, thresholds
/// ├── currencies.yaml    # Currencies and exchange rate history
/// └── dsa_regions.yaml   # DSA regions and their rate history
/// ```
///
/// # Example
///
/// ```no_run
/// use travel_cost_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Business area: {}", loader.workspace().business_area_code);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    workspace: WorkspaceConfig,
    reference_data: ReferenceData,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML (`ConfigParseError`)
    /// - The reference data is inconsistent (`InvalidConfig`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let workspace = Self::load_yaml::<WorkspaceConfig>(&path.join("workspace.yaml"))?;
        let currencies = Self::load_yaml::<CurrenciesConfig>(&path.join("currencies.yaml"))?;
        let regions = Self::load_yaml::<RegionsConfig>(&path.join("dsa_regions.yaml"))?;

        debug!(
            path = %path.display(),
            regions = regions.regions.len(),
            currencies = currencies.currencies.len(),
            "Loaded travel cost configuration"
        );

        let reference_data = ReferenceData::new(regions.regions, currencies.currencies)?;

        Ok(Self {
            workspace,
            reference_data,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the workspace configuration.
    pub fn workspace(&self) -> &WorkspaceConfig {
        &self.workspace
    }

    /// Returns the reference data.
    pub fn reference_data(&self) -> &ReferenceData {
        &self.reference_data
    }
}
