//! Configuration management for mti
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence)
//! 2. Environment variables (MTI_* prefix, `__` between nested keys)
//! 3. mti.local.toml (gitignored, local overrides)
//! 4. mti.toml (git-tracked, project config)
//! 5. ~/.config/mti/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use anyhow::Result;
use mti_lods::LodsConfig;
use mti_sim::Scenario;
use mti_types::{Epc, SimulationConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE, Paths};

/// Main mti configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MtiConfig {
    pub simulation: SimulationConfig,
    pub protocol: LodsConfig,
    pub scenario: ScenarioConfig,
}

/// Population generation settings not covered by [`SimulationConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub base_epc: Epc,
    pub rssi_min_dbm: f64,
    pub rssi_max_dbm: f64,
    /// Separate population seed; defaults to the simulation seed
    pub seed: Option<u64>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let scenario = Scenario::default();
        Self {
            base_epc: scenario.base_epc,
            rssi_min_dbm: scenario.rssi_range_dbm.0,
            rssi_max_dbm: scenario.rssi_range_dbm.1,
            seed: None,
        }
    }
}

impl MtiConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parse a single TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.protocol.validate()?;
        if self.scenario.rssi_min_dbm > self.scenario.rssi_max_dbm {
            return Err(ConfigError::ValidationError(format!(
                "scenario RSSI range [{}, {}] is empty",
                self.scenario.rssi_min_dbm, self.scenario.rssi_max_dbm
            )));
        }
        Ok(())
    }

    /// Population described by this configuration
    pub fn scenario(&self) -> Scenario {
        Scenario {
            total_tags: self.simulation.total_tags,
            missing_rate: self.simulation.missing_rate,
            base_epc: self.scenario.base_epc,
            seed: self.scenario.seed.unwrap_or(self.simulation.seed),
            rssi_range_dbm: (self.scenario.rssi_min_dbm, self.scenario.rssi_max_dbm),
        }
    }
}
