//! Configuration error types

use mti_lods::LodsConfigError;
use mti_types::ConfigInvalid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to render TOML config: {0}")]
    RenderError(#[from] toml::ser::Error),

    #[error("Invalid simulation configuration: {0}")]
    Simulation(#[from] ConfigInvalid),

    #[error("Invalid protocol configuration: {0}")]
    Protocol(#[from] LodsConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("XDG directory error: {0}")]
    XdgError(String),
}
