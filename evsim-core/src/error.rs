//! Error types for the simulation core

use std::path::PathBuf;
use thiserror::Error;

/// Contract violations at the engine entry point.
///
/// Physical anomalies (empty pack, overheating, isolation faults) are state,
/// not errors.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("timestep must be finite and non-negative, got {0}")]
    InvalidTimestep(f64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),

    #[error("no configuration file found")]
    NotFound,
}
