//! Error types for the BB84 simulator.

use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a quantum oracle backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("state is not normalized: norm squared {0}")]
    NotNormalized(f64),

    #[error("oracle backend failure: {0}")]
    Backend(String),
}

/// Errors raised by the protocol engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A numeric input is outside its allowed range. Blocks the run before it starts.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("quantum oracle failed: {0}")]
    Oracle(#[from] OracleError),
}

impl SimulationError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        SimulationError::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] SimulationError),
}
