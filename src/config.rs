//! Simulation parameters, loadable from TOML.
//!
//! ```toml
//! num_qubits = 500
//! qber_threshold = 0.11
//! eve_intercept_prob = 1.0
//! noise_prob = 0.01
//! seed = 42
//! ```

use crate::error::{ConfigError, SimulationError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_QUBITS: usize = 200;
pub const DEFAULT_QBER_THRESHOLD: f64 = 0.11;
pub const MAX_QBER_THRESHOLD: f64 = 0.25;
pub const DEFAULT_EVE_PROB: f64 = 0.5;
pub const DEFAULT_NOISE_PROB: f64 = 0.0;
pub const DEFAULT_SECURITY_PARAM: f64 = 1e-6;
pub const DEFAULT_BATCH_SIZE: usize = 256;
pub const DEFAULT_WINDOW_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Qubits Alice sends per scenario.
    pub num_qubits: usize,
    /// QBER at or above which the run is aborted.
    pub qber_threshold: f64,
    /// Probability the eavesdropper intercepts any given qubit.
    pub eve_intercept_prob: f64,
    /// Probability of an independent bit flip on the channel.
    pub noise_prob: f64,
    /// Privacy amplification failure probability epsilon.
    pub security_param: f64,
    /// Qubits handed to the oracle per chunk.
    pub batch_size: usize,
    /// Sifted records per window in the rolling error rate.
    pub window_size: usize,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            num_qubits: DEFAULT_QUBITS,
            qber_threshold: DEFAULT_QBER_THRESHOLD,
            eve_intercept_prob: DEFAULT_EVE_PROB,
            noise_prob: DEFAULT_NOISE_PROB,
            security_param: DEFAULT_SECURITY_PARAM,
            batch_size: DEFAULT_BATCH_SIZE,
            window_size: DEFAULT_WINDOW_SIZE,
            seed: None,
        }
    }
}

pub(crate) fn check_probability(name: &'static str, p: f64) -> Result<(), SimulationError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(SimulationError::invalid(name, p, "must be within [0, 1]"));
    }
    Ok(())
}

pub(crate) fn check_security_param(epsilon: f64) -> Result<(), SimulationError> {
    if !(epsilon > 0.0 && epsilon < 1.0) {
        return Err(SimulationError::invalid(
            "security_param",
            epsilon,
            "must be within (0, 1)",
        ));
    }
    Ok(())
}

impl SimulationConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.num_qubits == 0 {
            return Err(SimulationError::invalid(
                "num_qubits",
                0.0,
                "at least one qubit is required",
            ));
        }
        if !(0.0..=MAX_QBER_THRESHOLD).contains(&self.qber_threshold) {
            return Err(SimulationError::invalid(
                "qber_threshold",
                self.qber_threshold,
                "must be within [0, 0.25]",
            ));
        }
        check_probability("eve_intercept_prob", self.eve_intercept_prob)?;
        check_probability("noise_prob", self.noise_prob)?;
        check_security_param(self.security_param)?;
        if self.batch_size == 0 {
            return Err(SimulationError::invalid(
                "batch_size",
                0.0,
                "must be at least 1",
            ));
        }
        if self.window_size == 0 {
            return Err(SimulationError::invalid(
                "window_size",
                0.0,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
