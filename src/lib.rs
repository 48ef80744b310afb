//! # bb84-simulator
//!
//! Simulation engine for the BB84 quantum key distribution protocol.
//!
//! Alice encodes random bits in random bases, each qubit crosses a channel
//! that may be tapped by an intercept-resend eavesdropper and may flip bits,
//! Bob measures in his own random bases. The engine then sifts matching
//! bases, measures the QBER, aborts above a threshold, and distills the
//! surviving bits into a final key by hashing.
//!
//! ```no_run
//! use bb84_simulator::prelude::*;
//!
//! let config = SimulationConfig { eve_intercept_prob: 1.0, seed: Some(7), ..Default::default() };
//! let session = run_comparison_seeded(&config, &StateVectorOracle).unwrap();
//! println!("QBER without Eve: {:.3}", session.no_eve.qber());
//! println!("QBER with Eve:    {:.3}", session.with_eve.qber());
//! ```

pub mod bb84;
pub mod bb84_states;
pub mod config;
pub mod error;
pub mod oracle;
pub mod privacy_amplification;
pub mod report;
pub mod security;
pub mod sifting;

pub mod prelude {
    pub use crate::bb84::*;
    pub use crate::bb84_states::*;
    pub use crate::config::SimulationConfig;
    pub use crate::error::{ConfigError, OracleError, SimulationError};
    pub use crate::oracle::*;
    pub use crate::privacy_amplification::{privacy_amplify, AmplifiedKey, KeyStatus};
    pub use crate::report::*;
    pub use crate::security::*;
    pub use crate::sifting::*;
}
