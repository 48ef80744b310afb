//! Quantum oracle: the encode/measure contract the protocol engine runs against.
//!
//! The engine only needs two operations from a quantum backend: prepare a
//! state from a classical bit in a basis, and measure a state in a basis.
//! Two in-process backends are provided:
//!
//! - [`StateVectorOracle`] tracks the two complex amplitudes of a qubit,
//!   applies X and H gates, and samples measurements with the Born rule.
//! - [`BB84StateOracle`] works directly on the four BB84 states; a measurement
//!   in the state's own basis is deterministic, any other basis gives a fair coin.

use crate::bb84_states::{random_bit, BB84State, MeasurementBasis};
use crate::error::OracleError;
use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::FRAC_1_SQRT_2;

const NORM_TOLERANCE: f64 = 1e-9;

pub trait QuantumOracle {
    type State;

    /// Prepare the state encoding `bit` in `basis`.
    fn encode(&self, bit: bool, basis: MeasurementBasis) -> Result<Self::State, OracleError>;

    /// Measure `state` in `basis`, consuming it.
    fn measure<R: Rng + ?Sized>(
        &self,
        state: Self::State,
        basis: MeasurementBasis,
        rng: &mut R,
    ) -> Result<bool, OracleError>;
}

/// Single-qubit state vector `a0|0> + a1|1>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Qubit {
    amplitudes: [Complex64; 2],
}

impl Default for Qubit {
    fn default() -> Self {
        Qubit {
            amplitudes: [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
        }
    }
}

impl Qubit {
    pub fn from_amplitudes(a0: Complex64, a1: Complex64) -> Self {
        Qubit {
            amplitudes: [a0, a1],
        }
    }

    pub fn amplitudes(&self) -> [Complex64; 2] {
        self.amplitudes
    }

    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes[0].norm_sqr() + self.amplitudes[1].norm_sqr()
    }

    /// Pauli-X.
    pub fn x(self) -> Self {
        let [a0, a1] = self.amplitudes;
        Qubit {
            amplitudes: [a1, a0],
        }
    }

    /// Hadamard.
    pub fn h(self) -> Self {
        let [a0, a1] = self.amplitudes;
        let s = Complex64::new(FRAC_1_SQRT_2, 0.0);
        Qubit {
            amplitudes: [s * (a0 + a1), s * (a0 - a1)],
        }
    }

    /// Probability of reading 1 in the computational basis.
    pub fn probability_one(&self) -> Result<f64, OracleError> {
        let norm = self.norm_sqr();
        if !norm.is_finite() || (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(OracleError::NotNormalized(norm));
        }
        Ok((self.amplitudes[1].norm_sqr() / norm).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateVectorOracle;

impl QuantumOracle for StateVectorOracle {
    type State = Qubit;

    fn encode(&self, bit: bool, basis: MeasurementBasis) -> Result<Qubit, OracleError> {
        let mut q = Qubit::default();
        if bit {
            q = q.x();
        }
        if basis == MeasurementBasis::X {
            q = q.h();
        }
        Ok(q)
    }

    fn measure<R: Rng + ?Sized>(
        &self,
        state: Qubit,
        basis: MeasurementBasis,
        rng: &mut R,
    ) -> Result<bool, OracleError> {
        // Rotate the X eigenbasis onto Z before reading out.
        let q = match basis {
            MeasurementBasis::Z => state,
            MeasurementBasis::X => state.h(),
        };
        let p1 = q.probability_one()?;
        Ok(rng.gen::<f64>() < p1)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BB84StateOracle;

pub fn measure_bb84_state<R: Rng + ?Sized>(
    state: BB84State,
    basis: MeasurementBasis,
    rng: &mut R,
) -> bool {
    if state.basis() == basis {
        state.bit()
    } else {
        random_bit(rng)
    }
}

impl QuantumOracle for BB84StateOracle {
    type State = BB84State;

    fn encode(&self, bit: bool, basis: MeasurementBasis) -> Result<BB84State, OracleError> {
        Ok(BB84State::prepare(bit, basis))
    }

    fn measure<R: Rng + ?Sized>(
        &self,
        state: BB84State,
        basis: MeasurementBasis,
        rng: &mut R,
    ) -> Result<bool, OracleError> {
        Ok(measure_bb84_state(state, basis, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ones_ratio<O: QuantumOracle>(
        oracle: &O,
        bit: bool,
        prep: MeasurementBasis,
        meas: MeasurementBasis,
    ) -> f64 {
        let mut rng = StdRng::seed_from_u64(11);
        let trials = 4000;
        let mut ones = 0;
        for _ in 0..trials {
            let state = oracle.encode(bit, prep).unwrap();
            if oracle.measure(state, meas, &mut rng).unwrap() {
                ones += 1;
            }
        }
        ones as f64 / trials as f64
    }

    #[test]
    fn test_matching_basis_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(5);
        for bit in [false, true] {
            for basis in [MeasurementBasis::Z, MeasurementBasis::X] {
                for _ in 0..200 {
                    let q = StateVectorOracle.encode(bit, basis).unwrap();
                    assert_eq!(StateVectorOracle.measure(q, basis, &mut rng).unwrap(), bit);

                    let s = BB84StateOracle.encode(bit, basis).unwrap();
                    assert_eq!(BB84StateOracle.measure(s, basis, &mut rng).unwrap(), bit);
                }
            }
        }
    }

    #[test]
    fn test_mismatched_basis_is_a_fair_coin() {
        for bit in [false, true] {
            let sv = ones_ratio(&StateVectorOracle, bit, MeasurementBasis::Z, MeasurementBasis::X);
            let table = ones_ratio(&BB84StateOracle, bit, MeasurementBasis::X, MeasurementBasis::Z);
            assert!((sv - 0.5).abs() < 0.05, "state vector ratio {}", sv);
            assert!((table - 0.5).abs() < 0.05, "table ratio {}", table);
        }
    }

    #[test]
    fn test_hadamard_is_self_inverse() {
        let q = Qubit::default().x().h().h();
        let [a0, a1] = q.amplitudes();
        assert!(a0.norm() < 1e-12);
        assert!((a1.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unnormalized_state_is_rejected() {
        let q = Qubit::from_amplitudes(Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(0);
        let err = StateVectorOracle
            .measure(q, MeasurementBasis::Z, &mut rng)
            .unwrap_err();
        assert!(matches!(err, OracleError::NotNormalized(n) if (n - 2.0).abs() < 1e-12));
    }
}
