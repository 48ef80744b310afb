use crate::error::SimulationError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four BB84 preparation states.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BB84State {
    QubitZero,
    QubitOne,
    QubitPlus,  // |+> encodes bit 0 in the X basis
    QubitMinus, // |-> encodes bit 1 in the X basis
}

impl BB84State {
    /// State Alice prepares for `bit` in `basis`.
    pub fn prepare(bit: bool, basis: MeasurementBasis) -> Self {
        match (bit, basis) {
            (false, MeasurementBasis::Z) => BB84State::QubitZero,
            (true, MeasurementBasis::Z) => BB84State::QubitOne,
            (false, MeasurementBasis::X) => BB84State::QubitPlus,
            (true, MeasurementBasis::X) => BB84State::QubitMinus,
        }
    }

    /// Basis the state is an eigenstate of.
    pub fn basis(self) -> MeasurementBasis {
        match self {
            BB84State::QubitZero | BB84State::QubitOne => MeasurementBasis::Z,
            BB84State::QubitPlus | BB84State::QubitMinus => MeasurementBasis::X,
        }
    }

    /// Bit value the state encodes in its own basis.
    pub fn bit(self) -> bool {
        matches!(self, BB84State::QubitOne | BB84State::QubitMinus)
    }

    pub fn label(self) -> &'static str {
        match self {
            BB84State::QubitZero => "|0⟩ (Z)",
            BB84State::QubitOne => "|1⟩ (Z)",
            BB84State::QubitPlus => "|+⟩ (X)",
            BB84State::QubitMinus => "|−⟩ (X)",
        }
    }
}

impl fmt::Display for BB84State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rectilinear (Z) or diagonal (X) basis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementBasis {
    Z,
    X,
}

impl MeasurementBasis {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if random_bit(rng) {
            MeasurementBasis::X
        } else {
            MeasurementBasis::Z
        }
    }

    pub fn symbol(self) -> char {
        match self {
            MeasurementBasis::Z => 'Z',
            MeasurementBasis::X => 'X',
        }
    }
}

impl fmt::Display for MeasurementBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Fair coin flip, used for Alice's bits and for every random basis choice.
pub fn random_bit<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen()
}

/// Random bases for `n` qubits.
pub fn generate_bases<R: Rng + ?Sized>(
    n: usize,
    rng: &mut R,
) -> Result<Vec<MeasurementBasis>, SimulationError> {
    if n == 0 {
        return Err(SimulationError::invalid(
            "num_qubits",
            0.0,
            "at least one qubit is required",
        ));
    }
    Ok((0..n).map(|_| MeasurementBasis::random(rng)).collect())
}

/// Alice's random bits and bases, each of length `n`.
pub fn generate_bits_and_bases<R: Rng + ?Sized>(
    n: usize,
    rng: &mut R,
) -> Result<(Vec<bool>, Vec<MeasurementBasis>), SimulationError> {
    if n == 0 {
        return Err(SimulationError::invalid(
            "num_qubits",
            0.0,
            "at least one qubit is required",
        ));
    }
    let bits = (0..n).map(|_| random_bit(rng)).collect();
    let bases = generate_bases(n, rng)?;
    Ok((bits, bases))
}
