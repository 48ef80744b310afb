//! Basis sifting and error-rate estimation over a transmission timeline.

use crate::bb84::QubitRecord;
use serde::Serialize;

/// Bits both parties keep after discarding mismatched bases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiftedKey {
    /// Timeline positions of the surviving qubits, ascending.
    pub indices: Vec<usize>,
    pub alice_bits: Vec<bool>,
    pub bob_bits: Vec<bool>,
}

impl SiftedKey {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn mismatches(&self) -> usize {
        self.alice_bits
            .iter()
            .zip(&self.bob_bits)
            .filter(|(a, b)| a != b)
            .count()
    }
}

pub fn sift(timeline: &[QubitRecord]) -> SiftedKey {
    let mut key = SiftedKey::default();
    for record in timeline.iter().filter(|r| r.bases_match()) {
        key.indices.push(record.index());
        key.alice_bits.push(record.alice_bit());
        key.bob_bits.push(record.bob_bit());
    }
    key
}

/// Fraction of sifted positions where Alice and Bob disagree; 0 for an empty key.
pub fn compute_qber(sifted: &SiftedKey) -> f64 {
    if sifted.is_empty() {
        return 0.0;
    }
    sifted.mismatches() as f64 / sifted.len() as f64
}

/// Error rate over each full window of consecutive sifted positions.
pub fn windowed_error_rate(sifted: &SiftedKey, window: usize) -> Vec<f64> {
    if window == 0 || window > sifted.len() {
        return Vec::new();
    }
    let errors: Vec<u32> = sifted
        .alice_bits
        .iter()
        .zip(&sifted.bob_bits)
        .map(|(a, b)| u32::from(a != b))
        .collect();

    let mut in_window: u32 = errors[..window].iter().sum();
    let mut rates = Vec::with_capacity(errors.len() - window + 1);
    rates.push(in_window as f64 / window as f64);
    for i in window..errors.len() {
        in_window = in_window + errors[i] - errors[i - window];
        rates.push(in_window as f64 / window as f64);
    }
    rates
}
