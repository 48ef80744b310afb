use crate::config::{check_probability, check_security_param};
use crate::error::SimulationError;
use ring::digest::{Context, SHA256, SHA512};
use serde::Serialize;

/// Outcome of key distillation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum KeyStatus {
    Distilled,
    /// The secure length came out at zero bits.
    InsufficientKeyMaterial,
    /// Distillation was skipped because the QBER check failed.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmplifiedKey {
    pub bits: Vec<bool>,
    pub status: KeyStatus,
}

impl AmplifiedKey {
    pub fn empty(status: KeyStatus) -> Self {
        AmplifiedKey {
            bits: Vec::new(),
            status,
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        bools_to_bytes(&self.bits)
    }
}

/// Binary Shannon entropy, zero at the endpoints.
pub fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        0.0
    } else {
        -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
    }
}

/// `floor(n * (1 - H(qber)) - 2 * log2(1 / epsilon))`, clamped at zero.
pub fn secure_key_length(n: usize, qber: f64, epsilon: f64) -> usize {
    let margin = 2.0 * (1.0 / epsilon).log2();
    let length = (n as f64 * (1.0 - binary_entropy(qber)) - margin).floor();
    if length > 0.0 {
        // never more than the input, whatever rounding does
        (length as usize).min(n)
    } else {
        0
    }
}

/// Packs bits MSB first; the last byte is zero padded.
pub fn bools_to_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << (7 - i)))
        })
        .collect()
}

pub fn bytes_to_bools(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).map(move |i| byte & (0x80 >> i) != 0))
        .collect()
}

fn hash_input(bits: &[bool]) -> Vec<u8> {
    let mut input = (bits.len() as u64).to_be_bytes().to_vec();
    input.extend(bools_to_bytes(bits));
    input
}

fn hash_block(counter: u32, input: &[u8]) -> Vec<u8> {
    let mut context = if counter == 0 {
        Context::new(&SHA256)
    } else {
        let mut ctx = Context::new(&SHA512);
        ctx.update(&counter.to_be_bytes());
        ctx
    };
    context.update(input);
    context.finish().as_ref().to_vec()
}

/// SHA-256 of the input, then counter-prefixed SHA-512 blocks, cut to `bit_len` bits.
pub fn digest_stream(bits: &[bool], bit_len: usize) -> Vec<bool> {
    let input = hash_input(bits);
    let mut stream = Vec::with_capacity(bit_len + 512);
    let mut counter = 0u32;
    while stream.len() < bit_len {
        stream.extend(bytes_to_bools(&hash_block(counter, &input)));
        counter += 1;
    }
    stream.truncate(bit_len);
    stream
}

/// Compress the sifted key down to its secure length.
pub fn privacy_amplify(
    sifted_bits: &[bool],
    qber: f64,
    security_param: f64,
) -> Result<AmplifiedKey, SimulationError> {
    check_probability("qber", qber)?;
    check_security_param(security_param)?;

    let length = secure_key_length(sifted_bits.len(), qber, security_param);
    if length == 0 {
        log::warn!(
            "insufficient key material: {} sifted bits at QBER {:.4}",
            sifted_bits.len(),
            qber
        );
        return Ok(AmplifiedKey::empty(KeyStatus::InsufficientKeyMaterial));
    }

    Ok(AmplifiedKey {
        bits: digest_stream(sifted_bits, length),
        status: KeyStatus::Distilled,
    })
}
