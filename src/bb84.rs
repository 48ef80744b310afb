//! The BB84 pipeline: transmit, sift, measure QBER, decide, amplify.

use crate::bb84_states::{generate_bases, generate_bits_and_bases, BB84State, MeasurementBasis};
use crate::config::{check_probability, SimulationConfig};
use crate::error::SimulationError;
use crate::oracle::QuantumOracle;
use crate::privacy_amplification::{privacy_amplify, AmplifiedKey, KeyStatus};
use crate::report::{Comparison, RunResult};
use crate::security::assess_security;
use crate::sifting::{compute_qber, sift};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// What the eavesdropper saw on an intercepted qubit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Interception {
    pub basis: MeasurementBasis,
    pub bit: bool,
}

/// One transmitted qubit. Derived fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QubitRecord {
    index: usize,
    alice_bit: bool,
    alice_basis: MeasurementBasis,
    bob_basis: MeasurementBasis,
    bob_bit: bool,
    eve: Option<Interception>,
    bases_match: bool,
    is_error: bool,
}

impl QubitRecord {
    pub fn new(
        index: usize,
        alice_bit: bool,
        alice_basis: MeasurementBasis,
        bob_basis: MeasurementBasis,
        bob_bit: bool,
        eve: Option<Interception>,
    ) -> Self {
        let bases_match = alice_basis == bob_basis;
        QubitRecord {
            index,
            alice_bit,
            alice_basis,
            bob_basis,
            bob_bit,
            eve,
            bases_match,
            is_error: bases_match && alice_bit != bob_bit,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn alice_bit(&self) -> bool {
        self.alice_bit
    }

    pub fn alice_basis(&self) -> MeasurementBasis {
        self.alice_basis
    }

    pub fn alice_state(&self) -> BB84State {
        BB84State::prepare(self.alice_bit, self.alice_basis)
    }

    pub fn bob_basis(&self) -> MeasurementBasis {
        self.bob_basis
    }

    pub fn bob_bit(&self) -> bool {
        self.bob_bit
    }

    pub fn eve_intercepted(&self) -> bool {
        self.eve.is_some()
    }

    pub fn interception(&self) -> Option<Interception> {
        self.eve
    }

    pub fn bases_match(&self) -> bool {
        self.bases_match
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }
}

/// Intercept-resend attacker.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Eavesdropper {
    intercept_prob: f64,
}

impl Eavesdropper {
    pub fn new(intercept_prob: f64) -> Result<Self, SimulationError> {
        check_probability("eve_intercept_prob", intercept_prob)?;
        Ok(Eavesdropper { intercept_prob })
    }

    /// Intercepts every qubit.
    pub fn always() -> Self {
        Eavesdropper {
            intercept_prob: 1.0,
        }
    }

    pub fn intercept_prob(&self) -> f64 {
        self.intercept_prob
    }

    /// Per-qubit decisions for a run: `Some(basis)` where Eve intercepts.
    pub fn plan<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Option<MeasurementBasis>> {
        (0..n)
            .map(|_| {
                let basis = MeasurementBasis::random(rng);
                let intercepts = rng.gen::<f64>() < self.intercept_prob;
                intercepts.then_some(basis)
            })
            .collect()
    }
}

/// Alice's bits and bases plus Bob's bases, shared by both scenarios of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolInputs {
    pub alice_bits: Vec<bool>,
    pub alice_bases: Vec<MeasurementBasis>,
    pub bob_bases: Vec<MeasurementBasis>,
}

impl ProtocolInputs {
    pub fn new(
        alice_bits: Vec<bool>,
        alice_bases: Vec<MeasurementBasis>,
        bob_bases: Vec<MeasurementBasis>,
    ) -> Result<Self, SimulationError> {
        let n = alice_bits.len();
        if n == 0 {
            return Err(SimulationError::invalid(
                "num_qubits",
                0.0,
                "at least one qubit is required",
            ));
        }
        if alice_bases.len() != n || bob_bases.len() != n {
            return Err(SimulationError::invalid(
                "num_qubits",
                n as f64,
                "bits and bases must have equal length",
            ));
        }
        Ok(ProtocolInputs {
            alice_bits,
            alice_bases,
            bob_bases,
        })
    }

    pub fn generate<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Self, SimulationError> {
        let (alice_bits, alice_bases) = generate_bits_and_bases(n, rng)?;
        let bob_bases = generate_bases(n, rng)?;
        Ok(ProtocolInputs {
            alice_bits,
            alice_bases,
            bob_bases,
        })
    }

    pub fn len(&self) -> usize {
        self.alice_bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alice_bits.is_empty()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transmission {
    pub bob_bit: bool,
    pub interception: Option<Interception>,
}

fn intercept_resend<O, R>(
    oracle: &O,
    state: O::State,
    eve_basis: Option<MeasurementBasis>,
    rng: &mut R,
) -> Result<(O::State, Option<Interception>), SimulationError>
where
    O: QuantumOracle,
    R: Rng + ?Sized,
{
    match eve_basis {
        None => Ok((state, None)),
        Some(basis) => {
            let bit = oracle.measure(state, basis, rng)?;
            let resent = oracle.encode(bit, basis)?;
            Ok((resent, Some(Interception { basis, bit })))
        }
    }
}

fn receive<O, R>(
    oracle: &O,
    state: O::State,
    bob_basis: MeasurementBasis,
    noise_prob: f64,
    rng: &mut R,
) -> Result<bool, SimulationError>
where
    O: QuantumOracle,
    R: Rng + ?Sized,
{
    let bit = oracle.measure(state, bob_basis, rng)?;
    if noise_prob > 0.0 && rng.gen::<f64>() < noise_prob {
        return Ok(!bit);
    }
    Ok(bit)
}

/// Send one qubit from Alice to Bob, through Eve when `eve_basis` is set.
pub fn transmit<O, R>(
    oracle: &O,
    alice_bit: bool,
    alice_basis: MeasurementBasis,
    bob_basis: MeasurementBasis,
    eve_basis: Option<MeasurementBasis>,
    noise_prob: f64,
    rng: &mut R,
) -> Result<Transmission, SimulationError>
where
    O: QuantumOracle,
    R: Rng + ?Sized,
{
    check_probability("noise_prob", noise_prob)?;
    let state = oracle.encode(alice_bit, alice_basis)?;
    let (state, interception) = intercept_resend(oracle, state, eve_basis, rng)?;
    let bob_bit = receive(oracle, state, bob_basis, noise_prob, rng)?;
    Ok(Transmission {
        bob_bit,
        interception,
    })
}

/// Transmit every qubit, handing the oracle at most `batch_size` states at a time.
pub fn transmit_all<O, R>(
    oracle: &O,
    inputs: &ProtocolInputs,
    eve_plan: &[Option<MeasurementBasis>],
    noise_prob: f64,
    batch_size: usize,
    rng: &mut R,
) -> Result<Vec<QubitRecord>, SimulationError>
where
    O: QuantumOracle,
    R: Rng + ?Sized,
{
    check_probability("noise_prob", noise_prob)?;
    if batch_size == 0 {
        return Err(SimulationError::invalid("batch_size", 0.0, "must be at least 1"));
    }
    let n = inputs.len();
    if eve_plan.len() != n {
        return Err(SimulationError::invalid(
            "num_qubits",
            eve_plan.len() as f64,
            "eavesdropper plan does not cover every qubit",
        ));
    }

    let mut timeline = Vec::with_capacity(n);
    for start in (0..n).step_by(batch_size) {
        let end = usize::min(start + batch_size, n);
        log::debug!("transmitting qubits {}..{} of {}", start, end, n);

        let states = (start..end)
            .map(|i| oracle.encode(inputs.alice_bits[i], inputs.alice_bases[i]))
            .collect::<Result<Vec<_>, _>>()?;

        for (i, state) in (start..end).zip(states) {
            let (state, interception) = intercept_resend(oracle, state, eve_plan[i], rng)?;
            let bob_bit = receive(oracle, state, inputs.bob_bases[i], noise_prob, rng)?;
            timeline.push(QubitRecord::new(
                i,
                inputs.alice_bits[i],
                inputs.alice_bases[i],
                inputs.bob_bases[i],
                bob_bit,
                interception,
            ));
        }
    }
    Ok(timeline)
}

/// Run one scenario end to end over prepared inputs.
pub fn simulate_scenario<O, R>(
    config: &SimulationConfig,
    oracle: &O,
    inputs: &ProtocolInputs,
    eve: Option<&Eavesdropper>,
    rng: &mut R,
) -> Result<RunResult, SimulationError>
where
    O: QuantumOracle,
    R: Rng + ?Sized,
{
    config.validate()?;
    let n = inputs.len();
    if n != config.num_qubits {
        return Err(SimulationError::invalid(
            "num_qubits",
            n as f64,
            "inputs do not match the configured qubit count",
        ));
    }
    log::info!(
        "simulating {} qubits ({})",
        n,
        match eve {
            Some(e) => format!("eavesdropper at p={:.2}", e.intercept_prob()),
            None => "no eavesdropper".to_string(),
        }
    );

    let plan = match eve {
        Some(e) => e.plan(n, rng),
        None => vec![None; n],
    };
    let timeline = transmit_all(
        oracle,
        inputs,
        &plan,
        config.noise_prob,
        config.batch_size,
        rng,
    )?;

    let sifted = sift(&timeline);
    let qber = compute_qber(&sifted);
    let assessment = assess_security(qber, config.qber_threshold);

    let key = if assessment.status.is_secure() {
        privacy_amplify(&sifted.alice_bits, qber, config.security_param)?
    } else {
        log::warn!("{}", assessment.message);
        AmplifiedKey::empty(KeyStatus::Aborted)
    };

    log::info!(
        "sifted {} of {} qubits, QBER {:.4}, {} ({} key bits)",
        sifted.len(),
        n,
        qber,
        assessment.status,
        key.len()
    );

    Ok(RunResult::new(
        eve.is_some(),
        timeline,
        sifted,
        qber,
        assessment,
        key,
    ))
}

/// Both session scenarios over the same inputs: without and with the eavesdropper.
pub fn run_comparison<O, R>(
    config: &SimulationConfig,
    oracle: &O,
    rng: &mut R,
) -> Result<Comparison, SimulationError>
where
    O: QuantumOracle,
    R: Rng + ?Sized,
{
    config.validate()?;
    let inputs = ProtocolInputs::generate(config.num_qubits, rng)?;
    let eve = Eavesdropper::new(config.eve_intercept_prob)?;

    let no_eve = simulate_scenario(config, oracle, &inputs, None, rng)?;
    let with_eve = simulate_scenario(config, oracle, &inputs, Some(&eve), rng)?;

    Ok(Comparison {
        parameters: config.clone(),
        no_eve,
        with_eve,
    })
}

/// [`run_comparison`] with a generator seeded from `config.seed`, or from entropy.
pub fn run_comparison_seeded<O: QuantumOracle>(
    config: &SimulationConfig,
    oracle: &O,
) -> Result<Comparison, SimulationError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    run_comparison(config, oracle, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bb84_states::MeasurementBasis::{X, Z};
    use crate::oracle::{BB84StateOracle, StateVectorOracle};

    #[test]
    fn test_record_derives_match_and_error() {
        let r = QubitRecord::new(0, true, Z, Z, false, None);
        assert!(r.bases_match());
        assert!(r.is_error());

        let r = QubitRecord::new(1, true, Z, X, false, None);
        assert!(!r.bases_match());
        assert!(!r.is_error());
    }

    #[test]
    fn test_transmit_without_eve_or_noise_preserves_bit() {
        let mut rng = StdRng::seed_from_u64(2);
        for bit in [false, true] {
            for basis in [Z, X] {
                let t = transmit(&StateVectorOracle, bit, basis, basis, None, 0.0, &mut rng)
                    .unwrap();
                assert_eq!(t.bob_bit, bit);
                assert!(t.interception.is_none());
            }
        }
    }

    #[test]
    fn test_full_noise_flips_every_bit() {
        let mut rng = StdRng::seed_from_u64(2);
        let t = transmit(&BB84StateOracle, true, Z, Z, None, 1.0, &mut rng).unwrap();
        assert!(!t.bob_bit);
    }

    #[test]
    fn test_eve_in_matching_basis_is_invisible() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..100 {
            let t = transmit(&StateVectorOracle, true, X, X, Some(X), 0.0, &mut rng).unwrap();
            assert!(t.bob_bit);
            assert_eq!(t.interception, Some(Interception { basis: X, bit: true }));
        }
    }

    #[test]
    fn test_transmit_rejects_bad_noise() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = transmit(&BB84StateOracle, true, Z, Z, None, 2.0, &mut rng).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter { name: "noise_prob", .. }));
    }

    #[test]
    fn test_batching_does_not_change_results() {
        let inputs = ProtocolInputs::generate(97, &mut StdRng::seed_from_u64(4)).unwrap();
        let plan = Eavesdropper::new(0.5)
            .unwrap()
            .plan(97, &mut StdRng::seed_from_u64(5));

        let mut rng = StdRng::seed_from_u64(6);
        let one = transmit_all(&StateVectorOracle, &inputs, &plan, 0.05, 1, &mut rng).unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        let many = transmit_all(&StateVectorOracle, &inputs, &plan, 0.05, 32, &mut rng).unwrap();
        assert_eq!(one, many);
        assert_eq!(one.len(), 97);
        assert!(one.iter().enumerate().all(|(i, r)| r.index() == i));
    }

    #[test]
    fn test_plan_length_must_match_inputs() {
        let inputs = ProtocolInputs::generate(10, &mut StdRng::seed_from_u64(1)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(transmit_all(&BB84StateOracle, &inputs, &[None; 9], 0.0, 4, &mut rng).is_err());
        assert!(transmit_all(&BB84StateOracle, &inputs, &[None; 10], 0.0, 0, &mut rng).is_err());
    }

    #[test]
    fn test_inputs_validate_lengths() {
        assert!(ProtocolInputs::new(vec![], vec![], vec![]).is_err());
        assert!(ProtocolInputs::new(vec![true], vec![Z], vec![]).is_err());
        assert!(ProtocolInputs::new(vec![true], vec![Z], vec![X]).is_ok());
    }

    #[test]
    fn test_eavesdropper_plan_rates() {
        let mut rng = StdRng::seed_from_u64(13);
        assert!(Eavesdropper::new(0.0).unwrap().plan(500, &mut rng).iter().all(Option::is_none));
        assert!(Eavesdropper::always().plan(500, &mut rng).iter().all(Option::is_some));

        let half = Eavesdropper::new(0.5).unwrap().plan(4000, &mut rng);
        let ratio = half.iter().filter(|p| p.is_some()).count() as f64 / 4000.0;
        assert!((ratio - 0.5).abs() < 0.05, "intercept ratio {}", ratio);
        assert!(Eavesdropper::new(-0.1).is_err());
    }

    #[test]
    fn test_aborted_run_has_no_key() {
        let config = SimulationConfig {
            qber_threshold: 0.0,
            ..SimulationConfig::default()
        };
        let inputs = ProtocolInputs::generate(200, &mut StdRng::seed_from_u64(3)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let run = simulate_scenario(&config, &BB84StateOracle, &inputs, None, &mut rng).unwrap();
        assert_eq!(run.key_status(), KeyStatus::Aborted);
        assert!(run.final_key().is_empty());
    }

    #[test]
    fn test_inputs_must_match_configured_qubit_count() {
        let config = SimulationConfig {
            num_qubits: 200,
            ..SimulationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        let inputs = ProtocolInputs::generate(50, &mut rng).unwrap();
        let err =
            simulate_scenario(&config, &BB84StateOracle, &inputs, None, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::InvalidParameter {
                name: "num_qubits",
                value,
                ..
            } if value == 50.0
        ));

        let eve = Eavesdropper::always();
        let run = simulate_scenario(&config, &BB84StateOracle, &inputs, Some(&eve), &mut rng);
        assert!(run.is_err());
    }

    #[test]
    fn test_seeded_comparison_is_reproducible() {
        let config = SimulationConfig {
            seed: Some(99),
            ..SimulationConfig::default()
        };
        let a = run_comparison_seeded(&config, &StateVectorOracle).unwrap();
        let b = run_comparison_seeded(&config, &StateVectorOracle).unwrap();
        assert_eq!(a.no_eve, b.no_eve);
        assert_eq!(a.with_eve, b.with_eve);
    }

    #[test]
    fn test_invalid_config_blocks_the_run() {
        let config = SimulationConfig {
            num_qubits: 0,
            ..SimulationConfig::default()
        };
        assert!(run_comparison_seeded(&config, &BB84StateOracle).is_err());
    }
}
