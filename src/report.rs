//! Run results and the plain data handed to renderers.

use crate::bb84::QubitRecord;
use crate::config::SimulationConfig;
use crate::privacy_amplification::{AmplifiedKey, KeyStatus};
use crate::security::{expected_qber, SecurityAssessment, SecurityStatus};
use crate::sifting::{windowed_error_rate, SiftedKey};
use serde::Serialize;
use std::fmt;

/// Outcome of one scenario. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    eve_present: bool,
    timeline: Vec<QubitRecord>,
    sifted: SiftedKey,
    qber: f64,
    assessment: SecurityAssessment,
    final_key: Vec<u8>,
    final_key_bits: usize,
    key_status: KeyStatus,
}

impl RunResult {
    pub(crate) fn new(
        eve_present: bool,
        timeline: Vec<QubitRecord>,
        sifted: SiftedKey,
        qber: f64,
        assessment: SecurityAssessment,
        key: AmplifiedKey,
    ) -> Self {
        RunResult {
            eve_present,
            timeline,
            sifted,
            qber,
            assessment,
            final_key: key.to_bytes(),
            final_key_bits: key.len(),
            key_status: key.status,
        }
    }

    pub fn eve_present(&self) -> bool {
        self.eve_present
    }

    pub fn timeline(&self) -> &[QubitRecord] {
        &self.timeline
    }

    pub fn num_qubits(&self) -> usize {
        self.timeline.len()
    }

    pub fn qber(&self) -> f64 {
        self.qber
    }

    pub fn sifted(&self) -> &SiftedKey {
        &self.sifted
    }

    /// Alice's side of the sifted key.
    pub fn sifted_key(&self) -> &[bool] {
        &self.sifted.alice_bits
    }

    /// Distilled key bytes; the final byte is zero padded.
    pub fn final_key(&self) -> &[u8] {
        &self.final_key
    }

    pub fn final_key_bits(&self) -> usize {
        self.final_key_bits
    }

    pub fn final_key_hex(&self) -> String {
        hex::encode(&self.final_key)
    }

    pub fn key_status(&self) -> KeyStatus {
        self.key_status
    }

    pub fn assessment(&self) -> &SecurityAssessment {
        &self.assessment
    }

    pub fn status(&self) -> SecurityStatus {
        self.assessment.status
    }

    pub fn sifted_count(&self) -> usize {
        self.sifted.len()
    }

    pub fn error_count(&self) -> usize {
        self.timeline.iter().filter(|r| r.is_error()).count()
    }

    pub fn eve_intercept_count(&self) -> usize {
        self.timeline.iter().filter(|r| r.eve_intercepted()).count()
    }

    /// Fraction of sent qubits that survive sifting.
    pub fn efficiency(&self) -> f64 {
        ratio(self.sifted_count(), self.num_qubits())
    }

    /// Distilled key bits per sent qubit.
    pub fn key_rate(&self) -> f64 {
        ratio(self.final_key_bits, self.num_qubits())
    }

    /// Timeline indices of the first `limit` errors.
    pub fn error_positions(&self, limit: usize) -> Vec<usize> {
        self.timeline
            .iter()
            .filter(|r| r.is_error())
            .map(QubitRecord::index)
            .take(limit)
            .collect()
    }

    pub fn windowed_error_rate(&self, window: usize) -> Vec<f64> {
        windowed_error_rate(&self.sifted, window)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            scenario: if self.eve_present { "with_eve" } else { "no_eve" },
            num_qubits: self.num_qubits(),
            sifted_count: self.sifted_count(),
            error_count: self.error_count(),
            eve_intercepts: self.eve_intercept_count(),
            qber: self.qber,
            status: self.assessment.status,
            key_status: self.key_status,
            final_key_bits: self.final_key_bits,
            efficiency: self.efficiency(),
            key_rate: self.key_rate(),
            final_key_hex: self.final_key_hex(),
        }
    }

    pub fn timeline_rows(&self) -> Vec<TimelineRow> {
        self.timeline.iter().map(TimelineRow::from).collect()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Scalar metrics for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub scenario: &'static str,
    pub num_qubits: usize,
    pub sifted_count: usize,
    pub error_count: usize,
    pub eve_intercepts: usize,
    pub qber: f64,
    pub status: SecurityStatus,
    pub key_status: KeyStatus,
    pub final_key_bits: usize,
    pub efficiency: f64,
    pub key_rate: f64,
    pub final_key_hex: String,
}

/// One timeline entry flattened for tables and charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineRow {
    pub index: usize,
    pub alice_bit: u8,
    pub alice_basis: char,
    pub alice_state: &'static str,
    pub eve_basis: Option<char>,
    pub eve_bit: Option<u8>,
    pub bob_basis: char,
    pub bob_bit: u8,
    pub used: bool,
    pub error: bool,
}

impl From<&QubitRecord> for TimelineRow {
    fn from(r: &QubitRecord) -> Self {
        let eve = r.interception();
        TimelineRow {
            index: r.index(),
            alice_bit: r.alice_bit() as u8,
            alice_basis: r.alice_basis().symbol(),
            alice_state: r.alice_state().label(),
            eve_basis: eve.map(|e| e.basis.symbol()),
            eve_bit: eve.map(|e| e.bit as u8),
            bob_basis: r.bob_basis().symbol(),
            bob_bit: r.bob_bit() as u8,
            used: r.bases_match(),
            error: r.is_error(),
        }
    }
}

/// The two scenarios of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub parameters: SimulationConfig,
    pub no_eve: RunResult,
    pub with_eve: RunResult,
}

#[derive(Serialize)]
struct ComparisonReport<'a> {
    parameters: &'a SimulationConfig,
    expected_qber_with_eve: f64,
    summaries: [RunSummary; 2],
    no_eve_timeline: Vec<TimelineRow>,
    with_eve_timeline: Vec<TimelineRow>,
    no_eve_window_error_rate: Vec<f64>,
    with_eve_window_error_rate: Vec<f64>,
}

impl Comparison {
    pub fn summaries(&self) -> [RunSummary; 2] {
        [self.no_eve.summary(), self.with_eve.summary()]
    }

    /// Everything a renderer needs, as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let window = self.parameters.window_size;
        let report = ComparisonReport {
            parameters: &self.parameters,
            expected_qber_with_eve: expected_qber(
                self.parameters.eve_intercept_prob,
                self.parameters.noise_prob,
            ),
            summaries: self.summaries(),
            no_eve_timeline: self.no_eve.timeline_rows(),
            with_eve_timeline: self.with_eve.timeline_rows(),
            no_eve_window_error_rate: self.no_eve.windowed_error_rate(window),
            with_eve_window_error_rate: self.with_eve.windowed_error_rate(window),
        };
        serde_json::to_string_pretty(&report)
    }
}

/// Short plain-text summary for terminals.
impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.parameters;
        writeln!(
            f,
            "BB84 simulation: {} qubits, threshold {:.3}, Eve p={:.2}, noise p={:.3}",
            p.num_qubits, p.qber_threshold, p.eve_intercept_prob, p.noise_prob
        )?;
        for (name, run) in [("No Eve", &self.no_eve), ("With Eve", &self.with_eve)] {
            writeln!(f, "\n{}", name)?;
            writeln!(
                f,
                "  sifted      {} / {} ({:.1}%)",
                run.sifted_count(),
                run.num_qubits(),
                run.efficiency() * 100.0
            )?;
            writeln!(
                f,
                "  errors      {} at {:?}",
                run.error_count(),
                run.error_positions(10)
            )?;
            if run.eve_present() {
                writeln!(f, "  intercepted {}", run.eve_intercept_count())?;
            }
            writeln!(f, "  QBER        {:.4}", run.qber())?;
            writeln!(f, "  status      {}", run.status())?;
            writeln!(
                f,
                "  final key   {} bits ({:?}) {}",
                run.final_key_bits(),
                run.key_status(),
                run.final_key_hex()
            )?;
        }
        writeln!(
            f,
            "\nexpected QBER with Eve ≈ {:.4}",
            expected_qber(p.eve_intercept_prob, p.noise_prob)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bb84::{run_comparison, simulate_scenario, Eavesdropper, ProtocolInputs};
    use crate::oracle::BB84StateOracle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn comparison() -> Comparison {
        let config = SimulationConfig {
            num_qubits: 120,
            eve_intercept_prob: 1.0,
            ..SimulationConfig::default()
        };
        run_comparison(&config, &BB84StateOracle, &mut StdRng::seed_from_u64(21)).unwrap()
    }

    #[test]
    fn test_metrics_agree_with_timeline() {
        let c = comparison();
        let run = &c.with_eve;
        assert_eq!(run.num_qubits(), 120);
        assert_eq!(run.eve_intercept_count(), 120);
        assert_eq!(run.error_positions(usize::MAX).len(), run.error_count());
        assert_eq!(run.error_count(), run.sifted().mismatches());
        assert!((run.efficiency() - run.sifted_count() as f64 / 120.0).abs() < 1e-12);
    }

    #[test]
    fn test_final_key_bytes_cover_bits() {
        let config = SimulationConfig {
            num_qubits: 400,
            ..SimulationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(2);
        let inputs = ProtocolInputs::generate(400, &mut rng).unwrap();
        let run = simulate_scenario(&config, &BB84StateOracle, &inputs, None, &mut rng).unwrap();
        assert_eq!(run.key_status(), KeyStatus::Distilled);
        assert_eq!(run.final_key().len(), (run.final_key_bits() + 7) / 8);
        assert_eq!(run.final_key_hex().len(), run.final_key().len() * 2);
        assert!(run.key_rate() > 0.0);
    }

    #[test]
    fn test_timeline_rows_mirror_records() {
        let config = SimulationConfig {
            num_qubits: 50,
            ..SimulationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        let inputs = ProtocolInputs::generate(50, &mut rng).unwrap();
        let eve = Eavesdropper::always();
        let run =
            simulate_scenario(&config, &BB84StateOracle, &inputs, Some(&eve), &mut rng).unwrap();
        for (row, record) in run.timeline_rows().iter().zip(run.timeline()) {
            assert_eq!(row.index, record.index());
            assert_eq!(row.used, record.bases_match());
            assert_eq!(row.error, record.is_error());
            assert!(row.eve_basis.is_some());
            assert_eq!(row.alice_state, record.alice_state().label());
        }
    }

    #[test]
    fn test_json_report_has_both_scenarios() {
        let json = comparison().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summaries"][0]["scenario"], "no_eve");
        assert_eq!(value["summaries"][1]["scenario"], "with_eve");
        assert_eq!(value["no_eve_timeline"].as_array().unwrap().len(), 120);
        assert_eq!(value["expected_qber_with_eve"], 0.25);
    }

    #[test]
    fn test_display_summary_mentions_status() {
        let text = comparison().to_string();
        assert!(text.starts_with("BB84 simulation: 120 qubits"));
        assert!(text.contains("intercepted 120"));
        assert!(text.contains("No Eve"));
        assert!(text.contains("With Eve"));
        assert!(text.contains("QBER"));
    }
}
