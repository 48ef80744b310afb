//! Threshold decision on the measured QBER.
//!
//! A plain comparison against the configured threshold. It carries no
//! confidence bound on false alarms or missed detections.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SecurityStatus {
    Secure,
    EavesdroppingDetected,
}

impl SecurityStatus {
    pub fn is_secure(self) -> bool {
        self == SecurityStatus::Secure
    }

    pub fn action(self) -> &'static str {
        match self {
            SecurityStatus::Secure => "proceed with key",
            SecurityStatus::EavesdroppingDetected => "abort and retry",
        }
    }
}

impl fmt::Display for SecurityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityStatus::Secure => f.write_str("SECURE"),
            SecurityStatus::EavesdroppingDetected => f.write_str("EAVESDROPPING DETECTED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityAssessment {
    pub status: SecurityStatus,
    pub qber: f64,
    pub threshold: f64,
    pub message: String,
}

pub fn assess_security(qber: f64, threshold: f64) -> SecurityAssessment {
    let (status, message) = if qber >= threshold {
        (
            SecurityStatus::EavesdroppingDetected,
            format!(
                "QBER ({:.3}) reaches threshold ({:.3}). Eavesdropping suspected.",
                qber, threshold
            ),
        )
    } else {
        (
            SecurityStatus::Secure,
            format!(
                "QBER ({:.3}) below threshold ({:.3}). Key exchange successful.",
                qber, threshold
            ),
        )
    };
    SecurityAssessment {
        status,
        qber,
        threshold,
        message,
    }
}

/// Textbook QBER estimate: a quarter of intercepted qubits flip, plus channel noise.
pub fn expected_qber(intercept_prob: f64, noise_prob: f64) -> f64 {
    (intercept_prob * 0.25 + noise_prob).clamp(0.0, 1.0)
}
