//! Reconstruction Quality Metrics
//!
//! Compares the original analog waveform with its reconstruction:
//!
//! - RMSE: `sqrt(mean((o − r)²))` in volts
//! - SNR: `10·log10(Σo² / Σ(o − r)²)` in dB
//!
//! An all-zero original has no signal power; its SNR is reported as the
//! sentinel `0.0` dB rather than `-inf` or NaN. A perfect reconstruction of a
//! non-zero signal has infinite SNR.
//!
//! ## Example
//!
//! ```rust
//! use satlink_core::quality::evaluate;
//!
//! let report = evaluate(&[1.0, -1.0, 1.0, -1.0], &[0.9, -0.9, 0.9, -0.9]).unwrap();
//! assert!((report.rmse_v - 0.1).abs() < 1e-12);
//! assert!((report.snr_db - 20.0).abs() < 1e-9);
//! ```

use crate::types::{ConversionError, ConversionResult, Sample};
use serde::{Deserialize, Serialize};

/// Fidelity of one reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Root-mean-square error in volts
    pub rmse_v: f64,
    /// Signal-to-noise ratio in dB (0.0 when the original is silent)
    pub snr_db: f64,
}

impl std::fmt::Display for QualityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RMSE {:.4} V, SNR {:.2} dB", self.rmse_v, self.snr_db)
    }
}

/// Stateless evaluator for original/reconstructed pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityEvaluator;

impl QualityEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Compute RMSE and SNR.
    ///
    /// Fails with [`ConversionError::LengthMismatch`] when the sequences
    /// differ in length. Empty inputs give a zero report.
    pub fn evaluate(&self, original: &[Sample], reconstructed: &[Sample]) -> ConversionResult<QualityReport> {
        ConversionError::check_len(original.len(), reconstructed.len())?;
        if original.is_empty() {
            return Ok(QualityReport {
                rmse_v: 0.0,
                snr_db: 0.0,
            });
        }

        let (signal_power, noise_power) = original
            .iter()
            .zip(reconstructed)
            .fold((0.0, 0.0), |(sig, noise), (&o, &r)| {
                let e = o - r;
                (sig + o * o, noise + e * e)
            });

        let rmse_v = (noise_power / original.len() as f64).sqrt();
        let snr_db = if signal_power > 0.0 {
            10.0 * (signal_power / noise_power).log10()
        } else {
            0.0
        };

        Ok(QualityReport { rmse_v, snr_db })
    }
}

/// Compute the quality report for `original` against `reconstructed`.
pub fn evaluate(original: &[Sample], reconstructed: &[Sample]) -> ConversionResult<QualityReport> {
    QualityEvaluator.evaluate(original, reconstructed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_error() {
        let original = [3.0, 4.0];
        let reconstructed = [3.0, 3.0];
        let report = evaluate(&original, &reconstructed).unwrap();
        // mean squared error = 0.5, signal energy 25, noise energy 1
        assert_relative_eq!(report.rmse_v, 0.5_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(report.snr_db, 10.0 * 25.0_f64.log10(), epsilon = 1e-12);
    }

    #[test]
    fn test_silent_original_reports_zero_snr() {
        let report = evaluate(&[0.0; 8], &[0.5; 8]).unwrap();
        assert_eq!(report.snr_db, 0.0);
        assert_relative_eq!(report.rmse_v, 0.5, epsilon = 1e-12);

        let report = evaluate(&[0.0; 8], &[0.0; 8]).unwrap();
        assert_eq!(report.snr_db, 0.0);
        assert_eq!(report.rmse_v, 0.0);
    }

    #[test]
    fn test_perfect_reconstruction() {
        let signal = [1.0, -2.0, 0.5];
        let report = evaluate(&signal, &signal).unwrap();
        assert_eq!(report.rmse_v, 0.0);
        assert!(report.snr_db.is_infinite() && report.snr_db > 0.0);
    }

    #[test]
    fn test_empty_and_mismatched() {
        assert_eq!(
            evaluate(&[], &[]).unwrap(),
            QualityReport {
                rmse_v: 0.0,
                snr_db: 0.0
            }
        );
        assert_eq!(
            evaluate(&[1.0, 2.0], &[1.0]),
            Err(ConversionError::LengthMismatch { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_report_serializes() {
        let report = QualityReport {
            rmse_v: 0.25,
            snr_db: 12.5,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"rmse_v":0.25,"snr_db":12.5}"#);
        assert_eq!(report.to_string(), "RMSE 0.2500 V, SNR 12.50 dB");
    }
}
