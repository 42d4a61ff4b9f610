//! Core types for the conversion pipeline
//!
//! This module defines the sequence types that flow between pipeline stages
//! and the error type every stage returns.
//!
//! ## Sequences on a Shared Time Grid
//!
//! Every stage works on whole sequences that share one uniform time grid:
//!
//! ```text
//!  t:        0    Δt   2Δt  3Δt  ...  (N-1)Δt       Δt = 1 / sample_rate
//!  analog:   v0   v1   v2   v3   ...  vN-1          volts
//!  codes:    c0   c1   c2   c3   ...  cN-1          0 ..= 2^bits - 1
//!  pwm:      1    1    0    0    ...  b(N-1)        0.0 / 1.0
//!  recon:    r0   r1   r2   r3   ...  rN-1          volts
//! ```
//!
//! Sequences are produced fresh on every run and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// A real-valued sample (volts for analog sequences).
pub type Sample = f64;

/// A quantizer output code. 16 bits covers every supported bit depth.
pub type Code = u16;

/// Result type for pipeline operations
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Errors that can occur while running the conversion pipeline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// A parameter is outside its domain (non-positive frequency, voltage,
    /// cutoff, unsupported bit depth, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two sequences that must share the time grid have different lengths.
    #[error("Length mismatch: expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Butterworth design was infeasible. Recovered inside the reconstructor
    /// and never returned from the public API.
    #[error("Filter design failed: {0}")]
    FilterDesign(String),
}

impl ConversionError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ConversionError::InvalidConfig(msg.into())
    }

    /// Fail with [`ConversionError::LengthMismatch`] unless `actual == expected`.
    pub(crate) fn check_len(expected: usize, actual: usize) -> ConversionResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(ConversionError::LengthMismatch { expected, actual })
        }
    }
}

/// Uniform sampling grid `t_i = i / sample_rate`, `i = 0 .. N-1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    sample_rate: f64,
    times: Vec<f64>,
}

impl TimeGrid {
    /// Build a grid covering `duration_s` seconds at `sample_rate` Hz.
    ///
    /// The sample count is `duration_s * sample_rate`, truncated; products
    /// within 1e-9 of an integer are rounded instead so that float noise such
    /// as `0.1 * 100000.0` does not lose a sample.
    ///
    /// # Example
    /// ```rust
    /// use satlink_core::types::TimeGrid;
    ///
    /// let grid = TimeGrid::new(100_000.0, 0.1).unwrap();
    /// assert_eq!(grid.len(), 10_000);
    /// assert!((grid.step() - 1e-5).abs() < 1e-15);
    /// ```
    pub fn new(sample_rate: f64, duration_s: f64) -> ConversionResult<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ConversionError::invalid(format!(
                "sample_rate must be positive, got {sample_rate}"
            )));
        }
        if !(duration_s.is_finite() && duration_s > 0.0) {
            return Err(ConversionError::invalid(format!(
                "duration must be positive, got {duration_s}"
            )));
        }

        let product = duration_s * sample_rate;
        let count = if (product - product.round()).abs() < 1e-9 {
            product.round()
        } else {
            product.floor()
        } as usize;

        let times = (0..count).map(|i| i as f64 / sample_rate).collect();
        Ok(Self { sample_rate, times })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Grid spacing in seconds.
    pub fn step(&self) -> f64 {
        1.0 / self.sample_rate
    }

    /// Sample times in seconds.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_length_and_spacing() {
        let grid = TimeGrid::new(1000.0, 0.1).unwrap();
        assert_eq!(grid.len(), 100);
        assert_eq!(grid.times()[0], 0.0);
        for pair in grid.times().windows(2) {
            assert!(pair[1] > pair[0]);
            assert!((pair[1] - pair[0] - 1e-3).abs() < 1e-12);
        }
    }

    #[test]
    fn test_grid_float_noise_rounds() {
        // 0.1 * 100000 is 10000.000000000002 in f64
        let grid = TimeGrid::new(100_000.0, 0.1).unwrap();
        assert_eq!(grid.len(), 10_000);
    }

    #[test]
    fn test_grid_truncates_fractional_count() {
        let grid = TimeGrid::new(1000.0, 0.0105).unwrap();
        assert_eq!(grid.len(), 10);
    }

    #[test]
    fn test_grid_rejects_bad_parameters() {
        assert!(matches!(
            TimeGrid::new(0.0, 0.1),
            Err(ConversionError::InvalidConfig(_))
        ));
        assert!(matches!(
            TimeGrid::new(1000.0, -1.0),
            Err(ConversionError::InvalidConfig(_))
        ));
        assert!(matches!(
            TimeGrid::new(f64::NAN, 0.1),
            Err(ConversionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_check_len() {
        assert!(ConversionError::check_len(4, 4).is_ok());
        assert_eq!(
            ConversionError::check_len(4, 3),
            Err(ConversionError::LengthMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn test_error_display() {
        let err = ConversionError::LengthMismatch { expected: 10, actual: 9 };
        assert_eq!(err.to_string(), "Length mismatch: expected 10 samples, got 9");
    }
}
