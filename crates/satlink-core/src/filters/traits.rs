//! Core Filter Traits
//!
//! Defines the traits the reconstruction filters are built on.
//!
//! ## Architecture
//!
//! ```text
//! Filter (causal, sample-at-a-time, internal state)
//!    └── IirFilter
//!
//! BlockFilter (whole-sequence, may be non-causal)
//!    ├── MovingAverage          centered rectangular kernel
//!    └── ZeroPhaseButterworth   forward-backward IIR
//!
//! FrequencyResponse (frequency domain analysis)
//! ```
//!
//! The reconstructor only sees `BlockFilter`, so the moving-average and
//! Butterworth paths are interchangeable strategies.

use serde::{Deserialize, Serialize};

/// Causal filter with internal state.
pub trait Filter: Send + Sync {
    /// Process a single sample through the filter.
    fn process(&mut self, input: f64) -> f64;

    /// Process a block of samples, returning filtered output.
    fn process_block(&mut self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|&s| self.process(s)).collect()
    }

    /// Reset filter state (clear delay lines).
    fn reset(&mut self);

    /// Filter order.
    fn order(&self) -> usize;
}

/// Filter that consumes a whole sequence and returns a same-length sequence.
///
/// Implementations are free to look ahead (centered kernels, forward-backward
/// passes); they hold no state between calls.
pub trait BlockFilter: Send + Sync {
    /// Filter `input`. The output has exactly `input.len()` samples.
    fn apply(&self, input: &[f64]) -> Vec<f64>;

    /// Short human-readable name for logs and reports.
    fn name(&self) -> &'static str;
}

/// Magnitude response analysis.
pub trait FrequencyResponse {
    /// Linear magnitude response at `freq_hz`.
    fn magnitude_response(&self, freq_hz: f64, sample_rate: f64) -> f64;

    /// Magnitude response in decibels.
    fn magnitude_response_db(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        20.0 * self.magnitude_response(freq_hz, sample_rate).log10()
    }
}

/// Reconstruction filter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Centered rectangular window of `round(fs / cutoff)` samples
    #[default]
    MovingAverage,
    /// Zero-phase Butterworth low-pass
    Butterworth,
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterKind::MovingAverage => write!(f, "moving_average"),
            FilterKind::Butterworth => write!(f, "butterworth"),
        }
    }
}

impl std::str::FromStr for FilterKind {
    type Err = crate::types::ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "moving_average" | "ma" => Ok(FilterKind::MovingAverage),
            "butterworth" | "butter" => Ok(FilterKind::Butterworth),
            other => Err(crate::types::ConversionError::invalid(format!(
                "unknown filter kind '{other}', expected moving_average or butterworth"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock filter for testing traits
    struct Doubler;

    impl BlockFilter for Doubler {
        fn apply(&self, input: &[f64]) -> Vec<f64> {
            input.iter().map(|v| v * 2.0).collect()
        }

        fn name(&self) -> &'static str {
            "doubler"
        }
    }

    struct Accumulator {
        sum: f64,
    }

    impl Filter for Accumulator {
        fn process(&mut self, input: f64) -> f64 {
            self.sum += input;
            self.sum
        }

        fn reset(&mut self) {
            self.sum = 0.0;
        }

        fn order(&self) -> usize {
            1
        }
    }

    #[test]
    fn test_block_filter_object() {
        let filter: Box<dyn BlockFilter> = Box::new(Doubler);
        assert_eq!(filter.apply(&[1.0, -2.0]), vec![2.0, -4.0]);
        assert_eq!(filter.name(), "doubler");
    }

    #[test]
    fn test_default_process_block() {
        let mut acc = Accumulator { sum: 0.0 };
        assert_eq!(acc.process_block(&[1.0, 1.0, 1.0]), vec![1.0, 2.0, 3.0]);
        acc.reset();
        assert_eq!(acc.process(5.0), 5.0);
    }

    #[test]
    fn test_filter_kind_parse() {
        assert_eq!("butterworth".parse::<FilterKind>().unwrap(), FilterKind::Butterworth);
        assert_eq!("moving-average".parse::<FilterKind>().unwrap(), FilterKind::MovingAverage);
        assert!("chebyshev".parse::<FilterKind>().is_err());
        assert_eq!(FilterKind::MovingAverage.to_string(), "moving_average");
    }
}
