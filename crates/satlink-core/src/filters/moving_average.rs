//! Moving Average Filter
//!
//! Centered rectangular smoothing: the sequence is convolved with a kernel of
//! `length` taps of `1/length` each and the middle `N` samples of the full
//! convolution are kept. Samples beyond either end count as zero, so the
//! first and last `length/2` outputs sag toward zero.
//!
//! A prefix-sum makes each output O(1) regardless of window length.
//!
//! ## Example
//!
//! ```rust
//! use satlink_core::filters::{BlockFilter, MovingAverage};
//!
//! let ma = MovingAverage::new(4).unwrap();
//! let out = ma.apply(&[1.0; 10]);
//! assert_eq!(out.len(), 10);
//! assert!((out[5] - 1.0).abs() < 1e-12);
//! ```

use super::traits::{BlockFilter, FrequencyResponse};
use crate::types::{ConversionError, ConversionResult};
use std::f64::consts::PI;

/// Centered moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverage {
    /// Window length
    length: usize,
}

impl MovingAverage {
    /// Create a moving average of `length` taps.
    pub fn new(length: usize) -> ConversionResult<Self> {
        if length == 0 {
            return Err(ConversionError::invalid("moving-average window must be at least 1 sample"));
        }
        Ok(Self { length })
    }

    /// Window that approximates a low-pass at `cutoff_hz`: `max(1, round(fs / cutoff))`.
    ///
    /// Rounding is half-to-even.
    pub fn for_cutoff(cutoff_hz: f64, sample_rate: f64) -> ConversionResult<Self> {
        if !(cutoff_hz.is_finite() && cutoff_hz > 0.0) {
            return Err(ConversionError::invalid(format!(
                "cutoff must be positive, got {cutoff_hz} Hz"
            )));
        }
        let taps = (sample_rate / cutoff_hz).round_ties_even();
        let length = if taps.is_finite() && taps >= 1.0 {
            taps as usize
        } else {
            1
        };
        Self::new(length)
    }

    /// Get the window length.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl BlockFilter for MovingAverage {
    fn apply(&self, input: &[f64]) -> Vec<f64> {
        let n = input.len();
        let w = self.length;
        let offset = (w - 1) / 2;

        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push(0.0);
        let mut acc = 0.0;
        for &x in input {
            acc += x;
            prefix.push(acc);
        }

        (0..n)
            .map(|i| {
                // Window covers input[i + offset + 1 - w ..= i + offset]
                let hi = (i + offset).min(n - 1);
                let lo = (i + offset + 1).saturating_sub(w);
                if lo > hi {
                    0.0
                } else {
                    (prefix[hi + 1] - prefix[lo]) / w as f64
                }
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "moving_average"
    }
}

impl FrequencyResponse for MovingAverage {
    /// |sin(πfL/fs) / (L·sin(πf/fs))|, the Dirichlet kernel.
    fn magnitude_response(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let x = PI * freq_hz / sample_rate;
        let l = self.length as f64;
        if x.sin().abs() < 1e-12 {
            return 1.0;
        }
        ((l * x).sin() / (l * x.sin())).abs()
    }
}
