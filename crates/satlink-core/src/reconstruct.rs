//! PWM-to-Analog Reconstruction
//!
//! Low-pass filters a 0/1 PWM bitstream back into a duty-cycle estimate and
//! rescales it to the bipolar voltage range:
//!
//! ```text
//!  bits ──► low-pass ──► f ∈ [0, 1] ──► (2f − 1)·Vref ──► volts
//! ```
//!
//! Two filter strategies are available behind [`BlockFilter`]:
//!
//! | Kind            | Filter                                              |
//! |-----------------|-----------------------------------------------------|
//! | `MovingAverage` | centered window of `max(1, round(fs / cutoff))`     |
//! | `Butterworth`   | zero-phase Butterworth, cutoff `min(0.99, fc/(fs/2))` of Nyquist |
//!
//! When the Butterworth design is infeasible, or its output is not finite,
//! the reconstructor logs a warning and silently uses the moving average with
//! the same cutoff. Callers never see the design failure.

use crate::filters::{BlockFilter, FilterKind, MovingAverage, ZeroPhaseButterworth};
use crate::types::{ConversionError, ConversionResult};
use serde::{Deserialize, Serialize};

/// Upper bound for the normalized Butterworth cutoff (fraction of Nyquist).
pub const MAX_NORMALIZED_CUTOFF: f64 = 0.99;

/// Reconstruction filter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub kind: FilterKind,
    /// Cutoff frequency in Hz
    pub cutoff_hz: f64,
    /// Butterworth order; ignored by the moving average
    pub order: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: FilterKind::MovingAverage,
            cutoff_hz: 20_000.0,
            order: 4,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> ConversionResult<()> {
        if !(self.cutoff_hz.is_finite() && self.cutoff_hz > 0.0) {
            return Err(ConversionError::invalid(format!(
                "filter cutoff must be positive, got {} Hz",
                self.cutoff_hz
            )));
        }
        if self.kind == FilterKind::Butterworth && self.order < 1 {
            return Err(ConversionError::invalid("Butterworth order must be at least 1"));
        }
        Ok(())
    }
}

/// Rebuilds an analog waveform from a PWM bitstream.
#[derive(Debug, Clone)]
pub struct SignalReconstructor {
    config: FilterConfig,
    reference_voltage: f64,
}

impl SignalReconstructor {
    /// Create a reconstructor.
    ///
    /// Fails with [`ConversionError::InvalidConfig`] for a non-positive
    /// cutoff, a Butterworth order of zero, or a non-positive reference
    /// voltage.
    pub fn new(config: FilterConfig, reference_voltage: f64) -> ConversionResult<Self> {
        config.validate()?;
        if !(reference_voltage.is_finite() && reference_voltage > 0.0) {
            return Err(ConversionError::invalid(format!(
                "reference voltage must be positive, got {reference_voltage} V"
            )));
        }
        Ok(Self {
            config,
            reference_voltage,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Build the filter that will run at `sample_rate`.
    ///
    /// Butterworth design failures are logged and answered with the moving
    /// average for the same cutoff.
    pub fn filter_for(&self, sample_rate: f64) -> ConversionResult<Box<dyn BlockFilter>> {
        match self.config.kind {
            FilterKind::MovingAverage => Ok(Box::new(self.moving_average(sample_rate)?)),
            FilterKind::Butterworth => {
                let nyquist = sample_rate / 2.0;
                let normalized = (self.config.cutoff_hz / nyquist).min(MAX_NORMALIZED_CUTOFF);
                match ZeroPhaseButterworth::new(self.config.order, normalized * nyquist, sample_rate) {
                    Ok(filter) => Ok(Box::new(filter)),
                    Err(e) => {
                        tracing::warn!(
                            order = self.config.order,
                            cutoff_hz = self.config.cutoff_hz,
                            "Butterworth design failed ({}), using moving average",
                            e
                        );
                        Ok(Box::new(self.moving_average(sample_rate)?))
                    }
                }
            }
        }
    }

    fn moving_average(&self, sample_rate: f64) -> ConversionResult<MovingAverage> {
        MovingAverage::for_cutoff(self.config.cutoff_hz, sample_rate)
    }

    /// Reconstruct volts from `pwm` sampled on the uniform grid `t`.
    ///
    /// The sample rate is taken from the first two time stamps. Inputs shorter
    /// than two samples come back as zeros.
    pub fn reconstruct(&self, t: &[f64], pwm: &[f64]) -> ConversionResult<Vec<f64>> {
        ConversionError::check_len(t.len(), pwm.len())?;
        if t.len() < 2 {
            return Ok(vec![0.0; t.len()]);
        }

        let dt = t[1] - t[0];
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConversionError::invalid(format!(
                "time grid must be strictly increasing, got step {dt} s"
            )));
        }
        let sample_rate = 1.0 / dt;

        let filter = self.filter_for(sample_rate)?;
        let mut filtered = filter.apply(pwm);

        if filter.name() != "moving_average" && filtered.iter().any(|v| !v.is_finite()) {
            tracing::warn!(
                filter = filter.name(),
                "non-finite filter output, using moving average"
            );
            filtered = self.moving_average(sample_rate)?.apply(pwm);
        }

        tracing::debug!(
            filter = filter.name(),
            sample_rate,
            samples = pwm.len(),
            "reconstructed PWM stream"
        );

        let vref = self.reference_voltage;
        Ok(filtered.into_iter().map(|f| (f * 2.0 - 1.0) * vref).collect())
    }
}

/// Validate parameters and reconstruct `pwm` on the grid `t`.
pub fn reconstruct(
    t: &[f64],
    pwm: &[f64],
    cutoff_hz: f64,
    order: usize,
    reference_voltage: f64,
    kind: FilterKind,
) -> ConversionResult<Vec<f64>> {
    SignalReconstructor::new(
        FilterConfig {
            kind,
            cutoff_hz,
            order,
        },
        reference_voltage,
    )?
    .reconstruct(t, pwm)
}
