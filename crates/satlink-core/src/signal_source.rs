//! Signal Source / Test Waveform Generator
//!
//! Generates the band-limited analog test signals that drive the conversion
//! pipeline: sine, bipolar square, and triangle. All frequencies are in hertz;
//! any kHz display scaling belongs to the presentation layer.
//!
//! ```text
//!  Sine       A·sin(2π·f·t)
//!  Square     +A while ((t·f) mod 1) < duty, else -A
//!  Triangle   A·2·|2·((t·f) mod 1) - 1| - A
//! ```
//!
//! ## Example
//!
//! ```rust
//! use satlink_core::signal_source::{SignalSource, WaveformConfig, WaveformShape};
//! use satlink_core::types::TimeGrid;
//!
//! let grid = TimeGrid::new(48_000.0, 0.01).unwrap();
//! let config = WaveformConfig {
//!     shape: WaveformShape::Sine,
//!     frequency_hz: 1000.0,
//!     amplitude_v: 1.0,
//!     duty_cycle: 0.5,
//! };
//!
//! let samples = SignalSource::new(config).unwrap().generate(grid.times());
//! assert_eq!(samples.len(), grid.len());
//! ```

use crate::types::{ConversionError, ConversionResult, Sample};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

/// Test waveform shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformShape {
    /// Pure tone
    #[default]
    Sine,
    /// Bipolar square wave with configurable duty cycle
    Square,
    /// Symmetric triangle ramp
    Triangle,
}

impl std::fmt::Display for WaveformShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaveformShape::Sine => write!(f, "sine"),
            WaveformShape::Square => write!(f, "square"),
            WaveformShape::Triangle => write!(f, "triangle"),
        }
    }
}

impl FromStr for WaveformShape {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(WaveformShape::Sine),
            "square" | "sq" => Ok(WaveformShape::Square),
            "triangle" | "tri" => Ok(WaveformShape::Triangle),
            other => Err(ConversionError::invalid(format!(
                "unknown waveform shape '{other}', expected sine, square or triangle"
            ))),
        }
    }
}

/// Waveform parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    pub shape: WaveformShape,
    /// Frequency in Hz
    pub frequency_hz: f64,
    /// Peak amplitude in volts
    pub amplitude_v: f64,
    /// High fraction of each period, used by [`WaveformShape::Square`] only
    pub duty_cycle: f64,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            shape: WaveformShape::Sine,
            frequency_hz: 1000.0,
            amplitude_v: 5.0,
            duty_cycle: 0.5,
        }
    }
}

impl WaveformConfig {
    /// Check parameter domains.
    pub fn validate(&self) -> ConversionResult<()> {
        if !(self.frequency_hz.is_finite() && self.frequency_hz > 0.0) {
            return Err(ConversionError::invalid(format!(
                "waveform frequency must be positive, got {} Hz",
                self.frequency_hz
            )));
        }
        if !(self.amplitude_v.is_finite() && self.amplitude_v > 0.0) {
            return Err(ConversionError::invalid(format!(
                "waveform amplitude must be positive, got {} V",
                self.amplitude_v
            )));
        }
        if self.shape == WaveformShape::Square && !(self.duty_cycle > 0.0 && self.duty_cycle < 1.0)
        {
            return Err(ConversionError::invalid(format!(
                "square duty cycle must be in (0, 1), got {}",
                self.duty_cycle
            )));
        }
        Ok(())
    }
}

/// Stateless test-signal generator.
#[derive(Debug, Clone)]
pub struct SignalSource {
    config: WaveformConfig,
}

impl SignalSource {
    /// Create a generator after validating `config`.
    pub fn new(config: WaveformConfig) -> ConversionResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Sample the waveform at every time in `t` (seconds).
    pub fn generate(&self, t: &[f64]) -> Vec<Sample> {
        t.iter().map(|&ti| self.sample_at(ti)).collect()
    }

    /// Waveform value at time `t` seconds.
    pub fn sample_at(&self, t: f64) -> Sample {
        let WaveformConfig {
            shape,
            frequency_hz,
            amplitude_v,
            duty_cycle,
        } = self.config;

        match shape {
            WaveformShape::Sine => amplitude_v * (2.0 * PI * frequency_hz * t).sin(),
            WaveformShape::Square => {
                let phase = (t * frequency_hz).rem_euclid(1.0);
                if phase < duty_cycle {
                    amplitude_v
                } else {
                    -amplitude_v
                }
            }
            WaveformShape::Triangle => {
                let phase = (t * frequency_hz).rem_euclid(1.0);
                amplitude_v * 2.0 * (2.0 * phase - 1.0).abs() - amplitude_v
            }
        }
    }

    pub fn config(&self) -> &WaveformConfig {
        &self.config
    }
}

/// Validate `config` and sample it on `t`.
pub fn generate(config: &WaveformConfig, t: &[f64]) -> ConversionResult<Vec<Sample>> {
    Ok(SignalSource::new(config.clone())?.generate(t))
}
