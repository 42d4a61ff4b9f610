//! # Uniform ADC Quantizer
//!
//! Maps bipolar analog samples in `[-Vref, +Vref]` onto unsigned integer
//! codes `0 ..= 2^bits - 1`, the way a straight-binary ADC would.
//!
//! ```text
//!   -Vref ──────────── 0 V ──────────── +Vref
//!     0       ...      max/2     ...     max_code
//! ```
//!
//! Samples outside the reference range are clipped, never wrapped. Rounding is
//! half-to-even: a normalized level of exactly 127.5 maps to code 128,
//! 126.5 maps to 126.
//!
//! ## Features
//!
//! - Supported resolutions: 8, 10, 12 and 16 bits
//! - Linear de-quantization back to volts
//! - Ideal SQNR estimate (`6.02·N + 1.76` dB)
//!
//! ## Example
//!
//! ```rust
//! use satlink_core::quantizer::Quantizer;
//!
//! let adc = Quantizer::new(8, 5.0).unwrap();
//! assert_eq!(adc.max_code(), 255);
//!
//! let codes = adc.quantize(&[-5.0, 0.0, 5.0, 12.0]);
//! assert_eq!(codes, vec![0, 128, 255, 255]);
//! ```

use crate::types::{Code, ConversionError, ConversionResult, Sample};
use serde::{Deserialize, Serialize};

/// Bit depths the converter supports.
pub const SUPPORTED_BIT_DEPTHS: [u8; 4] = [8, 10, 12, 16];

/// ADC parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizerConfig {
    /// Resolution in bits (8, 10, 12 or 16)
    pub bits: u8,
    /// Reference voltage; the input range is `[-Vref, +Vref]`
    pub reference_voltage_v: f64,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            bits: 8,
            reference_voltage_v: 5.0,
        }
    }
}

impl QuantizerConfig {
    pub fn validate(&self) -> ConversionResult<()> {
        if !SUPPORTED_BIT_DEPTHS.contains(&self.bits) {
            return Err(ConversionError::invalid(format!(
                "unsupported bit depth {}, expected one of {:?}",
                self.bits, SUPPORTED_BIT_DEPTHS
            )));
        }
        if !(self.reference_voltage_v.is_finite() && self.reference_voltage_v > 0.0) {
            return Err(ConversionError::invalid(format!(
                "reference voltage must be positive, got {} V",
                self.reference_voltage_v
            )));
        }
        Ok(())
    }
}

/// Uniform bipolar quantizer.
#[derive(Debug, Clone)]
pub struct Quantizer {
    bits: u8,
    reference_voltage: f64,
    max_code: Code,
}

impl Quantizer {
    /// Create a quantizer.
    ///
    /// Fails with [`ConversionError::InvalidConfig`] for an unsupported bit
    /// depth or a non-positive reference voltage.
    pub fn new(bits: u8, reference_voltage: f64) -> ConversionResult<Self> {
        Self::from_config(&QuantizerConfig {
            bits,
            reference_voltage_v: reference_voltage,
        })
    }

    pub fn from_config(config: &QuantizerConfig) -> ConversionResult<Self> {
        config.validate()?;
        let max_code = ((1u32 << config.bits) - 1) as Code;
        Ok(Self {
            bits: config.bits,
            reference_voltage: config.reference_voltage_v,
            max_code,
        })
    }

    /// Resolution in bits.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Highest output code, `2^bits - 1`.
    pub fn max_code(&self) -> Code {
        self.max_code
    }

    pub fn reference_voltage(&self) -> f64 {
        self.reference_voltage
    }

    /// Voltage spanned by one code step, `2·Vref / max_code`.
    pub fn step_size(&self) -> f64 {
        2.0 * self.reference_voltage / self.max_code as f64
    }

    /// Quantize one sample.
    pub fn quantize_sample(&self, sample: Sample) -> Code {
        let vref = self.reference_voltage;
        let max = self.max_code as f64;

        let clipped = sample.clamp(-vref, vref);
        let normalized = (clipped + vref) / (2.0 * vref) * max;

        normalized.round_ties_even().clamp(0.0, max) as Code
    }

    /// Quantize a whole sequence. Output length equals input length.
    pub fn quantize(&self, samples: &[Sample]) -> Vec<Code> {
        samples.iter().map(|&s| self.quantize_sample(s)).collect()
    }

    /// Map a code back to the center of its voltage bin.
    pub fn dequantize(&self, code: Code) -> Sample {
        code as f64 / self.max_code as f64 * 2.0 * self.reference_voltage - self.reference_voltage
    }

    /// De-quantize a whole code sequence.
    pub fn dequantize_all(&self, codes: &[Code]) -> Vec<Sample> {
        codes.iter().map(|&c| self.dequantize(c)).collect()
    }

    /// Theoretical SQNR for a full-scale sinusoid: `6.02·N + 1.76` dB.
    pub fn ideal_sqnr_db(&self) -> f64 {
        6.02 * self.bits as f64 + 1.76
    }
}

/// Validate parameters and quantize `samples`.
pub fn quantize(samples: &[Sample], bits: u8, reference_voltage: f64) -> ConversionResult<Vec<Code>> {
    Ok(Quantizer::new(bits, reference_voltage)?.quantize(samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_max_code_per_depth() {
        let expected = [(8, 255), (10, 1023), (12, 4095), (16, 65535)];
        for (bits, max) in expected {
            assert_eq!(Quantizer::new(bits, 1.0).unwrap().max_code(), max);
        }
    }

    #[test]
    fn test_endpoints_and_midscale() {
        let adc = Quantizer::new(8, 5.0).unwrap();
        assert_eq!(adc.quantize_sample(-5.0), 0);
        assert_eq!(adc.quantize_sample(5.0), 255);
        // 0 V normalizes to 127.5, ties to even -> 128
        assert_eq!(adc.quantize_sample(0.0), 128);
    }

    #[test]
    fn test_round_half_to_even() {
        let adc = Quantizer::new(8, 255.0).unwrap();
        // normalized = (v + 255) / 510 * 255 = (v + 255) / 2
        // v = -2 -> 126.5 -> 126 ; v = 0 -> 127.5 -> 128 ; v = 2 -> 128.5 -> 128
        assert_eq!(adc.quantize_sample(-2.0), 126);
        assert_eq!(adc.quantize_sample(0.0), 128);
        assert_eq!(adc.quantize_sample(2.0), 128);
        assert_eq!(adc.quantize_sample(4.0), 130);
    }

    #[test]
    fn test_out_of_range_clips() {
        for bits in SUPPORTED_BIT_DEPTHS {
            let adc = Quantizer::new(bits, 1.0).unwrap();
            let samples = [-1e9, -3.0, -1.0001, 1.0001, 3.0, 1e9, f64::INFINITY];
            let codes = adc.quantize(&samples);
            assert_eq!(codes.len(), samples.len());
            assert_eq!(&codes[..3], &[0, 0, 0]);
            assert!(codes[3..].iter().all(|&c| c == adc.max_code()));
        }
    }

    #[test]
    fn test_codes_in_range_for_sweep() {
        for bits in SUPPORTED_BIT_DEPTHS {
            let adc = Quantizer::new(bits, 2.5).unwrap();
            let samples: Vec<f64> = (0..2001).map(|i| -10.0 + i as f64 * 0.01).collect();
            let codes = adc.quantize(&samples);
            assert!(codes.iter().all(|&c| c <= adc.max_code()));
            // Monotonic transfer function
            assert!(codes.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_round_trip_within_one_step() {
        for bits in SUPPORTED_BIT_DEPTHS {
            let adc = Quantizer::new(bits, 5.0).unwrap();
            let step = adc.step_size();
            for i in 0..=200 {
                let v = -5.0 + i as f64 * 0.05;
                let back = adc.dequantize(adc.quantize_sample(v));
                assert!(
                    (back - v).abs() <= step,
                    "bits {} v {} back {} step {}",
                    bits,
                    v,
                    back,
                    step
                );
            }
        }
    }

    #[test]
    fn test_higher_resolution_lowers_error() {
        let samples: Vec<f64> = (0..1000)
            .map(|i| 4.0 * (2.0 * std::f64::consts::PI * i as f64 / 250.0).sin())
            .collect();
        let mut last = f64::INFINITY;
        for bits in SUPPORTED_BIT_DEPTHS {
            let adc = Quantizer::new(bits, 5.0).unwrap();
            let back = adc.dequantize_all(&adc.quantize(&samples));
            let mse = samples
                .iter()
                .zip(&back)
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                / samples.len() as f64;
            assert!(mse <= last);
            last = mse;
        }
    }

    #[test]
    fn test_ideal_sqnr() {
        assert_relative_eq!(Quantizer::new(8, 1.0).unwrap().ideal_sqnr_db(), 49.92, epsilon = 1e-9);
        assert_relative_eq!(Quantizer::new(16, 1.0).unwrap().ideal_sqnr_db(), 98.08, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(Quantizer::new(0, 5.0), Err(ConversionError::InvalidConfig(_))));
        assert!(matches!(Quantizer::new(9, 5.0), Err(ConversionError::InvalidConfig(_))));
        assert!(matches!(Quantizer::new(8, -1.0), Err(ConversionError::InvalidConfig(_))));
        assert!(matches!(Quantizer::new(8, 0.0), Err(ConversionError::InvalidConfig(_))));
        assert!(matches!(quantize(&[0.0], 8, f64::NAN), Err(ConversionError::InvalidConfig(_))));
    }
}
