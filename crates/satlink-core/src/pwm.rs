//! Natural-Sampling PWM Encoder
//!
//! Re-encodes a quantized code stream as a 0/1 bitstream whose local duty
//! cycle carries the code value.
//!
//! ```text
//!  period = 1 / pwm_frequency
//!  phase_i = (t_i mod period) / period          ∈ [0, 1)
//!  duty_i  = code_i / max_code                  ∈ [0, 1]
//!  bit_i   = 1.0 if phase_i < duty_i else 0.0
//!
//!  code = 64/255 (25%)    ▔▔▔▔▁▁▁▁▁▁▁▁▁▁▁▁▔▔▔▔▁▁▁▁▁▁▁▁▁▁▁▁
//!  code = 191/255 (75%)   ▔▔▔▔▔▔▔▔▔▔▔▔▁▁▁▁▔▔▔▔▔▔▔▔▔▔▔▔▁▁▁▁
//! ```
//!
//! The duty is re-evaluated at every sample rather than latched once per PWM
//! period, so a code that changes mid-period shows up immediately. Each
//! output bit depends only on its own index, which makes the mapping
//! trivially parallel (see `parallel::encode_pwm_parallel`).
//!
//! A PWM frequency close to the sample rate is accepted; the duty cycle just
//! becomes coarse (one period spans `sample_rate / pwm_frequency` samples).

use crate::types::{Code, ConversionError, ConversionResult};
use serde::{Deserialize, Serialize};

/// Default number of hard payload bits sliced from a PWM stream.
pub const DEFAULT_PAYLOAD_SEGMENTS: usize = 32;

/// PWM parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PwmConfig {
    /// PWM carrier frequency in Hz
    pub pwm_frequency_hz: f64,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: 5000.0,
        }
    }
}

impl PwmConfig {
    pub fn validate(&self) -> ConversionResult<()> {
        if !(self.pwm_frequency_hz.is_finite() && self.pwm_frequency_hz > 0.0) {
            return Err(ConversionError::invalid(format!(
                "PWM frequency must be positive, got {} Hz",
                self.pwm_frequency_hz
            )));
        }
        Ok(())
    }
}

/// PWM encoder for a fixed carrier frequency and code range.
#[derive(Debug, Clone)]
pub struct PwmEncoder {
    period: f64,
    max_code: Code,
}

impl PwmEncoder {
    /// Create an encoder.
    ///
    /// Fails with [`ConversionError::InvalidConfig`] when `pwm_frequency_hz`
    /// is not positive or `max_code` is zero.
    pub fn new(pwm_frequency_hz: f64, max_code: Code) -> ConversionResult<Self> {
        PwmConfig { pwm_frequency_hz }.validate()?;
        if max_code == 0 {
            return Err(ConversionError::invalid("max_code must be at least 1"));
        }
        Ok(Self {
            period: 1.0 / pwm_frequency_hz,
            max_code,
        })
    }

    /// PWM period in seconds.
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Duty cycle that represents `code`.
    pub fn duty(&self, code: Code) -> f64 {
        code as f64 / self.max_code as f64
    }

    /// Output bit at time `t` for `code`.
    #[inline]
    pub fn bit_at(&self, t: f64, code: Code) -> f64 {
        let phase = t.rem_euclid(self.period) / self.period;
        if phase < self.duty(code) {
            1.0
        } else {
            0.0
        }
    }

    /// Encode a code stream sampled at times `t`.
    ///
    /// Fails with [`ConversionError::LengthMismatch`] when `codes` and `t`
    /// differ in length.
    pub fn encode(&self, t: &[f64], codes: &[Code]) -> ConversionResult<Vec<f64>> {
        ConversionError::check_len(t.len(), codes.len())?;
        Ok(t.iter()
            .zip(codes)
            .map(|(&ti, &code)| self.bit_at(ti, code))
            .collect())
    }
}

/// Validate parameters and encode `codes` on the grid `t`.
pub fn encode(t: &[f64], codes: &[Code], max_code: Code, pwm_frequency_hz: f64) -> ConversionResult<Vec<f64>> {
    PwmEncoder::new(pwm_frequency_hz, max_code)?.encode(t, codes)
}

/// Reduce a PWM stream to `segments` hard bits.
///
/// The stream is split into `segments` nearly equal chunks (the first
/// `len % segments` chunks are one sample longer) and each chunk becomes `1`
/// when more than half its samples are high. Empty chunks yield `0`.
///
/// ```rust
/// use satlink_core::pwm::slice_payload_bits;
///
/// let pwm = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
/// assert_eq!(slice_payload_bits(&pwm, 4), vec![1, 0, 0, 0]);
/// ```
pub fn slice_payload_bits(pwm: &[f64], segments: usize) -> Vec<u8> {
    if segments == 0 {
        return Vec::new();
    }

    let base = pwm.len() / segments;
    let extra = pwm.len() % segments;

    let mut bits = Vec::with_capacity(segments);
    let mut start = 0;
    for k in 0..segments {
        let len = base + usize::from(k < extra);
        let chunk = &pwm[start..start + len];
        start += len;

        let high = !chunk.is_empty() && chunk.iter().sum::<f64>() / chunk.len() as f64 > 0.5;
        bits.push(u8::from(high));
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 / sample_rate).collect()
    }

    #[test]
    fn test_extreme_codes() {
        let t = grid(100_000.0, 200);
        let enc = PwmEncoder::new(5000.0, 255).unwrap();

        let zeros = enc.encode(&t, &vec![0; 200]).unwrap();
        assert!(zeros.iter().all(|&b| b == 0.0));

        let ones = enc.encode(&t, &vec![255; 200]).unwrap();
        assert!(ones.iter().all(|&b| b == 1.0));
    }

    #[test]
    fn test_output_is_binary() {
        let t = grid(100_000.0, 1000);
        let codes: Vec<Code> = (0..1000).map(|i| (i % 256) as Code).collect();
        let bits = encode(&t, &codes, 255, 5000.0).unwrap();
        assert_eq!(bits.len(), 1000);
        assert!(bits.iter().all(|&b| b == 0.0 || b == 1.0));
    }

    #[test]
    fn test_constant_code_duty_per_period() {
        // 20 samples per PWM period, 500 periods
        let t = grid(100_000.0, 10_000);
        for code in [0u16, 1, 64, 127, 128, 200, 254, 255] {
            let bits = encode(&t, &vec![code; t.len()], 255, 5000.0).unwrap();
            let expected = code as f64 / 255.0 * 20.0;
            for period in bits.chunks_exact(20) {
                let high = period.iter().sum::<f64>();
                assert!(
                    (high - expected).abs() <= 1.0 + 1e-9,
                    "code {} high {} expected {}",
                    code,
                    high,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_high_samples_lead_the_period() {
        let t = grid(1000.0, 10);
        // 100 Hz PWM: 10 samples per period, half duty
        let bits = encode(&t, &[5; 10], 10, 100.0).unwrap();
        assert_eq!(bits, vec![1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_duty_tracks_code_mid_period() {
        let t = grid(1000.0, 10);
        // Code jumps from 0 to full scale halfway through one period
        let codes = [0, 0, 0, 0, 0, 10, 10, 10, 10, 10];
        let bits = encode(&t, &codes, 10, 100.0).unwrap();
        assert_eq!(&bits[..5], &[0.0; 5]);
        assert_eq!(&bits[5..], &[1.0; 5]);
    }

    #[test]
    fn test_pwm_faster_than_sampling_is_accepted() {
        let t = grid(1000.0, 50);
        let bits = encode(&t, &[100; 50], 255, 900.0).unwrap();
        assert_eq!(bits.len(), 50);
    }

    #[test]
    fn test_invalid_inputs() {
        let t = grid(1000.0, 4);
        assert!(matches!(
            encode(&t, &[0; 4], 255, 0.0),
            Err(ConversionError::InvalidConfig(_))
        ));
        assert!(matches!(
            encode(&t, &[0; 4], 255, -5.0),
            Err(ConversionError::InvalidConfig(_))
        ));
        assert!(matches!(
            encode(&t, &[0; 4], 0, 100.0),
            Err(ConversionError::InvalidConfig(_))
        ));
        assert_eq!(
            encode(&t, &[0; 3], 255, 100.0),
            Err(ConversionError::LengthMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn test_slice_payload_bits_uneven_split() {
        // 10 samples into 4 chunks: sizes 3, 3, 2, 2
        let pwm = [1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0];
        assert_eq!(slice_payload_bits(&pwm, 4), vec![1, 0, 1, 0]);
    }

    #[test]
    fn test_slice_payload_bits_short_stream() {
        assert_eq!(slice_payload_bits(&[1.0, 1.0], 4), vec![1, 1, 0, 0]);
        assert!(slice_payload_bits(&[1.0], 0).is_empty());
        assert_eq!(slice_payload_bits(&[], DEFAULT_PAYLOAD_SEGMENTS).len(), 32);
    }
}
