//! IIR Filter implementations
//!
//! Butterworth low-pass filters built as cascaded biquad sections for
//! numerical stability, plus forward-backward (zero-phase) application.
//!
//! ## Design Method
//!
//! Analog Butterworth prototype poles are scaled to the pre-warped cutoff and
//! mapped to the z-plane with the bilinear transform. Each conjugate pole pair
//! becomes one second-order section; an odd order adds one first-order
//! section for the real pole at `s = -1`.
//!
//! ## Zero-Phase Filtering
//!
//! ```text
//! x ──odd-extend──► forward pass ──reverse──► forward pass ──reverse──► trim ──► y
//! ```
//!
//! Each pass starts from the steady state for its first sample, so a constant
//! input produces a constant output with no start-up transient. Running the
//! cascade twice squares the magnitude response and cancels the phase.
//!
//! ## Example
//!
//! ```rust
//! use satlink_core::filters::{BlockFilter, ZeroPhaseButterworth};
//!
//! // 4th-order low-pass at 1 kHz, 8 kHz sample rate
//! let lpf = ZeroPhaseButterworth::new(4, 1000.0, 8000.0).unwrap();
//! let out = lpf.apply(&[1.0; 64]);
//! assert!((out[32] - 1.0).abs() < 1e-9);
//! ```

use super::traits::{BlockFilter, Filter, FrequencyResponse};
use crate::types::{ConversionError, ConversionResult};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Highest Butterworth order the designer accepts.
pub const MAX_BUTTERWORTH_ORDER: usize = 20;

/// A single biquad (second-order section) filter.
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
///
/// Using Direct Form II Transposed for better numerical properties.
#[derive(Debug, Clone)]
pub struct Biquad {
    /// Numerator coefficients [b0, b1, b2]
    b: [f64; 3],
    /// Denominator coefficients [a1, a2] (a0 is normalized to 1)
    a: [f64; 2],
    /// State variables for Direct Form II Transposed
    state: [f64; 2],
}

impl Biquad {
    /// Create a new biquad section with given coefficients.
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self {
            b,
            a,
            state: [0.0; 2],
        }
    }

    /// Create a pass-through (unity gain) biquad.
    pub fn unity() -> Self {
        Self::new([1.0, 0.0, 0.0], [0.0, 0.0])
    }

    /// Process a single sample using Direct Form II Transposed.
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b[0] * input + self.state[0];
        self.state[0] = self.b[1] * input - self.a[0] * output + self.state[1];
        self.state[1] = self.b[2] * input - self.a[1] * output;
        output
    }

    /// Reset the filter state.
    pub fn reset(&mut self) {
        self.state = [0.0; 2];
    }

    /// Gain at DC, H(z = 1).
    pub fn dc_gain(&self) -> f64 {
        let den = 1.0 + self.a[0] + self.a[1];
        (self.b[0] + self.b[1] + self.b[2]) / den
    }

    /// Load the state a constant `input` would settle into.
    ///
    /// Returns the settled output so sections can be chained.
    pub fn settle(&mut self, input: f64) -> f64 {
        let den = 1.0 + self.a[0] + self.a[1];
        if den.abs() < f64::MIN_POSITIVE {
            self.reset();
            return 0.0;
        }
        let output = self.dc_gain() * input;
        self.state[1] = self.b[2] * input - self.a[1] * output;
        self.state[0] = self.b[1] * input - self.a[0] * output + self.state[1];
        output
    }

    /// Get the numerator coefficients.
    pub fn numerator(&self) -> &[f64; 3] {
        &self.b
    }

    /// Get the denominator coefficients.
    pub fn denominator(&self) -> &[f64; 2] {
        &self.a
    }

    /// Check if this biquad is stable (poles inside unit circle).
    pub fn is_stable(&self) -> bool {
        // For 1 + a1*z^-1 + a2*z^-2: |a2| < 1 and |a1| < 1 + a2
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }
}

/// IIR filter implemented as a cascade of biquad sections.
#[derive(Debug, Clone)]
pub struct IirFilter {
    /// Cascade of biquad sections
    sections: Vec<Biquad>,
    /// Overall gain factor
    gain: f64,
    /// Filter order
    order: usize,
}

impl IirFilter {
    /// Create a new IIR filter from biquad sections.
    pub fn new(sections: Vec<Biquad>, gain: f64) -> Self {
        let order = sections.len() * 2;
        Self {
            sections,
            gain,
            order,
        }
    }

    /// Design a Butterworth lowpass filter.
    ///
    /// # Arguments
    /// * `order` - Filter order (1 to [`MAX_BUTTERWORTH_ORDER`])
    /// * `cutoff_hz` - Cutoff frequency in Hz (-3 dB point), below Nyquist
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// Fails with [`ConversionError::FilterDesign`] when the combination is
    /// infeasible or the resulting cascade is unstable.
    pub fn butterworth_lowpass(order: usize, cutoff_hz: f64, sample_rate: f64) -> ConversionResult<Self> {
        if order == 0 || order > MAX_BUTTERWORTH_ORDER {
            return Err(ConversionError::FilterDesign(format!(
                "order {order} outside 1..={MAX_BUTTERWORTH_ORDER}"
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ConversionError::FilterDesign(format!(
                "sample rate {sample_rate} Hz is not usable"
            )));
        }
        if !(cutoff_hz.is_finite() && cutoff_hz > 0.0 && cutoff_hz < sample_rate / 2.0) {
            return Err(ConversionError::FilterDesign(format!(
                "cutoff {cutoff_hz} Hz must lie in (0, {}) Hz",
                sample_rate / 2.0
            )));
        }

        let sections = design_butterworth(order, cutoff_hz, sample_rate);
        let mut filter = Self::new(sections, 1.0);
        filter.order = order;

        if !filter.is_stable() {
            return Err(ConversionError::FilterDesign(format!(
                "order {order} at {cutoff_hz} Hz / {sample_rate} Hz produced an unstable cascade"
            )));
        }
        Ok(filter)
    }

    /// Get the number of biquad sections.
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Check if the filter is stable (all poles inside unit circle).
    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(|s| s.is_stable())
    }

    /// Get access to biquad sections for analysis.
    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Load the steady state for a constant `input`.
    pub fn settle(&mut self, input: f64) {
        let mut level = input * self.gain;
        for section in &mut self.sections {
            level = section.settle(level);
        }
    }

    /// Complex frequency response H(e^jω) at `freq_hz`.
    pub fn frequency_response(&self, freq_hz: f64, sample_rate: f64) -> Complex64 {
        let omega = 2.0 * PI * freq_hz / sample_rate;
        let z_inv = Complex64::new(omega.cos(), -omega.sin());
        let z_inv2 = z_inv * z_inv;

        let mut response = Complex64::new(self.gain, 0.0);
        for section in &self.sections {
            let num = section.b[0] + section.b[1] * z_inv + section.b[2] * z_inv2;
            let den = 1.0 + section.a[0] * z_inv + section.a[1] * z_inv2;
            response *= num / den;
        }
        response
    }

    /// Forward-backward filtering of a whole sequence.
    ///
    /// The input is extended at both ends by odd reflection of
    /// `3·(2·sections + 1)` samples (fewer for short inputs) before the two
    /// passes, and the extension is trimmed afterwards.
    pub fn filtfilt(&self, input: &[f64]) -> Vec<f64> {
        let n = input.len();
        if n == 0 {
            return Vec::new();
        }

        let pad = (3 * (2 * self.sections.len() + 1)).min(n - 1);
        let first = input[0];
        let last = input[n - 1];

        let mut extended = Vec::with_capacity(n + 2 * pad);
        extended.extend((1..=pad).rev().map(|i| 2.0 * first - input[i]));
        extended.extend_from_slice(input);
        extended.extend((0..pad).map(|i| 2.0 * last - input[n - 2 - i]));

        let mut pass = self.clone();
        pass.settle(extended[0]);
        let mut y = pass.process_block(&extended);
        y.reverse();

        pass.settle(y[0]);
        let mut y = pass.process_block(&y);
        y.reverse();

        y.drain(..pad);
        y.truncate(n);
        y
    }
}

impl Filter for IirFilter {
    fn process(&mut self, input: f64) -> f64 {
        let mut output = input * self.gain;
        for section in &mut self.sections {
            output = section.process(output);
        }
        output
    }

    fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    fn order(&self) -> usize {
        self.order
    }
}

impl FrequencyResponse for IirFilter {
    fn magnitude_response(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        self.frequency_response(freq_hz, sample_rate).norm()
    }
}

/// Zero-phase Butterworth low-pass, applied forward and backward.
#[derive(Debug, Clone)]
pub struct ZeroPhaseButterworth {
    filter: IirFilter,
}

impl ZeroPhaseButterworth {
    /// Design the underlying Butterworth cascade.
    pub fn new(order: usize, cutoff_hz: f64, sample_rate: f64) -> ConversionResult<Self> {
        Ok(Self {
            filter: IirFilter::butterworth_lowpass(order, cutoff_hz, sample_rate)?,
        })
    }

    /// The single-pass cascade.
    pub fn inner(&self) -> &IirFilter {
        &self.filter
    }
}

impl BlockFilter for ZeroPhaseButterworth {
    fn apply(&self, input: &[f64]) -> Vec<f64> {
        self.filter.filtfilt(input)
    }

    fn name(&self) -> &'static str {
        "butterworth"
    }
}

impl FrequencyResponse for ZeroPhaseButterworth {
    /// Forward-backward magnitude, |H|².
    fn magnitude_response(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        self.filter.magnitude_response(freq_hz, sample_rate).powi(2)
    }
}

// ============================================================================
// Design Functions
// ============================================================================

/// Design Butterworth low-pass sections using the bilinear transform.
fn design_butterworth(order: usize, cutoff_hz: f64, sample_rate: f64) -> Vec<Biquad> {
    let wc = prewarp(cutoff_hz, sample_rate);
    let k = 2.0 * sample_rate;

    let mut sections: Vec<Biquad> = butterworth_upper_poles(order)
        .into_iter()
        .map(|p| {
            let (b, a) = bilinear_2pole(p * wc, k);
            Biquad::new(b, a)
        })
        .collect();

    if order % 2 == 1 {
        let (b, a) = bilinear_1pole(-wc, k);
        sections.push(Biquad::new(b, a));
    }

    sections
}

/// Pre-warp frequency for bilinear transform.
fn prewarp(freq_hz: f64, sample_rate: f64) -> f64 {
    2.0 * sample_rate * (PI * freq_hz / sample_rate).tan()
}

/// Butterworth prototype poles in the upper-left quadrant, one per conjugate pair.
fn butterworth_upper_poles(order: usize) -> Vec<Complex64> {
    (0..order / 2)
        .map(|k| {
            let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
            Complex64::new(theta.cos(), theta.sin())
        })
        .collect()
}

/// Bilinear transform of the real pole `p`: H(s) = -p / (s - p).
fn bilinear_1pole(p: f64, k: f64) -> ([f64; 3], [f64; 2]) {
    let alpha = k - p;
    let beta = k + p;
    let b0 = -p / alpha;
    ([b0, b0, 0.0], [-beta / alpha, 0.0])
}

/// Bilinear transform of the pole pair p, p*: H(s) = |p|² / (s² - 2·Re(p)·s + |p|²).
fn bilinear_2pole(p: Complex64, k: f64) -> ([f64; 3], [f64; 2]) {
    let p_mag_sq = p.norm_sqr();
    let k2 = k * k;
    let d = k2 - 2.0 * k * p.re + p_mag_sq;

    let b0 = p_mag_sq / d;
    let a1 = 2.0 * (p_mag_sq - k2) / d;
    let a2 = (k2 + 2.0 * k * p.re + p_mag_sq) / d;

    ([b0, 2.0 * b0, b0], [a1, a2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_biquad_unity() {
        let mut bq = Biquad::unity();
        assert_abs_diff_eq!(bq.process(1.0), 1.0, epsilon = 1e-12);
        assert_eq!(bq.numerator(), &[1.0, 0.0, 0.0]);
        assert_eq!(bq.denominator(), &[0.0, 0.0]);
    }

    #[test]
    fn test_biquad_stability() {
        assert!(Biquad::new([1.0, 0.0, 0.0], [0.5, 0.2]).is_stable());
        assert!(!Biquad::new([1.0, 0.0, 0.0], [2.0, 0.5]).is_stable());
    }

    #[test]
    fn test_biquad_settle_matches_convergence() {
        let mut settled = Biquad::new([0.2, 0.4, 0.2], [-0.5, 0.3]);
        let out = settled.settle(2.0);
        // Already at steady state, so the next outputs stay put
        for _ in 0..10 {
            assert_abs_diff_eq!(settled.process(2.0), out, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(out, 2.0 * settled.dc_gain(), epsilon = 1e-12);
    }

    #[test]
    fn test_section_counts() {
        for order in 1..=8 {
            let filter = IirFilter::butterworth_lowpass(order, 1000.0, 8000.0).unwrap();
            assert_eq!(filter.order(), order);
            assert_eq!(filter.num_sections(), (order + 1) / 2);
            assert!(filter.is_stable());
        }
    }

    #[test]
    fn test_cutoff_is_minus_3db_for_every_order() {
        for order in 1..=7 {
            let filter = IirFilter::butterworth_lowpass(order, 1000.0, 8000.0).unwrap();
            let dc_db = filter.magnitude_response_db(0.0, 8000.0);
            let cutoff_db = filter.magnitude_response_db(1000.0, 8000.0);
            assert!(dc_db.abs() < 1e-6, "order {} DC {}", order, dc_db);
            assert!(
                (cutoff_db + 3.0103).abs() < 0.01,
                "order {} cutoff {}",
                order,
                cutoff_db
            );
        }
    }

    #[test]
    fn test_rolloff_steepens_with_order() {
        let low = IirFilter::butterworth_lowpass(2, 1000.0, 8000.0).unwrap();
        let high = IirFilter::butterworth_lowpass(6, 1000.0, 8000.0).unwrap();
        assert!(high.magnitude_response_db(2500.0, 8000.0) < low.magnitude_response_db(2500.0, 8000.0));
        assert!(high.magnitude_response_db(3000.0, 8000.0) < -40.0);
    }

    #[test]
    fn test_causal_dc_passthrough() {
        let mut filter = IirFilter::butterworth_lowpass(4, 1000.0, 8000.0).unwrap();
        let out = filter.process_block(&[1.0; 200]);
        assert_abs_diff_eq!(out[199], 1.0, epsilon = 1e-6);

        filter.reset();
        assert!(filter.process(1.0).abs() < 0.5);
    }

    #[test]
    fn test_design_rejections() {
        assert!(matches!(
            IirFilter::butterworth_lowpass(0, 1000.0, 8000.0),
            Err(ConversionError::FilterDesign(_))
        ));
        assert!(matches!(
            IirFilter::butterworth_lowpass(MAX_BUTTERWORTH_ORDER + 1, 1000.0, 8000.0),
            Err(ConversionError::FilterDesign(_))
        ));
        assert!(matches!(
            IirFilter::butterworth_lowpass(4, 4000.0, 8000.0),
            Err(ConversionError::FilterDesign(_))
        ));
        assert!(matches!(
            IirFilter::butterworth_lowpass(4, f64::NAN, 8000.0),
            Err(ConversionError::FilterDesign(_))
        ));
    }

    #[test]
    fn test_filtfilt_constant_is_exact() {
        let lpf = ZeroPhaseButterworth::new(5, 500.0, 8000.0).unwrap();
        let out = lpf.apply(&[0.75; 300]);
        assert_eq!(out.len(), 300);
        for v in out {
            assert_abs_diff_eq!(v, 0.75, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_filtfilt_has_no_delay() {
        // Slow sine well inside the passband: zero-phase output lines up with input
        let fs = 8000.0;
        let input: Vec<f64> = (0..4000)
            .map(|i| (2.0 * PI * 20.0 * i as f64 / fs).sin())
            .collect();
        let lpf = ZeroPhaseButterworth::new(4, 400.0, fs).unwrap();
        let out = lpf.apply(&input);
        for i in 500..3500 {
            assert_abs_diff_eq!(out[i], input[i], epsilon = 1e-3);
        }
    }

    #[test]
    fn test_filtfilt_attenuates_stopband() {
        let fs = 8000.0;
        let input: Vec<f64> = (0..4000)
            .map(|i| (2.0 * PI * 2000.0 * i as f64 / fs).sin())
            .collect();
        let lpf = ZeroPhaseButterworth::new(4, 200.0, fs).unwrap();
        let out = lpf.apply(&input);
        let peak = out[500..3500].iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(peak < 1e-4, "stopband peak {}", peak);
        assert!(lpf.magnitude_response_db(2000.0, fs) < -100.0);
    }

    #[test]
    fn test_filtfilt_short_inputs() {
        let lpf = ZeroPhaseButterworth::new(2, 100.0, 1000.0).unwrap();
        assert!(lpf.apply(&[]).is_empty());
        let one = lpf.apply(&[0.3]);
        assert_eq!(one.len(), 1);
        assert_abs_diff_eq!(one[0], 0.3, epsilon = 1e-12);
        assert_eq!(lpf.apply(&[0.0, 1.0, 0.0]).len(), 3);
    }
}
