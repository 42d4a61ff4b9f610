//! Parallel Processing Module
//!
//! Rayon-backed versions of the embarrassingly parallel parts of the
//! pipeline. Enable with the `parallel` feature flag.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! satlink-core = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! ## What Runs in Parallel
//!
//! - PWM encoding: every output bit depends only on its own index
//! - Bit-depth sweeps: each configuration is an independent run
//!
//! The filters stay sequential; their running sums and recursive state do
//! not split cleanly. Results are identical to the sequential paths.

use rayon::prelude::*;

use crate::pipeline::{run_pipeline, PipelineConfig};
use crate::pwm::PwmEncoder;
use crate::quality::QualityReport;
use crate::types::{Code, ConversionError, ConversionResult};

/// Minimum chunk handed to one rayon task when encoding PWM.
const PWM_MIN_CHUNK: usize = 4096;

/// Encode a code stream with rayon. Same output as [`PwmEncoder::encode`].
pub fn encode_pwm_parallel(encoder: &PwmEncoder, t: &[f64], codes: &[Code]) -> ConversionResult<Vec<f64>> {
    ConversionError::check_len(t.len(), codes.len())?;
    Ok(t.par_iter()
        .zip(codes.par_iter())
        .with_min_len(PWM_MIN_CHUNK)
        .map(|(&ti, &code)| encoder.bit_at(ti, code))
        .collect())
}

/// Run `config` at every bit depth in `depths` concurrently.
///
/// Results come back in the order of `depths`; each run fails or succeeds on
/// its own.
pub fn sweep_bit_depths(config: &PipelineConfig, depths: &[u8]) -> Vec<(u8, ConversionResult<QualityReport>)> {
    depths
        .par_iter()
        .map(|&bits| {
            let mut cfg = config.clone();
            cfg.adc.bits = bits;
            (bits, run_pipeline(&cfg).map(|out| out.report))
        })
        .collect()
}
