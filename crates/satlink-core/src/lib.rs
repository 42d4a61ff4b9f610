//! # Satellite-Link Conversion Core
//!
//! This crate implements the analog → digital → PWM → analog conversion chain
//! used by the satellite-link classroom demonstrations.
//!
//! ## Overview
//!
//! A finite test waveform is sampled, quantized by an ideal ADC, carried as a
//! natural-sampling PWM bitstream and turned back into volts by a low-pass
//! filter. The reconstruction is then scored against the original.
//!
//! - **Signal source**: sine, square and triangle test waveforms
//! - **Quantizer**: 8/10/12/16-bit bipolar ADC with clipping
//! - **PWM encoder**: per-sample duty-cycle comparison
//! - **Reconstructor**: centered moving average or zero-phase Butterworth
//! - **Quality**: RMSE and SNR
//!
//! ## Signal Flow
//!
//! ```text
//! t → Waveform → Quantizer → PWM → Low-pass → (2f−1)·Vref → RMSE / SNR
//!        └──────────────────────────────────────────────────────▲
//! ```
//!
//! ## Example
//!
//! ```rust
//! use satlink_core::{run_pipeline, FilterKind, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .bits(10)
//!     .filter(FilterKind::Butterworth)
//!     .cutoff(2500.0)
//!     .order(2)
//!     .build();
//!
//! let output = run_pipeline(&config).unwrap();
//! println!("{}", output.report);
//! assert_eq!(output.codes.len(), output.reconstructed.len());
//! ```

pub mod config;
pub mod filters;
pub mod observe;
pub mod pipeline;
pub mod pwm;
pub mod quality;
pub mod quantizer;
pub mod reconstruct;
pub mod signal_source;
pub mod types;

// Parallel processing (requires `parallel` feature)
#[cfg(feature = "parallel")]
pub mod parallel;

// Re-export main types
pub use config::{ConfigError, SatlinkConfig, TickerConfig};
pub use filters::{BlockFilter, FilterKind, MovingAverage, ZeroPhaseButterworth};
pub use pipeline::{run_pipeline, GridConfig, Pipeline, PipelineConfig, PipelineOutput, ProbeReading};
pub use pwm::{slice_payload_bits, PwmConfig, PwmEncoder};
pub use quality::{evaluate, QualityEvaluator, QualityReport};
pub use quantizer::{quantize, Quantizer, QuantizerConfig, SUPPORTED_BIT_DEPTHS};
pub use reconstruct::{reconstruct, FilterConfig, SignalReconstructor};
pub use signal_source::{generate, SignalSource, WaveformConfig, WaveformShape};
pub use types::{Code, ConversionError, ConversionResult, Sample, TimeGrid};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::filters::FilterKind;
    pub use crate::pipeline::{run_pipeline, Pipeline, PipelineConfig, PipelineOutput};
    pub use crate::quality::QualityReport;
    pub use crate::signal_source::WaveformShape;
    pub use crate::types::{ConversionError, ConversionResult};
}
