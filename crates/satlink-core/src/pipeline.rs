//! End-to-End Conversion Pipeline
//!
//! Wires the stages together on one time grid:
//!
//! ```text
//!  TimeGrid ─► SignalSource ─► Quantizer ─► PwmEncoder ─► SignalReconstructor
//!                   │                                           │
//!                   └──────────────► QualityEvaluator ◄─────────┘
//! ```
//!
//! [`Pipeline::new`] validates every parameter before any sample is produced,
//! so a bad configuration never yields partial output. A run is pure: the
//! same configuration always gives the same [`PipelineOutput`], and nothing
//! is carried between runs.
//!
//! ## Example
//!
//! ```rust
//! use satlink_core::pipeline::{run_pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .frequency(500.0)
//!     .bits(12)
//!     .duration(0.01)
//!     .build();
//!
//! let output = run_pipeline(&config).unwrap();
//! assert_eq!(output.len(), 1000);
//! assert!(output.report.rmse_v.is_finite());
//! ```

use crate::filters::FilterKind;
use crate::pwm::{slice_payload_bits, PwmConfig, PwmEncoder};
use crate::quality::{QualityEvaluator, QualityReport};
use crate::quantizer::{Quantizer, QuantizerConfig};
use crate::reconstruct::{FilterConfig, SignalReconstructor};
use crate::signal_source::{SignalSource, WaveformConfig, WaveformShape};
use crate::types::{Code, ConversionResult, Sample, TimeGrid};
use serde::{Deserialize, Serialize};

/// Sampling grid parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Simulation sample rate in Hz
    pub sample_rate_hz: f64,
    /// Simulated duration in seconds
    pub duration_s: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 100_000.0,
            duration_s: 0.1,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> ConversionResult<()> {
        TimeGrid::new(self.sample_rate_hz, self.duration_s).map(|_| ())
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub waveform: WaveformConfig,
    pub adc: QuantizerConfig,
    pub pwm: PwmConfig,
    pub filter: FilterConfig,
    pub grid: GridConfig,
}

impl PipelineConfig {
    /// Create a builder starting from the default scenario.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Check every stage's parameters.
    pub fn validate(&self) -> ConversionResult<()> {
        self.grid.validate()?;
        self.waveform.validate()?;
        self.adc.validate()?;
        self.pwm.validate()?;
        self.filter.validate()?;
        Ok(())
    }
}

/// Builder for [`PipelineConfig`]. Values are validated when the pipeline is
/// built, not here.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn shape(mut self, shape: WaveformShape) -> Self {
        self.config.waveform.shape = shape;
        self
    }

    pub fn frequency(mut self, hz: f64) -> Self {
        self.config.waveform.frequency_hz = hz;
        self
    }

    pub fn amplitude(mut self, volts: f64) -> Self {
        self.config.waveform.amplitude_v = volts;
        self
    }

    pub fn duty_cycle(mut self, duty: f64) -> Self {
        self.config.waveform.duty_cycle = duty;
        self
    }

    pub fn bits(mut self, bits: u8) -> Self {
        self.config.adc.bits = bits;
        self
    }

    pub fn reference_voltage(mut self, volts: f64) -> Self {
        self.config.adc.reference_voltage_v = volts;
        self
    }

    pub fn pwm_frequency(mut self, hz: f64) -> Self {
        self.config.pwm.pwm_frequency_hz = hz;
        self
    }

    pub fn filter(mut self, kind: FilterKind) -> Self {
        self.config.filter.kind = kind;
        self
    }

    pub fn cutoff(mut self, hz: f64) -> Self {
        self.config.filter.cutoff_hz = hz;
        self
    }

    pub fn order(mut self, order: usize) -> Self {
        self.config.filter.order = order;
        self
    }

    pub fn sample_rate(mut self, hz: f64) -> Self {
        self.config.grid.sample_rate_hz = hz;
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.config.grid.duration_s = seconds;
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

/// Readout of every stage at a single sample index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbeReading {
    pub index: usize,
    pub time_s: f64,
    pub analog_v: Sample,
    pub code: Code,
    /// Duty cycle carried by `code`, in percent
    pub duty_percent: f64,
    pub reconstructed_v: Sample,
}

/// All intermediate and final sequences of one run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub time: Vec<f64>,
    pub analog: Vec<Sample>,
    pub codes: Vec<Code>,
    pub pwm: Vec<f64>,
    pub reconstructed: Vec<Sample>,
    pub report: QualityReport,
    pub max_code: Code,
}

impl PipelineOutput {
    /// Number of samples in every sequence.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Values of every stage at `index`, or `None` past the end.
    pub fn probe(&self, index: usize) -> Option<ProbeReading> {
        let code = *self.codes.get(index)?;
        Some(ProbeReading {
            index,
            time_s: self.time[index],
            analog_v: self.analog[index],
            code,
            duty_percent: code as f64 / self.max_code as f64 * 100.0,
            reconstructed_v: self.reconstructed[index],
        })
    }

    /// Probe at the middle sample.
    pub fn midpoint_probe(&self) -> Option<ProbeReading> {
        self.probe(self.len() / 2)
    }

    /// Hard payload bits sliced from the PWM stream.
    pub fn payload_bits(&self, segments: usize) -> Vec<u8> {
        slice_payload_bits(&self.pwm, segments)
    }
}

/// A validated pipeline, ready to run any number of times.
#[derive(Debug, Clone)]
pub struct Pipeline {
    grid: TimeGrid,
    source: SignalSource,
    adc: Quantizer,
    encoder: PwmEncoder,
    reconstructor: SignalReconstructor,
}

impl Pipeline {
    /// Validate `config` and build every stage.
    pub fn new(config: &PipelineConfig) -> ConversionResult<Self> {
        config.validate()?;

        let grid = TimeGrid::new(config.grid.sample_rate_hz, config.grid.duration_s)?;
        let source = SignalSource::new(config.waveform.clone())?;
        let adc = Quantizer::from_config(&config.adc)?;
        let encoder = PwmEncoder::new(config.pwm.pwm_frequency_hz, adc.max_code())?;
        let reconstructor = SignalReconstructor::new(config.filter.clone(), adc.reference_voltage())?;

        Ok(Self {
            grid,
            source,
            adc,
            encoder,
            reconstructor,
        })
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn quantizer(&self) -> &Quantizer {
        &self.adc
    }

    /// Run every stage once.
    #[tracing::instrument(skip_all, fields(bits = self.adc.bits(), samples = self.grid.len()))]
    pub fn run(&self) -> ConversionResult<PipelineOutput> {
        let t = self.grid.times();

        let analog = self.source.generate(t);
        tracing::debug!(shape = %self.source.config().shape, "generated waveform");

        let codes = self.adc.quantize(&analog);
        tracing::debug!(max_code = self.adc.max_code(), "quantized");

        let pwm = self.encode(t, &codes)?;
        tracing::debug!(period_s = self.encoder.period(), "PWM encoded");

        let reconstructed = self.reconstructor.reconstruct(t, &pwm)?;
        let report = QualityEvaluator.evaluate(&analog, &reconstructed)?;
        tracing::debug!(rmse_v = report.rmse_v, snr_db = report.snr_db, "evaluated");

        Ok(PipelineOutput {
            time: t.to_vec(),
            analog,
            codes,
            pwm,
            reconstructed,
            report,
            max_code: self.adc.max_code(),
        })
    }

    #[cfg(feature = "parallel")]
    fn encode(&self, t: &[f64], codes: &[Code]) -> ConversionResult<Vec<f64>> {
        crate::parallel::encode_pwm_parallel(&self.encoder, t, codes)
    }

    #[cfg(not(feature = "parallel"))]
    fn encode(&self, t: &[f64], codes: &[Code]) -> ConversionResult<Vec<f64>> {
        self.encoder.encode(t, codes)
    }
}

/// Validate `config` and run the whole chain once.
///
/// Returns [`InvalidConfig`](crate::types::ConversionError::InvalidConfig) before computing anything when
/// a parameter is out of range.
pub fn run_pipeline(config: &PipelineConfig) -> ConversionResult<PipelineOutput> {
    Pipeline::new(config)?.run()
}

/// Run the same scenario at several bit depths, in order.
pub fn sweep_bit_depths(config: &PipelineConfig, depths: &[u8]) -> Vec<(u8, ConversionResult<QualityReport>)> {
    depths
        .iter()
        .map(|&bits| {
            let mut cfg = config.clone();
            cfg.adc.bits = bits;
            (bits, run_pipeline(&cfg).map(|out| out.report))
        })
        .collect()
}
