//! # Configuration System
//!
//! YAML configuration for satlink tools:
//!
//! - Scenario parameters (waveform, ADC, PWM, reconstruction filter, grid)
//! - Logging
//! - Ticker settings for the repeating "watch" mode
//!
//! Every section is optional; missing fields take the defaults of the
//! reference scenario (1 kHz / 5 V sine, 8-bit ADC at 5 V, 5 kHz PWM,
//! 20 kHz moving average, 100 kHz for 0.1 s).
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `SATLINK_CONFIG` environment variable
//! 2. `./satlink.yaml` (current directory)
//! 3. `~/.config/satlink/config.yaml` (user config)
//! 4. `/etc/satlink/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! waveform:
//!   shape: sine
//!   frequency_hz: 1000.0
//!   amplitude_v: 5.0
//!
//! adc:
//!   bits: 12
//!
//! filter:
//!   kind: butterworth
//!   cutoff_hz: 2500.0
//!   order: 4
//! ```

use crate::filters::FilterKind;
use crate::observe::LogConfig;
use crate::pipeline::{GridConfig, PipelineConfig};
use crate::pwm::PwmConfig;
use crate::quantizer::QuantizerConfig;
use crate::reconstruct::FilterConfig;
use crate::signal_source::WaveformConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SATLINK_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to read or write the configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Repeating-run settings for interactive hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    /// Delay between full pipeline runs in milliseconds
    pub interval_ms: u64,
    /// Number of runs; 0 runs until interrupted
    pub ticks: u64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 50,
            ticks: 0,
        }
    }
}

/// Complete satlink configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatlinkConfig {
    /// Configuration version
    pub version: String,
    /// Test waveform
    pub waveform: WaveformConfig,
    /// ADC quantizer
    pub adc: QuantizerConfig,
    /// PWM carrier
    pub pwm: PwmConfig,
    /// Reconstruction filter
    pub filter: FilterConfig,
    /// Sampling grid
    pub grid: GridConfig,
    /// Logging
    pub logging: LogConfig,
    /// Watch-mode ticker
    pub ticker: TickerConfig,
}

impl Default for SatlinkConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            waveform: WaveformConfig::default(),
            adc: QuantizerConfig::default(),
            pwm: PwmConfig::default(),
            filter: FilterConfig::default(),
            grid: GridConfig::default(),
            logging: LogConfig::default(),
            ticker: TickerConfig::default(),
        }
    }
}

impl SatlinkConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
            tracing::warn!("{} points at missing file {}", CONFIG_ENV_VAR, path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Loaded config from {}", path.display());
        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths (after `SATLINK_CONFIG`).
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./satlink.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "satlink") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/satlink/config.yaml"));

        paths
    }

    /// The scenario part of the configuration.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            waveform: self.waveform.clone(),
            adc: self.adc.clone(),
            pwm: self.pwm.clone(),
            filter: self.filter.clone(),
            grid: self.grid.clone(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline()
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.ticker.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "ticker interval_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            filter: FilterConfig {
                kind: FilterKind::Butterworth,
                cutoff_hz: 2500.0,
                order: 4,
            },
            ticker: TickerConfig {
                interval_ms: 50,
                ticks: 20,
            },
            ..Default::default()
        };

        let body = serde_yaml::to_string(&config).unwrap_or_default();
        format!(
            "# satlink configuration\n\
             # Frequencies are in Hz, voltages in V, durations in s.\n\
             # adc.bits: 8, 10, 12 or 16. filter.kind: moving_average or butterworth.\n\
             {body}"
        )
    }
}
