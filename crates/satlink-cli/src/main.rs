//! satlink: command-line front end for the conversion pipeline
//!
//! ```text
//! satlink run --bits 12 --filter butterworth --cutoff 2500
//! satlink watch --ticks 20 --interval-ms 50
//! satlink sweep --json
//! satlink init-config satlink.yaml
//! ```
//!
//! Scenario values come from the YAML configuration (see
//! `satlink_core::config`) and can be overridden per flag.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use satlink_core::config::SatlinkConfig;
use satlink_core::observe::{init_logging, LogFormat, LogLevel};
use satlink_core::pwm::DEFAULT_PAYLOAD_SEGMENTS;
use satlink_core::{
    FilterKind, Pipeline, PipelineConfig, PipelineOutput, ProbeReading, QualityReport, WaveformShape,
    SUPPORTED_BIT_DEPTHS,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "satlink", version, about = "Satellite-link ADC -> PWM -> DAC conversion simulator")]
struct Cli {
    /// Configuration file (defaults to the standard search path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format override (json, pretty, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline once and print the quality report
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Write time, analog, code, pwm and reconstructed columns to a CSV file
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Re-run the pipeline on a fixed interval, like the classroom display
    Watch {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Delay between runs in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Number of runs (0 = until interrupted)
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Compare every supported ADC resolution on the same scenario
    Sweep {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write an example configuration file
    InitConfig {
        /// Output path
        #[arg(default_value = "satlink.yaml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Per-run overrides of the configured scenario.
#[derive(Args, Debug, Default, Clone)]
struct ScenarioArgs {
    /// Waveform shape (sine, square, triangle)
    #[arg(long)]
    shape: Option<WaveformShape>,

    /// Waveform frequency in Hz
    #[arg(long)]
    frequency: Option<f64>,

    /// Waveform amplitude in volts
    #[arg(long)]
    amplitude: Option<f64>,

    /// Square-wave duty cycle in (0, 1)
    #[arg(long)]
    duty: Option<f64>,

    /// ADC resolution (8, 10, 12, 16)
    #[arg(long)]
    bits: Option<u8>,

    /// ADC reference voltage in volts
    #[arg(long)]
    vref: Option<f64>,

    /// PWM carrier frequency in Hz
    #[arg(long)]
    pwm_frequency: Option<f64>,

    /// Reconstruction filter (moving_average, butterworth)
    #[arg(long)]
    filter: Option<FilterKind>,

    /// Filter cutoff in Hz
    #[arg(long)]
    cutoff: Option<f64>,

    /// Butterworth order
    #[arg(long)]
    order: Option<usize>,

    /// Simulation sample rate in Hz
    #[arg(long)]
    sample_rate: Option<f64>,

    /// Simulated duration in seconds
    #[arg(long)]
    duration: Option<f64>,
}

impl ScenarioArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(shape) = self.shape {
            config.waveform.shape = shape;
        }
        if let Some(v) = self.frequency {
            config.waveform.frequency_hz = v;
        }
        if let Some(v) = self.amplitude {
            config.waveform.amplitude_v = v;
        }
        if let Some(v) = self.duty {
            config.waveform.duty_cycle = v;
        }
        if let Some(v) = self.bits {
            config.adc.bits = v;
        }
        if let Some(v) = self.vref {
            config.adc.reference_voltage_v = v;
        }
        if let Some(v) = self.pwm_frequency {
            config.pwm.pwm_frequency_hz = v;
        }
        if let Some(kind) = self.filter {
            config.filter.kind = kind;
        }
        if let Some(v) = self.cutoff {
            config.filter.cutoff_hz = v;
        }
        if let Some(v) = self.order {
            config.filter.order = v;
        }
        if let Some(v) = self.sample_rate {
            config.grid.sample_rate_hz = v;
        }
        if let Some(v) = self.duration {
            config.grid.duration_s = v;
        }
    }
}

#[derive(Serialize)]
struct RunSummary<'a> {
    config: &'a PipelineConfig,
    samples: usize,
    report: QualityReport,
    ideal_sqnr_db: f64,
    probe: Option<ProbeReading>,
    payload_bits: String,
}

#[derive(Serialize)]
struct SweepRow {
    bits: u8,
    rmse_v: Option<f64>,
    snr_db: Option<f64>,
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => SatlinkConfig::load_from(path)?,
        None => SatlinkConfig::load()?,
    };

    let mut log = file_config.logging.clone();
    if let Some(level) = cli.log_level {
        log.level = level;
    }
    if let Some(format) = cli.log_format {
        log.format = format;
    }
    init_logging(&log);

    match cli.command {
        Command::Run { scenario, json, dump } => {
            let config = scenario_config(&file_config, &scenario);
            run_once(&config, json, dump.as_deref())
        }
        Command::Watch {
            scenario,
            interval_ms,
            ticks,
        } => {
            let config = scenario_config(&file_config, &scenario);
            let interval = interval_ms.unwrap_or(file_config.ticker.interval_ms);
            let ticks = ticks.unwrap_or(file_config.ticker.ticks);
            watch(&config, Duration::from_millis(interval), ticks)
        }
        Command::Sweep { scenario, json } => {
            let config = scenario_config(&file_config, &scenario);
            sweep(&config, json)
        }
        Command::InitConfig { path, force } => init_config(&path, force),
    }
}

fn scenario_config(file_config: &SatlinkConfig, overrides: &ScenarioArgs) -> PipelineConfig {
    let mut config = file_config.pipeline();
    overrides.apply(&mut config);
    config
}

fn payload_string(output: &PipelineOutput) -> String {
    output
        .payload_bits(DEFAULT_PAYLOAD_SEGMENTS)
        .iter()
        .map(|b| if *b == 1 { '1' } else { '0' })
        .collect()
}

fn run_once(config: &PipelineConfig, json: bool, dump: Option<&Path>) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config).context("invalid scenario")?;
    let output = pipeline.run()?;

    if let Some(path) = dump {
        write_csv(path, &output)?;
        tracing::info!("Wrote {} samples to {}", output.len(), path.display());
    }

    let summary = RunSummary {
        config,
        samples: output.len(),
        report: output.report,
        ideal_sqnr_db: pipeline.quantizer().ideal_sqnr_db(),
        probe: output.midpoint_probe(),
        payload_bits: payload_string(&output),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary<'_>) {
    let cfg = summary.config;
    println!(
        "Waveform:  {} {:.1} Hz, {:.2} V",
        cfg.waveform.shape, cfg.waveform.frequency_hz, cfg.waveform.amplitude_v
    );
    println!(
        "ADC:       {} bits, Vref {:.2} V (ideal SQNR {:.2} dB)",
        cfg.adc.bits, cfg.adc.reference_voltage_v, summary.ideal_sqnr_db
    );
    println!("PWM:       {:.1} Hz", cfg.pwm.pwm_frequency_hz);
    println!("Filter:    {} @ {:.1} Hz (order {})", cfg.filter.kind, cfg.filter.cutoff_hz, cfg.filter.order);
    println!("Samples:   {}", summary.samples);
    if let Some(p) = summary.probe {
        println!(
            "Probe:     t={:.5} s, analog {:.3} V, code {}, duty {:.1}%, recon {:.3} V",
            p.time_s, p.analog_v, p.code, p.duty_percent, p.reconstructed_v
        );
    }
    println!("Payload:   {}", summary.payload_bits);
    println!("Quality:   {}", summary.report);
}

fn write_csv(path: &Path, output: &PipelineOutput) -> anyhow::Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = std::io::BufWriter::new(file);

    writeln!(w, "time_s,analog_v,code,pwm,reconstructed_v")?;
    for i in 0..output.len() {
        writeln!(
            w,
            "{},{},{},{},{}",
            output.time[i], output.analog[i], output.codes[i], output.pwm[i], output.reconstructed[i]
        )?;
    }
    w.flush()?;
    Ok(())
}

fn watch(config: &PipelineConfig, interval: Duration, ticks: u64) -> anyhow::Result<()> {
    if interval.is_zero() {
        bail!("watch interval must be greater than zero");
    }
    let pipeline = Pipeline::new(config).context("invalid scenario")?;

    let mut tick = 0u64;
    while ticks == 0 || tick < ticks {
        let started = Instant::now();
        let output = pipeline.run()?;
        tick += 1;

        let probe = output
            .midpoint_probe()
            .map(|p| format!("code {:>5} duty {:>5.1}%", p.code, p.duty_percent))
            .unwrap_or_default();
        println!("[{:>4}] {}  {}", tick, output.report, probe);

        let elapsed = started.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        } else {
            tracing::debug!("tick {} took {:?}, longer than the interval", tick, elapsed);
        }
    }
    Ok(())
}

fn sweep_rows(config: &PipelineConfig) -> Vec<SweepRow> {
    #[cfg(feature = "parallel")]
    let results = satlink_core::parallel::sweep_bit_depths(config, &SUPPORTED_BIT_DEPTHS);
    #[cfg(not(feature = "parallel"))]
    let results = satlink_core::pipeline::sweep_bit_depths(config, &SUPPORTED_BIT_DEPTHS);

    results
        .into_iter()
        .map(|(bits, result)| match result {
            Ok(report) => SweepRow {
                bits,
                rmse_v: Some(report.rmse_v),
                snr_db: Some(report.snr_db),
                error: None,
            },
            Err(e) => SweepRow {
                bits,
                rmse_v: None,
                snr_db: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}

fn sweep(config: &PipelineConfig, json: bool) -> anyhow::Result<()> {
    let rows = sweep_rows(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:>5}  {:>10}  {:>10}", "bits", "RMSE (V)", "SNR (dB)");
    for row in &rows {
        match (&row.rmse_v, &row.snr_db, &row.error) {
            (Some(rmse), Some(snr), _) => println!("{:>5}  {:>10.5}  {:>10.3}", row.bits, rmse, snr),
            (_, _, Some(err)) => println!("{:>5}  {}", row.bits, err),
            _ => {}
        }
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(path, SatlinkConfig::example_yaml())
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
