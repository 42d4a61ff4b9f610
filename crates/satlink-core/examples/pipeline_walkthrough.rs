//! Walk through the conversion chain stage by stage.
//!
//! Run with: cargo run -p satlink-core --example pipeline_walkthrough

use satlink_core::observe::{init_logging, LogConfig, LogLevel};
use satlink_core::prelude::*;
use satlink_core::{evaluate, slice_payload_bits, PwmEncoder, Quantizer, SignalReconstructor, SignalSource};
use satlink_core::{FilterConfig, TimeGrid, WaveformConfig, SUPPORTED_BIT_DEPTHS};

fn main() -> ConversionResult<()> {
    init_logging(&LogConfig {
        level: LogLevel::Debug,
        ..Default::default()
    });

    println!("=== Satellite-Link Conversion Walkthrough ===\n");

    // 1. Time grid and test waveform
    let grid = TimeGrid::new(100_000.0, 0.1)?;
    let source = SignalSource::new(WaveformConfig::default())?;
    let analog = source.generate(grid.times());
    println!("1. {} samples of a {} Hz {} wave", analog.len(), source.config().frequency_hz, source.config().shape);

    // 2. ADC
    let adc = Quantizer::new(8, 5.0)?;
    let codes = adc.quantize(&analog);
    println!(
        "2. {}-bit ADC, step {:.4} V, ideal SQNR {:.2} dB",
        adc.bits(),
        adc.step_size(),
        adc.ideal_sqnr_db()
    );

    // 3. PWM
    let encoder = PwmEncoder::new(5000.0, adc.max_code())?;
    let pwm = encoder.encode(grid.times(), &codes)?;
    let bits: String = slice_payload_bits(&pwm, 32).iter().map(|b| b.to_string()).collect();
    println!("3. PWM period {:.1} us, payload bits {}", encoder.period() * 1e6, bits);

    // 4. Reconstruction with both filter families
    for (kind, cutoff) in [
        (FilterKind::MovingAverage, 20_000.0),
        (FilterKind::MovingAverage, 2_500.0),
        (FilterKind::Butterworth, 2_500.0),
    ] {
        let reconstructor = SignalReconstructor::new(
            FilterConfig {
                kind,
                cutoff_hz: cutoff,
                order: 4,
            },
            adc.reference_voltage(),
        )?;
        let volts = reconstructor.reconstruct(grid.times(), &pwm)?;
        let report = evaluate(&analog, &volts)?;
        println!("4. {:>14} @ {:>7.0} Hz: {}", kind, cutoff, report);
    }

    // 5. Resolution sweep through the full pipeline
    println!("\n5. Bit-depth sweep (moving average @ 2.5 kHz)");
    for bits in SUPPORTED_BIT_DEPTHS {
        let config = PipelineConfig::builder().bits(bits).cutoff(2_500.0).build();
        let output = run_pipeline(&config)?;
        if let Some(probe) = output.midpoint_probe() {
            println!(
                "   {:>2} bits: {}  (t={:.5}s code={} duty={:.1}%)",
                bits, output.report, probe.time_s, probe.code, probe.duty_percent
            );
        }
    }

    Ok(())
}
