//! Reconstruction Filters
//!
//! Low-pass filters that turn a PWM bitstream back into a smooth duty-cycle
//! envelope:
//!
//! - **Moving average**: centered rectangular window, cheap, sinc-shaped
//!   response with nulls at multiples of `fs / L`
//! - **Butterworth**: maximally flat IIR cascade, applied forward and
//!   backward so the reconstruction has no group delay
//!
//! ```text
//! PWM bits ──► BlockFilter ──► duty envelope (0..1) ──► ×2 − 1 ──► ×Vref ──► volts
//! ```

pub mod iir;
pub mod moving_average;
pub mod traits;

pub use iir::{Biquad, IirFilter, ZeroPhaseButterworth, MAX_BUTTERWORTH_ORDER};
pub use moving_average::MovingAverage;
pub use traits::{BlockFilter, Filter, FilterKind, FrequencyResponse};
