//! Heart-rate estimation from a recorded sensor channel.
//!
//! A sample file goes through a fixed chain of pure stages: channel loading with an explicit fill
//! policy, a one-second window guard, baseline detrending, an adaptive `mean + k * stddev`
//! threshold, peak detection with a refractory distance, and RR-interval averaging. The
//! [`Analysis`] boundary always hands back a well-formed [`HeartRate`]; when anything goes wrong
//! the result is empty with a BPM of zero.

use std::path::Path;

pub mod analysis;
pub mod error;
pub mod loader;
pub mod log;
pub mod mock;

pub use analysis::{Analysis, Detection, DetrendStrategy, HeartRate, Parameters};
pub use error::{AnalysisError, Result};
pub use loader::FillPolicy;

/// Estimates the heart rate of the `ECG` channel (or the first column) of `path` with default
/// tuning. Returns [`HeartRate::empty`] when the file yields no usable data.
pub fn estimate_heart_rate<P: AsRef<Path>>(path: P, sampling_frequency: u32) -> HeartRate {
    Analysis::with_logger(
        Parameters::with_sampling_frequency(sampling_frequency),
        log::silent_logger(),
    )
    .run(path)
}
