use std::error::Error;
use std::path::Path;

use ndarray::{Array1, ArrayView1};
use slog::{debug, info, o, warn, Logger};

use crate::error::{AnalysisError, Result};
use crate::loader::{self, FillPolicy};
use crate::log::create_logger;

pub mod ecg;
pub mod filter;
mod tests;

pub use filter::DetrendStrategy;

pub const DEFAULT_SAMPLING_FREQUENCY: u32 = 250;
pub const DEFAULT_CHANNEL: &str = "ECG";
/// Standard deviations above the mean a sample must reach to count as a beat.
pub const DEFAULT_THRESHOLD_K: f64 = 1.0;
/// `fs / 2.5` samples between beats, i.e. at most 150 BPM.
pub const DEFAULT_MIN_DISTANCE_DIVISOR: f64 = 2.5;

#[derive(Debug, PartialEq, Clone)]
pub struct Parameters {
    pub sampling_frequency: u32,
    pub channel: String,
    pub fill_policy: FillPolicy,
    pub detrend: DetrendStrategy,
    /// Optional `(low, high)` band-pass corners in Hz, applied after detrending.
    pub bandpass: Option<(f64, f64)>,
    pub threshold_k: f64,
    pub min_distance_divisor: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            sampling_frequency: DEFAULT_SAMPLING_FREQUENCY,
            channel: DEFAULT_CHANNEL.to_string(),
            fill_policy: FillPolicy::default(),
            detrend: DetrendStrategy::default(),
            bandpass: None,
            threshold_k: DEFAULT_THRESHOLD_K,
            min_distance_divisor: DEFAULT_MIN_DISTANCE_DIVISOR,
        }
    }
}

impl Parameters {
    pub fn with_sampling_frequency(sampling_frequency: u32) -> Self {
        Self {
            sampling_frequency,
            ..Self::default()
        }
    }

    /// Minimum gap between accepted peaks, in samples. Never less than one.
    pub fn min_peak_distance(&self) -> usize {
        let distance = (self.sampling_frequency as f64 / self.min_distance_divisor).round();
        (distance as usize).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampling_frequency == 0 {
            return Err(invalid("sampling frequency must be positive"));
        }
        if !self.threshold_k.is_finite() || self.threshold_k < 0.0 {
            return Err(invalid(format!(
                "threshold multiplier must be finite and non-negative, got {}",
                self.threshold_k
            )));
        }
        if !self.min_distance_divisor.is_finite() || self.min_distance_divisor <= 0.0 {
            return Err(invalid(format!(
                "minimum distance divisor must be finite and positive, got {}",
                self.min_distance_divisor
            )));
        }
        if !self.fill_policy.fill_value().is_finite() {
            return Err(invalid("fill value must be finite"));
        }
        if let Some((low, high)) = self.bandpass {
            let nyquist = self.sampling_frequency as f64 / 2.0;
            if !(low > 0.0 && low < high && high < nyquist) {
                return Err(invalid(format!(
                    "band-pass ({}, {}) Hz must satisfy 0 < low < high < {}",
                    low, high, nyquist
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AnalysisError {
    AnalysisError::InvalidParameter(message.into())
}

/// The triple handed to consumers. All three parts are empty/zero when no usable data was found.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeartRate {
    pub time_axis: Vec<f64>,
    pub signal: Vec<f64>,
    pub bpm: f64,
}

impl HeartRate {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    /// The leading `len` time/signal pairs, for charting.
    pub fn preview(&self, len: usize) -> (&[f64], &[f64]) {
        let len = len.min(self.signal.len());
        (&self.time_axis[..len], &self.signal[..len])
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>, f64) {
        (self.time_axis, self.signal, self.bpm)
    }
}

/// Everything the detector found in one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub time_axis: Array1<f64>,
    pub cleaned: Array1<f64>,
    pub height: f64,
    pub peaks: Vec<usize>,
    pub rr_intervals: Vec<f64>,
    pub bpm: f64,
}

impl From<Detection> for HeartRate {
    fn from(detection: Detection) -> Self {
        HeartRate {
            time_axis: detection.time_axis.to_vec(),
            signal: detection.cleaned.to_vec(),
            bpm: detection.bpm,
        }
    }
}

pub type Plotter = Box<
    dyn Fn(ArrayView1<f64>, &str, Option<&[usize]>) -> std::result::Result<(), Box<dyn Error>>
        + Send
        + Sync,
>;

pub struct Analysis {
    pub params: Parameters,
    pub logger: Logger,
    pub plotter: Option<Plotter>,
}

impl Analysis {
    pub fn new(params: Parameters) -> Self {
        Self::with_logger(params, create_logger("analysis".to_string()))
    }

    pub fn with_logger(params: Parameters, logger: Logger) -> Self {
        Self {
            params,
            logger,
            plotter: None,
        }
    }

    /// Loads the configured channel from `path` and estimates the heart rate.
    ///
    /// Never fails: any error along the way is logged and yields [`HeartRate::empty`].
    pub fn run<P: AsRef<Path>>(&self, path: P) -> HeartRate {
        let path = path.as_ref();
        let log = self.logger.new(o!("file" => path.display().to_string()));
        self.isolate(&log, self.try_run(path))
    }

    /// Same boundary as [`Analysis::run`], over a buffer already in memory.
    pub fn run_signal(&self, signal: ArrayView1<f64>) -> HeartRate {
        self.isolate(&self.logger, self.analyze(signal).map(HeartRate::from))
    }

    pub fn try_run<P: AsRef<Path>>(&self, path: P) -> Result<HeartRate> {
        self.params.validate()?;
        let loaded = loader::load_signal(
            path.as_ref(),
            &self.params.channel,
            self.params.fill_policy,
        )?;
        debug!(self.logger, "loaded samples";
            "column" => &loaded.column,
            "samples" => loaded.signal.len(),
            "filled" => loaded.filled);

        self.analyze(loaded.signal.view()).map(HeartRate::from)
    }

    /// Runs every stage after loading: window guard, detrend, optional band-pass, threshold,
    /// peak detection and rate estimation.
    pub fn analyze(&self, signal: ArrayView1<f64>) -> Result<Detection> {
        self.params.validate()?;
        let fs = self.params.sampling_frequency as f64;
        let required = self.params.sampling_frequency as usize;
        if signal.len() < required {
            return Err(AnalysisError::InsufficientData {
                len: signal.len(),
                required,
            });
        }

        self.plot_signal(signal, "Raw Signal", None);

        let detrended = filter::detrend(signal, self.params.detrend);
        if let Some(index) = detrended.iter().position(|v| !v.is_finite()) {
            return Err(AnalysisError::NonFinite {
                stage: "detrending",
                index,
            });
        }
        self.plot_signal(detrended.view(), "Detrended Signal", None);

        let cleaned = match self.params.bandpass {
            Some((low, high)) => {
                let filtered = filter::bandpass_filter(detrended.view(), low, high, fs)?;
                self.plot_signal(filtered.view(), "Filtered Signal", None);
                filtered
            }
            None => detrended,
        };

        let height = ecg::adaptive_height(cleaned.view(), self.params.threshold_k)?;
        let distance = self.params.min_peak_distance();
        let peaks = ecg::detect_peaks(cleaned.view(), height, distance)?;
        self.plot_signal(cleaned.view(), "Peaks", Some(peaks.as_slice()));

        let rr_intervals = ecg::rr_intervals(&peaks, fs);
        let bpm = ecg::bpm_from_peaks(&peaks, fs);
        debug!(self.logger, "detected beats";
            "height" => height,
            "distance" => distance,
            "peaks" => peaks.len(),
            "bpm" => bpm);

        let time_axis = Array1::from_iter((0..cleaned.len()).map(|i| i as f64 / fs));

        Ok(Detection {
            time_axis,
            cleaned,
            height,
            peaks,
            rr_intervals,
            bpm,
        })
    }

    fn isolate(&self, log: &Logger, result: Result<HeartRate>) -> HeartRate {
        match result {
            Ok(heart_rate) => heart_rate,
            Err(e @ AnalysisError::InsufficientData { .. }) => {
                info!(log, "not enough samples for an estimate"; "reason" => %e);
                HeartRate::empty()
            }
            Err(e) => {
                warn!(log, "heart rate analysis failed"; "error" => %e);
                HeartRate::empty()
            }
        }
    }

    fn plot_signal(&self, signal: ArrayView1<f64>, title: &str, points: Option<&[usize]>) {
        if let Some(f) = &self.plotter {
            f(signal, title, points).unwrap_or_else(|e| {
                warn!(self.logger, "plotting failed"; "title" => title, "error" => %e);
            });
        }
    }
}
