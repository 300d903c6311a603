//! Synthetic heart-rate sensor feed.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A train of Gaussian beats riding on a linear baseline drift, with optional uniform noise.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseTrain {
    pub sampling_frequency: u32,
    pub seconds: f64,
    pub bpm: f64,
    pub amplitude: f64,
    /// Standard deviation of each beat, in seconds.
    pub pulse_width: f64,
    pub offset: f64,
    /// Baseline change per second.
    pub drift: f64,
    /// Half-width of the uniform noise band. Zero disables noise.
    pub noise: f64,
    pub seed: u64,
}

impl Default for PulseTrain {
    fn default() -> Self {
        Self {
            sampling_frequency: 250,
            seconds: 10.0,
            bpm: 75.0,
            amplitude: 1.0,
            pulse_width: 0.02,
            offset: 0.0,
            drift: 0.0,
            noise: 0.0,
            seed: 0,
        }
    }
}

impl PulseTrain {
    pub fn period_samples(&self) -> f64 {
        self.sampling_frequency as f64 * 60.0 / self.bpm
    }

    /// Sample indices of the beat centres. The first beat sits half a period in.
    pub fn beat_positions(&self) -> Vec<usize> {
        let len = self.len();
        let period = self.period_samples();
        (0..)
            .map(|k| (period / 2.0 + k as f64 * period).round() as usize)
            .take_while(|&i| i < len)
            .collect()
    }

    pub fn len(&self) -> usize {
        (self.seconds * self.sampling_frequency as f64).round() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generate(&self) -> Vec<f64> {
        let fs = self.sampling_frequency as f64;
        let sigma = self.pulse_width * fs;
        let beats = self.beat_positions();
        let mut rng = StdRng::seed_from_u64(self.seed);

        (0..self.len())
            .map(|i| {
                let pulse: f64 = beats
                    .iter()
                    .map(|&b| {
                        let d = (i as f64 - b as f64) / sigma;
                        self.amplitude * (-0.5 * d * d).exp()
                    })
                    .sum();
                let baseline = self.offset + self.drift * i as f64 / fs;
                let noise = if self.noise > 0.0 {
                    rng.gen_range(-self.noise..=self.noise)
                } else {
                    0.0
                };
                pulse + baseline + noise
            })
            .collect()
    }
}

/// Writes `values` as a single-column CSV file headed by `column`.
pub fn write_channel_csv<P: AsRef<Path>, S: ToString>(
    path: P,
    column: &str,
    values: &[S],
) -> csv::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([column])?;
    for value in values {
        writer.write_record([value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
