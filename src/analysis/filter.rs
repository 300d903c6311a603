use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type, Q_BUTTERWORTH_F64};
use ndarray::{Array1, ArrayView1};

use crate::error::{AnalysisError, Result};

/// Baseline removed by [`detrend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetrendStrategy {
    /// Subtract the mean.
    Constant,
    /// Subtract the least-squares line over the sample index.
    #[default]
    Linear,
}

/// Removes the baseline selected by `strategy`. The result has the same length and zero mean.
pub fn detrend(data: ArrayView1<f64>, strategy: DetrendStrategy) -> Array1<f64> {
    if data.is_empty() {
        return Array1::zeros(0);
    }
    match strategy {
        DetrendStrategy::Constant => {
            let mean = data.mean().unwrap_or(0.0);
            data.mapv(|y| y - mean)
        }
        DetrendStrategy::Linear => {
            let (slope, intercept) = linear_fit(data);
            Array1::from_iter(
                data.iter()
                    .enumerate()
                    .map(|(i, &y)| y - (slope * i as f64 + intercept)),
            )
        }
    }
}

/// Least-squares fit `y = slope * i + intercept` against the sample index `i`.
pub fn linear_fit(data: ArrayView1<f64>) -> (f64, f64) {
    let n = data.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = data.mean().unwrap_or(0.0);

    let (sxy, sxx) = data
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (i, &y)| {
            let dx = i as f64 - x_mean;
            (sxy + dx * (y - y_mean), sxx + dx * dx)
        });

    // a single sample has no slope
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (slope, y_mean - slope * x_mean)
}

/// Zero-phase Butterworth band-pass: low-pass and high-pass sections run forward, then backward.
pub fn bandpass_filter(
    data: ArrayView1<f64>,
    lowcut: f64,
    highcut: f64,
    fs: f64,
) -> Result<Array1<f64>> {
    let low_coeff = Coefficients::<f64>::from_params(
        Type::LowPass,
        fs.hz(),
        highcut.hz(),
        Q_BUTTERWORTH_F64,
    )
    .map_err(|e| AnalysisError::Filter(format!("low-pass at {} Hz: {:?}", highcut, e)))?;

    let high_coeff = Coefficients::<f64>::from_params(
        Type::HighPass,
        fs.hz(),
        lowcut.hz(),
        Q_BUTTERWORTH_F64,
    )
    .map_err(|e| AnalysisError::Filter(format!("high-pass at {} Hz: {:?}", lowcut, e)))?;

    let low_forward = forward_filter(data, &low_coeff);
    let band_forward = forward_filter(low_forward.view(), &high_coeff);
    let low_full = backward_filter(band_forward.view(), &low_coeff);
    let band_full = backward_filter(low_full.view(), &high_coeff);

    Ok(band_full)
}

fn forward_filter(data: ArrayView1<f64>, coefficients: &Coefficients<f64>) -> Array1<f64> {
    let mut filter = DirectForm1::<f64>::new(*coefficients);
    data.iter().map(|&sample| filter.run(sample)).collect()
}

fn backward_filter(data: ArrayView1<f64>, coefficients: &Coefficients<f64>) -> Array1<f64> {
    let mut filter = DirectForm1::<f64>::new(*coefficients);

    let mut reversed: Vec<f64> = data.iter().rev().map(|&sample| filter.run(sample)).collect();

    // restore original order
    reversed.reverse();
    Array1::from_vec(reversed)
}
