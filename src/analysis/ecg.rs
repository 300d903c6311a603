use std::cmp::Reverse;

use find_peaks::PeakFinder;
use ndarray::ArrayView1;
use noisy_float::types::R64;

use crate::error::{AnalysisError, Result};

/// Detection height `mean + k * stddev` (population stddev).
///
/// Scale-free: the same `k` works for any amplifier gain. For a constant signal the height equals
/// the mean, which no sample exceeds.
pub fn adaptive_height(signal: ArrayView1<f64>, k: f64) -> Result<f64> {
    let mean = signal
        .mean()
        .ok_or(AnalysisError::DegenerateStatistics("threshold of an empty signal"))?;
    let std = signal.std(0.0);
    let height = mean + k * std;

    if !height.is_finite() {
        return Err(AnalysisError::DegenerateStatistics("non-finite threshold"));
    }
    Ok(height)
}

/// Indices of local maxima strictly above `height`, at least `distance` samples apart.
///
/// When candidates crowd each other the larger one is kept; equal amplitudes keep the earlier
/// index. A flat top counts as one maximum located at its middle sample. The first and last
/// samples are never peaks.
pub fn detect_peaks(signal: ArrayView1<f64>, height: f64, distance: usize) -> Result<Vec<usize>> {
    let samples = signal.to_vec();
    let amplitudes = samples
        .iter()
        .enumerate()
        .map(|(index, &v)| {
            R64::try_new(v).ok_or(AnalysisError::NonFinite {
                stage: "peak detection",
                index,
            })
        })
        .collect::<Result<Vec<R64>>>()?;

    let mut candidates: Vec<usize> = PeakFinder::new(samples.as_slice())
        .with_min_height(height)
        .find_peaks()
        .iter()
        .filter_map(|p| plateau_midpoint(&samples, p.position.start))
        .filter(|&i| samples[i] > height)
        .collect();
    candidates.sort_unstable();
    candidates.dedup();

    Ok(enforce_distance(&candidates, &amplitudes, distance.max(1)))
}

/// Middle of the flat top containing `index`, provided the signal falls off on both sides.
fn plateau_midpoint(samples: &[f64], index: usize) -> Option<usize> {
    let top = *samples.get(index)?;
    let mut start = index;
    while start > 0 && samples[start - 1] == top {
        start -= 1;
    }
    if start == 0 || samples[start - 1] > top {
        return None;
    }
    let end = (start..samples.len()).find(|&j| samples[j] != top)?;
    if samples[end] > top {
        return None;
    }
    Some((start + end - 1) / 2)
}

fn enforce_distance(candidates: &[usize], amplitudes: &[R64], distance: usize) -> Vec<usize> {
    let mut priority: Vec<usize> = (0..candidates.len()).collect();
    // stable, so equal amplitudes stay in index order
    priority.sort_by_key(|&c| Reverse(amplitudes[candidates[c]]));

    let mut keep = vec![true; candidates.len()];
    for &c in &priority {
        if !keep[c] {
            continue;
        }
        let position = candidates[c];
        for j in (0..c).rev() {
            if position - candidates[j] >= distance {
                break;
            }
            keep[j] = false;
        }
        for j in c + 1..candidates.len() {
            if candidates[j] - position >= distance {
                break;
            }
            keep[j] = false;
        }
    }

    candidates
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

/// Seconds between consecutive peaks.
pub fn rr_intervals(peaks: &[usize], fs: f64) -> Vec<f64> {
    peaks
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64 / fs)
        .collect()
}

/// `60 / mean(RR)`, or `0.0` when fewer than two peaks exist or the mean interval is not positive.
pub fn bpm_from_peaks(peaks: &[usize], fs: f64) -> f64 {
    let rr = rr_intervals(peaks, fs);
    if rr.is_empty() {
        return 0.0;
    }
    let mean_rr = rr.iter().sum::<f64>() / rr.len() as f64;
    if mean_rr > 0.0 && mean_rr.is_finite() {
        60.0 / mean_rr
    } else {
        0.0
    }
}
