//! Advisory signal quality assessment
//!
//! Quality never blocks feature extraction; it is reported next to the
//! features so callers can judge how much to trust them.
//!
//! # Quality Factors
//! - **SNR:** signal variance over the variance of the residual left by a
//!   5-point median filter, divided by 10
//! - **Dynamic range:** log10 of peak-to-peak over residual std, divided by 2
//! - **Peak regularity:** `1 - CV` of the spacing between prominent peaks
//!
//! Each factor is clamped to [0, 1]; the score is their mean.

use super::entropy::population_std;
use super::peaks::{find_peaks, PeakCriteria};
use serde::{Deserialize, Serialize};

/// Score below which a signal is reported invalid
pub const MIN_QUALITY_SCORE: f64 = 0.3;

const MIN_PEAK_TO_PEAK: f64 = 0.1;
const MIN_STD: f64 = 0.01;
const MEDIAN_KERNEL: usize = 5;

/// Summary statistics of the raw signal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalStatistics {
    pub length: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub num_peaks: usize,
    pub sampling_rate: f64,
    pub duration_seconds: f64,
}

/// Quality verdict for one waveform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalQuality {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub quality_score: f64,
    pub statistics: SignalStatistics,
}

/// Assess a raw pulse waveform
pub fn assess_signal_quality(samples: &[f64], sampling_rate: f64, min_length: usize) -> SignalQuality {
    let mut issues = Vec::new();

    if samples.len() < min_length {
        issues.push(format!("Signal too short: {} < {}", samples.len(), min_length));
    }

    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() != samples.len() {
        issues.push("Signal contains NaN or Inf values".to_string());
    }

    if finite.is_empty() {
        issues.push("Signal has no usable samples".to_string());
        return SignalQuality {
            is_valid: false,
            issues,
            quality_score: 0.0,
            statistics: SignalStatistics {
                length: samples.len(),
                sampling_rate,
                duration_seconds: duration(samples.len(), sampling_rate),
                ..Default::default()
            },
        };
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    let std = population_std(&finite);

    if range < MIN_PEAK_TO_PEAK {
        issues.push(format!("Signal amplitude too small: {}", range));
    }
    if std < MIN_STD {
        issues.push("Signal is too flat (low variance)".to_string());
    }

    let filtered = median_filter(&finite, MEDIAN_KERNEL);
    let noise: Vec<f64> = finite.iter().zip(&filtered).map(|(x, f)| x - f).collect();
    let noise_std = population_std(&noise);

    let snr = std.powi(2) / (noise_std.powi(2) + 1e-8);
    let snr_factor = (snr / 10.0).clamp(0.0, 1.0);

    let dynamic_range = (range / (noise_std + 1e-8)).log10();
    let range_factor = if dynamic_range.is_finite() {
        (dynamic_range / 2.0).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let distance = (sampling_rate / 4.0).floor();
    let peaks = find_peaks(
        &finite,
        &PeakCriteria {
            min_height: Some(mean + std),
            min_distance: (distance >= 1.0).then_some(distance),
            min_prominence: None,
        },
    );
    let regularity_factor = if peaks.len() >= 2 {
        let intervals: Vec<f64> = peaks
            .indices
            .windows(2)
            .map(|w| (w[1] - w[0]) as f64)
            .collect();
        let interval_mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
        let cv = population_std(&intervals) / interval_mean;
        (1.0 - cv).clamp(0.0, 1.0)
    } else {
        0.1
    };

    let quality_score = (snr_factor + range_factor + regularity_factor) / 3.0;
    if quality_score < MIN_QUALITY_SCORE {
        issues.push(format!("Low quality score: {:.2}", quality_score));
    }

    SignalQuality {
        is_valid: issues.is_empty(),
        issues,
        quality_score,
        statistics: SignalStatistics {
            length: samples.len(),
            mean,
            std,
            min,
            max,
            range,
            num_peaks: peaks.len(),
            sampling_rate,
            duration_seconds: duration(samples.len(), sampling_rate),
        },
    }
}

fn duration(len: usize, sampling_rate: f64) -> f64 {
    if sampling_rate > 0.0 {
        len as f64 / sampling_rate
    } else {
        0.0
    }
}

/// Median filter with zero padding at both edges
fn median_filter(x: &[f64], kernel: usize) -> Vec<f64> {
    let half = kernel / 2;
    let mut window = Vec::with_capacity(kernel);
    (0..x.len())
        .map(|i| {
            window.clear();
            for offset in 0..kernel {
                let idx = i as isize + offset as isize - half as isize;
                let v = if idx >= 0 && (idx as usize) < x.len() {
                    x[idx as usize]
                } else {
                    0.0
                };
                window.push(v);
            }
            window.sort_by(|a, b| a.total_cmp(b));
            window[half]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, fs: f64, seconds: f64) -> Vec<f64> {
        let n = (fs * seconds) as usize;
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / fs).sin()).collect()
    }

    #[test]
    fn test_clean_sine_is_valid() {
        let q = assess_signal_quality(&sine(1.2, 125.0, 10.0), 125.0, 500);
        assert!(q.is_valid, "Issues: {:?}", q.issues);
        assert!(q.quality_score > 0.6, "Score {}", q.quality_score);
        assert_eq!(q.statistics.length, 1250);
        assert!((q.statistics.duration_seconds - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_signal_flagged() {
        let q = assess_signal_quality(&sine(1.2, 125.0, 2.0), 125.0, 500);
        assert!(!q.is_valid);
        assert!(q.issues.iter().any(|i| i.contains("too short")));
    }

    #[test]
    fn test_flat_signal_flagged() {
        let q = assess_signal_quality(&[1.0; 600], 125.0, 500);
        assert!(!q.is_valid);
        assert!(q.issues.iter().any(|i| i.contains("too flat")));
        assert!(q.quality_score.is_finite());
    }

    #[test]
    fn test_median_filter_removes_spike() {
        let y = median_filter(&[1.0, 9.0, 1.0, 1.0, 1.0], 5);
        assert_eq!(y[1], 1.0);

        // Zero padding dominates a two-sample signal
        assert_eq!(median_filter(&[5.0, 5.0], 5), vec![0.0, 0.0]);
    }
}
