//! Synthetic pulse waveform generator
//!
//! Deterministic signals only; no randomness, so feature values are
//! reproducible across runs.

use std::f64::consts::PI;

/// Configuration for a generated sine waveform
#[derive(Debug, Clone)]
pub struct WaveformConfig {
    pub duration_seconds: f64,
    pub sampling_rate: f64,
    pub frequency_hz: f64,
    pub amplitude: f64,
    /// Constant offset added to every sample
    pub baseline: f64,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 10.0,
            sampling_rate: 125.0,
            frequency_hz: 1.2,
            amplitude: 1.0,
            baseline: 0.0,
        }
    }
}

/// Sine wave at `config.frequency_hz` (1.2 Hz = 72 bpm by default)
pub fn sine_wave(config: &WaveformConfig) -> Vec<f64> {
    let total = (config.duration_seconds * config.sampling_rate) as usize;
    (0..total)
        .map(|i| {
            let t = i as f64 / config.sampling_rate;
            config.baseline + config.amplitude * (2.0 * PI * config.frequency_hz * t).sin()
        })
        .collect()
}

/// Train of Gaussian beats separated by the given RR intervals
///
/// The first beat sits one second in; the signal runs one second past the
/// last beat.
///
/// # Arguments
/// * `rr_intervals` - Beat-to-beat intervals in seconds
/// * `sampling_rate` - Hz
pub fn pulse_train(rr_intervals: &[f64], sampling_rate: f64) -> Vec<f64> {
    const WIDTH_SECONDS: f64 = 0.06;

    let mut beats = vec![1.0];
    for rr in rr_intervals {
        let last = beats[beats.len() - 1];
        beats.push(last + rr);
    }
    let duration = beats[beats.len() - 1] + 1.0;
    let total = (duration * sampling_rate) as usize;

    (0..total)
        .map(|i| {
            let t = i as f64 / sampling_rate;
            beats
                .iter()
                .map(|b| (-(t - b).powi(2) / (2.0 * WIDTH_SECONDS * WIDTH_SECONDS)).exp())
                .sum()
        })
        .collect()
}
