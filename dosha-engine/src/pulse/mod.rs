//! Pulse waveform feature extraction
//!
//! Converts a raw pulse waveform into the numeric feature vector consumed by
//! the rule scorer.
//!
//! # Algorithm
//! 1. Zero-phase Butterworth band-pass (0.5-5 Hz, order 3), skipped when the
//!    signal is too short or the band does not fit under Nyquist
//! 2. Peak detection with 0.4 s minimum spacing and minimum prominence
//! 3. RR intervals, heart rate, HRV
//! 4. RR spectrum bands (VLF / LF / HF) once at least 10 intervals exist
//! 5. Rhythm class from the RR coefficient of variation
//! 6. Peak amplitude, sample entropy, stress flag
//!
//! Fewer than two peaks yields a degenerate vector flagged
//! `insufficient_data`, never an error.
//!
//! # Example
//! ```rust,ignore
//! use dosha_engine::pulse::{extract_features, Waveform};
//!
//! let waveform = Waveform::new(samples, 125.0, None)?;
//! let features = extract_features(&waveform);
//! println!("HR {:.1} bpm, rhythm {}", features.heart_rate, features.rhythm_type);
//! ```

pub mod entropy;
pub mod filter;
pub mod peaks;
pub mod quality;
pub mod spectral;

use crate::error::InputError;
use dosha_common::config::PulseSettings;
use entropy::{population_std, sample_entropy};
use peaks::{find_peaks, PeakCriteria};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Heart rate reported for degenerate signals when no override is given
pub const DEFAULT_HEART_RATE: f64 = 70.0;

/// Minimum RR intervals for the spectral bands
pub const MIN_INTERVALS_FOR_SPECTRUM: usize = 10;

/// Rhythm classification needs more than this many RR intervals
pub const MIN_INTERVALS_FOR_RHYTHM: usize = 5;

// ============================================================================
// Waveform
// ============================================================================

/// Validated pulse waveform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
    samples: Vec<f64>,
    sampling_rate: f64,
    heart_rate_override: Option<f64>,
}

impl Waveform {
    /// Validate and construct
    ///
    /// # Errors
    /// Empty sample array, non-finite sample, non-positive or non-finite
    /// sampling rate, non-positive or non-finite heart-rate override.
    pub fn new(
        samples: Vec<f64>,
        sampling_rate: f64,
        heart_rate_override: Option<f64>,
    ) -> Result<Self, InputError> {
        if samples.is_empty() {
            return Err(InputError::EmptyWaveform);
        }
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(InputError::InvalidSamplingRate(sampling_rate));
        }
        if let Some(index) = samples.iter().position(|v| !v.is_finite()) {
            return Err(InputError::NonFiniteSample { index });
        }
        if let Some(hr) = heart_rate_override {
            if !hr.is_finite() || hr <= 0.0 {
                return Err(InputError::InvalidHeartRateOverride(hr));
            }
        }
        Ok(Self {
            samples,
            sampling_rate,
            heart_rate_override,
        })
    }

    /// Build from an untyped JSON sample array
    ///
    /// Rejects nested arrays and non-numeric entries.
    pub fn from_json(
        value: &serde_json::Value,
        sampling_rate: f64,
        heart_rate_override: Option<f64>,
    ) -> Result<Self, InputError> {
        let array = value.as_array().ok_or_else(|| {
            InputError::NotOneDimensional("expected an array of numbers".to_string())
        })?;
        let samples = array
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                serde_json::Value::Number(n) => n.as_f64().ok_or(InputError::NonFiniteSample { index: i }),
                serde_json::Value::Array(_) => Err(InputError::NotOneDimensional(format!(
                    "element {} is a nested array",
                    i
                ))),
                other => Err(InputError::NotOneDimensional(format!(
                    "element {} is not a number: {}",
                    i, other
                ))),
            })
            .collect::<Result<Vec<f64>, InputError>>()?;
        Self::new(samples, sampling_rate, heart_rate_override)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn heart_rate_override(&self) -> Option<f64> {
        self.heart_rate_override
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sampling_rate
    }
}

// ============================================================================
// Feature Vector
// ============================================================================

/// Rhythm class from RR coefficient of variation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmType {
    /// CV < 5%
    Regular,
    /// 5% ≤ CV ≤ 10%
    Moderate,
    /// CV > 10%
    Irregular,
    /// Too few intervals to classify
    InsufficientData,
}

impl fmt::Display for RhythmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RhythmType::Regular => "regular",
            RhythmType::Moderate => "moderate",
            RhythmType::Irregular => "irregular",
            RhythmType::InsufficientData => "insufficient_data",
        };
        f.write_str(s)
    }
}

/// Pulse features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Beats per minute (override when supplied)
    pub heart_rate: f64,
    /// Population std of RR intervals (s)
    pub hrv: f64,
    /// LF / (HF + 1e-6), uncapped
    pub lf_hf_ratio: f64,
    pub rhythm_type: RhythmType,
    /// Mean peak prominence
    pub mean_peak_amplitude: f64,
    /// `mean_peak_amplitude × 100`
    pub sharpness: f64,
    pub sample_entropy: f64,
    /// Same value as `hrv`
    pub std_rr: f64,
    pub vlf_power: f64,
    pub stress_indicator: bool,
    pub insufficient_data: bool,
    pub num_peaks: usize,
    /// Seconds
    pub signal_duration: f64,
}

impl FeatureVector {
    /// Vector reported when fewer than two peaks are found
    pub fn degenerate(heart_rate: f64, num_peaks: usize, signal_duration: f64) -> Self {
        Self {
            heart_rate,
            hrv: 0.0,
            lf_hf_ratio: 0.0,
            rhythm_type: RhythmType::InsufficientData,
            mean_peak_amplitude: 0.0,
            sharpness: 0.0,
            sample_entropy: 0.0,
            std_rr: 0.0,
            vlf_power: 0.0,
            stress_indicator: false,
            insufficient_data: true,
            num_peaks,
            signal_duration,
        }
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Feature extractor parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PulseFeatureExtractor {
    pub default_heart_rate: f64,
    /// `None` disables prominence filtering
    pub min_prominence: Option<f64>,
    pub band_low_hz: f64,
    pub band_high_hz: f64,
    pub filter_order: usize,
    /// Minimum spacing between beats (s)
    pub min_beat_spacing: f64,
}

impl Default for PulseFeatureExtractor {
    fn default() -> Self {
        Self {
            default_heart_rate: DEFAULT_HEART_RATE,
            min_prominence: Some(0.1),
            band_low_hz: 0.5,
            band_high_hz: 5.0,
            filter_order: 3,
            min_beat_spacing: 0.4,
        }
    }
}

impl PulseFeatureExtractor {
    /// Extractor configured from the `[pulse]` config section
    pub fn from_settings(settings: &PulseSettings) -> Self {
        Self {
            default_heart_rate: settings.default_heart_rate,
            min_prominence: (settings.min_prominence > 0.0).then_some(settings.min_prominence),
            ..Self::default()
        }
    }

    /// Extract features from a validated waveform
    pub fn extract(&self, waveform: &Waveform) -> FeatureVector {
        let fs = waveform.sampling_rate();
        let override_hr = waveform.heart_rate_override();
        let duration = waveform.duration();

        let (signal, filtered) = filter::bandpass(
            waveform.samples(),
            fs,
            self.band_low_hz,
            self.band_high_hz,
            self.filter_order,
        );
        if !filtered {
            warn!(
                "Band-pass skipped ({} samples at {} Hz), using raw signal",
                waveform.samples().len(),
                fs
            );
        }

        let peaks = find_peaks(
            &signal,
            &PeakCriteria {
                min_height: None,
                min_distance: Some(self.min_beat_spacing * fs),
                min_prominence: self.min_prominence,
            },
        );
        debug!("Detected {} peaks", peaks.len());

        if peaks.len() < 2 {
            let hr = override_hr.unwrap_or(self.default_heart_rate);
            debug!("Fewer than 2 peaks, degenerate features (HR {})", hr);
            return FeatureVector::degenerate(hr, peaks.len(), duration);
        }

        let rr: Vec<f64> = peaks
            .indices
            .windows(2)
            .map(|w| (w[1] - w[0]) as f64 / fs)
            .collect();
        let mean_rr = rr.iter().sum::<f64>() / rr.len() as f64;
        let heart_rate = override_hr.unwrap_or(60.0 / mean_rr);
        let hrv = population_std(&rr);

        let (lf_hf_ratio, vlf_power) = if rr.len() >= MIN_INTERVALS_FOR_SPECTRUM {
            let bands = spectral::band_powers(&rr);
            debug!(
                "RR bands: VLF {:.4}, LF {:.4}, HF {:.4}",
                bands.vlf, bands.lf, bands.hf
            );
            (bands.lf_hf_ratio(), bands.vlf)
        } else {
            (0.0, 0.0)
        };

        let rhythm_type = if rr.len() > MIN_INTERVALS_FOR_RHYTHM {
            let cv = hrv / mean_rr * 100.0;
            if cv > 10.0 {
                RhythmType::Irregular
            } else if cv < 5.0 {
                RhythmType::Regular
            } else {
                RhythmType::Moderate
            }
        } else {
            RhythmType::InsufficientData
        };

        let mean_peak_amplitude = match &peaks.prominences {
            Some(p) if !p.is_empty() => p.iter().sum::<f64>() / p.len() as f64,
            _ => {
                peaks.indices.iter().map(|&i| signal[i].abs()).sum::<f64>()
                    / peaks.len() as f64
            }
        };

        let entropy = sample_entropy(&rr, 2, 0.2);
        let stress_indicator = lf_hf_ratio > 2.0 || heart_rate > 90.0;

        debug!(
            "Features: HR {:.1}, HRV {:.4}, rhythm {}, amplitude {:.3}, entropy {:.3}",
            heart_rate, hrv, rhythm_type, mean_peak_amplitude, entropy
        );

        FeatureVector {
            heart_rate,
            hrv,
            lf_hf_ratio,
            rhythm_type,
            mean_peak_amplitude,
            sharpness: mean_peak_amplitude * 100.0,
            sample_entropy: entropy,
            std_rr: hrv,
            vlf_power,
            stress_indicator,
            insufficient_data: false,
            num_peaks: peaks.len(),
            signal_duration: duration,
        }
    }
}

/// Extract features with default parameters
pub fn extract_features(waveform: &Waveform) -> FeatureVector {
    PulseFeatureExtractor::default().extract(waveform)
}
