//! RR-interval frequency bands
//!
//! The RR series is treated as uniformly sampled at its mean interval, so
//! bin `k` of an `n`-point transform sits at `k / (n * mean_rr)` Hz.

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

/// Very low frequency band [0.003, 0.04) Hz
pub const VLF_BAND: (f64, f64) = (0.003, 0.04);
/// Low frequency band [0.04, 0.15) Hz
pub const LF_BAND: (f64, f64) = (0.04, 0.15);
/// High frequency band [0.15, 0.4) Hz
pub const HF_BAND: (f64, f64) = (0.15, 0.4);

/// Added to HF before dividing
pub const LF_HF_EPSILON: f64 = 1e-6;

/// Summed spectral magnitude per band
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandPowers {
    pub vlf: f64,
    pub lf: f64,
    pub hf: f64,
}

impl BandPowers {
    pub fn lf_hf_ratio(&self) -> f64 {
        self.lf / (self.hf + LF_HF_EPSILON)
    }
}

/// One-sided magnitude spectrum of the mean-centred RR series with bin
/// frequencies
pub fn rr_spectrum(rr: &[f64]) -> Vec<(f64, f64)> {
    let n = rr.len();
    if n == 0 {
        return Vec::new();
    }
    let mean = rr.iter().sum::<f64>() / n as f64;
    if mean <= 0.0 || !mean.is_finite() {
        return Vec::new();
    }

    let mut buffer: Vec<Complex64> = rr.iter().map(|v| Complex64::new(v - mean, 0.0)).collect();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    (0..=n / 2)
        .map(|k| (k as f64 / (n as f64 * mean), buffer[k].norm()))
        .collect()
}

/// Band sums over the RR spectrum
pub fn band_powers(rr: &[f64]) -> BandPowers {
    let in_band = |f: f64, band: (f64, f64)| f >= band.0 && f < band.1;
    rr_spectrum(rr)
        .into_iter()
        .fold(BandPowers::default(), |mut acc, (f, mag)| {
            if in_band(f, VLF_BAND) {
                acc.vlf += mag;
            }
            if in_band(f, LF_BAND) {
                acc.lf += mag;
            }
            if in_band(f, HF_BAND) {
                acc.hf += mag;
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_series_has_no_power() {
        let bands = band_powers(&[0.8; 16]);
        assert!(bands.vlf.abs() < 1e-12);
        assert!(bands.lf.abs() < 1e-12);
        assert!(bands.hf.abs() < 1e-12);
        assert_eq!(bands.lf_hf_ratio(), 0.0);
    }

    #[test]
    fn test_bin_frequencies() {
        let rr = vec![1.0; 10];
        let spectrum = rr_spectrum(&rr);
        assert_eq!(spectrum.len(), 6);
        assert!((spectrum[1].0 - 0.1).abs() < 1e-12);
        assert!((spectrum[5].0 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_alternating_series_lands_in_top_bin() {
        // Period-2 oscillation at mean RR 1 s is 0.5 Hz, outside every band
        let rr: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.1 } else { 0.9 }).collect();
        let bands = band_powers(&rr);
        assert!(bands.lf.abs() < 1e-9);
        assert!(bands.hf.abs() < 1e-9);
    }

    #[test]
    fn test_hf_oscillation() {
        // 0.25 Hz oscillation with 1 s mean interval: bin 5 of 20
        let rr: Vec<f64> = (0..20)
            .map(|i| 1.0 + 0.05 * (2.0 * std::f64::consts::PI * 0.25 * i as f64).cos())
            .collect();
        let bands = band_powers(&rr);
        assert!(bands.hf > 0.4, "HF {}", bands.hf);
        assert!(bands.lf_hf_ratio() < 0.01);
    }
}
