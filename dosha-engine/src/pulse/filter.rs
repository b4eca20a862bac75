//! Zero-phase Butterworth band-pass filtering
//!
//! Digital design follows the classic analog-prototype route: Butterworth
//! poles, band-pass transformation, bilinear transform, then forward-backward
//! filtering with odd-extension padding and steady-state initial conditions.
//! Output matches the usual `butter` + `filtfilt` pair to within rounding.

use rustfft::num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

/// Transfer function coefficients (numerator `b`, denominator `a`)
#[derive(Debug, Clone, PartialEq)]
pub struct BandPass {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl BandPass {
    /// Design an order-`order` Butterworth band-pass filter
    ///
    /// Returns `None` when the band cannot be represented at this sampling
    /// rate (an edge at or above Nyquist, or `low >= high`).
    pub fn butterworth(order: usize, low_hz: f64, high_hz: f64, sampling_rate: f64) -> Option<Self> {
        if order == 0 || !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return None;
        }
        let nyquist = 0.5 * sampling_rate;
        let (w_low, w_high) = (low_hz / nyquist, high_hz / nyquist);
        if !(w_low > 0.0 && w_low < w_high && w_high < 1.0) {
            return None;
        }

        // Analog prototype poles (unit cutoff, left half-plane)
        let n = order as i64;
        let prototype: Vec<Complex64> = (0..order as i64)
            .map(|k| {
                let m = (-n + 1 + 2 * k) as f64;
                -Complex64::from_polar(1.0, PI * m / (2.0 * n as f64))
            })
            .collect();

        // Pre-warp band edges for the bilinear transform (fs = 2)
        let fs2 = 4.0;
        let warped_low = fs2 * (PI * w_low / 2.0).tan();
        let warped_high = fs2 * (PI * w_high / 2.0).tan();
        let bw = warped_high - warped_low;
        let wo = (warped_low * warped_high).sqrt();

        // Low-pass to band-pass: each pole splits into a pair, `order` zeros at s = 0
        let mut analog_poles = Vec::with_capacity(2 * order);
        for p in &prototype {
            let p_lp = *p * (bw / 2.0);
            let root = (p_lp * p_lp - Complex64::new(wo * wo, 0.0)).sqrt();
            analog_poles.push(p_lp + root);
        }
        for p in &prototype {
            let p_lp = *p * (bw / 2.0);
            let root = (p_lp * p_lp - Complex64::new(wo * wo, 0.0)).sqrt();
            analog_poles.push(p_lp - root);
        }
        let analog_gain = bw.powi(order as i32);

        // Bilinear transform: s-plane zeros at 0 map to z = 1, the excess
        // degree adds zeros at z = -1
        let fs2c = Complex64::new(fs2, 0.0);
        let digital_poles: Vec<Complex64> = analog_poles
            .iter()
            .map(|p| (fs2c + *p) / (fs2c - *p))
            .collect();
        let mut digital_zeros = vec![Complex64::new(1.0, 0.0); order];
        digital_zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(order));

        let zero_term = fs2c.powi(order as i32);
        let pole_term = analog_poles
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, p| acc * (fs2c - *p));
        let gain = analog_gain * (zero_term / pole_term).re;

        let b: Vec<f64> = poly(&digital_zeros).iter().map(|c| gain * c.re).collect();
        let a: Vec<f64> = poly(&digital_poles).iter().map(|c| c.re).collect();

        if b.iter().chain(a.iter()).any(|c| !c.is_finite()) {
            return None;
        }
        Some(Self { b, a })
    }

    /// Padding length used by [`filtfilt`](Self::filtfilt)
    pub fn pad_len(&self) -> usize {
        3 * self.a.len().max(self.b.len())
    }

    /// Forward-backward filter
    ///
    /// Returns `None` if the signal is not longer than the padding.
    pub fn filtfilt(&self, x: &[f64]) -> Option<Vec<f64>> {
        let pad = self.pad_len();
        let n = x.len();
        if n <= pad {
            debug!("Signal length {} <= pad length {}, filter skipped", n, pad);
            return None;
        }

        // Odd extension on both ends
        let mut ext = Vec::with_capacity(n + 2 * pad);
        ext.extend((1..=pad).rev().map(|i| 2.0 * x[0] - x[i]));
        ext.extend_from_slice(x);
        ext.extend((1..=pad).map(|i| 2.0 * x[n - 1] - x[n - 1 - i]));

        let zi = self.steady_state()?;

        let x0 = ext[0];
        let init: Vec<f64> = zi.iter().map(|z| z * x0).collect();
        let mut y = self.lfilter(&ext, &init);

        y.reverse();
        let y0 = y[0];
        let init: Vec<f64> = zi.iter().map(|z| z * y0).collect();
        let mut y = self.lfilter(&y, &init);
        y.reverse();

        Some(y[pad..pad + n].to_vec())
    }

    /// Direct form II transposed IIR filter with initial state `zi`
    pub fn lfilter(&self, x: &[f64], zi: &[f64]) -> Vec<f64> {
        let order = self.a.len().max(self.b.len());
        let a0 = self.a[0];
        let b: Vec<f64> = (0..order)
            .map(|i| self.b.get(i).copied().unwrap_or(0.0) / a0)
            .collect();
        let a: Vec<f64> = (0..order)
            .map(|i| self.a.get(i).copied().unwrap_or(0.0) / a0)
            .collect();

        let mut z = vec![0.0; order.saturating_sub(1)];
        for (dst, src) in z.iter_mut().zip(zi) {
            *dst = *src;
        }

        let mut y = Vec::with_capacity(x.len());
        for &xn in x {
            let yn = b[0] * xn + z.first().copied().unwrap_or(0.0);
            for i in 0..z.len() {
                let next = if i + 1 < z.len() { z[i + 1] } else { 0.0 };
                z[i] = b[i + 1] * xn + next - a[i + 1] * yn;
            }
            y.push(yn);
        }
        y
    }

    /// Initial state giving a step-response steady state
    ///
    /// Solves `(I - A^T) zi = b[1:] - a[1:] * b[0]` where `A` is the
    /// companion matrix of the normalized denominator.
    pub fn steady_state(&self) -> Option<Vec<f64>> {
        let order = self.a.len().max(self.b.len());
        if order < 2 {
            return Some(Vec::new());
        }
        let a0 = self.a[0];
        let b: Vec<f64> = (0..order)
            .map(|i| self.b.get(i).copied().unwrap_or(0.0) / a0)
            .collect();
        let a: Vec<f64> = (0..order)
            .map(|i| self.a.get(i).copied().unwrap_or(0.0) / a0)
            .collect();

        let m = order - 1;
        let mut matrix = vec![vec![0.0; m]; m];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
            row[0] += a[i + 1];
            if i + 1 < m {
                row[i + 1] -= 1.0;
            }
        }
        let rhs: Vec<f64> = (0..m).map(|i| b[i + 1] - a[i + 1] * b[0]).collect();

        solve_linear(matrix, rhs)
    }
}

/// Band-pass a pulse waveform, falling back to the raw signal
///
/// Returns the filtered signal and whether filtering was applied.
pub fn bandpass(x: &[f64], sampling_rate: f64, low_hz: f64, high_hz: f64, order: usize) -> (Vec<f64>, bool) {
    match BandPass::butterworth(order, low_hz, high_hz, sampling_rate) {
        Some(filter) => match filter.filtfilt(x) {
            Some(y) => (y, true),
            None => (x.to_vec(), false),
        },
        None => {
            debug!(
                "Band {}-{} Hz not representable at {} Hz, filter skipped",
                low_hz, high_hz, sampling_rate
            );
            (x.to_vec(), false)
        }
    }
}

/// Polynomial coefficients (highest power first) from roots
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for r in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, c) in coeffs.iter().enumerate() {
            next[i] += *c;
            next[i + 1] -= *c * *r;
        }
        coeffs = next;
    }
    coeffs
}

/// Gaussian elimination with partial pivoting
fn solve_linear(mut m: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))?;
        if m[pivot][col].abs() < 1e-300 {
            return None;
        }
        m.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| m[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[row][row];
    }
    Some(x)
}
