//! Sample entropy of an RR series

/// Sample entropy with template length `m` and tolerance `r_factor × std`
///
/// Counts pairs of distinct templates (Chebyshev distance ≤ r) among the
/// first `N - m` start positions at lengths `m` and `m + 1`, and returns
/// `-ln(A / B)`, computed as `ln(B / A)` so that `A == B` gives `+0.0`.
/// Returns 0.0 for a series shorter than `m + 2`, zero variance,
/// or when either count is zero.
pub fn sample_entropy(data: &[f64], m: usize, r_factor: f64) -> f64 {
    let n = data.len();
    if m == 0 || n < m + 2 {
        return 0.0;
    }

    let std = population_std(data);
    if std == 0.0 || !std.is_finite() {
        return 0.0;
    }
    let r = r_factor * std;

    let templates = n - m;
    let mut b = 0u64;
    let mut a = 0u64;
    for i in 0..templates {
        for j in (i + 1)..templates {
            if within(data, i, j, m, r) {
                b += 1;
                if (data[i + m] - data[j + m]).abs() <= r {
                    a += 1;
                }
            }
        }
    }

    if a == 0 || b == 0 {
        return 0.0;
    }
    ((b as f64) / (a as f64)).ln()
}

fn within(data: &[f64], i: usize, j: usize, len: usize, r: f64) -> bool {
    (0..len).all(|k| (data[i + k] - data[j + k]).abs() <= r)
}

/// Population standard deviation
pub fn population_std(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    (data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
