//! Peak detection
//!
//! Local maxima with plateau handling, then optional height, minimum-distance
//! and minimum-prominence filters, applied in that order.

/// Peak selection criteria
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakCriteria {
    /// Minimum sample value at the peak
    pub min_height: Option<f64>,
    /// Minimum horizontal spacing between kept peaks, in samples
    pub min_distance: Option<f64>,
    /// Minimum topographic prominence
    pub min_prominence: Option<f64>,
}

/// Detected peaks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Peaks {
    /// Sample indices, ascending
    pub indices: Vec<usize>,
    /// Prominence of each kept peak; `None` when prominence was not requested
    pub prominences: Option<Vec<f64>>,
}

impl Peaks {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Find peaks in `x` satisfying `criteria`
pub fn find_peaks(x: &[f64], criteria: &PeakCriteria) -> Peaks {
    let mut indices = local_maxima(x);

    if let Some(h) = criteria.min_height {
        indices.retain(|&i| x[i] >= h);
    }

    if let Some(d) = criteria.min_distance {
        indices = select_by_distance(x, &indices, d);
    }

    let prominences = match criteria.min_prominence {
        Some(min_p) => {
            let all = prominences(x, &indices);
            let (kept, proms): (Vec<usize>, Vec<f64>) = indices
                .iter()
                .zip(all)
                .filter(|(_, p)| *p >= min_p)
                .map(|(i, p)| (*i, p))
                .unzip();
            indices = kept;
            Some(proms)
        }
        None => None,
    };

    Peaks {
        indices,
        prominences,
    }
}

/// Strict local maxima; flat plateaus report their (lower) midpoint
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let left = i;
                let right = ahead - 1;
                peaks.push((left + right) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Drop peaks closer than `distance` to a higher peak
///
/// Peaks are visited from highest to lowest; among equal heights the later
/// index is visited first.
fn select_by_distance(x: &[f64], peaks: &[usize], distance: f64) -> Vec<usize> {
    let n = peaks.len();
    if n == 0 {
        return Vec::new();
    }
    let distance = distance.ceil().max(1.0) as usize;
    let mut keep = vec![true; n];

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Topographic prominence of each peak
///
/// Height above the higher of the two lowest points reached on either side
/// before the signal rises above the peak (or the signal ends).
pub fn prominences(x: &[f64], peaks: &[usize]) -> Vec<f64> {
    peaks
        .iter()
        .map(|&peak| {
            let height = x[peak];

            let mut left_min = height;
            let mut i = peak;
            loop {
                if x[i] > height {
                    break;
                }
                left_min = left_min.min(x[i]);
                if i == 0 {
                    break;
                }
                i -= 1;
            }

            let mut right_min = height;
            for &v in &x[peak..] {
                if v > height {
                    break;
                }
                right_min = right_min.min(v);
            }

            height - left_min.max(right_min)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plateau_midpoint() {
        let x = [0.0, 1.0, 2.0, 2.0, 2.0, 1.0, 0.0];
        assert_eq!(local_maxima(&x), vec![3]);

        // Even-length plateau rounds down
        let x = [0.0, 2.0, 2.0, 0.0];
        assert_eq!(local_maxima(&x), vec![1]);
    }

    #[test]
    fn test_edges_are_not_peaks() {
        let x = [5.0, 1.0, 0.0, 1.0, 5.0];
        assert!(local_maxima(&x).is_empty());
    }

    #[test]
    fn test_distance_keeps_highest() {
        let x = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0];
        let criteria = PeakCriteria {
            min_distance: Some(3.0),
            ..Default::default()
        };
        assert_eq!(find_peaks(&x, &criteria).indices, vec![3]);
    }

    #[test]
    fn test_prominence_filter() {
        // Small ripple on a large bump
        let x = [0.0, 1.0, 0.95, 1.0, 2.0, 1.0, 0.0];
        let criteria = PeakCriteria {
            min_prominence: Some(0.1),
            ..Default::default()
        };
        let peaks = find_peaks(&x, &criteria);
        assert_eq!(peaks.indices, vec![4]);
        let proms = peaks.prominences.unwrap();
        assert!((proms[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_prominence_uses_higher_base() {
        let x = [0.5, 3.0, 1.0, 2.0, 0.0];
        let p = prominences(&x, &[3]);
        // Left side stops at 3.0 with min 1.0; right side reaches 0.0
        assert!((p[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_height_filter() {
        let x = [0.0, 1.0, 0.0, 3.0, 0.0];
        let criteria = PeakCriteria {
            min_height: Some(2.0),
            ..Default::default()
        };
        assert_eq!(find_peaks(&x, &criteria).indices, vec![3]);
    }
}
