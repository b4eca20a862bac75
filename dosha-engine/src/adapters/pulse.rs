//! Pulse classifier adapter
//!
//! Evidence is the feature vector embedded under `features`, if any. Older
//! analyzers name two of the fields differently (`pitta_score` for
//! sharpness, `has_stress_indicator` for the stress flag); both spellings
//! are accepted.

use super::{ModalityAdapter, ModalityEvidence};
use crate::pulse::{FeatureVector, RhythmType};
use crate::types::Modality;
use serde_json::Value;

pub struct PulseAdapter;

impl ModalityAdapter for PulseAdapter {
    fn modality(&self) -> Modality {
        Modality::Pulse
    }

    fn evidence(&self, payload: &Value) -> ModalityEvidence {
        ModalityEvidence::Pulse {
            features: payload.get("features").and_then(embedded_features),
        }
    }
}

/// Read an embedded feature object; `heart_rate` is required
fn embedded_features(value: &Value) -> Option<FeatureVector> {
    let num = |key: &str| value.get(key).and_then(Value::as_f64).filter(|v| v.is_finite());
    let flag = |key: &str| value.get(key).and_then(Value::as_bool);

    let heart_rate = num("heart_rate")?;
    let hrv = num("hrv").unwrap_or(0.0);
    let rhythm_type = value
        .get("rhythm_type")
        .cloned()
        .and_then(|v| serde_json::from_value::<RhythmType>(v).ok())
        .unwrap_or(RhythmType::InsufficientData);
    let mean_peak_amplitude = num("mean_peak_amplitude").unwrap_or(0.0);

    Some(FeatureVector {
        heart_rate,
        hrv,
        lf_hf_ratio: num("lf_hf_ratio").unwrap_or(0.0),
        rhythm_type,
        mean_peak_amplitude,
        sharpness: num("sharpness")
            .or_else(|| num("pitta_score"))
            .unwrap_or(mean_peak_amplitude * 100.0),
        sample_entropy: num("sample_entropy").unwrap_or(0.0),
        std_rr: num("std_rr").unwrap_or(hrv),
        vlf_power: num("vlf_power").unwrap_or(0.0),
        stress_indicator: flag("stress_indicator")
            .or_else(|| flag("has_stress_indicator"))
            .unwrap_or(false),
        insufficient_data: flag("insufficient_data")
            .unwrap_or(rhythm_type == RhythmType::InsufficientData && hrv == 0.0),
        num_peaks: value.get("num_peaks").and_then(Value::as_u64).unwrap_or(0) as usize,
        signal_duration: num("signal_duration").unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_field_names() {
        let payload = json!({
            "probabilities": {"Vata": 0.6, "Pitta": 0.3, "Kapha": 0.1, "Balanced": 0.0},
            "features": {
                "heart_rate": 88.0,
                "hrv": 0.12,
                "rhythm_type": "irregular",
                "mean_peak_amplitude": 1.5,
                "pitta_score": 150.0,
                "has_stress_indicator": true
            }
        });
        let adapted = PulseAdapter.adapt(&payload);
        let ModalityEvidence::Pulse { features: Some(f) } = adapted.evidence else {
            panic!("expected embedded features");
        };
        assert_eq!(f.rhythm_type, RhythmType::Irregular);
        assert_eq!(f.sharpness, 150.0);
        assert!(f.stress_indicator);
        assert_eq!(f.std_rr, 0.12);
        assert!(!f.insufficient_data);
    }

    #[test]
    fn test_features_without_heart_rate_ignored() {
        let payload = json!({"scores": {"vata": 1.0}, "features": {"hrv": 0.1}});
        let adapted = PulseAdapter.adapt(&payload);
        assert_eq!(adapted.evidence, ModalityEvidence::Pulse { features: None });
    }
}
