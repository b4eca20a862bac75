//! Fusion and adapter property tests

use dosha_engine::adapters::{adapt, ModalityPayload};
use dosha_engine::fusion::{fuse, FusionEngine, FusionStatus, ImbalanceLevel};
use dosha_engine::{Dosha, DoshaVector, FusionWeights, Modality};
use serde_json::json;

/// Deterministic spread of vectors including zeros and unnormalised values
fn sample_vectors() -> Vec<Option<DoshaVector>> {
    let mut vectors = vec![None, Some(DoshaVector::zero())];
    for a in [0.0, 0.1, 0.5, 2.0] {
        for b in [0.0, 0.3, 1.0] {
            for c in [0.0, 0.2, 0.7] {
                vectors.push(Some(DoshaVector::new(a, b, c)));
            }
        }
    }
    vectors
}

#[test]
fn test_fused_vector_is_a_distribution() {
    let vectors = sample_vectors();
    for pulse in &vectors {
        for tongue in vectors.iter().step_by(5) {
            for symptoms in vectors.iter().step_by(7) {
                let result = fuse(pulse.as_ref(), tongue.as_ref(), symptoms.as_ref(), None);

                if result.status == FusionStatus::NoData {
                    assert_eq!(result.fused, DoshaVector::uniform());
                    assert_eq!(result.confidence, 0.0);
                    continue;
                }
                assert!((result.fused.sum() - 1.0).abs() < 1e-6);
                assert!(result.fused.iter().all(|(_, v)| v >= 0.0));
                assert_eq!(result.confidence, result.fused.get(result.dominant));

                let weight_sum: f64 = result.sources.iter().map(|s| s.weight).sum();
                assert!((weight_sum - 1.0).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn test_partial_fusion_scenario() {
    let result = fuse(
        Some(&DoshaVector::new(0.7, 0.2, 0.1)),
        None,
        Some(&DoshaVector::new(0.5, 0.3, 0.2)),
        None,
    );

    assert_eq!(result.status, FusionStatus::Partial);
    assert!((result.fused.vata - 0.62).abs() < 1e-9);
    assert!((result.fused.pitta - 0.24).abs() < 1e-9);
    assert!((result.fused.kapha - 0.14).abs() < 1e-9);
    assert_eq!(result.dominant, Dosha::Vata);
    assert!((result.confidence - 0.62).abs() < 1e-9);
    assert_eq!(result.imbalance_level, ImbalanceLevel::Severe);
}

#[test]
fn test_all_missing_scenario() {
    let result = fuse(None, None, None, None);

    assert_eq!(result.status, FusionStatus::NoData);
    assert_eq!(result.fused, DoshaVector::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0));
    assert_eq!(result.confidence, 0.0);
    assert!(result.sources.iter().all(|s| !s.active && s.weight == 0.0));
}

#[test]
fn test_fusion_is_deterministic() {
    let pulse = DoshaVector::new(0.123, 0.456, 0.789);
    let tongue = DoshaVector::new(0.3, 0.3, 0.4);
    let symptoms = DoshaVector::new(1.7, 0.01, 0.2);
    let weights = FusionWeights::new(0.37, 0.41, 0.22).unwrap();

    let first = fuse(Some(&pulse), Some(&tongue), Some(&symptoms), Some(&weights));
    for _ in 0..10 {
        let again = fuse(Some(&pulse), Some(&tongue), Some(&symptoms), Some(&weights));
        assert_eq!(again.fused.vata.to_bits(), first.fused.vata.to_bits());
        assert_eq!(again.fused.pitta.to_bits(), first.fused.pitta.to_bits());
        assert_eq!(again.fused.kapha.to_bits(), first.fused.kapha.to_bits());
        assert_eq!(again, first);
    }
    assert_eq!(first.status, FusionStatus::Complete);
}

#[test]
fn test_weight_monotonicity() {
    let pulse = DoshaVector::new(0.8, 0.1, 0.1);
    let tongue = DoshaVector::new(0.1, 0.8, 0.1);

    let mut previous = 0.0;
    for step in 1..=9 {
        let pulse_weight = step as f64 / 10.0;
        let weights = FusionWeights::new(pulse_weight, 0.5, 0.2).unwrap();
        let result = fuse(Some(&pulse), Some(&tongue), None, Some(&weights));
        assert!(
            result.fused.vata > previous,
            "vata {} did not increase at pulse weight {}",
            result.fused.vata,
            pulse_weight
        );
        previous = result.fused.vata;
    }
}

#[test]
fn test_invalid_weights_rejected() {
    assert!(FusionWeights::new(-0.1, 0.5, 0.6).is_err());
    assert!(FusionWeights::new(0.0, 0.0, 0.0).is_err());
    assert!(FusionWeights::new(f64::NAN, 0.5, 0.5).is_err());
    assert!(serde_json::from_value::<FusionWeights>(json!({"pulse": -1.0, "tongue": 1.0, "symptoms": 1.0})).is_err());
}

#[test]
fn test_adapted_payloads_fuse_like_vectors() {
    let tongue = ModalityPayload::Tongue(json!({"probabilities": {"Vata": 0.1, "Pitta": 0.7, "Kapha": 0.2}}));
    let symptoms = ModalityPayload::Symptoms(json!({"dosha_contributions": {"vata": "0.2", "pitta": 0.5, "kapha": 0.3}}));
    let pulse = ModalityPayload::Pulse(json!({"error": "device disconnected"}));

    let adapted = vec![pulse.adapt(), tongue.adapt(), symptoms.adapt()];
    assert!(adapted[0].missing);

    let engine = FusionEngine::default();
    let from_payloads = engine.fuse_adapted(&adapted);
    let from_vectors = fuse(
        None,
        Some(&adapt(tongue.raw())),
        Some(&adapt(symptoms.raw())),
        None,
    );

    assert_eq!(from_payloads, from_vectors);
    assert_eq!(from_payloads.dominant, Dosha::Pitta);
    assert!(!from_payloads.source(Modality::Pulse).unwrap().active);
}
