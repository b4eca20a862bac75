//! Assessment pipeline integration tests

mod helpers;

use dosha_common::config::TomlConfig;
use dosha_engine::cache::FeatureCache;
use dosha_engine::fusion::FusionStatus;
use dosha_engine::pulse::PulseFeatureExtractor;
use dosha_engine::report::render_text;
use dosha_engine::workflow::{AssessmentPipeline, AssessmentRequest, PipelineConfig};
use dosha_engine::{Dosha, EngineError, FusionEngine, InputError, Modality};
use helpers::{sine_wave, FailingAnalyzer, SlowAnalyzer, StaticAnalyzer, WaveformConfig};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn pipeline_with_timeout(timeout: Duration) -> AssessmentPipeline {
    AssessmentPipeline::new(
        PipelineConfig {
            analyzer_timeout: timeout,
            ..PipelineConfig::default()
        },
        PulseFeatureExtractor::default(),
        FusionEngine::default(),
    )
}

fn tongue_payload() -> serde_json::Value {
    json!({
        "probabilities": {"Vata": 0.15, "Pitta": 0.7, "Kapha": 0.15},
        "cv_features": {"has_cracks": false, "has_coating": true, "dominant_color": "red"},
        "confidence": 0.8
    })
}

fn symptom_payload() -> serde_json::Value {
    json!({
        "dosha_contributions": {"vata": 0.2, "pitta": 0.6, "kapha": 0.2},
        "symptom_analysis": [
            {"symptom": "Acidity", "primary_dosha": "pitta"},
            {"symptom": "Irritability", "primary_dosha": "pitta"},
            {"symptom": "Dry skin", "primary_dosha": "vata"}
        ]
    })
}

fn waveform_request() -> AssessmentRequest {
    AssessmentRequest::from_waveform(sine_wave(&WaveformConfig::default()), 125.0, None)
}

#[tokio::test]
async fn test_full_assessment_with_analyzers() {
    let pipeline = pipeline_with_timeout(Duration::from_secs(5))
        .with_analyzer(Arc::new(StaticAnalyzer::new(Modality::Tongue, tongue_payload())))
        .with_analyzer(Arc::new(StaticAnalyzer::new(Modality::Symptoms, symptom_payload())));

    let assessment = pipeline.assess(waveform_request()).await.unwrap();

    assert_eq!(assessment.fusion.status, FusionStatus::Complete);
    assert_eq!(assessment.fusion.dominant, Dosha::Pitta);
    assert!(assessment.features.is_some());
    assert!(assessment.quality.as_ref().unwrap().is_valid);
    assert_eq!(assessment.modality(Modality::Tongue).unwrap().confidence, Some(0.8));

    let modalities: Vec<Modality> = assessment.explanation.iter().map(|e| e.modality).collect();
    assert_eq!(modalities, vec![Modality::Pulse, Modality::Tongue, Modality::Symptoms]);
    let symptoms = &assessment.explanation[2].text;
    assert_eq!(
        symptoms,
        "The following reported symptoms are strong indicators of Pitta: Acidity, Irritability."
    );
    assert!(assessment.summary.contains("Pitta imbalance"));

    let text = render_text(&assessment);
    assert!(text.contains("Dominant: Pitta"));
    assert!(text.contains("[Symptoms]"));
}

#[tokio::test]
async fn test_failed_and_slow_analyzers_count_as_missing() {
    let slow = SlowAnalyzer {
        inner: StaticAnalyzer::new(Modality::Symptoms, symptom_payload()),
        delay: Duration::from_millis(500),
    };
    let pipeline = pipeline_with_timeout(Duration::from_millis(20))
        .with_analyzer(Arc::new(FailingAnalyzer(Modality::Tongue)))
        .with_analyzer(Arc::new(slow));

    let assessment = pipeline.assess(waveform_request()).await.unwrap();

    assert_eq!(assessment.fusion.status, FusionStatus::Partial);
    assert!(assessment.modality(Modality::Tongue).unwrap().missing);
    assert!(assessment.modality(Modality::Symptoms).unwrap().missing);
    assert_eq!(assessment.explanation.len(), 1);
    assert_eq!(assessment.explanation[0].modality, Modality::Pulse);

    let pulse = assessment.fusion.source(Modality::Pulse).unwrap();
    assert_eq!(pulse.weight, 1.0);
}

#[tokio::test]
async fn test_inline_payload_wins_over_analyzer() {
    let pipeline = pipeline_with_timeout(Duration::from_secs(5)).with_analyzer(Arc::new(
        StaticAnalyzer::new(Modality::Tongue, json!({"probabilities": {"kapha": 1.0}})),
    ));
    let request = AssessmentRequest {
        tongue: Some(json!({"probabilities": {"vata": 1.0}})),
        ..AssessmentRequest::default()
    };

    let assessment = pipeline.assess(request).await.unwrap();
    assert_eq!(assessment.fusion.dominant, Dosha::Vata);
    assert!(assessment.features.is_none());
}

#[tokio::test]
async fn test_precomputed_pulse_payload_without_waveform() {
    let pipeline = pipeline_with_timeout(Duration::from_secs(5));
    let request: AssessmentRequest = serde_json::from_value(json!({
        "pulse_payload": {
            "probabilities": {"Vata": 0.6, "Pitta": 0.3, "Kapha": 0.1, "Balanced": 0.0},
            "features": {"heart_rate": 92.0, "hrv": 0.2, "rhythm_type": "irregular"}
        }
    }))
    .unwrap();

    let assessment = pipeline.assess(request).await.unwrap();
    assert_eq!(assessment.fusion.status, FusionStatus::Partial);
    assert_eq!(assessment.fusion.dominant, Dosha::Vata);
    assert!(assessment.explanation[0].text.starts_with("Pulse features supporting Vata: irregular rhythm"));
}

#[tokio::test]
async fn test_malformed_waveform_has_no_partial_output() {
    let pipeline = pipeline_with_timeout(Duration::from_secs(5));
    let request: AssessmentRequest = serde_json::from_value(json!({
        "pulse": {"samples": [0.1, "0.2", 0.3]},
        "tongue": tongue_payload()
    }))
    .unwrap();

    let err = pipeline.assess(request).await.unwrap_err();
    assert!(matches!(err, EngineError::Input(InputError::NotOneDimensional(_))));
}

#[tokio::test]
async fn test_cache_reused_across_assessments() {
    let temp = TempDir::new().unwrap();
    let cache = FeatureCache::new(8).with_dir(temp.path()).unwrap();
    let pipeline = pipeline_with_timeout(Duration::from_secs(5)).with_cache(cache);

    let first = pipeline.assess(waveform_request()).await.unwrap();
    let second = pipeline.assess(waveform_request()).await.unwrap();

    assert_eq!(pipeline.cache().unwrap().len(), 1);
    assert_eq!(first.features, second.features);
    assert_ne!(first.id, second.id);
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_batch_preserves_request_order() {
    let pipeline = AssessmentPipeline::from_config(&TomlConfig::default()).unwrap();
    let requests = vec![
        AssessmentRequest {
            tongue: Some(json!({"scores": {"kapha": 1.0}})),
            ..AssessmentRequest::default()
        },
        AssessmentRequest::default(),
        AssessmentRequest {
            symptoms: Some(json!({"scores": {"vata": 1.0}})),
            ..AssessmentRequest::default()
        },
    ];

    let results = pipeline.assess_batch(requests).await;
    let dominants: Vec<_> = results
        .iter()
        .map(|r| {
            let a = r.as_ref().unwrap();
            (a.fusion.status, a.fusion.dominant)
        })
        .collect();

    assert_eq!(
        dominants,
        vec![
            (FusionStatus::Partial, Dosha::Kapha),
            (FusionStatus::NoData, Dosha::Vata),
            (FusionStatus::Partial, Dosha::Vata),
        ]
    );
}
