//! Assessment pipeline orchestrator
//!
//! # Architecture
//! - **Phase 1**: Validate the waveform (fails fast)
//! - **Phase 2**: Pulse path on the blocking pool, concurrently with the
//!   external analyzers
//! - **Phase 3**: Adapt every modality and fuse
//! - **Phase 4**: Explain and summarize
//!
//! # Example
//! ```rust,ignore
//! let pipeline = AssessmentPipeline::from_config(&config)?
//!     .with_analyzer(Arc::new(TongueClassifierClient::new(url)));
//! let assessment = pipeline.assess(request).await?;
//! println!("{}", assessment.summary);
//! ```

use super::{Assessment, AssessmentRequest, PulseInput};
use crate::adapters::{AdaptedModality, ModalityAdapter, ModalityPayload, PulseAdapter};
use crate::cache::FeatureCache;
use crate::error::{EngineError, Result};
use crate::explain::{explain, summarize};
use crate::fusion::FusionEngine;
use crate::pulse::quality::{assess_signal_quality, SignalQuality};
use crate::pulse::{FeatureVector, PulseFeatureExtractor, Waveform};
use crate::scoring::{score_dosha, DoshaScoreReport};
use crate::types::{FusionWeights, Modality, ModalityAnalyzer, ModalityResult};
use chrono::Utc;
use dosha_common::config::TomlConfig;
use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Used when a request gives no sampling rate (Hz)
    pub default_sampling_rate: f64,
    /// Minimum length before the quality check flags the signal
    pub min_signal_length: usize,
    /// Per-analyzer deadline
    pub analyzer_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_sampling_rate: 125.0,
            min_signal_length: 500,
            analyzer_timeout: Duration::from_millis(10_000),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            default_sampling_rate: config.pulse.sampling_rate,
            min_signal_length: config.pulse.min_signal_length,
            analyzer_timeout: Duration::from_millis(config.analyzers.timeout_ms),
        }
    }
}

/// Pulse path output
#[derive(Debug, Clone, Serialize)]
pub struct PulseAnalysis {
    pub features: FeatureVector,
    pub score: DoshaScoreReport,
    pub quality: SignalQuality,
}

/// Assessment orchestrator
///
/// Cheap to share behind an `Arc`; every call owns its own data apart from
/// the feature cache.
pub struct AssessmentPipeline {
    config: PipelineConfig,
    extractor: PulseFeatureExtractor,
    engine: FusionEngine,
    cache: Option<Arc<FeatureCache>>,
    analyzers: Vec<Arc<dyn ModalityAnalyzer>>,
}

impl AssessmentPipeline {
    pub fn new(config: PipelineConfig, extractor: PulseFeatureExtractor, engine: FusionEngine) -> Self {
        Self {
            config,
            extractor,
            engine,
            cache: None,
            analyzers: Vec::new(),
        }
    }

    /// Pipeline built from resolved configuration
    ///
    /// # Errors
    /// Invalid fusion weights or an unusable cache directory.
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        let weights = FusionWeights::from_settings(&config.fusion)?;
        let mut pipeline = Self::new(
            PipelineConfig::from_toml(config),
            PulseFeatureExtractor::from_settings(&config.pulse),
            FusionEngine::new(weights),
        );
        pipeline.cache = FeatureCache::from_settings(&config.cache)?.map(Arc::new);
        debug!(
            "Pipeline configured: cache {}, analyzer timeout {:?}",
            if pipeline.cache.is_some() { "enabled" } else { "disabled" },
            pipeline.config.analyzer_timeout
        );
        Ok(pipeline)
    }

    pub fn with_cache(mut self, cache: FeatureCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Register an external analyzer; the first one per modality is used
    pub fn with_analyzer(mut self, analyzer: Arc<dyn ModalityAnalyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn cache(&self) -> Option<&FeatureCache> {
        self.cache.as_deref()
    }

    pub fn engine(&self) -> &FusionEngine {
        &self.engine
    }

    /// Run one assessment
    ///
    /// # Errors
    /// Only a malformed waveform (or a panicked extraction task) fails the
    /// call. Missing modalities are reported inside the assessment.
    pub async fn assess(&self, request: AssessmentRequest) -> Result<Assessment> {
        let id = Uuid::new_v4();
        let waveform = request
            .pulse
            .as_ref()
            .map(|input| self.validate(input))
            .transpose()?;

        info!(
            "Assessment {} started (waveform: {}, tongue: {}, symptoms: {})",
            id,
            waveform.is_some(),
            request.tongue.is_some(),
            request.symptoms.is_some()
        );

        let has_waveform = waveform.is_some();
        let pulse_path = async {
            match waveform {
                Some(w) => self.run_pulse(w).await.map(Some),
                None => Ok(None),
            }
        };
        let (pulse, external) = tokio::join!(pulse_path, self.run_external(&request, has_waveform));
        let pulse = pulse?;

        // Canonical order: pulse, tongue, symptoms
        let mut modalities = Vec::with_capacity(Modality::ALL.len());
        match &pulse {
            Some(analysis) => modalities.push(PulseAdapter.adapt(&json!({
                "scores": analysis.score.vector,
                "features": analysis.features,
            }))),
            None => modalities.push(
                external
                    .iter()
                    .find(|m| m.modality == Modality::Pulse)
                    .cloned()
                    .unwrap_or_else(|| AdaptedModality::absent(Modality::Pulse)),
            ),
        }
        for modality in [Modality::Tongue, Modality::Symptoms] {
            modalities.push(
                external
                    .iter()
                    .find(|m| m.modality == modality)
                    .cloned()
                    .unwrap_or_else(|| AdaptedModality::absent(modality)),
            );
        }

        for adapted in modalities.iter().filter(|m| m.missing) {
            warn!("Assessment {}: {} modality missing", id, adapted.modality);
        }

        let engine = request.weights.map(FusionEngine::new).unwrap_or(self.engine);
        let fusion = engine.fuse_adapted(&modalities);
        let evidence: Vec<_> = modalities.iter().map(|m| m.evidence.clone()).collect();
        let explanation = explain(&fusion, &evidence);
        let summary = summarize(&fusion);

        info!(
            "Assessment {} complete: {} {} ({:.2}, {:?})",
            id, fusion.imbalance_level, fusion.dominant, fusion.confidence, fusion.status
        );

        let (features, score, quality) = match pulse {
            Some(p) => (Some(p.features), Some(p.score), Some(p.quality)),
            None => (None, None, None),
        };

        Ok(Assessment {
            id,
            created_at: Utc::now(),
            features,
            score,
            quality,
            modalities,
            fusion,
            explanation,
            summary,
        })
    }

    /// Run independent assessments concurrently, results in request order
    pub async fn assess_batch(&self, requests: Vec<AssessmentRequest>) -> Vec<Result<Assessment>> {
        info!("Batch of {} assessments", requests.len());
        join_all(requests.into_iter().map(|r| self.assess(r))).await
    }

    /// Pulse path only: features, score and quality
    pub async fn analyze_pulse(&self, input: &PulseInput) -> Result<PulseAnalysis> {
        let waveform = self.validate(input)?;
        self.run_pulse(waveform).await
    }

    fn validate(&self, input: &PulseInput) -> Result<Waveform> {
        let sampling_rate = input.sampling_rate.unwrap_or(self.config.default_sampling_rate);
        Ok(Waveform::from_json(&input.samples, sampling_rate, input.heart_rate_override)?)
    }

    async fn run_pulse(&self, waveform: Waveform) -> Result<PulseAnalysis> {
        let extractor = self.extractor.clone();
        let cache = self.cache.clone();
        let min_length = self.config.min_signal_length;

        let analysis = tokio::task::spawn_blocking(move || {
            let quality = assess_signal_quality(waveform.samples(), waveform.sampling_rate(), min_length);
            let features = match &cache {
                Some(cache) => cache.get_or_extract(&extractor, &waveform),
                None => extractor.extract(&waveform),
            };
            let score = score_dosha(&features);
            PulseAnalysis {
                features,
                score,
                quality,
            }
        })
        .await
        .map_err(|e| EngineError::Join(e.to_string()))?;

        if !analysis.quality.is_valid {
            warn!(
                "Low signal quality ({:.2}): {}",
                analysis.quality.quality_score,
                analysis.quality.issues.join("; ")
            );
        }
        if analysis.features.insufficient_data {
            warn!(
                "Too few beats detected ({}), degenerate pulse features",
                analysis.features.num_peaks
            );
        }
        debug!(
            "Pulse path: HR {:.1}, rhythm {}, dominant {}",
            analysis.features.heart_rate, analysis.features.rhythm_type, analysis.score.dominant
        );
        Ok(analysis)
    }

    /// Inline payloads and registered analyzers, concurrently
    async fn run_external(&self, request: &AssessmentRequest, has_waveform: bool) -> Vec<AdaptedModality> {
        let mut inline = Vec::new();
        let mut pending = Vec::new();

        for modality in Modality::ALL {
            if modality == Modality::Pulse && has_waveform {
                if request.pulse_payload.is_some() {
                    debug!("Waveform supplied, ignoring precomputed pulse payload");
                }
                continue;
            }
            if let Some(payload) = request.inline_payload(modality) {
                let result = ModalityResult {
                    source: "inline".to_string(),
                    payload: payload.clone(),
                    confidence: None,
                };
                inline.push(ModalityPayload::from_result(modality, result).adapt());
            } else if let Some(analyzer) = self.analyzers.iter().find(|a| a.modality() == modality) {
                pending.push(self.run_analyzer(analyzer.as_ref()));
            }
        }

        inline.extend(join_all(pending).await);
        inline
    }

    async fn run_analyzer(&self, analyzer: &dyn ModalityAnalyzer) -> AdaptedModality {
        let modality = analyzer.modality();
        match tokio::time::timeout(self.config.analyzer_timeout, analyzer.analyze()).await {
            Ok(Ok(result)) => {
                debug!("{} analyzer '{}' returned", modality, analyzer.name());
                ModalityPayload::from_result(modality, result).adapt()
            }
            Ok(Err(e)) => {
                warn!("{} analyzer '{}' failed: {}", modality, analyzer.name(), e);
                AdaptedModality::absent(modality)
            }
            Err(_) => {
                warn!(
                    "{} analyzer '{}' timed out after {:?}",
                    modality,
                    analyzer.name(),
                    self.config.analyzer_timeout
                );
                AdaptedModality::absent(modality)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;
    use serde_json::json;

    #[tokio::test]
    async fn test_malformed_waveform_fails_fast() {
        let pipeline = AssessmentPipeline::from_config(&TomlConfig::default()).unwrap();
        let request = AssessmentRequest {
            pulse: Some(PulseInput {
                samples: json!([[0.1, 0.2], [0.3, 0.4]]),
                sampling_rate: None,
                heart_rate_override: None,
            }),
            tongue: Some(json!({"probabilities": {"pitta": 0.9}})),
            ..AssessmentRequest::default()
        };

        let err = pipeline.assess(request).await.unwrap_err();
        assert!(matches!(err, EngineError::Input(InputError::NotOneDimensional(_))));
    }

    #[tokio::test]
    async fn test_empty_request_is_no_data() {
        let pipeline = AssessmentPipeline::from_config(&TomlConfig::default()).unwrap();
        let assessment = pipeline.assess(AssessmentRequest::default()).await.unwrap();

        assert_eq!(assessment.fusion.status, crate::fusion::FusionStatus::NoData);
        assert!(assessment.explanation.is_empty());
        assert_eq!(assessment.modalities.len(), 3);
        assert!(assessment.features.is_none());
    }

    #[tokio::test]
    async fn test_request_weights_override_config() {
        let pipeline = AssessmentPipeline::from_config(&TomlConfig::default()).unwrap();
        let request = AssessmentRequest {
            tongue: Some(json!({"probabilities": {"vata": 0.1, "pitta": 0.8, "kapha": 0.1}})),
            symptoms: Some(json!({"dosha_contributions": {"vata": 0.8, "pitta": 0.1, "kapha": 0.1}})),
            weights: Some(FusionWeights::new(0.0, 0.1, 0.9).unwrap()),
            ..AssessmentRequest::default()
        };

        let assessment = pipeline.assess(request).await.unwrap();
        assert_eq!(assessment.fusion.dominant, crate::types::Dosha::Vata);
    }
}
