//! Assessment workflow
//!
//! Orchestration around the pure core:
//! - **Pulse path**: waveform validation, cached feature extraction, signal
//!   quality and rule scoring on the blocking pool
//! - **Analyzer path**: external tongue / symptom analyzers run concurrently
//!   under a per-analyzer timeout
//! - **Fusion**: adapted modalities fused, explained and summarized
//!
//! # Error Handling
//! - A malformed waveform fails the whole assessment with no partial output
//! - A failed, timed-out or absent modality is missing input to fusion
//! - Nothing usable at all still yields an assessment (uniform, `no_data`)

pub mod pipeline;

use crate::adapters::AdaptedModality;
use crate::explain::ExplanationEntry;
use crate::fusion::FusionResult;
use crate::pulse::quality::SignalQuality;
use crate::pulse::FeatureVector;
use crate::scoring::DoshaScoreReport;
use crate::types::{FusionWeights, Modality};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use pipeline::{AssessmentPipeline, PipelineConfig};

/// Raw pulse capture as supplied by the caller
///
/// `samples` stays untyped until validation so nested or non-numeric
/// arrays are reported as input errors rather than parse failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseInput {
    pub samples: Value,
    /// Hz, pipeline default when absent
    #[serde(default)]
    pub sampling_rate: Option<f64>,
    #[serde(default)]
    pub heart_rate_override: Option<f64>,
}

/// One assessment request
///
/// Inline payloads take precedence over registered analyzers for the same
/// modality. `pulse_payload` is a precomputed pulse classifier output, used
/// only when no waveform is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentRequest {
    #[serde(default)]
    pub pulse: Option<PulseInput>,
    #[serde(default)]
    pub pulse_payload: Option<Value>,
    #[serde(default)]
    pub tongue: Option<Value>,
    #[serde(default)]
    pub symptoms: Option<Value>,
    /// Per-request weights, configured weights when absent
    #[serde(default)]
    pub weights: Option<FusionWeights>,
}

impl AssessmentRequest {
    /// Request carrying only a waveform
    pub fn from_waveform(samples: Vec<f64>, sampling_rate: f64, heart_rate_override: Option<f64>) -> Self {
        Self {
            pulse: Some(PulseInput {
                samples: Value::from(samples),
                sampling_rate: Some(sampling_rate),
                heart_rate_override,
            }),
            ..Self::default()
        }
    }

    /// Inline payload for a non-pulse modality
    pub fn inline_payload(&self, modality: Modality) -> Option<&Value> {
        match modality {
            Modality::Pulse => self.pulse_payload.as_ref(),
            Modality::Tongue => self.tongue.as_ref(),
            Modality::Symptoms => self.symptoms.as_ref(),
        }
    }
}

/// Complete assessment
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Present when a waveform was supplied
    pub features: Option<FeatureVector>,
    pub score: Option<DoshaScoreReport>,
    pub quality: Option<SignalQuality>,
    /// All three modalities, canonical order
    pub modalities: Vec<AdaptedModality>,
    pub fusion: FusionResult,
    pub explanation: Vec<ExplanationEntry>,
    pub summary: String,
}

impl Assessment {
    pub fn modality(&self, modality: Modality) -> Option<&AdaptedModality> {
        self.modalities.iter().find(|m| m.modality == modality)
    }
}
