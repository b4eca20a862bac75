//! Modality adapters
//!
//! External analyzers report dosha likelihoods under differing field names
//! with inconsistent key capitalisation. Adapters normalise that into a
//! [`DoshaVector`] without rescaling it, and flag unusable payloads as
//! missing rather than failing.
//!
//! # Extraction Contract
//! 1. Score fields are searched in priority order: `probabilities`,
//!    `scores`, `dosha_scores`, `dosha_contributions`. The first field
//!    present is used, even if it turns out to be unusable.
//! 2. Keys inside it match vata / pitta / kapha case-insensitively; other
//!    keys (e.g. `Balanced`) are ignored.
//! 3. Values may be numbers or numeric strings. Negative, non-finite or
//!    non-numeric values count as 0.0 and are logged.
//! 4. No field, a non-object field, no matching key, or all-zero values
//!    produce a zero vector marked missing.
//!
//! # Architecture
//! [`ModalityPayload`] is a tagged union with one variant per analyzer. Each
//! variant dispatches to its [`ModalityAdapter`], which shares the contract
//! above and additionally extracts that analyzer's explanation evidence.

pub mod pulse;
pub mod symptoms;
pub mod tongue;

use crate::pulse::FeatureVector;
use crate::types::{Dosha, DoshaVector, Modality, ModalityResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub use pulse::PulseAdapter;
pub use symptoms::{SymptomAdapter, SymptomEvidence};
pub use tongue::{TongueAdapter, TongueEvidence};

/// Score fields in priority order
pub const SCORE_FIELDS: [&str; 4] = ["probabilities", "scores", "dosha_scores", "dosha_contributions"];

// ============================================================================
// Extraction
// ============================================================================

/// Result of the shared extraction contract
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extraction {
    pub vector: DoshaVector,
    pub missing: bool,
    /// Field the vector came from
    pub field: Option<&'static str>,
}

impl Extraction {
    fn missing(field: Option<&'static str>) -> Self {
        Self {
            vector: DoshaVector::zero(),
            missing: true,
            field,
        }
    }
}

/// Adapt a raw analyzer payload into a dosha vector
///
/// A zero vector means the modality is missing.
pub fn adapt(payload: &Value) -> DoshaVector {
    extract_scores(payload).vector
}

/// Apply the extraction contract to a raw payload
pub fn extract_scores(payload: &Value) -> Extraction {
    let Some(object) = payload.as_object() else {
        debug!("Payload is not an object, modality missing");
        return Extraction::missing(None);
    };

    let Some((field, scores)) = SCORE_FIELDS
        .iter()
        .find_map(|f| object.get(*f).map(|v| (*f, v)))
    else {
        debug!("No score field in payload, modality missing");
        return Extraction::missing(None);
    };

    let Some(scores) = scores.as_object() else {
        warn!("Score field '{}' is not an object, modality missing", field);
        return Extraction::missing(Some(field));
    };

    let mut vector = DoshaVector::zero();
    let mut matched = [false; 3];
    for (key, value) in scores {
        let Some(dosha) = Dosha::from_key(key) else {
            continue;
        };
        if matched[dosha.index()] {
            warn!("Duplicate '{}' key in '{}', ignoring '{}'", dosha.key(), field, key);
            continue;
        }
        matched[dosha.index()] = true;
        vector.set(dosha, coerce_score(field, key, value));
    }

    if !matched.iter().any(|m| *m) {
        debug!("No dosha keys in '{}', modality missing", field);
        return Extraction::missing(Some(field));
    }
    if vector.is_empty() {
        debug!("All dosha values in '{}' are zero, modality missing", field);
        return Extraction::missing(Some(field));
    }

    Extraction {
        vector,
        missing: false,
        field: Some(field),
    }
}

/// Coerce one score value to a non-negative finite f64
///
/// Booleans count as 1.0 / 0.0.
fn coerce_score(field: &str, key: &str, value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        Some(v) => {
            warn!("{}.{} = {} is negative or non-finite, using 0.0", field, key, v);
            0.0
        }
        None => {
            warn!("{}.{} = {} is not numeric, using 0.0", field, key, value);
            0.0
        }
    }
}

/// Top-level `confidence` stated by the analyzer
pub fn stated_confidence(payload: &Value) -> Option<f64> {
    payload
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite())
}

// ============================================================================
// Typed Payloads
// ============================================================================

/// Evidence an analyzer supplies for explanations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "modality", rename_all = "lowercase")]
pub enum ModalityEvidence {
    Pulse { features: Option<FeatureVector> },
    Tongue(TongueEvidence),
    Symptoms(SymptomEvidence),
}

/// A modality after adaptation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptedModality {
    pub modality: Modality,
    /// Raw extracted values, not normalised
    pub vector: DoshaVector,
    pub missing: bool,
    pub confidence: Option<f64>,
    pub evidence: ModalityEvidence,
}

impl AdaptedModality {
    /// Placeholder for a modality that was never supplied
    pub fn absent(modality: Modality) -> Self {
        let evidence = match modality {
            Modality::Pulse => ModalityEvidence::Pulse { features: None },
            Modality::Tongue => ModalityEvidence::Tongue(TongueEvidence::default()),
            Modality::Symptoms => ModalityEvidence::Symptoms(SymptomEvidence::default()),
        };
        Self {
            modality,
            vector: DoshaVector::zero(),
            missing: true,
            confidence: None,
            evidence,
        }
    }
}

/// Per-analyzer adapter
///
/// # Example
/// ```rust,ignore
/// use dosha_engine::adapters::{ModalityAdapter, TongueAdapter};
///
/// let adapted = TongueAdapter.adapt(&serde_json::json!({
///     "probabilities": {"Vata": 0.2, "Pitta": 0.7, "Kapha": 0.1},
///     "cv_features": {"has_cracks": false, "dominant_color": "red"}
/// }));
/// assert!(!adapted.missing);
/// ```
pub trait ModalityAdapter {
    fn modality(&self) -> Modality;

    /// Analyzer-specific explanation evidence
    fn evidence(&self, payload: &Value) -> ModalityEvidence;

    /// Score vector, missing flag, stated confidence and evidence
    fn adapt(&self, payload: &Value) -> AdaptedModality {
        let extraction = extract_scores(payload);
        debug!(
            "{} adapted from {:?}: V {:.3} P {:.3} K {:.3} (missing: {})",
            self.modality(),
            extraction.field,
            extraction.vector.vata,
            extraction.vector.pitta,
            extraction.vector.kapha,
            extraction.missing
        );
        AdaptedModality {
            modality: self.modality(),
            vector: extraction.vector,
            missing: extraction.missing,
            confidence: stated_confidence(payload),
            evidence: self.evidence(payload),
        }
    }
}

/// Raw analyzer output tagged with its modality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", content = "payload", rename_all = "lowercase")]
pub enum ModalityPayload {
    Pulse(Value),
    Tongue(Value),
    Symptoms(Value),
}

impl ModalityPayload {
    /// Tag an analyzer result with the modality it was produced for
    pub fn from_result(modality: Modality, result: ModalityResult) -> Self {
        let mut payload = result.payload;
        // A confidence reported beside the payload wins over one inside it
        if let (Some(confidence), Some(object)) = (result.confidence, payload.as_object_mut()) {
            object.insert("confidence".to_string(), Value::from(confidence));
        }
        match modality {
            Modality::Pulse => ModalityPayload::Pulse(payload),
            Modality::Tongue => ModalityPayload::Tongue(payload),
            Modality::Symptoms => ModalityPayload::Symptoms(payload),
        }
    }

    pub fn modality(&self) -> Modality {
        match self {
            ModalityPayload::Pulse(_) => Modality::Pulse,
            ModalityPayload::Tongue(_) => Modality::Tongue,
            ModalityPayload::Symptoms(_) => Modality::Symptoms,
        }
    }

    pub fn raw(&self) -> &Value {
        match self {
            ModalityPayload::Pulse(v) | ModalityPayload::Tongue(v) | ModalityPayload::Symptoms(v) => v,
        }
    }

    /// Run the matching adapter
    pub fn adapt(&self) -> AdaptedModality {
        match self {
            ModalityPayload::Pulse(v) => PulseAdapter.adapt(v),
            ModalityPayload::Tongue(v) => TongueAdapter.adapt(v),
            ModalityPayload::Symptoms(v) => SymptomAdapter.adapt(v),
        }
    }
}
