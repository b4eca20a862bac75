//! Core Types and Trait Definitions for dosha-engine
//!
//! Defines the shared vocabulary of the three-stage assessment:
//! - **Stage 1:** Per-modality evidence (pulse features, analyzer payloads)
//! - **Stage 2:** Adaptation into dosha likelihood vectors
//! - **Stage 3:** Weighted fusion and explanation
//!
//! # Architecture
//! Everything in this module is a plain value type except `ModalityAnalyzer`,
//! the async seam behind which external tongue and symptom analyzers live.

use crate::error::InputError;
use dosha_common::config::FusionSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Dosha
// ============================================================================

/// The three Ayurvedic doshas
///
/// Declaration order is the canonical order used for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dosha {
    Vata,
    Pitta,
    Kapha,
}

impl Dosha {
    /// All doshas in canonical order
    pub const ALL: [Dosha; 3] = [Dosha::Vata, Dosha::Pitta, Dosha::Kapha];

    /// Position in canonical order
    pub fn index(self) -> usize {
        match self {
            Dosha::Vata => 0,
            Dosha::Pitta => 1,
            Dosha::Kapha => 2,
        }
    }

    /// Lowercase key ("vata", "pitta", "kapha")
    pub fn key(self) -> &'static str {
        match self {
            Dosha::Vata => "vata",
            Dosha::Pitta => "pitta",
            Dosha::Kapha => "kapha",
        }
    }

    /// Case-insensitive lookup from an analyzer key
    pub fn from_key(key: &str) -> Option<Dosha> {
        match key.trim().to_ascii_lowercase().as_str() {
            "vata" => Some(Dosha::Vata),
            "pitta" => Some(Dosha::Pitta),
            "kapha" => Some(Dosha::Kapha),
            _ => None,
        }
    }
}

impl fmt::Display for Dosha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dosha::Vata => "Vata",
            Dosha::Pitta => "Pitta",
            Dosha::Kapha => "Kapha",
        };
        f.write_str(name)
    }
}

// ============================================================================
// DoshaVector
// ============================================================================

/// One value per dosha
///
/// In canonical form the entries are non-negative and sum to 1. A vector
/// summing to 0 stands for "modality unavailable".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DoshaVector {
    pub vata: f64,
    pub pitta: f64,
    pub kapha: f64,
}

impl DoshaVector {
    pub fn new(vata: f64, pitta: f64, kapha: f64) -> Self {
        Self { vata, pitta, kapha }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Uniform thirds
    pub fn uniform() -> Self {
        Self::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
    }

    pub fn get(&self, dosha: Dosha) -> f64 {
        match dosha {
            Dosha::Vata => self.vata,
            Dosha::Pitta => self.pitta,
            Dosha::Kapha => self.kapha,
        }
    }

    pub fn set(&mut self, dosha: Dosha, value: f64) {
        match dosha {
            Dosha::Vata => self.vata = value,
            Dosha::Pitta => self.pitta = value,
            Dosha::Kapha => self.kapha = value,
        }
    }

    pub fn sum(&self) -> f64 {
        self.vata + self.pitta + self.kapha
    }

    /// True when the vector carries no evidence
    pub fn is_empty(&self) -> bool {
        let total = self.sum();
        total.is_nan() || total <= 0.0
    }

    /// Divide by the sum; uniform thirds when the sum is not positive
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        if total > 0.0 && total.is_finite() {
            Self::new(self.vata / total, self.pitta / total, self.kapha / total)
        } else {
            Self::uniform()
        }
    }

    /// Highest entry, ties within `tolerance` resolved by canonical order
    pub fn argmax(&self, tolerance: f64) -> Dosha {
        let mut best = Dosha::Vata;
        for dosha in Dosha::ALL.iter().skip(1).copied() {
            if self.get(dosha) > self.get(best) + tolerance {
                best = dosha;
            }
        }
        best
    }

    /// Entries in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Dosha, f64)> + '_ {
        Dosha::ALL.iter().map(move |d| (*d, self.get(*d)))
    }
}

// ============================================================================
// Modality
// ============================================================================

/// Diagnostic modalities, declared in canonical fusion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Pulse,
    Tongue,
    Symptoms,
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::Pulse, Modality::Tongue, Modality::Symptoms];
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modality::Pulse => "Pulse",
            Modality::Tongue => "Tongue",
            Modality::Symptoms => "Symptoms",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Fusion Weights
// ============================================================================

/// Validated per-modality fusion weights
///
/// Finite, non-negative, at least one positive. Weights need not sum to 1;
/// the fusion engine renormalizes over the active modalities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeights", into = "RawWeights")]
pub struct FusionWeights {
    pulse: f64,
    tongue: f64,
    symptoms: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawWeights {
    pulse: f64,
    tongue: f64,
    symptoms: f64,
}

impl TryFrom<RawWeights> for FusionWeights {
    type Error = InputError;

    fn try_from(raw: RawWeights) -> Result<Self, Self::Error> {
        FusionWeights::new(raw.pulse, raw.tongue, raw.symptoms)
    }
}

impl From<FusionWeights> for RawWeights {
    fn from(w: FusionWeights) -> Self {
        RawWeights {
            pulse: w.pulse,
            tongue: w.tongue,
            symptoms: w.symptoms,
        }
    }
}

impl FusionWeights {
    /// Validate and construct
    pub fn new(pulse: f64, tongue: f64, symptoms: f64) -> Result<Self, InputError> {
        for (name, w) in [("pulse", pulse), ("tongue", tongue), ("symptoms", symptoms)] {
            if !w.is_finite() || w < 0.0 {
                return Err(InputError::InvalidWeights(format!(
                    "{} weight must be finite and non-negative, got {}",
                    name, w
                )));
            }
        }
        if pulse + tongue + symptoms <= 0.0 {
            return Err(InputError::InvalidWeights(
                "at least one weight must be positive".to_string(),
            ));
        }
        Ok(Self {
            pulse,
            tongue,
            symptoms,
        })
    }

    /// Weights from the `[fusion]` config section
    pub fn from_settings(settings: &FusionSettings) -> Result<Self, InputError> {
        Self::new(settings.pulse, settings.tongue, settings.symptoms)
    }

    pub fn get(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Pulse => self.pulse,
            Modality::Tongue => self.tongue,
            Modality::Symptoms => self.symptoms,
        }
    }
}

impl Default for FusionWeights {
    /// Tongue 0.50, pulse 0.30, symptoms 0.20
    fn default() -> Self {
        Self {
            pulse: 0.30,
            tongue: 0.50,
            symptoms: 0.20,
        }
    }
}

// ============================================================================
// External Analyzer Trait
// ============================================================================

/// Output of an external analyzer before adaptation
///
/// The payload schema is owned by the analyzer and is not trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModalityResult {
    /// Analyzer name for provenance
    pub source: String,
    /// Raw payload of unknown shape
    pub payload: serde_json::Value,
    /// Confidence stated by the analyzer, if any
    pub confidence: Option<f64>,
}

/// External analyzer seam (tongue classifier, symptom analyzer)
///
/// # Example
/// ```rust,ignore
/// use dosha_engine::types::{AnalyzerError, Modality, ModalityAnalyzer, ModalityResult};
///
/// pub struct StaticTongue(serde_json::Value);
///
/// #[async_trait::async_trait]
/// impl ModalityAnalyzer for StaticTongue {
///     fn name(&self) -> &'static str { "static-tongue" }
///     fn modality(&self) -> Modality { Modality::Tongue }
///
///     async fn analyze(&self) -> Result<ModalityResult, AnalyzerError> {
///         Ok(ModalityResult { source: self.name().into(), payload: self.0.clone(), confidence: None })
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait ModalityAnalyzer: Send + Sync {
    /// Analyzer name for provenance tracking
    fn name(&self) -> &'static str;

    /// Modality this analyzer produces
    fn modality(&self) -> Modality;

    /// Run the analyzer
    ///
    /// # Errors
    /// Any error makes the modality count as missing; it never fails the
    /// assessment.
    async fn analyze(&self) -> Result<ModalityResult, AnalyzerError>;
}

/// External analyzer failure
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Analyzer not configured or not reachable
    #[error("Analyzer not available: {0}")]
    NotAvailable(String),

    /// Analyzer returned something unusable
    #[error("Analyzer failed: {0}")]
    Failed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_ties_resolve_canonically() {
        let v = DoshaVector::new(0.4, 0.4, 0.2);
        assert_eq!(v.argmax(1e-9), Dosha::Vata);

        let v = DoshaVector::new(0.2, 0.4, 0.4);
        assert_eq!(v.argmax(1e-9), Dosha::Pitta);
    }

    #[test]
    fn test_normalized_zero_vector_is_uniform() {
        let v = DoshaVector::zero().normalized();
        assert_eq!(v, DoshaVector::uniform());
    }

    #[test]
    fn test_dosha_from_key_case_insensitive() {
        assert_eq!(Dosha::from_key("VATA"), Some(Dosha::Vata));
        assert_eq!(Dosha::from_key("Kapha"), Some(Dosha::Kapha));
        assert_eq!(Dosha::from_key("Balanced"), None);
    }

    #[test]
    fn test_weights_validation() {
        assert!(FusionWeights::new(0.3, 0.5, 0.2).is_ok());
        assert!(FusionWeights::new(-0.1, 0.5, 0.2).is_err());
        assert!(FusionWeights::new(f64::NAN, 0.5, 0.2).is_err());
        assert!(FusionWeights::new(0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_weights_deserialize_validates() {
        let ok: Result<FusionWeights, _> =
            serde_json::from_str(r#"{"pulse":0.6,"tongue":0.0,"symptoms":0.4}"#);
        assert!(ok.is_ok());

        let bad: Result<FusionWeights, _> =
            serde_json::from_str(r#"{"pulse":-1.0,"tongue":0.0,"symptoms":0.4}"#);
        assert!(bad.is_err());
    }
}
