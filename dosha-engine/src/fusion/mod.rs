//! Weighted fusion of per-modality dosha vectors
//!
//! # Algorithm
//! 1. Active set = modalities whose vector has a positive sum
//! 2. Renormalize the active weights to sum to 1
//! 3. `fused[c] = Σ vector[c] × weight`, modalities in canonical order
//! 4. Normalize `fused` to sum to 1
//! 5. No active modality (or zero total active weight): uniform thirds,
//!    confidence 0, status `no_data`
//! 6. Dominant = argmax, ties within 1e-9 broken Vata, Pitta, Kapha
//! 7. Confidence = fused value of the dominant dosha
//! 8. Imbalance: severe > 0.6, moderate > 0.45, else mild
//!
//! Vectors are weighted as supplied; adapters do not rescale them.

use crate::adapters::AdaptedModality;
use crate::types::{Dosha, DoshaVector, FusionWeights, Modality};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Scores closer than this are ties
pub const TIE_TOLERANCE: f64 = 1e-9;

const SEVERE_THRESHOLD: f64 = 0.6;
const MODERATE_THRESHOLD: f64 = 0.45;

// ============================================================================
// Result Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStatus {
    /// All three modalities contributed
    Complete,
    /// At least one, but not all, contributed
    Partial,
    /// Nothing usable
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImbalanceLevel {
    Mild,
    Moderate,
    Severe,
}

impl ImbalanceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > SEVERE_THRESHOLD {
            ImbalanceLevel::Severe
        } else if confidence > MODERATE_THRESHOLD {
            ImbalanceLevel::Moderate
        } else {
            ImbalanceLevel::Mild
        }
    }
}

impl fmt::Display for ImbalanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImbalanceLevel::Mild => "mild",
            ImbalanceLevel::Moderate => "moderate",
            ImbalanceLevel::Severe => "severe",
        })
    }
}

/// One modality's part in the fusion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SourceContribution {
    pub modality: Modality,
    /// Vector as supplied (zero when missing)
    pub vector: DoshaVector,
    pub active: bool,
    /// Renormalized weight actually applied (0 when inactive)
    pub weight: f64,
}

/// Fusion output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionResult {
    pub status: FusionStatus,
    pub dominant: Dosha,
    pub confidence: f64,
    pub fused: DoshaVector,
    /// One entry per modality, canonical order
    pub sources: Vec<SourceContribution>,
    pub imbalance_level: ImbalanceLevel,
}

impl FusionResult {
    pub fn source(&self, modality: Modality) -> Option<&SourceContribution> {
        self.sources.iter().find(|s| s.modality == modality)
    }

    /// Modalities that contributed, canonical order
    pub fn active_modalities(&self) -> impl Iterator<Item = Modality> + '_ {
        self.sources.iter().filter(|s| s.active).map(|s| s.modality)
    }
}

// ============================================================================
// Fusion Engine
// ============================================================================

/// Fusion engine holding the configured weights
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FusionEngine {
    weights: FusionWeights,
}

impl FusionEngine {
    pub fn new(weights: FusionWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    /// Fuse adapted modalities; missing or absent ones are excluded
    pub fn fuse_adapted(&self, modalities: &[AdaptedModality]) -> FusionResult {
        let pick = |m: Modality| {
            modalities
                .iter()
                .find(|a| a.modality == m && !a.missing)
                .map(|a| a.vector)
        };
        self.fuse(
            pick(Modality::Pulse).as_ref(),
            pick(Modality::Tongue).as_ref(),
            pick(Modality::Symptoms).as_ref(),
        )
    }

    /// Fuse up to three vectors with the engine's weights
    pub fn fuse(
        &self,
        pulse: Option<&DoshaVector>,
        tongue: Option<&DoshaVector>,
        symptoms: Option<&DoshaVector>,
    ) -> FusionResult {
        let inputs = [
            (Modality::Pulse, pulse),
            (Modality::Tongue, tongue),
            (Modality::Symptoms, symptoms),
        ];

        let mut sources: Vec<SourceContribution> = inputs
            .iter()
            .map(|(modality, vector)| {
                let vector = vector.copied().unwrap_or_default();
                SourceContribution {
                    modality: *modality,
                    vector,
                    active: is_usable(*modality, &vector),
                    weight: 0.0,
                }
            })
            .collect();

        let active_weight: f64 = sources
            .iter()
            .filter(|s| s.active)
            .map(|s| self.weights.get(s.modality))
            .sum();
        let active_count = sources.iter().filter(|s| s.active).count();

        if active_count == 0 || active_weight <= 0.0 {
            if active_count > 0 {
                warn!("Active modalities all carry zero weight, no usable data");
            }
            debug!("No active modalities, uniform result");
            return FusionResult {
                status: FusionStatus::NoData,
                dominant: Dosha::Vata,
                confidence: 0.0,
                fused: DoshaVector::uniform(),
                sources,
                imbalance_level: ImbalanceLevel::Mild,
            };
        }

        for source in sources.iter_mut().filter(|s| s.active) {
            source.weight = self.weights.get(source.modality) / active_weight;
        }

        let mut fused = DoshaVector::zero();
        for source in sources.iter().filter(|s| s.active) {
            for dosha in Dosha::ALL {
                let value = fused.get(dosha) + source.vector.get(dosha) * source.weight;
                fused.set(dosha, value);
            }
        }
        let fused = fused.normalized();

        let dominant = fused.argmax(TIE_TOLERANCE);
        let confidence = fused.get(dominant);
        let status = if active_count == Modality::ALL.len() {
            FusionStatus::Complete
        } else {
            FusionStatus::Partial
        };

        debug!(
            "Fused V {:.3} P {:.3} K {:.3} from {} modalities, dominant {}",
            fused.vata, fused.pitta, fused.kapha, active_count, dominant
        );

        FusionResult {
            status,
            dominant,
            confidence,
            fused,
            sources,
            imbalance_level: ImbalanceLevel::from_confidence(confidence),
        }
    }
}

/// Fuse with explicit weights (default weights when `None`)
pub fn fuse(
    pulse: Option<&DoshaVector>,
    tongue: Option<&DoshaVector>,
    symptoms: Option<&DoshaVector>,
    weights: Option<&FusionWeights>,
) -> FusionResult {
    FusionEngine::new(weights.copied().unwrap_or_default()).fuse(pulse, tongue, symptoms)
}

/// Positive-sum vector with finite, non-negative entries
fn is_usable(modality: Modality, vector: &DoshaVector) -> bool {
    if vector.iter().any(|(_, v)| !v.is_finite() || v < 0.0) {
        warn!("{} vector has negative or non-finite entries, treated as missing", modality);
        return false;
    }
    !vector.is_empty()
}
