//! Deterministic per-modality rationale text
//!
//! Every fragment is derived from values already computed upstream: the
//! fusion result picks the dosha to justify, and each active modality's
//! evidence names what supports it. Pulse fragments reuse the scorer's
//! indicator terms so the explanation and the score never disagree.

use crate::adapters::{ModalityEvidence, SymptomEvidence, TongueEvidence};
use crate::fusion::{FusionResult, FusionStatus};
use crate::pulse::FeatureVector;
use crate::scoring::indicators;
use crate::types::{Dosha, Modality};
use serde::Serialize;

/// Symptoms named in a symptom fragment
const MAX_SUPPORTING_SYMPTOMS: usize = 3;

const PULSE_FALLBACK: &str = "General pulse characteristics match this profile.";
const NO_SYMPTOMS: &str = "No specific symptoms reported.";
const NO_TONGUE_FEATURES: &str = "No distinctive visual tongue features were detected.";

/// One rationale fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplanationEntry {
    pub modality: Modality,
    pub text: String,
}

/// Explain a fusion result
///
/// One entry per active modality in canonical order. A modality with no
/// matching evidence still gets its fallback text.
pub fn explain(result: &FusionResult, evidence: &[ModalityEvidence]) -> Vec<ExplanationEntry> {
    if result.status == FusionStatus::NoData {
        return Vec::new();
    }

    let dominant = result.dominant;
    result
        .active_modalities()
        .map(|modality| {
            let found = evidence.iter().find(|e| evidence_modality(e) == modality);
            let text = match (modality, found) {
                (Modality::Pulse, Some(ModalityEvidence::Pulse { features })) => {
                    explain_pulse(features.as_ref(), dominant)
                }
                (Modality::Tongue, Some(ModalityEvidence::Tongue(tongue))) => explain_tongue(tongue, dominant),
                (Modality::Symptoms, Some(ModalityEvidence::Symptoms(symptoms))) => {
                    explain_symptoms(symptoms, dominant)
                }
                (Modality::Pulse, _) => explain_pulse(None, dominant),
                (Modality::Tongue, _) => explain_tongue(&TongueEvidence::default(), dominant),
                (Modality::Symptoms, _) => explain_symptoms(&SymptomEvidence::default(), dominant),
            };
            ExplanationEntry { modality, text }
        })
        .collect()
}

/// One-sentence assessment summary
pub fn summarize(result: &FusionResult) -> String {
    if result.status == FusionStatus::NoData {
        return "Insufficient data to identify a dosha imbalance: no modality produced a usable result."
            .to_string();
    }
    format!(
        "The system has identified a {} {} imbalance based on the weighted aggregation of multiple physiological markers.",
        result.imbalance_level, result.dominant
    )
}

fn evidence_modality(evidence: &ModalityEvidence) -> Modality {
    match evidence {
        ModalityEvidence::Pulse { .. } => Modality::Pulse,
        ModalityEvidence::Tongue(_) => Modality::Tongue,
        ModalityEvidence::Symptoms(_) => Modality::Symptoms,
    }
}

fn explain_pulse(features: Option<&FeatureVector>, dominant: Dosha) -> String {
    let mut supporting: Vec<_> = features
        .map(indicators)
        .unwrap_or_default()
        .into_iter()
        .filter(|i| i.dosha == dominant && i.contribution > 0.0)
        .collect();
    // Stable sort keeps scorer order among equal contributions
    supporting.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));

    let reasons = if supporting.is_empty() {
        PULSE_FALLBACK.to_string()
    } else {
        let names: Vec<&str> = supporting.iter().map(|i| i.signal.describe()).collect();
        format!("{}.", names.join(", "))
    };
    format!("Pulse features supporting {}: {}", dominant, reasons)
}

fn explain_tongue(evidence: &TongueEvidence, dominant: Dosha) -> String {
    let observed = [
        (
            evidence.has_cracks,
            &[Dosha::Vata][..],
            "Visible cracks on the tongue suggest dryness, which is commonly associated with Vata imbalance.",
        ),
        (
            evidence.has_coating,
            &[Dosha::Kapha, Dosha::Pitta][..],
            "Presence of tongue coating indicates digestive imbalance, often linked with Kapha or Pitta.",
        ),
        (
            evidence.has_heat_color(),
            &[Dosha::Pitta][..],
            "Reddish or yellowish coloration may reflect heat-related imbalance associated with Pitta.",
        ),
    ];

    let any_observed = observed.iter().any(|(present, _, _)| *present);
    let sentences: Vec<&str> = observed
        .iter()
        .filter(|(present, supports, _)| *present && supports.contains(&dominant))
        .map(|(_, _, sentence)| *sentence)
        .collect();

    let mut text = if !sentences.is_empty() {
        sentences.join(" ")
    } else if any_observed {
        format!("No visual tongue features specific to {} were detected.", dominant)
    } else {
        NO_TONGUE_FEATURES.to_string()
    };
    if !evidence.keywords.is_empty() {
        text.push_str(&format!(
            " Analyzer keywords ({}): {}.",
            dominant,
            evidence.keywords.join(", ")
        ));
    }
    text
}

fn explain_symptoms(evidence: &SymptomEvidence, dominant: Dosha) -> String {
    let supporting: Vec<&str> = evidence.supporting(dominant).take(MAX_SUPPORTING_SYMPTOMS).collect();
    if !supporting.is_empty() {
        return format!(
            "The following reported symptoms are strong indicators of {}: {}.",
            dominant,
            supporting.join(", ")
        );
    }

    match evidence.keyword_matches.get(&dominant) {
        Some(words) if !words.is_empty() => format!(
            "Reported symptoms matched {} keywords: {}.",
            dominant,
            words.join(", ")
        ),
        _ => NO_SYMPTOMS.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::symptoms::ReportedSymptom;
    use crate::fusion::fuse;
    use crate::pulse::RhythmType;
    use crate::types::DoshaVector;
    use std::collections::BTreeMap;

    fn vata_features() -> FeatureVector {
        FeatureVector {
            heart_rate: 95.0,
            hrv: 0.25,
            lf_hf_ratio: 1.0,
            rhythm_type: RhythmType::Irregular,
            mean_peak_amplitude: 0.5,
            sharpness: 50.0,
            sample_entropy: 0.9,
            std_rr: 0.25,
            vlf_power: 0.0,
            stress_indicator: true,
            insufficient_data: false,
            num_peaks: 12,
            signal_duration: 10.0,
        }
    }

    #[test]
    fn test_pulse_lists_strongest_first() {
        let text = explain_pulse(Some(&vata_features()), Dosha::Vata);
        assert!(text.starts_with("Pulse features supporting Vata: irregular rhythm, "));
        assert!(text.contains("complex beat-to-beat pattern"));
    }

    #[test]
    fn test_pulse_fallback() {
        let text = explain_pulse(None, Dosha::Kapha);
        assert_eq!(
            text,
            "Pulse features supporting Kapha: General pulse characteristics match this profile."
        );
    }

    #[test]
    fn test_symptoms_capped_at_three() {
        let symptoms = ["Dry skin", "Anxiety", "Insomnia", "Constipation"]
            .iter()
            .map(|s| ReportedSymptom {
                symptom: s.to_string(),
                primary_dosha: Some(Dosha::Vata),
            })
            .collect();
        let evidence = SymptomEvidence {
            symptoms,
            keyword_matches: BTreeMap::new(),
        };
        assert_eq!(
            explain_symptoms(&evidence, Dosha::Vata),
            "The following reported symptoms are strong indicators of Vata: Dry skin, Anxiety, Insomnia."
        );
        assert_eq!(explain_symptoms(&evidence, Dosha::Pitta), NO_SYMPTOMS);
    }

    #[test]
    fn test_only_active_modalities_explained() {
        let result = fuse(
            Some(&DoshaVector::new(0.7, 0.2, 0.1)),
            None,
            Some(&DoshaVector::new(0.5, 0.3, 0.2)),
            None,
        );
        let entries = explain(&result, &[ModalityEvidence::Tongue(TongueEvidence::default())]);
        let modalities: Vec<Modality> = entries.iter().map(|e| e.modality).collect();
        assert_eq!(modalities, vec![Modality::Pulse, Modality::Symptoms]);
    }

    #[test]
    fn test_tongue_sentences_follow_dominant_dosha() {
        let evidence = TongueEvidence {
            has_cracks: true,
            has_coating: true,
            dominant_color: Some("yellow".to_string()),
            keywords: vec!["dry".to_string()],
        };

        let vata = explain_tongue(&evidence, Dosha::Vata);
        assert!(vata.starts_with("Visible cracks"));
        assert!(!vata.contains("coating"));
        assert!(!vata.contains("heat-related"));
        assert!(vata.ends_with("Analyzer keywords (Vata): dry."));

        let pitta = explain_tongue(&evidence, Dosha::Pitta);
        assert!(pitta.starts_with("Presence of tongue coating"));
        assert!(pitta.contains("heat-related"));
        assert!(!pitta.contains("cracks"));

        let kapha = explain_tongue(&evidence, Dosha::Kapha);
        assert!(kapha.starts_with("Presence of tongue coating"));
        assert!(!kapha.contains("heat-related"));
    }

    #[test]
    fn test_tongue_features_for_other_dosha_only() {
        let evidence = TongueEvidence {
            has_cracks: true,
            ..TongueEvidence::default()
        };
        assert_eq!(
            explain_tongue(&evidence, Dosha::Kapha),
            "No visual tongue features specific to Kapha were detected."
        );
        assert_eq!(explain_tongue(&TongueEvidence::default(), Dosha::Kapha), NO_TONGUE_FEATURES);
    }

    #[test]
    fn test_summary() {
        let result = fuse(Some(&DoshaVector::new(0.7, 0.2, 0.1)), None, None, None);
        assert_eq!(
            summarize(&result),
            "The system has identified a severe Vata imbalance based on the weighted aggregation of multiple physiological markers."
        );
        assert!(summarize(&fuse(None, None, None, None)).starts_with("Insufficient data"));
    }
}
