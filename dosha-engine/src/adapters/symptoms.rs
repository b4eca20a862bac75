//! Symptom analyzer adapter

use super::{ModalityAdapter, ModalityEvidence};
use crate::types::{Dosha, Modality};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One reported symptom and the dosha it points to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportedSymptom {
    pub symptom: String,
    /// `None` when the analyzer could not attribute it
    pub primary_dosha: Option<Dosha>,
}

/// Symptom analyzer findings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SymptomEvidence {
    /// In analyzer order
    pub symptoms: Vec<ReportedSymptom>,
    /// Matched keywords per dosha
    pub keyword_matches: BTreeMap<Dosha, Vec<String>>,
}

impl SymptomEvidence {
    /// Symptoms attributed to `dosha`, in analyzer order
    pub fn supporting(&self, dosha: Dosha) -> impl Iterator<Item = &str> {
        self.symptoms
            .iter()
            .filter(move |s| s.primary_dosha == Some(dosha))
            .map(|s| s.symptom.as_str())
    }
}

pub struct SymptomAdapter;

impl ModalityAdapter for SymptomAdapter {
    fn modality(&self) -> Modality {
        Modality::Symptoms
    }

    fn evidence(&self, payload: &Value) -> ModalityEvidence {
        let symptoms = payload
            .get("symptom_analysis")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let symptom = item.get("symptom").and_then(Value::as_str)?;
                        let primary_dosha = item
                            .get("primary_dosha")
                            .and_then(Value::as_str)
                            .and_then(Dosha::from_key);
                        Some(ReportedSymptom {
                            symptom: symptom.to_string(),
                            primary_dosha,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut keyword_matches = BTreeMap::new();
        if let Some(matches) = payload.get("keyword_matches").and_then(Value::as_object) {
            for (key, words) in matches {
                let Some(dosha) = Dosha::from_key(key) else {
                    continue;
                };
                let words: Vec<String> = words
                    .as_array()
                    .map(|w| w.iter().filter_map(Value::as_str).map(str::to_string).collect())
                    .unwrap_or_default();
                if !words.is_empty() {
                    keyword_matches.insert(dosha, words);
                }
            }
        }

        ModalityEvidence::Symptoms(SymptomEvidence {
            symptoms,
            keyword_matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_symptom_evidence() {
        let payload = json!({
            "dosha_contributions": {"vata": 0.5, "pitta": 0.3, "kapha": 0.2},
            "symptom_analysis": [
                {"symptom": "Dry skin", "primary_dosha": "vata"},
                {"symptom": "Acidity", "primary_dosha": "pitta"},
                {"symptom": "Fatigue", "primary_dosha": "unknown"},
                {"symptom": "Anxiety", "primary_dosha": "vata"}
            ],
            "keyword_matches": {"vata": ["dry", "anxiety"], "Kapha": []}
        });
        let ModalityEvidence::Symptoms(evidence) = SymptomAdapter.evidence(&payload) else {
            panic!("expected symptom evidence");
        };

        assert_eq!(evidence.symptoms.len(), 4);
        assert_eq!(evidence.symptoms[2].primary_dosha, None);
        let vata: Vec<&str> = evidence.supporting(Dosha::Vata).collect();
        assert_eq!(vata, vec!["Dry skin", "Anxiety"]);
        assert_eq!(evidence.keyword_matches.len(), 1);
        assert_eq!(evidence.keyword_matches[&Dosha::Vata], vec!["dry", "anxiety"]);
    }
}
