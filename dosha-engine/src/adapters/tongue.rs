//! Tongue classifier adapter
//!
//! Visual evidence (`has_cracks`, `has_coating`, `dominant_color`) is read
//! from the payload root or from a `cv_features` object; the classifier's
//! `detailed_features.cracks.present` and `detailed_features.color.dominant`
//! are accepted as well. Analyzer keywords come from a `keywords` string
//! array.

use super::{ModalityAdapter, ModalityEvidence};
use crate::types::Modality;
use serde::Serialize;
use serde_json::Value;

/// Visual tongue findings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TongueEvidence {
    pub has_cracks: bool,
    pub has_coating: bool,
    pub dominant_color: Option<String>,
    pub keywords: Vec<String>,
}

impl TongueEvidence {
    /// Red or yellow coloration
    pub fn has_heat_color(&self) -> bool {
        matches!(
            self.dominant_color.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("red") | Some("yellow")
        )
    }
}

pub struct TongueAdapter;

impl ModalityAdapter for TongueAdapter {
    fn modality(&self) -> Modality {
        Modality::Tongue
    }

    fn evidence(&self, payload: &Value) -> ModalityEvidence {
        let sources: Vec<&Value> = [Some(payload), payload.get("cv_features")]
            .into_iter()
            .flatten()
            .collect();
        let detailed = payload.get("detailed_features");

        let flag = |key: &str| sources.iter().any(|s| s.get(key).and_then(Value::as_bool) == Some(true));

        let has_cracks = flag("has_cracks")
            || detailed
                .and_then(|d| d.pointer("/cracks/present"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
        let has_coating = flag("has_coating");

        let dominant_color = sources
            .iter()
            .find_map(|s| s.get("dominant_color").and_then(Value::as_str))
            .or_else(|| {
                detailed
                    .and_then(|d| d.pointer("/color/dominant"))
                    .and_then(Value::as_str)
            })
            .map(str::to_string);

        let keywords = payload
            .get("keywords")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        ModalityEvidence::Tongue(TongueEvidence {
            has_cracks,
            has_coating,
            dominant_color,
            keywords,
        })
    }
}
