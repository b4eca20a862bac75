//! Rule-based dosha scoring of pulse features
//!
//! Each dosha score is a sum of independently clamped indicator terms,
//! clamped again to [0, 1]. The individual terms are kept as an indicator
//! breakdown so explanations can cite exactly what contributed.
//!
//! # Indicator Terms
//! - **Vata:** irregular rhythm, HRV, sample entropy, heart rate above 85
//! - **Pitta:** peak amplitude, heart rate in 75-90, peak sharpness, regular rhythm
//! - **Kapha:** heart rate below 65, stable RR intervals, VLF power, regular rhythm

pub mod templates;

use crate::pulse::{FeatureVector, RhythmType};
use crate::types::{Dosha, DoshaVector};
use serde::Serialize;
use templates::NadiCharacteristics;
use tracing::debug;

/// Raw score above which the runner-up dosha counts as a secondary influence
pub const SECONDARY_THRESHOLD: f64 = 0.3;

// ============================================================================
// Indicator Breakdown
// ============================================================================

/// Pulse signal behind one scoring term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorSignal {
    IrregularRhythm,
    HighVariability,
    HighEntropy,
    ElevatedHeartRate,
    StrongAmplitude,
    PittaHeartRate,
    SharpPeaks,
    RegularRhythm,
    SlowHeartRate,
    StableIntervals,
    VlfPower,
}

impl IndicatorSignal {
    /// Short human-readable phrase
    pub fn describe(self) -> &'static str {
        match self {
            IndicatorSignal::IrregularRhythm => "irregular rhythm",
            IndicatorSignal::HighVariability => "high heart rate variability",
            IndicatorSignal::HighEntropy => "complex beat-to-beat pattern",
            IndicatorSignal::ElevatedHeartRate => "elevated heart rate",
            IndicatorSignal::StrongAmplitude => "strong pulse amplitude",
            IndicatorSignal::PittaHeartRate => "moderately fast heart rate",
            IndicatorSignal::SharpPeaks => "sharp pulse peaks",
            IndicatorSignal::RegularRhythm => "regular rhythm",
            IndicatorSignal::SlowHeartRate => "slow heart rate",
            IndicatorSignal::StableIntervals => "stable beat intervals",
            IndicatorSignal::VlfPower => "strong very-low-frequency power",
        }
    }
}

/// One scoring term and what it added
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Indicator {
    pub dosha: Dosha,
    pub signal: IndicatorSignal,
    pub contribution: f64,
}

/// Evaluate every indicator term for the given features
///
/// Terms that do not fire are included with a zero contribution.
pub fn indicators(features: &FeatureVector) -> Vec<Indicator> {
    let hr = features.heart_rate;
    let regular = features.rhythm_type == RhythmType::Regular;
    let irregular = features.rhythm_type == RhythmType::Irregular;

    let term = |dosha, signal, contribution: f64| Indicator {
        dosha,
        signal,
        contribution: contribution.max(0.0),
    };

    vec![
        // Vata
        term(Dosha::Vata, IndicatorSignal::IrregularRhythm, if irregular { 0.5 } else { 0.0 }),
        term(Dosha::Vata, IndicatorSignal::HighVariability, (features.hrv / 30.0).min(0.3)),
        term(Dosha::Vata, IndicatorSignal::HighEntropy, (features.sample_entropy / 1.5).min(0.3)),
        term(
            Dosha::Vata,
            IndicatorSignal::ElevatedHeartRate,
            if hr > 85.0 { ((hr - 85.0) / 30.0).min(0.3) } else { 0.0 },
        ),
        // Pitta
        term(
            Dosha::Pitta,
            IndicatorSignal::StrongAmplitude,
            (features.mean_peak_amplitude / 10.0).min(0.3),
        ),
        term(
            Dosha::Pitta,
            IndicatorSignal::PittaHeartRate,
            if (75.0..=90.0).contains(&hr) {
                0.3
            } else if hr > 90.0 {
                0.3 - (hr - 90.0) / 50.0
            } else {
                0.0
            },
        ),
        term(Dosha::Pitta, IndicatorSignal::SharpPeaks, (features.sharpness / 500.0).min(0.2)),
        term(Dosha::Pitta, IndicatorSignal::RegularRhythm, if regular { 0.15 } else { 0.0 }),
        // Kapha
        term(
            Dosha::Kapha,
            IndicatorSignal::SlowHeartRate,
            if hr < 65.0 { ((65.0 - hr) / 15.0).min(0.4) } else { 0.0 },
        ),
        term(
            Dosha::Kapha,
            IndicatorSignal::StableIntervals,
            if features.std_rr < 0.1 {
                0.3
            } else if features.std_rr < 0.2 {
                0.15
            } else {
                0.0
            },
        ),
        term(Dosha::Kapha, IndicatorSignal::VlfPower, (features.vlf_power / 800.0).min(0.3)),
        term(Dosha::Kapha, IndicatorSignal::RegularRhythm, if regular { 0.25 } else { 0.0 }),
    ]
}

/// Raw per-dosha scores, each in [0, 1], not mutually normalized
pub fn raw_scores(features: &FeatureVector) -> DoshaVector {
    let mut scores = DoshaVector::zero();
    for indicator in indicators(features) {
        let current = scores.get(indicator.dosha);
        scores.set(indicator.dosha, current + indicator.contribution);
    }
    for dosha in Dosha::ALL {
        scores.set(dosha, scores.get(dosha).clamp(0.0, 1.0));
    }
    scores
}

// ============================================================================
// Score Report
// ============================================================================

/// Recommendation lists for the dominant dosha
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub diet: Vec<String>,
    pub lifestyle: Vec<String>,
    pub avoid: Vec<String>,
    pub herbs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub personalized: Vec<String>,
    pub seasonal_advice: Vec<SeasonalAdvice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalAdvice {
    pub season: String,
    pub advice: String,
}

/// Full scorer output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoshaScoreReport {
    pub raw_scores: DoshaVector,
    /// Raw scores divided by their sum (uniform when all zero)
    pub vector: DoshaVector,
    pub dominant: Dosha,
    pub secondary: Option<Dosha>,
    /// Registered combination key, e.g. `vata_pitta`
    pub combination: Option<String>,
    /// Raw score of the dominant dosha
    pub confidence: f64,
    pub interpretation: String,
    pub recommendations: Recommendations,
    pub traditional_characteristics: NadiCharacteristics,
    pub insights: Vec<String>,
    pub indicators: Vec<Indicator>,
}

/// Score a feature vector
pub fn score_dosha(features: &FeatureVector) -> DoshaScoreReport {
    let indicators = indicators(features);
    let raw = raw_scores(features);
    let vector = raw.normalized();

    // First maximum in canonical order
    let dominant = raw.argmax(0.0);

    // Stable descending sort; the runner-up is the secondary candidate
    let mut ranked: Vec<(Dosha, f64)> = raw.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let secondary = ranked
        .get(1)
        .filter(|(_, score)| *score > SECONDARY_THRESHOLD)
        .map(|(dosha, _)| *dosha)
        .filter(|dosha| *dosha != dominant);

    let combination = secondary.map(|sec| {
        let direct = format!("{}_{}", dominant.key(), sec.key());
        if templates::is_registered_combination(&direct) {
            direct
        } else {
            format!("{}_{}", sec.key(), dominant.key())
        }
    });

    debug!(
        "Raw scores V {:.3} P {:.3} K {:.3}, dominant {}, secondary {:?}",
        raw.vata, raw.pitta, raw.kapha, dominant, secondary
    );

    DoshaScoreReport {
        raw_scores: raw,
        vector,
        dominant,
        secondary,
        combination,
        confidence: raw.get(dominant),
        interpretation: build_interpretation(dominant, secondary, features),
        recommendations: build_recommendations(dominant, secondary, features),
        traditional_characteristics: templates::nadi_characteristics(dominant),
        insights: build_insights(features),
        indicators,
    }
}

fn build_interpretation(dominant: Dosha, secondary: Option<Dosha>, features: &FeatureVector) -> String {
    let mut text = templates::interpretation(dominant).to_string();

    if let Some(sec) = secondary {
        let key = format!("{}_{}", dominant.key(), sec.key());
        if let Some(description) = templates::combination_description(&key) {
            text.push_str(&format!(
                "\n\nWith secondary influence of {}: {}",
                sec, description
            ));
        }
    }

    let hr = features.heart_rate;
    if hr > 85.0 {
        text.push_str(" The elevated heart rate suggests increased metabolic activity.");
    } else if hr < 60.0 {
        text.push_str(" The slower rhythm indicates a calm, steady constitution.");
    }

    if features.rhythm_type == RhythmType::Irregular {
        text.push_str(" Irregular rhythm suggests adaptability and responsiveness.");
    }

    text
}

fn build_recommendations(
    dominant: Dosha,
    secondary: Option<Dosha>,
    features: &FeatureVector,
) -> Recommendations {
    let base = templates::base_recommendations(dominant);
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let mut diet = owned(base.diet);
    let mut lifestyle = owned(base.lifestyle);
    let mut avoid = owned(base.avoid);
    let mut herbs = owned(base.herbs);

    if let Some(sec) = secondary {
        let extra = templates::base_recommendations(sec);
        let prefixed = |items: &[&str]| {
            items
                .iter()
                .take(2)
                .map(|item| format!("(for {} influence): {}", sec.key(), item))
                .collect::<Vec<_>>()
        };
        diet.extend(prefixed(extra.diet));
        lifestyle.extend(prefixed(extra.lifestyle));
        avoid.extend(prefixed(extra.avoid));
        herbs.extend(prefixed(extra.herbs));
    }

    let mut personalized = Vec::new();
    let hr = features.heart_rate;
    if hr > 85.0 {
        personalized.push("Practice cooling pranayama like Sheetali".to_string());
    } else if hr < 60.0 {
        personalized.push("Include invigorating spices in diet".to_string());
    }
    if features.rhythm_type == RhythmType::Irregular {
        personalized.push("Establish regular daily routine".to_string());
    }
    if features.stress_indicator {
        personalized.push("Incorporate stress-reduction practices".to_string());
    }

    let seasonal_advice = templates::seasonal_advice(dominant)
        .iter()
        .map(|(season, advice)| SeasonalAdvice {
            season: season.to_string(),
            advice: advice.to_string(),
        })
        .collect();

    Recommendations {
        diet,
        lifestyle,
        avoid,
        herbs,
        personalized,
        seasonal_advice,
    }
}

fn build_insights(features: &FeatureVector) -> Vec<String> {
    let mut insights = Vec::new();

    let hr = features.heart_rate;
    if hr > 85.0 {
        insights.push("Elevated pulse suggests increased Agni (digestive fire)");
    } else if hr < 60.0 {
        insights.push("Slower rhythm indicates strong Ojas (vitality reserve)");
    }

    match features.rhythm_type {
        RhythmType::Irregular => insights.push("Variable rhythm reflects Vata's mobile nature"),
        RhythmType::Regular => insights.push("Steady rhythm shows doshic balance"),
        _ => {}
    }

    if features.mean_peak_amplitude > 4.0 {
        insights.push("Strong pulse waves indicate robust Prana (life force)");
    }
    if features.sample_entropy > 1.5 {
        insights.push("Complex pattern suggests adaptability and responsiveness");
    }
    if features.vlf_power > 500.0 {
        insights.push("Strong low-frequency power correlates with Kapha qualities");
    }

    insights.into_iter().map(String::from).collect()
}
