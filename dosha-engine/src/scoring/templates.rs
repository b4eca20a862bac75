//! Fixed Ayurvedic text tables
//!
//! Interpretations, recommendation lists, seasonal advice and traditional
//! nadi (pulse) characteristics per dosha. Looked up verbatim by the scorer.

use crate::types::Dosha;
use serde::Serialize;

/// Registered combination keys and their descriptions
const COMBINATIONS: &[(&str, &str)] = &[
    ("vata_pitta", "Creative energy with metabolic intensity"),
    ("vata_kapha", "Creative potential with structural stability"),
    ("pitta_kapha", "Metabolic intensity with structural stability"),
    ("tridoshic", "All three doshas in dynamic balance"),
];

/// Description of a registered combination key
pub fn combination_description(key: &str) -> Option<&'static str> {
    COMBINATIONS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, description)| *description)
}

pub fn is_registered_combination(key: &str) -> bool {
    combination_description(key).is_some()
}

/// Interpretation paragraph for a dominant dosha
pub fn interpretation(dosha: Dosha) -> &'static str {
    match dosha {
        Dosha::Vata => {
            "The pulse exhibits Vata characteristics - light, quick, and irregular \
             like the movement of a serpent. This suggests creative energy, adaptability, \
             and variable physiological rhythms. When balanced, Vata promotes creativity \
             and movement; when imbalanced, it may lead to anxiety or irregularity."
        }
        Dosha::Pitta => {
            "The pulse shows Pitta qualities - sharp, strong, and penetrating \
             like the leap of a frog. This indicates metabolic intensity, transformation, \
             and thermal regulation. Balanced Pitta supports digestion and intellect; \
             imbalanced it may create excess heat or inflammation."
        }
        Dosha::Kapha => {
            "The pulse demonstrates Kapha nature - slow, steady, and nourishing \
             like the glide of a swan. This represents structural stability, lubrication, \
             and physiological reserve. Balanced Kapha provides strength and endurance; \
             imbalanced it may lead to stagnation or heaviness."
        }
    }
}

/// Base recommendation lists for one dosha
#[derive(Debug, Clone, Copy)]
pub struct BaseRecommendations {
    pub diet: &'static [&'static str],
    pub lifestyle: &'static [&'static str],
    pub avoid: &'static [&'static str],
    pub herbs: &'static [&'static str],
}

pub fn base_recommendations(dosha: Dosha) -> BaseRecommendations {
    match dosha {
        Dosha::Vata => BaseRecommendations {
            diet: &[
                "Warm, cooked foods",
                "Nourishing soups",
                "Healthy fats",
                "Root vegetables",
                "Sweet fruits",
            ],
            lifestyle: &[
                "Regular routine",
                "Adequate rest",
                "Gentle exercise",
                "Warm oil massage",
                "Meditation",
            ],
            avoid: &[
                "Cold foods",
                "Excessive raw foods",
                "Irregular eating",
                "Over-stimulation",
                "Excessive travel",
            ],
            herbs: &["Ashwagandha", "Brahmi", "Shatavari", "Ginger", "Cinnamon"],
        },
        Dosha::Pitta => BaseRecommendations {
            diet: &[
                "Cooling foods",
                "Sweet fruits",
                "Bitter greens",
                "Coconut",
                "Mint",
            ],
            lifestyle: &[
                "Moderate exercise",
                "Cool environments",
                "Mindful work pace",
                "Water activities",
                "Moon gazing",
            ],
            avoid: &[
                "Spicy foods",
                "Excessive heat",
                "Competitive situations",
                "Alcohol",
                "Overwork",
            ],
            herbs: &["Amalaki", "Neem", "Brahmi", "Coriander", "Fennel"],
        },
        Dosha::Kapha => BaseRecommendations {
            diet: &[
                "Light, warm foods",
                "Bitter greens",
                "Spices",
                "Legumes",
                "Honey",
            ],
            lifestyle: &[
                "Vigorous exercise",
                "Stimulating activities",
                "Variety in routine",
                "Dry massage",
                "Early rising",
            ],
            avoid: &[
                "Heavy foods",
                "Excessive sleep",
                "Sedentary habits",
                "Cold drinks",
                "Dairy",
            ],
            herbs: &["Turmeric", "Ginger", "Triphala", "Pippali", "Mustard"],
        },
    }
}

/// Seasonal balancing advice, in table order
pub fn seasonal_advice(dosha: Dosha) -> &'static [(&'static str, &'static str)] {
    match dosha {
        Dosha::Vata => &[
            ("autumn", "Grounding practices, warm foods, oil massage"),
            ("winter", "Stay warm, nourishing soups, adequate rest"),
            ("spring", "Gentle detox, light foods, gradual activity increase"),
            ("summer", "Stay cool, hydrate, moderate exercise"),
        ],
        Dosha::Pitta => &[
            ("summer", "Maximum cooling, avoid sun, sweet fruits"),
            ("autumn", "Moderate cooling, bitter greens, evening walks"),
            ("winter", "Warm but not spicy foods, avoid overheating"),
            ("spring", "Light detox, cooling herbs, water activities"),
        ],
        Dosha::Kapha => &[
            ("spring", "Vigorous detox, light foods, stimulating exercise"),
            ("summer", "Light cooling, bitter tastes, swimming"),
            ("autumn", "Warm spicy foods, dry massage, varied activities"),
            ("winter", "Stay active, warm spices, avoid heavy foods"),
        ],
    }
}

/// Traditional nadi characteristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NadiCharacteristics {
    /// Classical movement image
    pub gati: &'static str,
    pub speed: &'static str,
    pub force: &'static str,
    pub volume: &'static str,
    pub rhythm: &'static str,
    pub temperature: &'static str,
    pub character: &'static str,
    pub season_affinity: &'static str,
    pub time_of_day: &'static str,
    pub emotional_state: &'static str,
}

pub fn nadi_characteristics(dosha: Dosha) -> NadiCharacteristics {
    match dosha {
        Dosha::Vata => NadiCharacteristics {
            gati: "sarpa_gati",
            speed: "fast",
            force: "weak",
            volume: "low",
            rhythm: "irregular",
            temperature: "cold",
            character: "light, thin, rapid",
            season_affinity: "autumn",
            time_of_day: "sunset, early morning",
            emotional_state: "anxious, creative, variable",
        },
        Dosha::Pitta => NadiCharacteristics {
            gati: "manduka_gati",
            speed: "moderate",
            force: "strong",
            volume: "medium",
            rhythm: "regular",
            temperature: "hot",
            character: "sharp, bounding, warm",
            season_affinity: "summer",
            time_of_day: "midday, midnight",
            emotional_state: "focused, intense, transformative",
        },
        Dosha::Kapha => NadiCharacteristics {
            gati: "hansa_gati",
            speed: "slow",
            force: "steady",
            volume: "high",
            rhythm: "regular",
            temperature: "cool",
            character: "broad, smooth, steady",
            season_affinity: "spring",
            time_of_day: "morning, evening",
            emotional_state: "calm, stable, nurturing",
        },
    }
}
