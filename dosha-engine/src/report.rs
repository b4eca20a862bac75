//! Plain-text assessment report

use crate::fusion::FusionStatus;
use crate::scoring::templates::base_recommendations;
use crate::types::Dosha;
use crate::workflow::Assessment;

/// Cells in a full distribution bar
pub const BAR_WIDTH: usize = 40;

/// Distribution bar for a value in [0, 1]
pub fn bar(value: f64) -> String {
    let fraction = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    let filled = ((fraction * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Render an assessment as a text report
pub fn render_text(assessment: &Assessment) -> String {
    let mut output = String::new();
    let fusion = &assessment.fusion;

    output.push_str("DOSHA ASSESSMENT\n");
    output.push_str("================\n");
    output.push_str(&format!("ID:      {}\n", assessment.id));
    output.push_str(&format!(
        "Created: {}\n\n",
        assessment.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if fusion.status == FusionStatus::NoData {
        output.push_str(&format!("{}\n", assessment.summary));
        return output;
    }

    output.push_str(&format!(
        "Dominant: {} ({} imbalance, confidence {:.1}%)\n\n",
        fusion.dominant,
        fusion.imbalance_level,
        fusion.confidence * 100.0
    ));

    output.push_str("Distribution\n");
    for dosha in Dosha::ALL {
        let value = fusion.fused.get(dosha);
        output.push_str(&format!(
            "  {:<6} {} {:>5.1}%\n",
            dosha.to_string(),
            bar(value),
            value * 100.0
        ));
    }

    output.push_str("\nSources\n");
    for source in &fusion.sources {
        if source.active {
            output.push_str(&format!(
                "  {:<9} weight {:.2}\n",
                source.modality.to_string(),
                source.weight
            ));
        } else {
            output.push_str(&format!("  {:<9} missing\n", source.modality.to_string()));
        }
    }
    output.push('\n');

    if let Some(features) = &assessment.features {
        output.push_str("Pulse\n");
        output.push_str(&format!("  Heart rate:      {:.1} bpm\n", features.heart_rate));
        output.push_str(&format!("  HRV:             {:.4} s\n", features.hrv));
        output.push_str(&format!("  Rhythm:          {}\n", features.rhythm_type));
        output.push_str(&format!("  LF/HF ratio:     {:.2}\n", features.lf_hf_ratio));
        output.push_str(&format!("  Sample entropy:  {:.3}\n", features.sample_entropy));
        output.push_str(&format!("  Beats detected:  {}\n", features.num_peaks));
        if let Some(quality) = &assessment.quality {
            output.push_str(&format!(
                "  Signal quality:  {:.2}{}\n",
                quality.quality_score,
                if quality.is_valid { "" } else { " (low)" }
            ));
        }
        if let Some(score) = &assessment.score {
            let nadi = &score.traditional_characteristics;
            output.push_str(&format!("  Nadi:            {} ({})\n", nadi.gati, nadi.character));
        }
        output.push('\n');
    }

    output.push_str("Explanation\n");
    for entry in &assessment.explanation {
        output.push_str(&format!("  [{}] {}\n", entry.modality, entry.text));
    }

    let recs = base_recommendations(fusion.dominant);
    output.push_str("\nRecommendations\n");
    for (label, items) in [
        ("Diet", recs.diet),
        ("Lifestyle", recs.lifestyle),
        ("Avoid", recs.avoid),
        ("Herbs", recs.herbs),
    ] {
        output.push_str(&format!("  {}: {}\n", label, items.join(", ")));
    }
    output.push_str(&format!("\n{}\n", assessment.summary));

    output
}
