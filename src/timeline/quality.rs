use serde::{Deserialize, Serialize};

use crate::timeline::model::Overlay;

/// Outcome of the quality gate: blocking findings and advisory ones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub critical: Vec<String>,
    pub warnings: Vec<String>,
}

impl QualityReport {
    /// A timeline is render-ready only with zero critical findings.
    pub fn is_render_ready(&self) -> bool {
        self.critical.is_empty()
    }
}

/// Validate an overlay list against structural and temporal invariants.
///
/// Performs no mutation and knows nothing about rendering. Timing and
/// position violations are critical; a small font on a text overlay is
/// advisory only. The whole list must contain a cta overlay and at least
/// one headline or callout.
pub fn validate_overlays(overlays: &[Overlay], duration_sec: f64) -> QualityReport {
    let mut report = QualityReport::default();
    let mut has_cta = false;
    let mut has_hook_text = false;

    for (idx, overlay) in overlays.iter().enumerate() {
        let kind = overlay.kind.trim().to_lowercase();
        if kind == "cta" {
            has_cta = true;
        }
        if kind == "headline" || kind == "callout" {
            has_hook_text = true;
        }

        if overlay.start_sec < 0.0 || overlay.end_sec <= overlay.start_sec {
            report
                .critical
                .push(format!("overlay[{idx}] has invalid timing"));
        }
        // Tolerate float drift of up to 10ms at the tail.
        if duration_sec > 0.0 && overlay.end_sec > duration_sec + 0.01 {
            report
                .critical
                .push(format!("overlay[{idx}] end exceeds video duration"));
        }

        let (x, y) = (overlay.position.x, overlay.position.y);
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            report
                .critical
                .push(format!("overlay[{idx}] has out-of-bounds position"));
        }

        let font_size = overlay.style_f64("font_size").unwrap_or(0.0);
        if matches!(kind.as_str(), "headline" | "callout" | "cta")
            && font_size != 0.0
            && font_size < 36.0
        {
            report
                .warnings
                .push(format!("overlay[{idx}] font_size is low ({})", font_size as i64));
        }
    }

    if !has_cta {
        report.critical.push("missing cta overlay".to_string());
    }
    if !has_hook_text {
        report
            .critical
            .push("missing headline/callout overlay".to_string());
    }

    report
}
