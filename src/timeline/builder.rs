use crate::creative::provider::AdCopy;
use crate::store::model::{Asset, Project};
use crate::timeline::model::{
    Anchor, CopyVariants, Overlay, Position, Provenance, StyleMap, Timeline, VideoMeta,
    new_overlay_id,
};

/// Template ids [`build_timeline`] knows; any other id falls back to the
/// hook/benefit/cta layout.
pub const TEMPLATE_HOOK_BENEFIT_CTA: &str = "hook_benefit_cta_v1";
pub const TEMPLATE_PROBLEM_SOLUTION_CTA: &str = "problem_solution_cta_v1";

/// Instantiate the project's template into a concrete overlay timeline.
///
/// Layout is a deterministic function of the duration and copy. Window
/// boundaries are fractions of the duration with minimum-duration floors,
/// so very short videos still get a readable headline window even when it
/// overlaps the next window's nominal start. If a logo asset is supplied,
/// a full-duration corner logo overlay is appended carrying its id.
pub fn build_timeline(
    project: &Project,
    logo: Option<&Asset>,
    video: VideoMeta,
    copy: &AdCopy,
    provider_name: &str,
) -> Timeline {
    let duration = video.duration_sec;
    let mut overlays = match project.template_id.as_str() {
        TEMPLATE_PROBLEM_SOLUTION_CTA => template_problem_solution_cta(project, duration, copy),
        _ => template_hook_benefit_cta(project, duration, copy),
    };

    if let Some(logo) = logo {
        overlays.push(Overlay {
            id: new_overlay_id(),
            kind: "logo".to_string(),
            start_sec: 0.0,
            end_sec: duration,
            text: String::new(),
            position: Position {
                x: 0.04,
                y: 0.04,
                anchor: Anchor::Left,
            },
            style: style_map(serde_json::json!({"scale_width": 220})),
            asset_ref: Some(logo.id.clone()),
        });
    }

    Timeline {
        project_id: project.id.clone(),
        template_id: project.template_id.clone(),
        video,
        copy_variants: CopyVariants {
            headline: vec![copy.headline.clone()],
            cta: vec![copy.cta.clone()],
        },
        overlays,
        generation: Provenance {
            model_provider: provider_name.to_string(),
            created_at: chrono::Utc::now(),
        },
    }
}

fn template_hook_benefit_cta(project: &Project, duration: f64, copy: &AdCopy) -> Vec<Overlay> {
    let section_a = round2(duration * 0.22);
    let section_b = round2(duration * 0.74);
    vec![
        Overlay {
            id: new_overlay_id(),
            kind: "headline".to_string(),
            start_sec: 0.0,
            end_sec: section_a.max(2.0),
            text: copy.headline.to_uppercase(),
            position: centered(0.5, 0.16),
            style: style_map(serde_json::json!({
                "font_size": 96, "color": "white", "box": "black@0.55", "box_border": 22
            })),
            asset_ref: None,
        },
        Overlay {
            id: new_overlay_id(),
            kind: "callout".to_string(),
            start_sec: section_a,
            end_sec: section_b.max(section_a + 1.5),
            text: copy.benefit.clone(),
            position: centered(0.5, 0.78),
            style: style_map(serde_json::json!({
                "font_size": 64, "color": "white", "box": "black@0.45", "box_border": 18
            })),
            asset_ref: None,
        },
        Overlay {
            id: new_overlay_id(),
            kind: "cta".to_string(),
            start_sec: section_b,
            end_sec: duration,
            text: copy.cta.clone(),
            position: centered(0.5, 0.9),
            style: style_map(serde_json::json!({
                "font_size": 82, "color": "white", "bg": project.primary_color
            })),
            asset_ref: None,
        },
    ]
}

fn template_problem_solution_cta(project: &Project, duration: f64, copy: &AdCopy) -> Vec<Overlay> {
    let section_a = round2(duration * 0.30);
    let section_b = round2(duration * 0.76);
    let hook: String = copy.headline.chars().take(48).collect();
    vec![
        Overlay {
            id: new_overlay_id(),
            kind: "headline".to_string(),
            start_sec: 0.0,
            end_sec: section_a.max(2.2),
            text: format!("STUCK? {}", hook.to_uppercase()),
            position: centered(0.5, 0.14),
            style: style_map(serde_json::json!({
                "font_size": 88, "color": "white", "box": "black@0.6", "box_border": 24
            })),
            asset_ref: None,
        },
        Overlay {
            id: new_overlay_id(),
            kind: "callout".to_string(),
            start_sec: section_a,
            end_sec: section_b.max(section_a + 1.2),
            text: format!("SOLUTION: {}", copy.benefit),
            position: centered(0.5, 0.74),
            style: style_map(serde_json::json!({
                "font_size": 62, "color": "white", "box": "black@0.45", "box_border": 16
            })),
            asset_ref: None,
        },
        Overlay {
            id: new_overlay_id(),
            kind: "cta".to_string(),
            start_sec: section_b,
            end_sec: duration,
            text: copy.cta.clone(),
            position: centered(0.5, 0.9),
            style: style_map(serde_json::json!({
                "font_size": 78, "color": "white", "bg": project.primary_color
            })),
            asset_ref: None,
        },
    ]
}

fn centered(x: f64, y: f64) -> Position {
    Position {
        x,
        y,
        anchor: Anchor::Center,
    }
}

fn style_map(value: serde_json::Value) -> StyleMap {
    value.as_object().cloned().unwrap_or_default()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
