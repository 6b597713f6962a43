use serde::{Deserialize, Serialize};

/// Horizontal alignment of a text overlay about its x coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Left,
    #[default]
    Center,
    Right,
}

/// Fractional canvas coordinates in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub anchor: Anchor,
}

/// Open style bag carried verbatim through build/edit/render.
pub type StyleMap = serde_json::Map<String, serde_json::Value>;

/// The atomic timed visual unit composited onto the source video.
///
/// `kind` is an open string; quality and render logic special-case
/// `headline`, `callout`, `cta`, and `logo`. Overlays are immutable
/// values: edits replace the owning list wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// Stable identifier, unique within a timeline. Synthesized at build
    /// time; payloads without one fall back to positional diff keys.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start_sec: f64,
    pub end_sec: f64,
    /// Display string; empty for logo overlays.
    #[serde(default)]
    pub text: String,
    pub position: Position,
    #[serde(default)]
    pub style: StyleMap,
    /// Logo asset reference, only meaningful when `kind` is `logo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_ref: Option<String>,
}

impl Overlay {
    /// Numeric style lookup. Accepts JSON numbers and numeric strings,
    /// which upstream editors occasionally emit.
    pub fn style_f64(&self, key: &str) -> Option<f64> {
        match self.style.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn style_str(&self, key: &str) -> Option<&str> {
        self.style.get(key)?.as_str()
    }
}

/// Synthesize a fresh overlay id.
pub fn new_overlay_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("ovl_{}", &hex[..8])
}

/// Target output geometry recorded on a timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub duration_sec: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Generated text alternatives kept for future A/B use.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CopyVariants {
    #[serde(default)]
    pub headline: Vec<String>,
    #[serde(default)]
    pub cta: Vec<String>,
}

/// Which provider produced a timeline, and when.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub model_provider: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Ordered overlay list plus the metadata one draft render needs.
///
/// Overlay order is z-order and compile order. A timeline is only
/// render-ready once the quality gate reports no critical findings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub project_id: String,
    pub template_id: String,
    pub video: VideoMeta,
    #[serde(default)]
    pub copy_variants: CopyVariants,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
    pub generation: Provenance,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay_json() -> serde_json::Value {
        serde_json::json!({
            "id": "ovl_1a2b3c4d",
            "type": "headline",
            "start_sec": 0.0,
            "end_sec": 4.4,
            "text": "PLAY SMARTER",
            "position": {"x": 0.5, "y": 0.16, "anchor": "center"},
            "style": {"font_size": 96, "color": "white"}
        })
    }

    #[test]
    fn overlay_round_trips_with_type_key() {
        let overlay: Overlay = serde_json::from_value(overlay_json()).unwrap();
        assert_eq!(overlay.kind, "headline");
        assert_eq!(overlay.position.anchor, Anchor::Center);

        let back = serde_json::to_value(&overlay).unwrap();
        assert_eq!(back["type"], "headline");
        assert!(back.get("asset_ref").is_none());
    }

    #[test]
    fn optional_fields_default() {
        let overlay: Overlay = serde_json::from_value(serde_json::json!({
            "type": "callout",
            "start_sec": 1.0,
            "end_sec": 2.0,
            "position": {"x": 0.5, "y": 0.5}
        }))
        .unwrap();
        assert!(overlay.id.is_empty());
        assert!(overlay.text.is_empty());
        assert!(overlay.style.is_empty());
        assert_eq!(overlay.position.anchor, Anchor::Center);
    }

    #[test]
    fn style_lookup_accepts_numbers_and_numeric_strings() {
        let mut overlay: Overlay = serde_json::from_value(overlay_json()).unwrap();
        assert_eq!(overlay.style_f64("font_size"), Some(96.0));
        assert_eq!(overlay.style_f64("missing"), None);

        overlay
            .style
            .insert("box_border".into(), serde_json::json!("22"));
        assert_eq!(overlay.style_f64("box_border"), Some(22.0));

        assert_eq!(overlay.style_str("color"), Some("white"));
    }

    #[test]
    fn overlay_ids_are_prefixed_hex() {
        let id = new_overlay_id();
        assert!(id.starts_with("ovl_"));
        assert_eq!(id.len(), 12);
        assert_ne!(new_overlay_id(), id);
    }
}
