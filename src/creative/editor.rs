//! Instruction-driven overlay editing. A hosted model rewrites the
//! overlay list when configured; otherwise a small set of local
//! heuristics covers the common asks.

use regex::Regex;
use serde_json::Value;

use crate::creative::gemini::GeminiClient;
use crate::foundation::config::ProviderConfig;
use crate::foundation::error::{AdreelError, AdreelResult};
use crate::timeline::model::Overlay;

/// Apply a free-form edit instruction to an overlay list.
///
/// Routes to the hosted editor only when the configured provider is
/// gemini with an API key; anything else edits locally.
pub fn apply_instruction(
    overlays: &[Overlay],
    instruction: &str,
    config: &ProviderConfig,
) -> AdreelResult<Vec<Overlay>> {
    if config.name != "gemini" {
        return Ok(apply_local_instruction(overlays, instruction));
    }
    let Some(key) = &config.api_key else {
        return Ok(apply_local_instruction(overlays, instruction));
    };
    edit_remote(overlays, instruction, config, key)
}

/// Heuristic edits: "bigger"/"larger" scales font sizes, "uppercase"
/// upcases texts, and a quoted value plus "cta"/"headline" replaces the
/// first matching overlay's text. Heuristics stack.
pub fn apply_local_instruction(overlays: &[Overlay], instruction: &str) -> Vec<Overlay> {
    let mut updated = overlays.to_vec();
    let low = instruction.to_lowercase();

    if low.contains("bigger") || low.contains("larger") {
        for overlay in &mut updated {
            let base = overlay
                .style_f64("font_size")
                .map(|v| v as i64)
                .unwrap_or(48);
            let grown = (base + 12).max((base as f64 * 1.2) as i64);
            overlay
                .style
                .insert("font_size".to_string(), Value::from(grown));
        }
    }

    if low.contains("uppercase") {
        for overlay in &mut updated {
            if !overlay.text.is_empty() {
                overlay.text = overlay.text.to_uppercase();
            }
        }
    }

    if let Some(quoted) = extract_quoted_value(instruction) {
        if low.contains("cta") {
            if let Some(overlay) = updated.iter_mut().find(|o| o.kind == "cta") {
                overlay.text = quoted.clone();
            }
        }
        if low.contains("headline") {
            if let Some(overlay) = updated.iter_mut().find(|o| o.kind == "headline") {
                overlay.text = quoted;
            }
        }
    }

    updated
}

fn extract_quoted_value(instruction: &str) -> Option<String> {
    let re = Regex::new(r#""([^"]+)""#).ok()?;
    let captured = re.captures(instruction)?.get(1)?;
    Some(captured.as_str().trim().to_string())
}

fn edit_remote(
    overlays: &[Overlay],
    instruction: &str,
    config: &ProviderConfig,
    key: &str,
) -> AdreelResult<Vec<Overlay>> {
    let current = serde_json::to_string(overlays)
        .map_err(|err| AdreelError::serde(format!("overlay serialization failed: {err}")))?;
    let prompt = format!(
        "You are editing ad video overlays. Return STRICT JSON array only.\n\
         Keep object shape and timing valid. Preserve logo overlays and asset_ref.\n\
         Allowed modifications: text, position, style, and optional small timing adjustments.\n\
         Do not add markdown or explanations.\n\
         Instruction: {instruction}\n\
         Current overlays JSON: {current}"
    );

    let client = GeminiClient::new(key, &config.model, config.timeout_secs);
    let response = client.generate(&prompt, 0.2, 1200)?;
    let text = response
        .candidate_text()
        .ok_or_else(|| AdreelError::provider("Gemini returned no overlay edit output"))?;

    let parsed: Value = serde_json::from_str(&text)
        .map_err(|err| AdreelError::provider(format!("Gemini returned invalid overlay JSON: {err}")))?;
    let Value::Array(rows) = parsed else {
        return Err(AdreelError::provider(
            "Gemini overlay edit output must be a JSON array",
        ));
    };
    sanitize_overlays(rows)
}

/// Keep only model rows that still look like overlays: objects carrying
/// a type and timing, with an object position. A missing or malformed
/// style is repaired to an empty map rather than dropped.
fn sanitize_overlays(rows: Vec<Value>) -> AdreelResult<Vec<Overlay>> {
    let mut out = Vec::new();
    for mut row in rows {
        let Some(fields) = row.as_object_mut() else {
            continue;
        };
        if !fields.contains_key("type")
            || !fields.contains_key("start_sec")
            || !fields.contains_key("end_sec")
        {
            continue;
        }
        if !fields.get("position").is_some_and(Value::is_object) {
            continue;
        }
        if !fields.get("style").is_some_and(Value::is_object) {
            fields.insert("style".to_string(), Value::Object(Default::default()));
        }
        match serde_json::from_value::<Overlay>(row) {
            Ok(overlay) => out.push(overlay),
            Err(err) => tracing::warn!("dropping malformed overlay from editor: {err}"),
        }
    }
    if out.is_empty() {
        return Err(AdreelError::validation("No valid overlays returned by editor"));
    }
    Ok(out)
}
