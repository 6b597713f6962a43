//! Blocking client for the Gemini `generateContent` endpoint, plus the
//! copy provider built on it.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::creative::provider::{truncate_chars, AdCopy, CopyProvider, CreativeBrief};
use crate::foundation::error::{AdreelError, AdreelResult};

/// Thin wrapper over one model endpoint. Requests always ask for a JSON
/// response body.
pub(crate) struct GeminiClient {
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub(crate) fn new(api_key: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs,
        }
    }

    pub(crate) fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        max_output_tokens: u32,
    ) -> AdreelResult<GeminiResponse> {
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": max_output_tokens,
                "responseMimeType": "application/json",
            }
        });
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|err| AdreelError::provider(format!("Gemini client setup failed: {err}")))?;
        let response = client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .map_err(|err| AdreelError::provider(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            return Err(AdreelError::provider(format!(
                "Gemini API request failed ({status}): {text}"
            )));
        }

        response
            .json()
            .map_err(|err| AdreelError::provider(format!("Gemini returned malformed JSON: {err}")))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

impl GeminiResponse {
    /// First non-empty part text of the first candidate, trimmed.
    pub(crate) fn candidate_text(&self) -> Option<String> {
        let candidate = self.candidates.as_deref().unwrap_or_default().first()?;
        let parts = candidate.content.as_ref()?.parts.as_deref().unwrap_or_default();
        parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }
}

/// Copy provider backed by a hosted Gemini model.
pub struct GeminiCopyProvider {
    client: GeminiClient,
}

impl GeminiCopyProvider {
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            client: GeminiClient::new(api_key, model, timeout_secs),
        }
    }
}

impl CopyProvider for GeminiCopyProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn creative_brief(&self, prompt: &str) -> CreativeBrief {
        let angle = prompt.trim();
        CreativeBrief {
            angle: if angle.is_empty() {
                "Promote this gameplay".to_string()
            } else {
                angle.to_string()
            },
            tone: "high-converting".to_string(),
        }
    }

    fn generate_copy(&self, brief: &CreativeBrief) -> AdreelResult<AdCopy> {
        let prompt = format!(
            "Generate short mobile ad copy as strict JSON with keys: headline, benefit, cta. \
             Rules: headline <= 80 chars, benefit <= 70 chars, cta <= 20 chars. \
             No markdown, no extra text. Context: {}. Tone: {}.",
            brief.angle, brief.tone
        );
        let response = self.client.generate(&prompt, 0.4, 180)?;
        let text = response
            .candidate_text()
            .ok_or_else(|| AdreelError::provider("Gemini returned no candidate text"))?;
        parse_copy_response(&text)
    }
}

/// Parse the model's copy JSON. Each field is capped to its length limit
/// and falls back to stock text when missing or empty.
pub(crate) fn parse_copy_response(text: &str) -> AdreelResult<AdCopy> {
    let parsed: Value = serde_json::from_str(text)
        .map_err(|err| AdreelError::provider(format!("Gemini returned invalid copy JSON: {err}")))?;
    Ok(AdCopy {
        headline: copy_field(&parsed, "headline", 80, "Level up your gameplay"),
        benefit: copy_field(&parsed, "benefit", 70, "Win faster with smarter controls"),
        cta: copy_field(&parsed, "cta", 20, "Play Free"),
    })
}

fn copy_field(parsed: &Value, key: &str, max: usize, fallback: &str) -> String {
    let raw = match parsed.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let capped = truncate_chars(&raw, max);
    if capped.is_empty() {
        fallback.to_string()
    } else {
        capped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: Value) -> GeminiResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn candidate_text_takes_first_nonempty_part() {
        let resp = response(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "  "}, {"text": "  hello "}, {"text": "later"}]}
            }]
        }));
        assert_eq!(resp.candidate_text().as_deref(), Some("hello"));
    }

    #[test]
    fn candidate_text_handles_missing_pieces() {
        assert_eq!(response(serde_json::json!({})).candidate_text(), None);
        assert_eq!(
            response(serde_json::json!({"candidates": []})).candidate_text(),
            None
        );
        assert_eq!(
            response(serde_json::json!({"candidates": [{"content": {}}]})).candidate_text(),
            None
        );
        assert_eq!(
            response(serde_json::json!({"candidates": [{"content": {"parts": [{}]}}]}))
                .candidate_text(),
            None
        );
    }

    #[test]
    fn copy_response_caps_field_lengths() {
        let text = serde_json::json!({
            "headline": "h".repeat(100),
            "benefit": "b".repeat(90),
            "cta": "c".repeat(30),
        })
        .to_string();
        let copy = parse_copy_response(&text).unwrap();
        assert_eq!(copy.headline.chars().count(), 80);
        assert_eq!(copy.benefit.chars().count(), 70);
        assert_eq!(copy.cta.chars().count(), 20);
    }

    #[test]
    fn copy_response_falls_back_per_field() {
        let copy = parse_copy_response(r#"{"headline": "Jump higher"}"#).unwrap();
        assert_eq!(copy.headline, "Jump higher");
        assert_eq!(copy.benefit, "Win faster with smarter controls");
        assert_eq!(copy.cta, "Play Free");
    }

    #[test]
    fn copy_response_rejects_non_json() {
        let err = parse_copy_response("not json").unwrap_err();
        assert!(err.to_string().contains("invalid copy JSON"));
    }

    #[test]
    fn brief_falls_back_on_empty_prompt() {
        let provider = GeminiCopyProvider::new("k", "gemini-2.0-flash", 20);
        let brief = provider.creative_brief("");
        assert_eq!(brief.angle, "Promote this gameplay");
        assert_eq!(brief.tone, "high-converting");
    }
}
