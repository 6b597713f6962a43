use crate::creative::gemini::GeminiCopyProvider;
use crate::creative::local::LocalCopyProvider;
use crate::foundation::config::ProviderConfig;
use crate::foundation::error::AdreelResult;

/// One generated copy set, consumed by the timeline builder.
#[derive(Clone, Debug, PartialEq)]
pub struct AdCopy {
    pub headline: String,
    pub benefit: String,
    pub cta: String,
}

/// The angle and tone the copy is written around.
#[derive(Clone, Debug, PartialEq)]
pub struct CreativeBrief {
    pub angle: String,
    pub tone: String,
}

/// Source of ad copy. Implementations either synthesize copy locally or
/// call out to a hosted model.
pub trait CopyProvider {
    /// Short provider name, recorded in timeline provenance.
    fn name(&self) -> &'static str;

    /// Derive a brief from the project prompt. Never fails; an empty
    /// prompt falls back to a stock angle.
    fn creative_brief(&self, prompt: &str) -> CreativeBrief;

    fn generate_copy(&self, brief: &CreativeBrief) -> AdreelResult<AdCopy>;
}

/// Pick the configured provider. Asking for gemini without an API key
/// logs a warning and falls back to the local provider.
pub fn select_provider(config: &ProviderConfig) -> Box<dyn CopyProvider> {
    if config.name == "gemini" {
        match &config.api_key {
            Some(key) => {
                return Box::new(GeminiCopyProvider::new(key, &config.model, config.timeout_secs));
            }
            None => {
                tracing::warn!(
                    "AI_PROVIDER=gemini but GEMINI_API_KEY is empty; using local fallback provider"
                );
            }
        }
    }
    Box::new(LocalCopyProvider)
}

/// Truncate to at most `max` characters, by char rather than byte so a
/// multi-byte boundary never splits.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_selects_local() {
        let provider = select_provider(&ProviderConfig::default());
        assert_eq!(provider.name(), "local");
    }

    #[test]
    fn gemini_with_key_selects_gemini() {
        let config = ProviderConfig {
            name: "gemini".to_string(),
            api_key: Some("k".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(select_provider(&config).name(), "gemini");
    }

    #[test]
    fn gemini_without_key_falls_back_to_local() {
        let config = ProviderConfig {
            name: "gemini".to_string(),
            api_key: None,
            ..ProviderConfig::default()
        };
        assert_eq!(select_provider(&config).name(), "local");
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 80), "short");
    }
}
