use crate::creative::provider::{truncate_chars, AdCopy, CopyProvider, CreativeBrief};
use crate::foundation::error::AdreelResult;

/// Deterministic provider used when no hosted model is configured. Keeps
/// the pipeline fully offline and is the fallback for every remote error
/// at selection time.
pub struct LocalCopyProvider;

impl CopyProvider for LocalCopyProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn creative_brief(&self, prompt: &str) -> CreativeBrief {
        let angle = prompt.trim();
        CreativeBrief {
            angle: if angle.is_empty() {
                "Level up your gameplay".to_string()
            } else {
                angle.to_string()
            },
            tone: "direct".to_string(),
        }
    }

    fn generate_copy(&self, brief: &CreativeBrief) -> AdreelResult<AdCopy> {
        Ok(AdCopy {
            headline: truncate_chars(&brief.angle, 80),
            benefit: "Win faster with smarter controls".to_string(),
            cta: "Play Free".to_string(),
        })
    }
}
