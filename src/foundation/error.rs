pub type AdreelResult<T> = Result<T, AdreelError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum AdreelError {
    /// Invalid user input, timeline payloads, or quality-gate failures.
    #[error("validation error: {0}")]
    Validation(String),

    /// Source media could not be probed or has no usable video stream.
    #[error("probe error: {0}")]
    Probe(String),

    /// The external renderer exited nonzero or could not be invoked.
    #[error("render error: {0}")]
    Render(String),

    /// Text-generation endpoint transport or response-format failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// A referenced project, draft, or asset does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AdreelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether a failed job may be re-run automatically.
    ///
    /// Only subprocess-class failures qualify. Validation, provider, and
    /// lookup errors are deterministic and would fail identically again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Probe(_) | Self::Render(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            AdreelError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(AdreelError::probe("x").to_string().contains("probe error:"));
        assert!(
            AdreelError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            AdreelError::provider("x")
                .to_string()
                .contains("provider error:")
        );
        assert!(AdreelError::not_found("x").to_string().contains("not found:"));
    }

    #[test]
    fn only_subprocess_failures_are_retryable() {
        assert!(AdreelError::render("ffmpeg exited 1").is_retryable());
        assert!(AdreelError::probe("no video stream").is_retryable());
        assert!(!AdreelError::validation("bad timing").is_retryable());
        assert!(!AdreelError::provider("timeout").is_retryable());
        assert!(!AdreelError::not_found("draft").is_retryable());
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = AdreelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
