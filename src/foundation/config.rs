use std::path::{Path, PathBuf};

use crate::foundation::error::{AdreelError, AdreelResult};

/// Text-generation provider settings.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Provider name ("local" or "gemini").
    pub name: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "local".to_string(),
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 20,
        }
    }
}

/// Pipeline settings threaded explicitly through every component that
/// needs them. Nothing reads the environment after construction.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Root directory for assets, normalized cache, drafts, and exports.
    pub media_root: PathBuf,
    /// Maximum accepted source-video duration in seconds.
    pub max_duration_secs: f64,
    pub target_width: u32,
    pub target_height: u32,
    pub target_fps: u32,
    pub provider: ProviderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            max_duration_secs: 60.0,
            target_width: 1080,
            target_height: 1920,
            target_fps: 30,
            provider: ProviderConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let provider = ProviderConfig {
            name: env_string("AI_PROVIDER", "local").trim().to_lowercase(),
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            model: env_string("GEMINI_MODEL", "gemini-2.0-flash"),
            timeout_secs: env_parse("GEMINI_TIMEOUT_SECONDS", 20),
        };
        Self {
            media_root: PathBuf::from(env_string("ADREEL_MEDIA_ROOT", "media")),
            max_duration_secs: env_parse("VIDEO_MAX_DURATION_SECONDS", defaults.max_duration_secs),
            target_width: env_parse("TARGET_WIDTH", defaults.target_width),
            target_height: env_parse("TARGET_HEIGHT", defaults.target_height),
            target_fps: env_parse("TARGET_FPS", defaults.target_fps),
            provider,
        }
    }

    pub fn validate(&self) -> AdreelResult<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(AdreelError::validation(
                "target width/height must be non-zero",
            ));
        }
        if !self.target_width.is_multiple_of(2) || !self.target_height.is_multiple_of(2) {
            // Normalized output is yuv420p, which needs even dimensions.
            return Err(AdreelError::validation(
                "target width/height must be even (required for yuv420p output)",
            ));
        }
        if self.target_fps == 0 {
            return Err(AdreelError::validation("target fps must be non-zero"));
        }
        if self.max_duration_secs <= 0.0 {
            return Err(AdreelError::validation(
                "max source duration must be positive",
            ));
        }
        Ok(())
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.media_root.join("assets")
    }

    pub fn normalized_path(&self, project_id: &str) -> PathBuf {
        self.media_root
            .join("normalized")
            .join(format!("{project_id}.mp4"))
    }

    pub fn drafts_dir(&self) -> PathBuf {
        self.media_root.join("drafts")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.media_root.join("exports")
    }

    pub fn store_path(&self) -> PathBuf {
        self.media_root.join("store.json")
    }

    pub fn with_media_root(mut self, media_root: impl Into<PathBuf>) -> Self {
        self.media_root = media_root.into();
        self
    }
}

fn env_string(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparsable env value, using default");
            default
        }),
        Err(_) => default,
    }
}

/// File name for a project's draft or export output.
pub fn versioned_media_name(project_id: &str, stem: &str) -> String {
    format!("{project_id}-{stem}.mp4")
}

/// Short random stem for version-suffixed output files so concurrent
/// renders never target the same path.
pub fn short_stem() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    hex[..6].to_string()
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> AdreelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn validation_catches_bad_geometry() {
        let mut cfg = PipelineConfig::default();
        cfg.target_width = 0;
        assert!(cfg.validate().is_err());

        cfg.target_width = 1081;
        assert!(cfg.validate().is_err());

        cfg.target_width = 1080;
        cfg.target_fps = 0;
        assert!(cfg.validate().is_err());

        cfg.target_fps = 30;
        cfg.max_duration_secs = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn media_paths_hang_off_root() {
        let cfg = PipelineConfig::default().with_media_root("/tmp/adreel");
        assert_eq!(
            cfg.normalized_path("p1"),
            PathBuf::from("/tmp/adreel/normalized/p1.mp4")
        );
        assert_eq!(cfg.drafts_dir(), PathBuf::from("/tmp/adreel/drafts"));
        assert_eq!(cfg.store_path(), PathBuf::from("/tmp/adreel/store.json"));
    }

    #[test]
    fn short_stems_are_six_hex_chars() {
        let stem = short_stem();
        assert_eq!(stem.len(), 6);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(short_stem(), stem);
    }
}
