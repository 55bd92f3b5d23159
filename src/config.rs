use crate::archive::mutator::ExistingEntryPolicy;
use crate::error::ConfigError;
use crate::translation::profile::StyleProfile;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Everything a run needs, passed explicitly into the pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    // Input
    pub directory: PathBuf,
    pub archive_extension: String,

    // Translation service
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,
    pub openai_temperature: f32,
    pub max_tokens: u32,
    pub max_attempts: u32,
    pub request_timeout: Duration,

    // Pacing
    pub rate_limit: Duration,

    // Languages and style
    pub reference_lang: String,
    pub target_lang: String,
    pub style_profile: StyleProfile,

    // Archive writes
    pub existing_entry_policy: ExistingEntryPolicy,
}

impl Config {
    /// Defaults for `directory`, without reading the environment.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            archive_extension: "jar".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_api_url: DEFAULT_API_URL.to_string(),
            openai_temperature: 0.3,
            max_tokens: 8192,
            max_attempts: 1,
            request_timeout: Duration::from_secs(120),
            rate_limit: Duration::from_secs(1),
            reference_lang: "en_us".to_string(),
            target_lang: "ja_jp".to_string(),
            style_profile: StyleProfile::neutral("English", "Japanese"),
            existing_entry_policy: ExistingEntryPolicy::Skip,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::new(".");

        let existing_entry_policy = match std::env::var("EXISTING_ENTRY_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.existing_entry_policy,
        };

        let style_profile = match std::env::var("STYLE_PROFILE") {
            Ok(path) if !path.trim().is_empty() => StyleProfile::load(Path::new(path.trim()))?,
            _ => defaults.style_profile.clone(),
        };

        let config = Self {
            directory: std::env::var("ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.directory),
            archive_extension: std::env::var("ARCHIVE_EXTENSION")
                .unwrap_or(defaults.archive_extension),

            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_api_url: std::env::var("OPENAI_API_URL").unwrap_or(defaults.openai_api_url),
            openai_temperature: std::env::var("OPENAI_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.openai_temperature),
            max_tokens: std::env::var("TRANSLATION_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
            max_attempts: std::env::var("TRANSLATION_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_attempts),
            request_timeout: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),

            rate_limit: std::env::var("RATE_LIMIT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.rate_limit),

            reference_lang: std::env::var("REFERENCE_LANG").unwrap_or(defaults.reference_lang),
            target_lang: std::env::var("TARGET_LANG").unwrap_or(defaults.target_lang),
            style_profile,

            existing_entry_policy,
        };

        config.validate_languages()?;
        Ok(config)
    }

    /// Only the input settings, for discovery runs.
    ///
    /// Translation settings keep their defaults, so a broken `STYLE_PROFILE`
    /// or language code does not stop a scan that never uses them.
    pub fn discovery_from_env() -> Self {
        let defaults = Self::new(".");
        Self {
            directory: std::env::var("ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.directory.clone()),
            archive_extension: std::env::var("ARCHIVE_EXTENSION")
                .unwrap_or(defaults.archive_extension.clone()),
            ..defaults
        }
    }

    /// The API key, required only when translating.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))
    }

    fn validate_languages(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("REFERENCE_LANG", &self.reference_lang),
            ("TARGET_LANG", &self.target_lang),
        ] {
            if value.is_empty() || value.contains(|c: char| c == '/' || c == '.') {
                return Err(ConfigError::Invalid {
                    name,
                    value: value.clone(),
                });
            }
        }
        if self.reference_lang == self.target_lang {
            return Err(ConfigError::Invalid {
                name: "TARGET_LANG",
                value: format!("{} (same as REFERENCE_LANG)", self.target_lang),
            });
        }
        Ok(())
    }

    /// Input checks that must pass before any archive is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_languages()?;
        if !self.directory.is_dir() {
            return Err(ConfigError::DirectoryNotFound(self.directory.clone()));
        }
        Ok(())
    }
}
