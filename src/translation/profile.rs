//! Style profiles: the domain tone and vocabulary handed to the translator.
//!
//! Profiles are plain JSON data so a modpack can ship its own without code
//! changes.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A worked example of the desired tone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleExample {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleProfile {
    /// Short label used in logs and in the prompt header
    pub name: String,
    /// Human-readable source language name ("English")
    pub source_language: String,
    /// Human-readable target language name ("Japanese")
    pub target_language: String,
    /// What the text belongs to, e.g. "the DarkRPG Minecraft modpack"
    #[serde(default)]
    pub setting: Option<String>,
    /// Register and voice of the translation
    #[serde(default)]
    pub tone: Option<String>,
    /// Vocabulary and phrasing rules, one per line in the prompt
    #[serde(default)]
    pub rules: Vec<String>,
    /// How to treat names of people, places and items
    #[serde(default)]
    pub proper_nouns: Option<String>,
    #[serde(default)]
    pub examples: Vec<StyleExample>,
}

impl StyleProfile {
    /// Plain profile with no domain flavour.
    pub fn neutral(source_language: &str, target_language: &str) -> Self {
        Self {
            name: "neutral".to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            setting: None,
            tone: None,
            rules: Vec::new(),
            proper_nouns: None,
            examples: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::StyleProfile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|reason| ConfigError::StyleProfile {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        let profile: Self = serde_json::from_str(text).map_err(|e| e.to_string())?;
        if profile.source_language.trim().is_empty() || profile.target_language.trim().is_empty() {
            return Err("source_language and target_language must not be empty".to_string());
        }
        Ok(profile)
    }
}
