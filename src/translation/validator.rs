//! Translation quality checks.
//!
//! These never reject a translation (key-set equality is enforced in
//! `payload::validate_keys`); they only surface suspicious values, such as
//! dropped format placeholders, as warnings.

use crate::archive::resource::LangMap;
use regex::Regex;
use std::sync::OnceLock;

/// Warnings about a translated mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
    /// Values identical to the source text
    pub unchanged: usize,
    /// Values that came back empty although the source was not
    pub emptied: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub struct TranslationValidator;

// Printf-style (%s, %d, %1$s, %%) and section-sign colour codes (§a, §l)
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Compare each translated value with its source value.
    pub fn validate(source: &LangMap, translated: &LangMap) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (key, original) in source {
            let Some(value) = translated.get(key) else {
                continue;
            };

            if !original.trim().is_empty() && value.trim().is_empty() {
                report.emptied += 1;
                report.warnings.push(format!("{}: translation is empty", key));
                continue;
            }

            if value == original && original.chars().any(|c| c.is_alphabetic()) {
                report.unchanged += 1;
            }

            let orig_placeholders = Self::extract_placeholders(original);
            let trans_placeholders = Self::extract_placeholders(value);
            if orig_placeholders != trans_placeholders {
                report.warnings.push(format!(
                    "{}: placeholder mismatch, original has {:?}, translation has {:?}",
                    key, orig_placeholders, trans_placeholders
                ));
            }
        }

        report
    }

    /// Placeholders in a value, sorted so reordering for grammar is allowed.
    fn extract_placeholders(text: &str) -> Vec<String> {
        let regex = PLACEHOLDER_REGEX.get_or_init(|| {
            Regex::new(r"%(?:\d+\$)?[sdfx%]|§[0-9a-fk-or]").expect("placeholder regex is valid")
        });
        let mut found: Vec<String> = regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        found.sort();
        found
    }
}
