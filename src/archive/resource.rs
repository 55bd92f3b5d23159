use crate::archive::path::{lang_code_of, namespace_of};
use crate::error::ResourceParseError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Flat language mapping, translation key -> display text.
///
/// Sorted keys keep serialization deterministic.
pub type LangMap = BTreeMap<String, String>;

/// One language file found inside an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    pub path: String,
    pub namespace: String,
    pub lang_code: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    /// Only populated when the caller asked to keep content (translation mode)
    #[serde(skip)]
    pub content: Option<LangMap>,
}

impl ResourceEntry {
    /// Entry metadata without content.
    pub fn describe(path: &str, size_bytes: u64) -> Self {
        Self {
            path: path.to_string(),
            namespace: namespace_of(path).to_string(),
            lang_code: lang_code_of(path).to_string(),
            size_bytes,
            content: None,
        }
    }
}

/// Build a [`ResourceEntry`] with content from the raw bytes of a matched entry.
pub fn extract(path: &str, bytes: &[u8]) -> Result<ResourceEntry, ResourceParseError> {
    let value = parse_json(bytes)?;
    let content = flatten(value)?;
    let mut entry = ResourceEntry::describe(path, bytes.len() as u64);
    entry.content = Some(content);
    Ok(entry)
}

/// Decode UTF-8 and parse as JSON; this is the "is it a language file at all" check.
pub fn parse_json(bytes: &[u8]) -> Result<serde_json::Value, ResourceParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ResourceParseError::Utf8)?;
    // Some resource packs are saved with a BOM
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    serde_json::from_str(text).map_err(|e| ResourceParseError::Json(e.to_string()))
}

/// Require a flat object of non-empty string keys to string values.
pub fn flatten(value: serde_json::Value) -> Result<LangMap, ResourceParseError> {
    let object = match value {
        serde_json::Value::Object(object) => object,
        other => {
            return Err(ResourceParseError::NotFlat(format!(
                "top level is {}, expected an object",
                json_kind(&other)
            )))
        }
    };

    let mut map = LangMap::new();
    for (key, value) in object {
        if key.is_empty() {
            return Err(ResourceParseError::NotFlat("empty key".to_string()));
        }
        match value {
            serde_json::Value::String(text) => {
                map.insert(key, text);
            }
            other => {
                return Err(ResourceParseError::NotFlat(format!(
                    "value of {} is {}",
                    key,
                    json_kind(&other)
                )))
            }
        }
    }
    Ok(map)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
