//! Decoding of free-form translator replies.
//!
//! Two stages with separate failure modes: [`extract_payload`] picks the
//! candidate text (never fails), [`parse_payload`] turns it into a flat
//! mapping. [`validate_keys`] then checks the key set against the source.

use crate::archive::resource::{flatten, LangMap};
use crate::error::{ResourceParseError, TranslationError};
use std::collections::BTreeSet;

const FENCE: &str = "```";
const SNIPPET_CHARS: usize = 500;

/// Candidate payload text: the body of the first fenced block, or the whole
/// reply when there is no complete fence.
pub fn extract_payload(reply: &str) -> &str {
    let Some(open) = reply.find(FENCE) else {
        return reply.trim();
    };
    let after_open = &reply[open + FENCE.len()..];

    // Drop an info string such as `json` on the opening fence line
    let body = match after_open.find('\n') {
        Some(nl) if is_info_string(&after_open[..nl]) => &after_open[nl + 1..],
        _ => strip_json_tag(after_open),
    };

    match body.find(FENCE) {
        Some(close) => body[..close].trim(),
        None => reply.trim(),
    }
}

/// `json` glued to the opening fence, as in ```` ```json{...}``` ````
fn strip_json_tag(text: &str) -> &str {
    match text.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &text[4..],
        _ => text,
    }
}

fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+')
}

/// Parse payload text into a flat key/value mapping.
pub fn parse_payload(payload: &str) -> Result<LangMap, TranslationError> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| TranslationError::MalformedPayload {
            reason: e.to_string(),
            snippet: snippet(payload),
        })?;

    flatten(value).map_err(|e| match e {
        ResourceParseError::NotFlat(reason) => TranslationError::NotFlat(reason),
        other => TranslationError::NotFlat(other.to_string()),
    })
}

/// Both stages in one go.
pub fn decode_reply(reply: &str) -> Result<LangMap, TranslationError> {
    if reply.trim().is_empty() {
        return Err(TranslationError::EmptyResponse);
    }
    parse_payload(extract_payload(reply))
}

/// The translated key set must equal the source key set exactly.
pub fn validate_keys(source: &LangMap, translated: &LangMap) -> Result<(), TranslationError> {
    let missing: BTreeSet<String> = source
        .keys()
        .filter(|k| !translated.contains_key(*k))
        .cloned()
        .collect();
    let extra: BTreeSet<String> = translated
        .keys()
        .filter(|k| !source.contains_key(*k))
        .cloned()
        .collect();

    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(TranslationError::KeyMismatch { missing, extra })
    }
}

/// First characters of a reply, for diagnostics.
pub fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
