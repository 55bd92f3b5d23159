use crate::archive::resource::LangMap;
use crate::translation::profile::StyleProfile;

/// Build the system prompt: fixed key-preservation rules plus the style profile
pub fn build_translation_system_prompt(profile: &StyleProfile) -> String {
    let mut prompt = format!(
        r#"You are a professional game localizer. You receive a language file in JSON format.
Translate only the values from {source} to {target}.

## Rules

### NEVER change:
- Keys (the left-hand side of each entry); do not add, remove or rename any key
- The JSON structure
- Format placeholders such as %s, %d, %1$s and %%
- Formatting codes such as §a, §l, §r and \n

### Output:
- Return only the translated JSON object
- Do not add explanations, notes or commentary before or after it"#,
        source = profile.source_language,
        target = profile.target_language,
    );

    prompt.push_str(&format!("\n\n## Style: {}\n", profile.name));
    if let Some(setting) = &profile.setting {
        prompt.push_str(&format!("- Setting: {}\n", setting));
    }
    if let Some(tone) = &profile.tone {
        prompt.push_str(&format!("- Tone: {}\n", tone));
    }
    for rule in &profile.rules {
        prompt.push_str(&format!("- {}\n", rule));
    }
    if let Some(proper_nouns) = &profile.proper_nouns {
        prompt.push_str(&format!("- Proper nouns: {}\n", proper_nouns));
    }
    prompt.push_str("- Keep the JSON structure and keys unchanged\n");

    if !profile.examples.is_empty() {
        prompt.push_str("\n## Examples\n");
        for example in &profile.examples {
            prompt.push_str(&format!("\"{}\" → \"{}\"\n", example.source, example.target));
        }
    }

    prompt
}

/// Build the user prompt carrying the serialized source mapping
pub fn build_translation_user_prompt(
    source: &LangMap,
    profile: &StyleProfile,
) -> Result<String, serde_json::Error> {
    let json = serialize_mapping(source)?;
    Ok(format!(
        "Translate the values of this language file from {} to {}. Keep every key exactly as it is and reply with the JSON only.\n\n{}",
        profile.source_language, profile.target_language, json
    ))
}

/// Deterministic, human-readable serialization (sorted keys, two-space indent).
pub fn serialize_mapping(source: &LangMap) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(source)
}
