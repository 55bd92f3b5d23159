//! Path grammar for language resources inside an archive.
//!
//! Language files live at `<root>/<namespace>/lang/<lang_code>.json` where
//! `<root>` is `assets` or `data`.

use crate::error::MutationError;
use regex::Regex;
use std::sync::OnceLock;

static LANG_PATH_REGEX: OnceLock<Regex> = OnceLock::new();

const UNKNOWN_NAMESPACE: &str = "unknown";
const LANG_EXTENSION: &str = ".json";

fn lang_path_regex() -> &'static Regex {
    LANG_PATH_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^(assets|data)/[^/]+/lang/[^/]+\.json$")
            .expect("language path regex is valid")
    })
}

/// Check whether an archive entry path follows the language resource layout.
pub fn is_lang_path(path: &str) -> bool {
    lang_path_regex().is_match(path)
}

/// Check the layout and, when `lang_code` is given, require that exact file stem.
pub fn matches_lang(path: &str, lang_code: Option<&str>) -> bool {
    if !is_lang_path(path) {
        return false;
    }
    match lang_code {
        Some(code) => lang_code_of(path) == code,
        None => true,
    }
}

/// Owning namespace: the second segment, or `"unknown"` when there is none.
pub fn namespace_of(path: &str) -> &str {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() >= 3 && !parts[1].is_empty() {
        parts[1]
    } else {
        UNKNOWN_NAMESPACE
    }
}

/// Language code: the file name without its extension.
pub fn lang_code_of(path: &str) -> &str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    }
}

/// Swap the reference language file name for the target one.
///
/// `assets/foo/lang/en_us.json` with `en_us` -> `ja_jp` becomes
/// `assets/foo/lang/ja_jp.json`. Root and namespace segments are never touched.
pub fn derive_target_path(
    path: &str,
    reference_lang: &str,
    target_lang: &str,
) -> Result<String, MutationError> {
    let expected = format!("{}{}", reference_lang, LANG_EXTENSION);
    let (dir, file_name) = match path.rfind('/') {
        Some(idx) => (&path[..=idx], &path[idx + 1..]),
        None => ("", path),
    };

    if !file_name.eq_ignore_ascii_case(&expected) {
        return Err(MutationError::PathDerivation {
            entry: path.to_string(),
            expected,
        });
    }

    Ok(format!("{}{}{}", dir, target_lang, LANG_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_is_lang_path_assets_and_data() {
        assert!(is_lang_path("assets/foo/lang/en_us.json"));
        assert!(is_lang_path("data/bar/lang/de_de.json"));
    }

    #[test]
    fn test_is_lang_path_case_insensitive() {
        assert!(is_lang_path("Assets/Foo/LANG/en_US.JSON"));
    }

    #[test]
    fn test_is_lang_path_rejects_other_layouts() {
        assert!(!is_lang_path("assets/foo/lang/en_us.lang"));
        assert!(!is_lang_path("assets/foo/textures/en_us.json"));
        assert!(!is_lang_path("assets/foo/lang/sub/en_us.json"));
        assert!(!is_lang_path("resources/foo/lang/en_us.json"));
        assert!(!is_lang_path("assets/lang/en_us.json"));
        assert!(!is_lang_path("x/assets/foo/lang/en_us.json"));
        assert!(!is_lang_path("META-INF/MANIFEST.MF"));
    }

    #[test]
    fn test_matches_lang_filter_is_exact() {
        assert!(matches_lang("assets/foo/lang/en_us.json", Some("en_us")));
        assert!(!matches_lang("assets/foo/lang/en_gb.json", Some("en_us")));
        assert!(!matches_lang("assets/foo/lang/EN_US.json", Some("en_us")));
        assert!(matches_lang("assets/foo/lang/fr_fr.json", None));
    }

    #[test]
    fn test_namespace_of() {
        assert_eq!(namespace_of("assets/foo/lang/en_us.json"), "foo");
        assert_eq!(namespace_of("data/bar/lang/en_us.json"), "bar");
        assert_eq!(namespace_of("assets//lang/en_us.json"), "unknown");
        assert_eq!(namespace_of("assets/en_us.json"), "unknown");
    }

    #[test]
    fn test_lang_code_of() {
        assert_eq!(lang_code_of("assets/foo/lang/en_us.json"), "en_us");
        assert_eq!(lang_code_of("ja_jp.json"), "ja_jp");
        assert_eq!(lang_code_of("assets/foo/lang/noext"), "noext");
    }

    #[test]
    fn test_derive_target_path() {
        assert_eq!(
            derive_target_path("assets/foo/lang/en_us.json", "en_us", "ja_jp").unwrap(),
            "assets/foo/lang/ja_jp.json"
        );
    }

    #[test]
    fn test_derive_target_path_keeps_namespace_containing_token() {
        assert_eq!(
            derive_target_path("assets/en_us.json/lang/en_us.json", "en_us", "ja_jp").unwrap(),
            "assets/en_us.json/lang/ja_jp.json"
        );
    }

    #[test]
    fn test_derive_target_path_rejects_other_language() {
        let err = derive_target_path("assets/foo/lang/fr_fr.json", "en_us", "ja_jp").unwrap_err();
        assert!(matches!(err, MutationError::PathDerivation { .. }));
    }

    proptest! {
        #[test]
        fn prop_namespace_and_lang_code(
            root in "(assets|data)",
            ns in "[a-z0-9_]{1,12}",
            code in "[a-z]{2}_[a-z]{2}",
        ) {
            let path = format!("{}/{}/lang/{}.json", root, ns, code);
            prop_assert!(is_lang_path(&path));
            prop_assert_eq!(namespace_of(&path), ns.as_str());
            prop_assert_eq!(lang_code_of(&path), code.as_str());
        }

        #[test]
        fn prop_derive_only_changes_file_name(
            root in "(assets|data)",
            ns in "[a-z0-9_]{1,12}",
        ) {
            let path = format!("{}/{}/lang/en_us.json", root, ns);
            let derived = derive_target_path(&path, "en_us", "ja_jp").unwrap();
            prop_assert_eq!(derived, format!("{}/{}/lang/ja_jp.json", root, ns));
        }

        #[test]
        fn prop_non_json_paths_never_match(name in "[a-z/]{0,30}") {
            prop_assert!(!is_lang_path(&name));
        }
    }
}
