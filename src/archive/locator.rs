//! Discovery of language resources inside a single archive.

use crate::archive::path::matches_lang;
use crate::archive::resource::{self, ResourceEntry};
use crate::error::{ArchiveError, ResourceParseError};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Largest language file read into memory; bigger entries are skipped.
pub const MAX_ENTRY_BYTES: u64 = 16 * 1024 * 1024;

/// What a scan looks for.
#[derive(Debug, Clone, Default)]
pub struct LocateOptions {
    /// Only accept this exact file stem (e.g. `en_us`); `None` accepts any language
    pub filter_lang_code: Option<String>,
    /// Parse and keep the key/value content of each entry
    pub retain_content: bool,
}

impl LocateOptions {
    /// Every language file, metadata only.
    pub fn discovery() -> Self {
        Self::default()
    }

    /// Only the reference language, with content.
    pub fn reference(lang_code: &str) -> Self {
        Self {
            filter_lang_code: Some(lang_code.to_string()),
            retain_content: true,
        }
    }
}

/// Outcome for one path-matched entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    Found(ResourceEntry),
    /// Path matched but the bytes are not a usable language file
    Skipped {
        path: String,
        reason: ResourceParseError,
    },
}

/// Lazy iterator over the language entries of one archive.
///
/// Entries come out in archive-listing order; entries whose path does not
/// match the language layout are never yielded.
pub struct EntryScan {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    index: usize,
    options: LocateOptions,
}

/// Open `archive_path` read-only and start a scan.
///
/// Each call re-opens the archive, so scans can be restarted freely.
pub fn locate(archive_path: &Path, options: LocateOptions) -> Result<EntryScan, ArchiveError> {
    let file = File::open(archive_path).map_err(|source| ArchiveError::Io {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| ArchiveError::from_zip(archive_path, e))?;

    Ok(EntryScan {
        path: archive_path.to_path_buf(),
        archive,
        index: 0,
        options,
    })
}

impl EntryScan {
    fn classify(&self, name: String, bytes: Vec<u8>) -> Discovery {
        let parsed = if self.options.retain_content {
            resource::extract(&name, &bytes)
        } else {
            resource::parse_json(&bytes)
                .map(|_| ResourceEntry::describe(&name, bytes.len() as u64))
        };

        match parsed {
            Ok(entry) => Discovery::Found(entry),
            Err(reason) => Discovery::Skipped { path: name, reason },
        }
    }
}

impl Iterator for EntryScan {
    type Item = Result<Discovery, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.archive.len() {
            let index = self.index;
            self.index += 1;

            // Raw access reads the header only, so unsupported compression
            // on unrelated entries does not matter
            let (name, declared_size) = match self.archive.by_index_raw(index) {
                Ok(file) if file.is_dir() => continue,
                Ok(file) => (file.name().to_string(), file.size()),
                Err(e) => return Some(Err(ArchiveError::from_zip(&self.path, e))),
            };

            if !matches_lang(&name, self.options.filter_lang_code.as_deref()) {
                continue;
            }
            if declared_size > MAX_ENTRY_BYTES {
                return Some(Ok(too_large(name, declared_size)));
            }

            // The declared size is untrusted, so the read is bounded as well
            let bytes = {
                let file = match self.archive.by_index(index) {
                    Ok(file) => file,
                    Err(e) => return Some(Err(ArchiveError::from_zip(&self.path, e))),
                };
                let mut bytes = Vec::new();
                if let Err(source) = file.take(MAX_ENTRY_BYTES + 1).read_to_end(&mut bytes) {
                    return Some(Err(ArchiveError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
                bytes
            };
            if bytes.len() as u64 > MAX_ENTRY_BYTES {
                return Some(Ok(too_large(name, bytes.len() as u64)));
            }

            return Some(Ok(self.classify(name, bytes)));
        }
        None
    }
}

fn too_large(path: String, size: u64) -> Discovery {
    Discovery::Skipped {
        path,
        reason: ResourceParseError::TooLarge {
            size,
            limit: MAX_ENTRY_BYTES,
        },
    }
}

/// Collected result of scanning one archive.
#[derive(Debug, Default)]
pub struct ArchiveScan {
    pub entries: Vec<ResourceEntry>,
    pub skipped: Vec<(String, ResourceParseError)>,
    /// Set when the archive could not be read; `entries` is then empty
    pub error: Option<ArchiveError>,
}

/// Scan an archive to completion, reporting archive-level failures instead of
/// returning them so the caller can move on to the next archive.
pub fn scan_archive(archive_path: &Path, options: LocateOptions) -> ArchiveScan {
    let scan = match locate(archive_path, options) {
        Ok(scan) => scan,
        Err(e) => return failed_scan(e),
    };

    let mut result = ArchiveScan::default();
    for discovery in scan {
        match discovery {
            Ok(Discovery::Found(entry)) => result.entries.push(entry),
            Ok(Discovery::Skipped { path, reason }) => {
                debug!("Skipping {} in {}: {}", path, archive_path.display(), reason);
                result.skipped.push((path, reason));
            }
            Err(e) => return failed_scan(e),
        }
    }
    result
}

fn failed_scan(error: ArchiveError) -> ArchiveScan {
    match &error {
        ArchiveError::Format { path, .. } => {
            warn!("{} is not a valid archive, skipping", path.display())
        }
        ArchiveError::Io { .. } => warn!("{}", error),
    }
    ArchiveScan {
        error: Some(error),
        ..ArchiveScan::default()
    }
}

/// Check whether the archive already holds an entry with exactly this name.
pub fn contains_entry(archive_path: &Path, entry_name: &str) -> Result<bool, ArchiveError> {
    let file = File::open(archive_path).map_err(|source| ArchiveError::Io {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| ArchiveError::from_zip(archive_path, e))?;
    Ok(archive.index_for_name(entry_name).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::{write_archive, write_raw_stored};
    use tempfile::TempDir;

    #[test]
    fn test_locate_yields_only_matching_entries() {
        let dir = TempDir::new().unwrap();
        let jar = write_archive(
            dir.path(),
            "mod.jar",
            &[
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".as_slice()),
                ("assets/m1/textures/item/sword.png", b"\x89PNG".as_slice()),
                ("assets/m1/lang/en_us.json", br#"{"item.sword":"Sword"}"#.as_slice()),
                ("data/m1/lang/de_de.json", br#"{"item.sword":"Schwert"}"#.as_slice()),
            ],
        );

        let found: Vec<_> = locate(&jar, LocateOptions::discovery())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(found.len(), 2);
        match &found[0] {
            Discovery::Found(entry) => {
                assert_eq!(entry.path, "assets/m1/lang/en_us.json");
                assert_eq!(entry.namespace, "m1");
                assert!(entry.content.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_locate_no_matching_paths_is_empty() {
        let dir = TempDir::new().unwrap();
        let jar = write_archive(
            dir.path(),
            "mod.jar",
            &[
                ("assets/m1/lang/en_us.lang", b"item.sword=Sword".as_slice()),
                ("assets/m1/models/sword.json", b"{}".as_slice()),
            ],
        );

        assert_eq!(locate(&jar, LocateOptions::discovery()).unwrap().count(), 0);
    }

    #[test]
    fn test_locate_reference_filter_and_content() {
        let dir = TempDir::new().unwrap();
        let jar = write_archive(
            dir.path(),
            "mod.jar",
            &[
                ("assets/m1/lang/en_us.json", br#"{"item.sword":"Sword"}"#.as_slice()),
                ("assets/m1/lang/fr_fr.json", br#"{"item.sword":"Epee"}"#.as_slice()),
            ],
        );

        let scan = scan_archive(&jar, LocateOptions::reference("en_us"));
        assert!(scan.error.is_none());
        assert_eq!(scan.entries.len(), 1);
        let content = scan.entries[0].content.as_ref().unwrap();
        assert_eq!(content["item.sword"], "Sword");
    }

    #[test]
    fn test_locate_skips_invalid_utf8_and_json() {
        let dir = TempDir::new().unwrap();
        let jar = write_archive(
            dir.path(),
            "mod.jar",
            &[
                ("assets/a/lang/en_us.json", [0xffu8, 0xfe, 0x01].as_slice()),
                ("assets/b/lang/en_us.json", b"not json at all".as_slice()),
                ("assets/c/lang/en_us.json", br#"{"ok":"yes"}"#.as_slice()),
            ],
        );

        let scan = scan_archive(&jar, LocateOptions::discovery());
        assert!(scan.error.is_none());
        assert_eq!(scan.entries.len(), 1);
        assert_eq!(scan.entries[0].namespace, "c");
        assert_eq!(scan.skipped.len(), 2);
        assert_eq!(scan.skipped[0].1, ResourceParseError::Utf8);
        assert!(matches!(scan.skipped[1].1, ResourceParseError::Json(_)));
    }

    #[test]
    fn test_discovery_accepts_nested_json_but_translation_skips_it() {
        let dir = TempDir::new().unwrap();
        let jar = write_archive(
            dir.path(),
            "mod.jar",
            &[("assets/a/lang/en_us.json", br#"{"a":{"b":"c"}}"#.as_slice())],
        );

        assert_eq!(scan_archive(&jar, LocateOptions::discovery()).entries.len(), 1);

        let scan = scan_archive(&jar, LocateOptions::reference("en_us"));
        assert!(scan.entries.is_empty());
        assert!(matches!(scan.skipped[0].1, ResourceParseError::NotFlat(_)));
    }

    #[test]
    fn test_scan_corrupt_archive_reports_format_error() {
        let dir = TempDir::new().unwrap();
        let jar = dir.path().join("broken.jar");
        std::fs::write(&jar, b"PK\x03\x04 definitely not a zip").unwrap();

        let scan = scan_archive(&jar, LocateOptions::discovery());
        assert!(scan.entries.is_empty());
        assert!(matches!(scan.error, Some(ArchiveError::Format { .. })));
    }

    #[test]
    fn test_scan_skips_entry_with_inflated_declared_size() {
        let dir = TempDir::new().unwrap();
        let jar = write_raw_stored(
            dir.path(),
            "huge.jar",
            "assets/m/lang/en_us.json",
            br#"{"k":"v"}"#,
            0,
            Some(1 << 61),
        );

        let scan = scan_archive(&jar, LocateOptions::discovery());
        assert!(scan.error.is_none());
        assert!(scan.entries.is_empty());
        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(
            scan.skipped[0].1,
            ResourceParseError::TooLarge {
                size: 1 << 61,
                limit: MAX_ENTRY_BYTES
            }
        );
    }

    #[test]
    fn test_scan_unreadable_entry_reports_archive_error() {
        let dir = TempDir::new().unwrap();
        let bad = write_raw_stored(
            dir.path(),
            "bad.jar",
            "assets/m/lang/en_us.json",
            br#"{"k":"v"}"#,
            0xdead_beef,
            None,
        );
        let good = write_archive(
            dir.path(),
            "good.jar",
            &[("assets/g/lang/en_us.json", br#"{"k":"v"}"#.as_slice())],
        );

        // Opens fine, fails once the entry body is read
        assert!(locate(&bad, LocateOptions::discovery()).is_ok());
        let scan = scan_archive(&bad, LocateOptions::discovery());
        assert!(scan.entries.is_empty());
        assert!(matches!(scan.error, Some(ArchiveError::Io { .. })));

        let next = scan_archive(&good, LocateOptions::discovery());
        assert!(next.error.is_none());
        assert_eq!(next.entries.len(), 1);
    }

    #[test]
    fn test_scan_missing_archive_reports_io_error() {
        let dir = TempDir::new().unwrap();
        let scan = scan_archive(&dir.path().join("gone.jar"), LocateOptions::discovery());
        assert!(matches!(scan.error, Some(ArchiveError::Io { .. })));
    }

    #[test]
    fn test_locate_is_restartable() {
        let dir = TempDir::new().unwrap();
        let jar = write_archive(
            dir.path(),
            "mod.jar",
            &[("assets/a/lang/en_us.json", br#"{"k":"v"}"#.as_slice())],
        );

        let first = locate(&jar, LocateOptions::discovery()).unwrap().count();
        let second = locate(&jar, LocateOptions::discovery()).unwrap().count();
        assert_eq!(first, 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_contains_entry() {
        let dir = TempDir::new().unwrap();
        let jar = write_archive(
            dir.path(),
            "mod.jar",
            &[("assets/a/lang/en_us.json", br#"{"k":"v"}"#.as_slice())],
        );

        assert!(contains_entry(&jar, "assets/a/lang/en_us.json").unwrap());
        assert!(!contains_entry(&jar, "assets/a/lang/ja_jp.json").unwrap());
    }
}
