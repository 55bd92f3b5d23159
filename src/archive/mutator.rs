//! Safe, all-or-nothing writes of translated entries into an archive.
//!
//! The archive on disk is only ever replaced by a rename of a fully written
//! temporary copy, and a pristine `.backup` sibling is taken before the first
//! replacement.

use crate::archive::path::derive_target_path;
use crate::archive::resource::LangMap;
use crate::error::{ConfigError, MutationError};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const BACKUP_SUFFIX: &str = ".backup";

/// What to do when the archive already holds the target-language entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingEntryPolicy {
    /// Leave the archive alone and report the entry as skipped
    #[default]
    Skip,
    /// Replace the existing entry with the new translation
    Overwrite,
    /// Report a failure for the entry
    Error,
}

impl FromStr for ExistingEntryPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::Invalid {
                name: "EXISTING_ENTRY_POLICY",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The archive now contains `entry`; `backup_created` is true when this
    /// call produced the `.backup` file
    Written { entry: String, backup_created: bool },
    /// `entry` already existed and the policy says skip
    SkippedExisting { entry: String },
}

/// Writes translated mappings back into archives.
///
/// Remembers per archive whether a backup has been taken during this run.
#[derive(Debug)]
pub struct ArchiveMutator {
    reference_lang: String,
    target_lang: String,
    policy: ExistingEntryPolicy,
    backup_taken: HashSet<PathBuf>,
}

impl ArchiveMutator {
    pub fn new(reference_lang: &str, target_lang: &str, policy: ExistingEntryPolicy) -> Self {
        Self {
            reference_lang: reference_lang.to_string(),
            target_lang: target_lang.to_string(),
            policy,
            backup_taken: HashSet::new(),
        }
    }

    pub fn policy(&self) -> ExistingEntryPolicy {
        self.policy
    }

    /// Entry path the translation of `original_entry_path` is written to.
    pub fn target_path(&self, original_entry_path: &str) -> Result<String, MutationError> {
        derive_target_path(original_entry_path, &self.reference_lang, &self.target_lang)
    }

    /// `<archive>.backup`
    pub fn backup_path(archive_path: &Path) -> PathBuf {
        let mut name = archive_path.as_os_str().to_os_string();
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }

    /// Add `translated` to the archive next to `original_entry_path`.
    ///
    /// Steps: copy the archive to a temporary file, write the entry into the
    /// copy, take the backup if none exists yet, then rename the copy over
    /// the archive. Any error before the rename leaves the archive untouched.
    pub fn append_translated_entry(
        &mut self,
        archive_path: &Path,
        original_entry_path: &str,
        translated: &LangMap,
    ) -> Result<MutationOutcome, MutationError> {
        let target = self.target_path(original_entry_path)?;
        let payload = serde_json::to_string_pretty(translated)?;

        let mut staged = copy_to_temp(archive_path)?;

        if entry_exists(staged.as_file_mut(), archive_path, &target)? {
            match self.policy {
                ExistingEntryPolicy::Skip => {
                    debug!("{} already in {}, skipping", target, archive_path.display());
                    return Ok(MutationOutcome::SkippedExisting { entry: target });
                }
                ExistingEntryPolicy::Error => {
                    return Err(MutationError::TargetExists {
                        path: archive_path.to_path_buf(),
                        entry: target,
                    });
                }
                ExistingEntryPolicy::Overwrite => {
                    staged = rebuild_without(staged.as_file_mut(), archive_path, &target)?;
                }
            }
        }

        append_entry(staged.as_file_mut(), archive_path, &target, payload.as_bytes())?;
        staged
            .as_file()
            .sync_all()
            .map_err(|source| io_error(archive_path, source))?;

        let backup_created = self.ensure_backup(archive_path)?;

        staged
            .persist(archive_path)
            .map_err(|e| MutationError::Persist {
                path: archive_path.to_path_buf(),
                source: e.error,
            })?;

        info!("Added {} to {}", target, archive_path.display());
        Ok(MutationOutcome::Written {
            entry: target,
            backup_created,
        })
    }

    /// Take the pristine backup unless this run (or an earlier one) already did.
    fn ensure_backup(&mut self, archive_path: &Path) -> Result<bool, MutationError> {
        if self.backup_taken.contains(archive_path) {
            return Ok(false);
        }

        let backup = Self::backup_path(archive_path);
        let created = if backup.exists() {
            debug!("Keeping existing backup {}", backup.display());
            false
        } else {
            let staged = copy_to_temp(archive_path)?;
            staged
                .as_file()
                .sync_all()
                .map_err(|source| io_error(archive_path, source))?;
            match staged.persist_noclobber(&backup) {
                Ok(_) => {
                    info!("Created backup {}", backup.display());
                    true
                }
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => false,
                Err(e) => {
                    return Err(MutationError::Persist {
                        path: backup,
                        source: e.error,
                    })
                }
            }
        };

        self.backup_taken.insert(archive_path.to_path_buf());
        Ok(created)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> MutationError {
    MutationError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn zip_error(path: &Path, source: zip::result::ZipError) -> MutationError {
    MutationError::Zip {
        path: path.to_path_buf(),
        source,
    }
}

fn new_temp_beside(archive_path: &Path) -> Result<NamedTempFile, MutationError> {
    // Same directory as the archive so the final rename stays on one filesystem
    let dir = match archive_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".modlang-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|source| io_error(archive_path, source))
}

/// Byte copy of the archive into a private temporary file, permissions included.
fn copy_to_temp(archive_path: &Path) -> Result<NamedTempFile, MutationError> {
    let mut staged = new_temp_beside(archive_path)?;
    let mut source = File::open(archive_path).map_err(|e| io_error(archive_path, e))?;
    std::io::copy(&mut source, staged.as_file_mut()).map_err(|e| io_error(archive_path, e))?;

    let permissions = source
        .metadata()
        .map_err(|e| io_error(archive_path, e))?
        .permissions();
    staged
        .as_file()
        .set_permissions(permissions)
        .map_err(|e| io_error(archive_path, e))?;
    Ok(staged)
}

fn entry_exists(file: &mut File, archive_path: &Path, entry: &str) -> Result<bool, MutationError> {
    file.seek(SeekFrom::Start(0))
        .map_err(|e| io_error(archive_path, e))?;
    let archive = ZipArchive::new(file).map_err(|e| zip_error(archive_path, e))?;
    Ok(archive.index_for_name(entry).is_some())
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated)
}

fn append_entry(
    file: &mut File,
    archive_path: &Path,
    entry: &str,
    bytes: &[u8],
) -> Result<(), MutationError> {
    file.seek(SeekFrom::Start(0))
        .map_err(|e| io_error(archive_path, e))?;
    let mut writer = ZipWriter::new_append(file).map_err(|e| zip_error(archive_path, e))?;
    writer
        .start_file(entry, entry_options())
        .map_err(|e| zip_error(archive_path, e))?;
    writer
        .write_all(bytes)
        .map_err(|e| io_error(archive_path, e))?;
    writer.finish().map_err(|e| zip_error(archive_path, e))?;
    Ok(())
}

/// Copy every entry except `skip_entry` into a fresh temporary archive.
fn rebuild_without(
    file: &mut File,
    archive_path: &Path,
    skip_entry: &str,
) -> Result<NamedTempFile, MutationError> {
    file.seek(SeekFrom::Start(0))
        .map_err(|e| io_error(archive_path, e))?;
    let mut source = ZipArchive::new(file).map_err(|e| zip_error(archive_path, e))?;

    let mut rebuilt = new_temp_beside(archive_path)?;
    let permissions = source_permissions(archive_path)?;
    rebuilt
        .as_file()
        .set_permissions(permissions)
        .map_err(|e| io_error(archive_path, e))?;

    {
        let mut writer = ZipWriter::new(rebuilt.as_file_mut());
        for index in 0..source.len() {
            let entry = source
                .by_index_raw(index)
                .map_err(|e| zip_error(archive_path, e))?;
            if entry.name() == skip_entry {
                continue;
            }
            writer
                .raw_copy_file(entry)
                .map_err(|e| zip_error(archive_path, e))?;
        }
        writer.finish().map_err(|e| zip_error(archive_path, e))?;
    }

    Ok(rebuilt)
}

fn source_permissions(archive_path: &Path) -> Result<std::fs::Permissions, MutationError> {
    std::fs::metadata(archive_path)
        .map(|m| m.permissions())
        .map_err(|e| io_error(archive_path, e))
}
