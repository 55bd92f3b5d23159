//! Directory-level drivers for discovery and translation.
//!
//! Archives are handled one after another in file-name order, and entries in
//! archive-listing order. Failures are recorded per entry or per archive and
//! never stop the run; only an unusable input directory does, before any
//! archive is opened.

use crate::archive::locator::{contains_entry, scan_archive, LocateOptions};
use crate::archive::mutator::{ArchiveMutator, ExistingEntryPolicy, MutationOutcome};
use crate::archive::resource::ResourceEntry;
use crate::config::Config;
use crate::error::{ConfigError, TranslationError};
use crate::report::ScanReport;
use crate::translation::Translator;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Archives directly inside `dir` with the given extension, sorted by file name.
pub fn list_archives(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::DirectoryNotFound(dir.to_path_buf()));
    }

    let read_dir = std::fs::read_dir(dir).map_err(|source| ConfigError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut archives: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
        })
        .collect();

    archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(archives)
}

fn archive_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Report every language file in every archive of the configured directory.
pub fn discover_directory(config: &Config) -> Result<ScanReport, ConfigError> {
    let archives = list_archives(&config.directory, &config.archive_extension)?;
    let mut report = ScanReport::new();

    if archives.is_empty() {
        warn!(
            "No .{} files found in {}",
            config.archive_extension,
            config.directory.display()
        );
        return Ok(report);
    }

    info!("Found {} archives", archives.len());

    for archive in &archives {
        info!("Processing {}", archive_name(archive));
        let scan = scan_archive(archive, LocateOptions::discovery());

        if scan.entries.is_empty() {
            info!("  No language files found");
            continue;
        }

        info!("  {} language files found", scan.entries.len());
        for entry in &scan.entries {
            info!(
                "    {} (namespace: {}, language: {}, {} bytes)",
                entry.path, entry.namespace, entry.lang_code, entry.size_bytes
            );
        }
        report.insert(archive, scan.entries);
    }

    Ok(report)
}

/// Why an entry was not translated.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryFailure {
    Translation(TranslationError),
    Mutation(String),
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryFailure::Translation(e) => write!(f, "translation failed: {}", e),
            EntryFailure::Mutation(e) => write!(f, "saving failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryStatus {
    /// Translated entry written to `target`
    Translated { target: String },
    /// Target entry already present and the policy says skip
    Skipped { target: String },
    Failed(EntryFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryOutcome {
    pub archive: PathBuf,
    pub entry: String,
    pub status: EntryStatus,
}

/// Totals for a translation run, plus every per-entry outcome in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub archives: usize,
    pub unreadable_archives: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<EntryOutcome>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    fn record(&mut self, outcome: EntryOutcome) {
        self.attempted += 1;
        match &outcome.status {
            EntryStatus::Translated { .. } => self.succeeded += 1,
            EntryStatus::Skipped { .. } => self.skipped += 1,
            EntryStatus::Failed(_) => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn log(&self, config: &Config) {
        info!("Translation finished");
        info!("Entries processed: {}", self.attempted);
        info!("Succeeded: {}", self.succeeded);
        info!("Failed: {}", self.failed);
        if let (Some(start), Some(end)) = (self.started_at, self.finished_at) {
            info!("Elapsed: {}s", (end - start).num_seconds());
        }
        if self.skipped > 0 {
            info!("Skipped (already translated): {}", self.skipped);
        }
        if self.unreadable_archives > 0 {
            warn!("Unreadable archives: {}", self.unreadable_archives);
        }
        if self.succeeded > 0 {
            info!(
                "Translated files were added to each archive as {}.json",
                config.target_lang
            );
            info!("Original archives are kept as <archive>.backup");
        }
    }
}

/// Translate the reference-language file of every archive in the directory.
pub async fn translate_directory(
    config: &Config,
    translator: &Translator,
    mutator: &mut ArchiveMutator,
) -> Result<RunSummary, ConfigError> {
    config.validate()?;
    let archives = list_archives(&config.directory, &config.archive_extension)?;
    let mut summary = RunSummary {
        started_at: Some(Utc::now()),
        ..RunSummary::default()
    };

    if archives.is_empty() {
        warn!(
            "No .{} files found in {}",
            config.archive_extension,
            config.directory.display()
        );
        summary.finished_at = Some(Utc::now());
        return Ok(summary);
    }

    info!(
        "Processing {}.json in {} archives",
        config.reference_lang,
        archives.len()
    );

    for archive in &archives {
        summary.archives += 1;
        info!("Processing {}", archive_name(archive));

        let scan = scan_archive(archive, LocateOptions::reference(&config.reference_lang));
        if scan.error.is_some() {
            summary.unreadable_archives += 1;
            continue;
        }
        if scan.entries.is_empty() {
            info!("  No {}.json found, skipping", config.reference_lang);
            continue;
        }

        info!(
            "  Found {} {}.json files",
            scan.entries.len(),
            config.reference_lang
        );

        for entry in scan.entries {
            info!(
                "  Translating {} ({} -> {})",
                entry.path, config.reference_lang, config.target_lang
            );
            let status = translate_entry(config, translator, mutator, archive, &entry).await;
            match &status {
                EntryStatus::Translated { .. } => info!("    ✓ Done"),
                EntryStatus::Skipped { target } => info!("    - {} already present", target),
                EntryStatus::Failed(failure) => warn!("    ✗ {}", failure),
            }
            summary.record(EntryOutcome {
                archive: archive.clone(),
                entry: entry.path,
                status,
            });
        }
    }

    summary.finished_at = Some(Utc::now());
    Ok(summary)
}

async fn translate_entry(
    config: &Config,
    translator: &Translator,
    mutator: &mut ArchiveMutator,
    archive: &Path,
    entry: &ResourceEntry,
) -> EntryStatus {
    let target = match mutator.target_path(&entry.path) {
        Ok(target) => target,
        Err(e) => return EntryStatus::Failed(EntryFailure::Mutation(e.to_string())),
    };

    // Don't spend a request on something that would be thrown away
    if mutator.policy() == ExistingEntryPolicy::Skip {
        match contains_entry(archive, &target) {
            Ok(true) => return EntryStatus::Skipped { target },
            Ok(false) => {}
            Err(e) => return EntryStatus::Failed(EntryFailure::Mutation(e.to_string())),
        }
    }

    let Some(content) = entry.content.as_ref() else {
        return EntryStatus::Failed(EntryFailure::Mutation(format!(
            "{} was located without content",
            entry.path
        )));
    };
    debug!("{} keys to translate", content.len());

    let translated = match translator.translate(content, &config.style_profile).await {
        Ok(translated) => translated,
        Err(e) => return EntryStatus::Failed(EntryFailure::Translation(e)),
    };

    match mutator.append_translated_entry(archive, &entry.path, &translated) {
        Ok(MutationOutcome::Written { entry, .. }) => EntryStatus::Translated { target: entry },
        Ok(MutationOutcome::SkippedExisting { entry }) => EntryStatus::Skipped { target: entry },
        Err(e) => EntryStatus::Failed(EntryFailure::Mutation(e.to_string())),
    }
}
