//! Discovery report: which language files live in which archive.

use crate::archive::resource::ResourceEntry;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

/// Archive path -> language files found in it.
///
/// Serializes as a plain JSON object keyed by archive path.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ScanReport {
    archives: BTreeMap<String, Vec<ResourceEntry>>,
}

/// Per-archive statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveStats {
    pub archive_name: String,
    pub namespaces: BTreeSet<String>,
    pub lang_codes: BTreeSet<String>,
    pub files: usize,
}

impl ScanReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the entries of one archive; archives without entries are not listed.
    pub fn insert(&mut self, archive_path: &Path, entries: Vec<ResourceEntry>) {
        if entries.is_empty() {
            return;
        }
        self.archives
            .insert(archive_path.display().to_string(), entries);
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    pub fn entries(&self, archive_path: &str) -> Option<&[ResourceEntry]> {
        self.archives.get(archive_path).map(Vec::as_slice)
    }

    /// Number of archives that contain at least one language file
    pub fn total_archives(&self) -> usize {
        self.archives.len()
    }

    pub fn total_lang_files(&self) -> usize {
        self.archives.values().map(Vec::len).sum()
    }

    pub fn archive_stats(&self) -> Vec<ArchiveStats> {
        self.archives
            .iter()
            .map(|(path, entries)| ArchiveStats {
                archive_name: Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone()),
                namespaces: entries.iter().map(|e| e.namespace.clone()).collect(),
                lang_codes: entries.iter().map(|e| e.lang_code.clone()).collect(),
                files: entries.len(),
            })
            .collect()
    }

    pub fn log_summary(&self) {
        if self.is_empty() {
            info!("No language files found");
            return;
        }

        info!("Scan summary");
        info!("Archives with language files: {}", self.total_archives());
        info!("Language files found: {}", self.total_lang_files());

        for stats in self.archive_stats() {
            info!(
                "  {}: namespaces [{}], languages [{}], {} files",
                stats.archive_name,
                join(&stats.namespaces),
                join(&stats.lang_codes),
                stats.files
            );
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize scan report")
    }

    /// Persist as pretty UTF-8 JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write scan report to {}", path.display()))?;
        Ok(())
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(", ")
}
