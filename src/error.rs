//! Error taxonomy for the archive pipeline.
//!
//! Every error here is caught at the smallest enclosing unit of work (one
//! entry or one archive) and turned into a recorded outcome. Only
//! [`ConfigError`] stops a run, and it does so before any archive is touched.

use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to open or read an archive as a whole.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The file exists but is not a valid ZIP/JAR container
    #[error("{path} is not a valid archive: {reason}")]
    Format { path: PathBuf, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    pub(crate) fn from_zip(path: &std::path::Path, err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(source) => ArchiveError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => ArchiveError::Format {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        }
    }
}

/// A path-matched entry whose bytes are not a usable language resource.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceParseError {
    #[error("entry is not valid UTF-8")]
    Utf8,

    #[error("entry is not valid JSON: {0}")]
    Json(String),

    /// Parsed fine but is not a flat mapping of non-empty string keys to strings
    #[error("entry is not a flat string mapping: {0}")]
    NotFlat(String),

    #[error("entry is {size} bytes, more than the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
}

/// Why a translation attempt produced no usable mapping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("could not build translation request: {0}")]
    Request(String),

    #[error("translation request failed: {0}")]
    Transport(String),

    #[error("translation service returned an empty response")]
    EmptyResponse,

    #[error("translation reply is not valid JSON ({reason}); reply began with: {snippet}")]
    MalformedPayload { reason: String, snippet: String },

    #[error("translation reply is not a flat string mapping: {0}")]
    NotFlat(String),

    #[error("translation reply changed the key set (missing: {missing:?}, extra: {extra:?})")]
    KeyMismatch {
        missing: BTreeSet<String>,
        extra: BTreeSet<String>,
    },
}

/// Failure while writing a translated entry back into an archive.
///
/// Whatever the variant, the original archive file is left as it was.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("I/O error while updating {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive error while updating {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to replace {path} with the updated copy: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} already contains {entry}")]
    TargetExists { path: PathBuf, entry: String },

    #[error("cannot derive target path from {entry}: file name is not {expected}")]
    PathDerivation { entry: String, expected: String },

    #[error("failed to serialize translated mapping: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Invalid configuration or input; aborts before processing starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("directory {0} does not exist or is not a directory")]
    DirectoryNotFound(PathBuf),

    #[error("cannot list directory {path}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load style profile {path}: {reason}")]
    StyleProfile { path: PathBuf, reason: String },
}
