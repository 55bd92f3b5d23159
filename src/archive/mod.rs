//! Archive access: locating language files, extracting them, and writing
//! translated entries back.

pub mod locator;
pub mod mutator;
pub mod path;
pub mod resource;

pub use locator::{
    contains_entry, locate, scan_archive, ArchiveScan, Discovery, EntryScan, LocateOptions,
};
pub use mutator::{ArchiveMutator, ExistingEntryPolicy, MutationOutcome};
pub use path::{derive_target_path, lang_code_of, namespace_of};
pub use resource::{extract, LangMap, ResourceEntry};
