//! Localize the language files packaged inside mod archives.
//!
//! The flow is: [`archive::locator`] finds `<root>/<namespace>/lang/<code>.json`
//! entries, [`translation::Translator`] turns a reference-language mapping into
//! the target language, and [`archive::mutator`] writes the result back into
//! the archive with a rename-based swap and a one-time `.backup`.

pub mod archive;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod rate_limit;
pub mod report;
pub mod retry;
pub mod translation;
