//! Translate the reference-language file of every mod archive in a directory
//!
//! Usage:
//!   cargo run -- [DIRECTORY]
//!
//! Required environment variables:
//! - OPENAI_API_KEY
//!
//! Optional:
//! - ARCHIVE_DIR (defaults to the current directory; the CLI argument wins)
//! - REFERENCE_LANG / TARGET_LANG (defaults to en_us / ja_jp)
//! - RATE_LIMIT_MS (defaults to 1000)
//! - STYLE_PROFILE (path to a style profile JSON, e.g. profiles/dark_fantasy_ja.json)
//! - EXISTING_ENTRY_POLICY (skip, overwrite or error; defaults to skip)

use anyhow::{Context, Result};
use modlang::archive::ArchiveMutator;
use modlang::config::Config;
use modlang::pipeline;
use modlang::translation::Translator;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("modlang=info".parse()?),
        )
        .init();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(directory) = std::env::args().nth(1) {
        config.directory = directory.into();
    }
    config.validate().context("Invalid input")?;

    info!("Mod translator");
    info!("Directory: {}", config.directory.display());
    info!(
        "Translating {} -> {} with style profile '{}'",
        config.reference_lang, config.target_lang, config.style_profile.name
    );

    let translator = Translator::new(&config)?;
    let mut mutator = ArchiveMutator::new(
        &config.reference_lang,
        &config.target_lang,
        config.existing_entry_policy,
    );

    let summary = pipeline::translate_directory(&config, &translator, &mut mutator)
        .await
        .context("Translation run aborted")?;
    summary.log(&config);

    Ok(())
}
