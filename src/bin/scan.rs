//! Scan binary - lists every language file inside the mod archives of a directory
//!
//! Usage:
//!   cargo run --bin modlang-scan -- [DIRECTORY] [--save-report FILE]
//!
//! Nothing is written unless `--save-report` is given.

use anyhow::{Context, Result};
use modlang::config::Config;
use modlang::pipeline;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, PartialEq)]
struct ScanArgs {
    directory: Option<PathBuf>,
    save_report: Option<PathBuf>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ScanArgs> {
    let mut parsed = ScanArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--save-report" => {
                let file = args.next().context("--save-report needs a file name")?;
                parsed.save_report = Some(PathBuf::from(file));
            }
            flag if flag.starts_with("--") => anyhow::bail!("Unknown option: {}", flag),
            _ if parsed.directory.is_none() => parsed.directory = Some(PathBuf::from(&arg)),
            _ => anyhow::bail!("Unexpected argument: {}", arg),
        }
    }

    Ok(parsed)
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("modlang=info".parse()?),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let mut config = Config::discovery_from_env();
    if let Some(directory) = args.directory {
        config.directory = directory;
    }

    info!("Scanning directory: {}", config.directory.display());
    let report = pipeline::discover_directory(&config).context("Scan aborted")?;
    report.log_summary();

    if let Some(path) = args.save_report {
        if report.is_empty() {
            info!("Nothing to save");
        } else {
            report.write_json(&path)?;
            info!("Saved report to {}", path.display());
        }
    }

    Ok(())
}
