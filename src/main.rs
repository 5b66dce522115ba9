use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use colored::*;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use media_localizer::{Config, LocalizeCommand, MediaMigrator};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match LocalizeCommand::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };
    setup_logging();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: LocalizeCommand) -> Result<()> {
    tracing::info!("Loading configuration from: {}", args.config.display());
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration {:?}", args.config))?;

    let migrator = MediaMigrator::new(config)?;
    let report = migrator.run().await?;

    println!(
        "✅ Media localized: {} file(s), {} bytes downloaded",
        report.downloaded, report.bytes
    );
    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("media_localizer=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
