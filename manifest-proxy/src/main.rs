//! Manifest Proxy - Main entry point
//!
//! Mirrors the files selected from one or more remote manifests into a local
//! folder and publishes a manifest for that folder.

use anyhow::Result;
use clap::Parser;
use manifest_proxy::{run, utils, Config, HttpFetcher, SyncReport};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the sync configuration file (JSON, or TOML with a .toml extension)
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = utils::logger::init(&args.log_level) {
        eprintln!("Unable to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match sync(&args).await {
        Ok(report) => {
            tracing::info!(
                "Done: {} files fetched, {} failed, {} up to date",
                report.fetched,
                report.failed,
                report.up_to_date
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(critical = true, "{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn sync(args: &Args) -> Result<SyncReport> {
    let config = Config::from_file(&args.config)?;

    tracing::info!(
        "Starting manifest-proxy v{} (manifest id: {})",
        env!("CARGO_PKG_VERSION"),
        config.id
    );

    let fetcher = HttpFetcher::new(config.fetch_timeout())?;
    let report = run(&config, &fetcher).await?;

    Ok(report)
}
