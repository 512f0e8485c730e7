//! Bookplate Ingest - catalog export scanner

use anyhow::{Context, Result};
use bookplate_common::logging::{init_logging, LogConfig, LogLevel};
use bookplate_ingest::config::{required_env, IngestConfig};
use bookplate_ingest::pipeline::BookplatePipeline;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "bookplate-ingest")]
#[command(author, version, about = "Finds bookplate metadata in catalog export archives")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the full-export archives and write the bookplate report
    Report {
        /// Directory holding the .tar.gz exports (overrides MARC_FULL_SOURCE_DIR)
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Working directory for decompressed files (overrides MARC_FULL_OUTPUT_DIR)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Directory for {mms_id}.json files (overrides BOOKPLATE_JSON_DIR)
        #[arg(long)]
        bookplate_dir: Option<PathBuf>,

        /// Tracker report path (overrides TRACKER_PATH)
        #[arg(long)]
        tracker: Option<PathBuf>,

        /// Archive file-name pattern, e.g. "*new.tar.gz" (overrides ARCHIVE_PATTERN)
        #[arg(long)]
        pattern: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .log_file_prefix("bookplate-ingest")
        .build();

    // Environment variables take precedence over flags
    let (log_config, log_env_error) = match log_config.clone().merge_env() {
        Ok(merged) => (merged, None),
        Err(e) => (log_config, Some(e)),
    };
    let _log_guard = init_logging(&log_config)?;
    if let Some(e) = log_env_error {
        warn!(error = %e, "Ignoring invalid logging environment; using defaults");
    }

    match cli.command {
        Command::Report {
            source_dir,
            output_dir,
            bookplate_dir,
            tracker,
            pattern,
        } => {
            let config = build_config(source_dir, output_dir, bookplate_dir, tracker, pattern)?;
            let report = BookplatePipeline::new(config).run().context("Bookplate report run failed")?;

            for skipped in &report.skipped_archives {
                warn!(archive = %skipped.archive.display(), reason = %skipped.reason, "Archive was skipped");
            }

            if !report.is_success() {
                error!(failed = ?report.failed_saves, "Some bookplate files could not be saved");
                anyhow::bail!("{} bookplate files could not be saved", report.failed_saves.len());
            }
        },
    }

    info!("Done");
    Ok(())
}

/// Environment config with command-line overrides applied
fn build_config(
    source_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    bookplate_dir: Option<PathBuf>,
    tracker: Option<PathBuf>,
    pattern: Option<String>,
) -> Result<IngestConfig> {
    let source_dir = match source_dir {
        Some(dir) => dir,
        None => required_env("MARC_FULL_SOURCE_DIR")?,
    };
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => required_env("MARC_FULL_OUTPUT_DIR")?,
    };

    let mut config = IngestConfig::new(source_dir, output_dir)
        .merge_env()
        .context("Failed to load configuration")?;

    if let Some(dir) = bookplate_dir {
        config.bookplate_dir = dir;
    }
    if let Some(path) = tracker {
        config.tracker_path = path;
    }
    if let Some(pattern) = pattern {
        config.archive_pattern = pattern;
    }

    config.validate()?;
    Ok(config)
}
