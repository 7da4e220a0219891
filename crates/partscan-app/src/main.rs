// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// partscan — Validate part numbers against their datasheets.
//
// Entry point. Initialises logging, resolves configuration (defaults, then an
// optional TOML file, then flags) and runs one file-to-file validation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use partscan_app::{ValidationOrchestrator, validate_file};
use partscan_core::ValidationConfig;
use partscan_core::error::Result;

#[derive(Parser, Debug)]
#[command(name = "partscan")]
#[command(
    version,
    about = "Check that each part number appears in the PDF datasheet it links to"
)]
struct Args {
    /// JSON array of rows with `MPN`/`identifier` and `PDF`/`location` columns
    input: PathBuf,

    /// Where to write the result rows
    #[arg(short, long, default_value = "partscan-results.json")]
    output: PathBuf,

    /// TOML file with validation settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the OCR detection and recognition models
    #[arg(long)]
    ocr_models: Option<PathBuf>,

    /// Minimum similarity for a fuzzy match, 0 to 1
    #[arg(long)]
    fuzzy_cutoff: Option<f64>,

    /// Run OCR when a document has at most this many characters of text
    #[arg(long)]
    ocr_trigger_chars: Option<usize>,

    /// Documents fetched and extracted per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// HTTP timeout per document, in seconds
    #[arg(long)]
    fetch_timeout: Option<u64>,

    /// Parallel matching workers
    #[arg(long)]
    workers: Option<usize>,
}

impl Args {
    /// File settings overlaid with any flags given.
    fn resolve_config(&self) -> Result<ValidationConfig> {
        let mut config = ValidationConfig::load(self.config.as_deref())?;
        if let Some(dir) = &self.ocr_models {
            config.ocr_model_dir = Some(dir.clone());
        }
        if let Some(cutoff) = self.fuzzy_cutoff {
            config.fuzzy_cutoff = cutoff;
        }
        if let Some(chars) = self.ocr_trigger_chars {
            config.ocr_trigger_chars = chars;
        }
        if let Some(size) = self.batch_size {
            config.fetch_batch_size = size;
        }
        if let Some(secs) = self.fetch_timeout {
            config.fetch_timeout_secs = secs;
        }
        if let Some(workers) = self.workers {
            config.match_workers = workers;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "partscan starting");

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "validation aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = args.resolve_config()?;
    let orchestrator = ValidationOrchestrator::new(config)?;
    validate_file(&orchestrator, &args.input, &args.output).await?;
    Ok(())
}
