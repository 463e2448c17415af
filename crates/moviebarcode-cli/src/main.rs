mod progress;
mod summary;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use moviebarcode_core::pipeline::config::BarcodeConfig;
use moviebarcode_core::pipeline::run_barcode_reported;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use progress::TerminalReporter;

#[derive(Parser)]
#[command(
    name = "moviebarcode",
    about = "Summarize a video's color progression as a barcode image"
)]
#[command(version)]
struct Cli {
    /// Source video [default: ./]
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output image; the extension selects the format [default: ./]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Barcode config file (TOML). --input/--output take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(input) = cli.input {
        config.input = input;
    }
    if let Some(output) = cli.output {
        config.output = output;
    }

    if cli.dump_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    debug!(?config, "Effective config");
    summary::print_run_header(&config);

    let reporter = Arc::new(TerminalReporter::new());
    let result = run_barcode_reported(&config, reporter.clone());
    reporter.clear();
    let run = result.with_context(|| {
        format!("Failed to build barcode for {}", config.input.display())
    })?;

    run.profile.log();
    summary::print_run_summary(&run, &config);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BarcodeConfig> {
    let Some(path) = path else {
        return Ok(BarcodeConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).context("Invalid barcode config")
}
