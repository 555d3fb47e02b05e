use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

mod cli;

use cli::Cli;
use cli::commands::Commands;
use tagflow::apply::{ApplyOptions, StderrDiagnostics, UploadMap, apply};
use tagflow::tags::{is_truncated, parse_document};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tagflow")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("tagflow.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Parse { file } => handle_parse_command(file),
        Commands::Apply { file, root, dry_run } => handle_apply_command(file, root, *dry_run),
    }
}

fn handle_parse_command(file: &Path) -> Result<()> {
    info!("Parsing tagged document: {}", file.display());
    let document = fs::read_to_string(file)
        .with_context(|| format!("Failed to read document: {}", file.display()))?;

    let parsed = parse_document(&document);
    println!("{}", serde_json::to_string_pretty(&parsed)?);

    if is_truncated(&document) {
        eprintln!("{}", "Document is truncated: last write tag is unclosed".yellow());
    }
    Ok(())
}

fn handle_apply_command(file: &Path, root: &Path, dry_run: bool) -> Result<()> {
    info!("Applying tagged document {} to {}", file.display(), root.display());
    let document = fs::read_to_string(file)
        .with_context(|| format!("Failed to read document: {}", file.display()))?;

    let parsed = parse_document(&document);
    if !parsed.has_operations() {
        println!("{}", "No operations to apply".cyan());
        return Ok(());
    }

    let uploads = UploadMap::new();
    let diagnostics = StderrDiagnostics;
    let mut options = ApplyOptions::new(&uploads, &diagnostics);
    options.dry_run = dry_run;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let manifest = runtime.block_on(apply(&parsed, root, &options));

    if dry_run {
        println!("{}", "Dry run - nothing was changed".cyan());
    }
    println!("{}", serde_json::to_string_pretty(&manifest)?);

    if let Some(error) = &manifest.error {
        eprintln!("{} {}", "Some operations failed:".red(), error);
    }
    Ok(())
}

fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();
    run_application(&cli)
}
