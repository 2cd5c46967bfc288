use anyhow::{Context, Result};
use clap::Parser;
use eafsum::{
    category::CategoryTable,
    cli::Cli,
    config::AnalysisConfig,
    csv_output::CsvReport,
    pipeline::{self, Analyzer},
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `-v` raises the default level
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Build the effective configuration: TOML file (if any), then flags
fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_toml(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    args.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

fn load_categories(args: &Cli) -> Result<CategoryTable> {
    let table = match &args.categories {
        Some(path) => CategoryTable::from_toml(path)
            .with_context(|| format!("Failed to load category table {}", path.display()))?,
        None => CategoryTable::default_table().context("Failed to load built-in category table")?,
    };
    Ok(table)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Validate jobs (must be >= 1)
    if args.jobs == 0 {
        anyhow::bail!("Invalid value for --jobs: 0 (must be >= 1)");
    }

    init_tracing(args.verbose);

    let config = load_config(&args)?;
    let categories = load_categories(&args)?;
    tracing::info!(
        "Ignoring tiers: {:?} (plus built-in list)",
        config.ignore_tiers
    );

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    let analyzer = Analyzer::new(&config, &categories);
    let csv = CsvReport::new(config.delimiter, &categories);
    let summary = pipeline::run(&analyzer, &csv, &args.files, args.jobs, &mut writer)?;

    tracing::info!(
        "Reported {} file(s), skipped {}",
        summary.files_reported,
        summary.files_skipped
    );

    Ok(())
}
