//! Hierclean - nested education dataset cleaner
//!
//! A CLI tool that validates student records, prunes empty containers,
//! flattens the hierarchy and prints grouped score analytics.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (invalid arguments, unreadable input, structure error,
//!       no students left after cleaning)

use anyhow::{Context, Result};
use chrono::Utc;
use hierclean::cli::{Args, OutputFormat};
use hierclean::config::{Config, DEFAULT_CONFIG_FILE};
use hierclean::models::{Report, ReportMetadata};
use hierclean::pipeline::{self, PipelineOptions};
use hierclean::report;
use hierclean::store::{loader, HierarchyStore};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Hierclean v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .hierclean.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, clean, analyze and write the report.
fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;

    // Step 1: Load the dataset
    let mut store = load_dataset(args)?;

    if args.dry_run {
        handle_dry_run(&store);
        return Ok(());
    }

    // Step 2: Run the pipeline
    let options = PipelineOptions::from(&config);
    let outcome = pipeline::run(&mut store, &options).context("Pipeline failed")?;

    // Step 3: Build and render the report
    let report = Report {
        metadata: ReportMetadata {
            source: args.source_name(),
            generated_at: Utc::now(),
            min_score: config.validation.min_score,
            max_score: config.validation.max_score,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        outcome,
    };

    let output = match config.report.format {
        OutputFormat::Text => report::generate_text_report(&report, config.report.decimals),
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, config.report.decimals)
        }
        OutputFormat::Json => report::generate_json_report(&report)?,
    };

    // Step 4: Write it out
    if config.general.output == "-" {
        print!("{}", output);
    } else {
        std::fs::write(&config.general.output, &output)
            .with_context(|| format!("Failed to write report to {}", config.general.output))?;

        if !args.quiet {
            println!(
                "✅ {} students processed. Report saved to: {}",
                report.outcome.analytics.total_rows, config.general.output
            );
        }
    }

    Ok(())
}

/// Load the dataset named on the command line.
fn load_dataset(args: &Args) -> Result<HierarchyStore> {
    match args.input {
        Some(ref input) => {
            info!("Loading dataset from: {}", input.display());
            loader::load_file(input)
        }
        None => {
            info!("Using built-in sample dataset");
            Ok(loader::sample())
        }
    }
}

/// Handle --dry-run: print the dataset shape and exit.
fn handle_dry_run(store: &HierarchyStore) {
    let counts = store.counts();

    println!("🔍 Dry run: dataset loaded, nothing cleaned.\n");
    println!("   Continents:   {}", counts.continents);
    println!("   Countries:    {}", counts.countries);
    println!("   Universities: {}", counts.universities);
    println!("   Faculties:    {}", counts.faculties);
    println!("   Departments:  {}", counts.departments);
    println!("   Students:     {}", counts.students);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
