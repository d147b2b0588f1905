//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::GroupKey;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hierclean - clean and analyze nested education datasets
///
/// Validates student records, prunes containers left empty, flattens the
/// hierarchy into rows and reports grouped averages.
///
/// Examples:
///   hierclean --input data.json
///   hierclean --sample --format markdown --output -
///   hierclean --input data.json --min-score 40 --group-by continent,faculty
///   hierclean --input data.json --dry-run
///   hierclean --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON dataset to process
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present_any = ["sample", "init_config"],
        conflicts_with = "sample"
    )]
    pub input: Option<PathBuf>,

    /// Run on the built-in sample dataset
    #[arg(long)]
    pub sample: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .hierclean.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file for the report, `-` for stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format (text, markdown, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Lowest valid score (inclusive)
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub min_score: Option<i64>,

    /// Highest valid score (inclusive)
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub max_score: Option<i64>,

    /// Extra levels to report grouped averages for (comma-separated)
    ///
    /// Example: --group-by continent,university
    #[arg(long, value_name = "LEVELS", value_delimiter = ',')]
    pub group_by: Option<Vec<GroupByLevel>>,

    /// Digits printed after the decimal point
    #[arg(long, value_name = "N")]
    pub decimals: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load the dataset and print its shape without cleaning it
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .hierclean.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

/// Level accepted by --group-by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GroupByLevel {
    Continent,
    Country,
    University,
    Faculty,
    Department,
}

impl From<GroupByLevel> for GroupKey {
    fn from(level: GroupByLevel) -> Self {
        match level {
            GroupByLevel::Continent => GroupKey::Continent,
            GroupByLevel::Country => GroupKey::Country,
            GroupByLevel::University => GroupKey::University,
            GroupByLevel::Faculty => GroupKey::Faculty,
            GroupByLevel::Department => GroupKey::Department,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let (Some(min), Some(max)) = (self.min_score, self.max_score) {
            if min > max {
                return Err(format!(
                    "--min-score ({}) must not exceed --max-score ({})",
                    min, max
                ));
            }
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Human-readable name of the dataset source.
    pub fn source_name(&self) -> String {
        match self.input {
            Some(ref input) => input.display().to_string(),
            None => "built-in sample".to_string(),
        }
    }
}

#[cfg(test)]
impl Args {
    pub(crate) fn for_tests() -> Self {
        Args {
            input: None,
            sample: true,
            config: None,
            output: None,
            format: None,
            min_score: None,
            max_score: None,
            group_by: None,
            decimals: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }
}
