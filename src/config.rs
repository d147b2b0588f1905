//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.hierclean.toml` files.

use crate::cli::OutputFormat;
use crate::models::GroupKey;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".hierclean.toml";

// Subjects checked by the validator. Other subjects are carried, never checked.
pub const CALC: &str = "calc";
pub const ALGEBRA: &str = "algebra";
pub const CHECKED_SUBJECTS: &[&str] = &[CALC, ALGEBRA];

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Leaf validation settings.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report output path, `-` for stdout.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "hierclean_report.txt".to_string()
}

/// Score bounds, both inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_min_score")]
    pub min_score: i64,

    #[serde(default = "default_max_score")]
    pub max_score: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            max_score: default_max_score(),
        }
    }
}

fn default_min_score() -> i64 {
    0
}

fn default_max_score() -> i64 {
    100
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Digits printed after the decimal point in text and markdown.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Extra grouped-average tables.
    #[serde(default)]
    pub group_by: Vec<GroupKey>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            decimals: default_decimals(),
            group_by: Vec::new(),
        }
    }
}

fn default_decimals() -> usize {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check settings that serde alone cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.validation.min_score > self.validation.max_score {
            bail!(
                "min_score ({}) must not exceed max_score ({})",
                self.validation.min_score,
                self.validation.max_score
            );
        }
        if self.general.output.trim().is_empty() {
            bail!("output path must not be empty");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(min) = args.min_score {
            self.validation.min_score = min;
        }
        if let Some(max) = args.max_score {
            self.validation.max_score = max;
        }
        if let Some(ref levels) = args.group_by {
            self.report.group_by = levels.iter().map(|&l| GroupKey::from(l)).collect();
        }
        if let Some(decimals) = args.decimals {
            self.report.decimals = decimals;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, GroupByLevel};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.validation.min_score, 0);
        assert_eq!(config.validation.max_score, 100);
        assert_eq!(config.report.format, OutputFormat::Text);
        assert_eq!(config.report.decimals, 2);
        assert!(config.report.group_by.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"
verbose = true

[validation]
min_score = 10

[report]
format = "markdown"
group_by = ["continent", "university"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert!(config.general.verbose);
        assert_eq!(config.validation.min_score, 10);
        assert_eq!(config.validation.max_score, 100);
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert_eq!(
            config.report.group_by,
            vec![GroupKey::Continent, GroupKey::University]
        );
    }

    #[test]
    fn test_load_rejects_inverted_bounds() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[validation]\nmin_score = 90\nmax_score = 10").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("must not exceed"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[report]\ndecimals = 4").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.report.decimals, 4);
    }

    #[test]
    fn test_merge_with_args_only_overrides_given_values() {
        let mut config = Config::default();
        config.validation.max_score = 90;

        let mut args = Args::for_tests();
        args.min_score = Some(5);
        args.output = Some(PathBuf::from("out.json"));
        args.format = Some(OutputFormat::Json);
        args.group_by = Some(vec![GroupByLevel::Faculty]);

        config.merge_with_args(&args);
        assert_eq!(config.validation.min_score, 5);
        assert_eq!(config.validation.max_score, 90);
        assert_eq!(config.general.output, "out.json");
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.group_by, vec![GroupKey::Faculty]);
        assert_eq!(config.report.decimals, 2);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[validation]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.validation.max_score, 100);
    }
}
