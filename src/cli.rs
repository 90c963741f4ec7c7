//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// popu-rank - rank prefectures by population change
///
/// Reads a `year,prefecture,<unused>,count,...` CSV and ranks every
/// prefecture by the ratio of its late-year count to its early-year count.
///
/// Examples:
///   popu-rank ./popu-pref.csv
///   popu-rank data.csv --early-year 2005 --late-year 2015 --top 10
///   popu-rank --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV file with one record per line
    ///
    /// If not specified, falls back to the config file and then to ./popu-pref.csv
    #[arg(value_name = "INPUT", env = "POPU_RANK_INPUT")]
    pub input: Option<PathBuf>,

    /// Earlier reference year (denominator of the change ratio)
    #[arg(long, value_name = "YEAR")]
    pub early_year: Option<i64>,

    /// Later reference year (numerator of the change ratio)
    #[arg(long, value_name = "YEAR")]
    pub late_year: Option<i64>,

    /// Only print the first N entries of the ranking
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .popu-rank.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .popu-rank.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let (Some(early), Some(late)) = (self.early_year, self.late_year) {
            if early == late {
                return Err(format!(
                    "Early and late reference years must differ (both are {})",
                    early
                ));
            }
        }

        if let Some(top) = self.top {
            if top == 0 {
                return Err("--top must be greater than 0".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
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
            tracing::Level::WARN
        }
    }
}
