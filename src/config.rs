//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.popu-rank.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".popu-rank.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Reference years.
    #[serde(default)]
    pub years: YearsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Input CSV file.
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            verbose: false,
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("./popu-pref.csv")
}

/// The two snapshot years compared by the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearsConfig {
    /// Earlier reference year.
    #[serde(default = "default_early_year")]
    pub early: i64,

    /// Later reference year.
    #[serde(default = "default_late_year")]
    pub late: i64,
}

impl Default for YearsConfig {
    fn default() -> Self {
        Self {
            early: default_early_year(),
            late: default_late_year(),
        }
    }
}

fn default_early_year() -> i64 {
    2010
}

fn default_late_year() -> i64 {
    2015
}

/// Report settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Print only the first N ranking entries.
    #[serde(default)]
    pub top: Option<usize>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.popu-rank.toml` from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.general.input = input.clone();
        }

        if let Some(early) = args.early_year {
            self.years.early = early;
        }
        if let Some(late) = args.late_year {
            self.years.late = late;
        }

        if let Some(top) = args.top {
            self.report.top = Some(top);
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check settings that can only be judged after merging.
    pub fn validate(&self) -> Result<()> {
        if self.years.early == self.years.late {
            anyhow::bail!(
                "Early and late reference years must differ (both are {})",
                self.years.early
            );
        }
        if self.report.top == Some(0) {
            anyhow::bail!("report.top must be greater than 0");
        }
        Ok(())
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
    use crate::cli::Args;

    fn make_args() -> Args {
        Args {
            input: None,
            early_year: None,
            late_year: None,
            top: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.input, PathBuf::from("./popu-pref.csv"));
        assert_eq!(config.years.early, 2010);
        assert_eq!(config.years.late, 2015);
        assert_eq!(config.report.top, None);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
input = "data/census.csv"
verbose = true

[years]
early = 2000

[report]
top = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.input, PathBuf::from("data/census.csv"));
        assert!(config.general.verbose);
        assert_eq!(config.years.early, 2000);
        assert_eq!(config.years.late, 2015);
        assert_eq!(config.report.top, Some(5));
    }

    #[test]
    fn test_merge_only_overrides_explicit_args() {
        let mut config: Config = toml::from_str("[years]\nearly = 2000\nlate = 2020\n").unwrap();
        let mut args = make_args();
        args.late_year = Some(2025);
        args.input = Some(PathBuf::from("other.csv"));

        config.merge_with_args(&args);

        assert_eq!(config.years.early, 2000);
        assert_eq!(config.years.late, 2025);
        assert_eq!(config.general.input, PathBuf::from("other.csv"));
    }

    #[test]
    fn test_validate_rejects_equal_years() {
        let mut config = Config::default();
        config.years.late = config.years.early;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[report]\ntop = 3\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.report.top, Some(3));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[years\nearly = ").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[years]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.years, YearsConfig::default());
    }
}
