//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.migralog.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".migralog.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding episodes.json, settings.json and medications.json.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            verbose: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".migralog")
}

/// Report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Entries shown in each ranking (medications, triggers, ...).
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Months shown in the trends series.
    #[serde(default = "default_trend_months")]
    pub trend_months: usize,

    /// Episodes shown by `list` when no limit is given.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            trend_months: default_trend_months(),
            list_limit: default_list_limit(),
        }
    }
}

fn default_top_n() -> usize {
    5
}

fn default_trend_months() -> usize {
    12
}

fn default_list_limit() -> usize {
    20
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

    /// Reject report sizes that would render empty reports.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("top_n", self.report.top_n),
            ("trend_months", self.report.trend_months),
            ("list_limit", self.report.list_limit),
        ];
        for (name, value) in sizes {
            if value == 0 {
                bail!("[report] {} must be at least 1", name);
            }
        }
        Ok(())
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.clone();
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
