//! Configuration loading.
//! Reads income_insights.toml from the current directory, the path given with
//! `--config`, or the path in the INCOME_INSIGHTS_CONFIG env var.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::Result;

const DEFAULT_CONFIG_FILE: &'static str = "income_insights.toml";

#[derive(Debug, Parser)]
#[command(name = "income_insights", about = "Income Insights Explorer")]
pub struct Cli {
    /// Verbose logging; rendered charts are logged as JSON
    #[arg(long)]
    pub debug: bool,

    /// Path to the TOML configuration file
    #[arg(long, env = "INCOME_INSIGHTS_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_uci_id")]
    pub uci_id: u32,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_dataset_path() -> PathBuf { PathBuf::from("adult_features.csv") }
fn default_api_url()      -> String { "https://archive.ics.uci.edu/api/dataset".to_string() }
fn default_uci_id()       -> u32 { 2 }

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            api_url: default_api_url(),
            uci_id: default_uci_id(),
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_parallel_max_lines")]
    pub parallel_max_lines: usize,
    #[serde(default = "default_sex")]
    pub default_gender: String,
    #[serde(default = "default_income")]
    pub default_income: String,
    #[serde(default = "default_sex")]
    pub default_sex: String,
    #[serde(default = "default_occupations")]
    pub default_occupations: Vec<String>,
}

fn default_tick_rate_ms()       -> u64 { 200 }
fn default_parallel_max_lines() -> usize { 300 }
fn default_sex()                -> String { "Male".to_string() }
fn default_income()             -> String { "<=50K".to_string() }

fn default_occupations() -> Vec<String> {
    ["Adm-clerical", "Exec-managerial", "Handlers-cleaners", "Prof-specialty"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate_ms(),
            parallel_max_lines: default_parallel_max_lines(),
            default_gender: default_sex(),
            default_income: default_income(),
            default_sex: default_sex(),
            default_occupations: default_occupations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_file()   -> PathBuf { PathBuf::from("income_insights.log") }
fn default_log_filter() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { file: default_log_file(), filter: default_log_filter() }
    }
}

impl Config {
    /// Load from an explicit path, or from `income_insights.toml` when present.
    /// A missing default file yields the built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
