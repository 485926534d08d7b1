use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Remote dataset error: {0}")]
    RemoteDataset(String),

    #[error("Unknown income label {value:?} on line {line}")]
    UnknownIncomeLabel { line: u64, value: String },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
