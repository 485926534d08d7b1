//! Download-once cache of the UCI "Adult" dataset.
//!
//! The UCI API describes a dataset with a JSON document that carries the URL of
//! the full CSV and the role of each column. Feature columns are kept first,
//! target columns after them, and the `income` target is renamed to
//! `income_label` before the file is persisted.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::DatasetConfig;
use crate::error::{DashboardError, Result};

const TARGET_COLUMN: &'static str = "income";
const LABEL_COLUMN: &'static str = "income_label";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: u16,
    #[serde(default)]
    message: Option<String>,
    data: Option<DatasetMetadata>,
}

#[derive(Debug, Deserialize)]
struct DatasetMetadata {
    #[serde(default)]
    name: Option<String>,
    data_url: Option<String>,
    #[serde(default)]
    variables: Vec<Variable>,
}

#[derive(Debug, Clone, Deserialize)]
struct Variable {
    name: String,
    role: String,
}

/// Returns `true` when the file had to be downloaded.
pub fn ensure_cached(config: &DatasetConfig) -> Result<bool> {
    if config.path.exists() {
        debug!(path = %config.path.display(), "Using cached dataset");
        return Ok(false);
    }

    info!(
        path = %config.path.display(),
        uci_id = config.uci_id,
        "Dataset not cached, fetching from UCI"
    );
    let client = reqwest::blocking::Client::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()?;

    let metadata = fetch_metadata(&client, config)?;
    let data_url = metadata.data_url.clone().ok_or_else(|| {
        DashboardError::RemoteDataset(format!("dataset {} has no data_url", config.uci_id))
    })?;

    info!(name = ?metadata.name, %data_url, "Downloading dataset");
    let response = client.get(&data_url).send()?.error_for_status()?;
    let rows = persist(&config.path, |out| write_merged(&metadata.variables, response, out))?;
    info!(rows, path = %config.path.display(), "Cached dataset");
    Ok(true)
}

fn fetch_metadata(client: &reqwest::blocking::Client, config: &DatasetConfig) -> Result<DatasetMetadata> {
    let response: ApiResponse = client
        .get(&config.api_url)
        .query(&[("id", config.uci_id)])
        .send()?
        .error_for_status()?
        .json()?;

    if response.status != 200 {
        return Err(DashboardError::RemoteDataset(format!(
            "UCI API returned status {}: {}",
            response.status,
            response.message.unwrap_or_default()
        )));
    }
    response
        .data
        .ok_or_else(|| DashboardError::RemoteDataset("UCI API response has no data".to_string()))
}

/// Write to a temporary file next to `path`, then move it into place.
fn persist<F>(path: &Path, write: F) -> Result<usize>
where
    F: FnOnce(&mut fs::File) -> Result<usize>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    let rows = write(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(rows)
}

/// Copy `reader` to `writer`, keeping feature columns followed by target
/// columns. Returns the number of data rows written.
fn write_merged<R: Read, W: Write>(variables: &[Variable], reader: R, writer: W) -> Result<usize> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let ordered: Vec<&Variable> = variables
        .iter()
        .filter(|v| v.role == "Feature")
        .chain(variables.iter().filter(|v| v.role == "Target"))
        .collect();
    if ordered.is_empty() {
        return Err(DashboardError::RemoteDataset("no feature or target columns".to_string()));
    }

    let mut positions = Vec::with_capacity(ordered.len());
    for variable in &ordered {
        let position = headers.iter().position(|h| h == variable.name).ok_or_else(|| {
            DashboardError::RemoteDataset(format!("column {} missing from data", variable.name))
        })?;
        positions.push(position);
    }

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(ordered.iter().map(|v| {
        if v.role == "Target" && v.name == TARGET_COLUMN {
            LABEL_COLUMN
        } else {
            v.name.as_str()
        }
    }))?;

    let mut rows = 0;
    for result in rdr.records() {
        let record = result?;
        wtr.write_record(positions.iter().map(|&i| record.get(i).unwrap_or("")))?;
        rows += 1;
    }
    wtr.flush()?;
    Ok(rows)
}
