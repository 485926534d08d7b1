use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::DatasetConfig;
use crate::csv_reader::{read_data, IncomeLabel, Record};
use crate::error::Result;
use crate::fetch;

/// Numeric columns offered to the parallel-coordinates control, in page order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NumericColumn {
    Age,
    CapitalLoss,
    CapitalGain,
    EducationNum,
    IncomeLabel,
    Fnlwgt,
    HoursPerWeek,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 7] = [
        NumericColumn::Age,
        NumericColumn::CapitalLoss,
        NumericColumn::CapitalGain,
        NumericColumn::EducationNum,
        NumericColumn::IncomeLabel,
        NumericColumn::Fnlwgt,
        NumericColumn::HoursPerWeek,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::Age => "age",
            NumericColumn::CapitalLoss => "capital-loss",
            NumericColumn::CapitalGain => "capital-gain",
            NumericColumn::EducationNum => "education-num",
            NumericColumn::IncomeLabel => "income_label",
            NumericColumn::Fnlwgt => "fnlwgt",
            NumericColumn::HoursPerWeek => "hours-per-week",
        }
    }

    pub fn value(self, record: &Record) -> f64 {
        match self {
            NumericColumn::Age => record.age as f64,
            NumericColumn::CapitalLoss => record.capital_loss as f64,
            NumericColumn::CapitalGain => record.capital_gain as f64,
            NumericColumn::EducationNum => record.education_num as f64,
            NumericColumn::IncomeLabel => record.income.value() as f64,
            NumericColumn::Fnlwgt => record.fnlwgt as f64,
            NumericColumn::HoursPerWeek => record.hours_per_week as f64,
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The full dataset. Built once, never mutated afterwards.
#[derive(Debug)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Table { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct sex values in order of first appearance.
    pub fn sexes(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| Some(r.sex.as_str())))
    }

    /// Distinct non-missing occupations in order of first appearance.
    pub fn occupations(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.occupation.as_deref()))
    }

    /// Income labels present in the table, in order of first appearance.
    pub fn income_labels(&self) -> Vec<IncomeLabel> {
        let mut seen = Vec::with_capacity(2);
        for record in &self.records {
            if !seen.contains(&record.income) {
                seen.push(record.income);
            }
        }
        seen
    }
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values.flatten() {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

pub struct LoadedDataset {
    pub table: Table,
    pub source: PathBuf,
    pub loaded_at: DateTime<Local>,
    pub fetched: bool,
}

/// Make sure the cache file exists, then load it unconditionally.
pub fn load(config: &DatasetConfig) -> Result<LoadedDataset> {
    let fetched = fetch::ensure_cached(config)?;
    let records = read_data(&config.path)?;
    let table = Table::new(records);
    if table.is_empty() {
        warn!(path = %config.path.display(), "Dataset has no rows");
    }
    info!(
        rows = table.len(),
        path = %config.path.display(),
        fetched,
        "Loaded dataset"
    );
    Ok(LoadedDataset {
        table,
        source: config.path.clone(),
        loaded_at: Local::now(),
        fetched,
    })
}
