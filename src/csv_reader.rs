use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Binary income target. `0` is "<=50K", `1` is ">50K".
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IncomeLabel {
    AtMost50K,
    Over50K,
}

impl IncomeLabel {
    pub fn value(self) -> u8 {
        match self {
            IncomeLabel::AtMost50K => 0,
            IncomeLabel::Over50K => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IncomeLabel::AtMost50K => "<=50K",
            IncomeLabel::Over50K => ">50K",
        }
    }

    /// Accepts the raw UCI spellings, including the dotted variants of the
    /// test split, and the already normalized `0`/`1`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "<=50K" | "<=50K." | "0" => Some(IncomeLabel::AtMost50K),
            ">50K" | ">50K." | "1" => Some(IncomeLabel::Over50K),
            _ => None,
        }
    }
}

impl fmt::Display for IncomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One row as it appears in the cached CSV.
#[derive(Debug, Deserialize)]
struct RawRecord {
    age: u32,
    workclass: Option<String>,
    fnlwgt: u64,
    education: String,
    #[serde(rename = "education-num")]
    education_num: u32,
    #[serde(rename = "marital-status")]
    marital_status: Option<String>,
    occupation: Option<String>,
    relationship: Option<String>,
    race: Option<String>,
    sex: String,
    #[serde(rename = "capital-gain")]
    capital_gain: u64,
    #[serde(rename = "capital-loss")]
    capital_loss: u64,
    #[serde(rename = "hours-per-week")]
    hours_per_week: u32,
    #[serde(rename = "native-country")]
    native_country: Option<String>,
    income_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub age: u32,
    pub workclass: Option<String>,
    pub fnlwgt: u64,
    pub education: String,
    pub education_num: u32,
    pub marital_status: Option<String>,
    pub occupation: Option<String>,
    pub relationship: Option<String>,
    pub race: Option<String>,
    pub sex: String,
    pub capital_gain: u64,
    pub capital_loss: u64,
    pub hours_per_week: u32,
    pub native_country: Option<String>,
    pub income: IncomeLabel,
}

// The UCI files mark unknown categories with `?`.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "?")
}

impl RawRecord {
    fn normalize(self, line: u64) -> Result<Record> {
        let income = IncomeLabel::parse(&self.income_label).ok_or_else(|| {
            DashboardError::UnknownIncomeLabel { line, value: self.income_label.clone() }
        })?;
        Ok(Record {
            age: self.age,
            workclass: present(self.workclass),
            fnlwgt: self.fnlwgt,
            education: self.education,
            education_num: self.education_num,
            marital_status: present(self.marital_status),
            occupation: present(self.occupation),
            relationship: present(self.relationship),
            race: present(self.race),
            sex: self.sex,
            capital_gain: self.capital_gain,
            capital_loss: self.capital_loss,
            hours_per_week: self.hours_per_week,
            native_country: present(self.native_country),
            income,
        })
    }
}

pub fn read_data(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path)?;
    read_records(file)
}

pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut row = csv::StringRecord::new();
    let mut records = Vec::<Record>::new();
    while rdr.read_record(&mut row)? {
        // physical line the row starts on; quoted fields may span several
        let line = row.position().map_or(0, |p| p.line());
        let raw: RawRecord = row.deserialize(Some(&headers))?;
        records.push(raw.normalize(line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "age,workclass,fnlwgt,education,education-num,marital-status,occupation,relationship,race,sex,capital-gain,capital-loss,hours-per-week,native-country,income_label";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_income_labels_normalize_to_binary() {
        let data = csv_with(&[
            "39,State-gov,77516,Bachelors,13,Never-married,Adm-clerical,Not-in-family,White,Male,2174,0,40,United-States,<=50K",
            "50,Self-emp-not-inc,83311,Bachelors,13,Married-civ-spouse,Exec-managerial,Husband,White,Male,0,0,13,United-States,>50K",
            "38,Private,215646,HS-grad,9,Divorced,Handlers-cleaners,Not-in-family,White,Male,0,0,40,United-States,<=50K.",
            "53,Private,234721,11th,7,Married-civ-spouse,Handlers-cleaners,Husband,Black,Male,0,0,40,United-States,>50K.",
            "28,Private,338409,Bachelors,13,Married-civ-spouse,Prof-specialty,Wife,Black,Female,0,0,40,Cuba,1",
            "37,Private,284582,Masters,14,Married-civ-spouse,Exec-managerial,Wife,White,Female,0,0,40,United-States,0",
        ]);
        let records = read_records(data.as_bytes()).unwrap();
        let labels: Vec<u8> = records.iter().map(|r| r.income.value()).collect();
        assert_eq!(labels, vec![0, 1, 0, 1, 1, 0]);
        assert!(records.iter().all(|r| r.income.value() <= 1));
    }

    #[test]
    fn test_unknown_income_label_is_rejected() {
        let data = csv_with(&[
            "39,State-gov,77516,Bachelors,13,Never-married,Adm-clerical,Not-in-family,White,Male,2174,0,40,United-States,<=50K",
            "39,State-gov,77516,Bachelors,13,Never-married,Adm-clerical,Not-in-family,White,Male,2174,0,40,United-States,maybe",
        ]);
        match read_records(data.as_bytes()) {
            Err(DashboardError::UnknownIncomeLabel { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "maybe");
            }
            other => panic!("expected UnknownIncomeLabel, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_income_label_line_counts_multiline_fields() {
        let data = csv_with(&[
            "39,State-gov,77516,Bachelors,13,Never-married,Adm-clerical,Not-in-family,White,Male,2174,0,40,\"United-\nStates\",<=50K",
            "39,State-gov,77516,Bachelors,13,Never-married,Adm-clerical,Not-in-family,White,Male,2174,0,40,United-States,maybe",
        ]);
        match read_records(data.as_bytes()) {
            Err(DashboardError::UnknownIncomeLabel { line, value }) => {
                // header on 1, the first row on 2 and 3
                assert_eq!(line, 4);
                assert_eq!(value, "maybe");
            }
            other => panic!("expected UnknownIncomeLabel, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_categories_become_none() {
        let data = csv_with(&[
            "54,?,180211,Some-college,10,Married-civ-spouse,?,Husband,Asian-Pac-Islander,Male,0,0,60,South,>50K",
            "32,,180211, HS-grad ,9,Never-married,,Unmarried,White,Female,0,0,40,,<=50K",
        ]);
        let records = read_records(data.as_bytes()).unwrap();
        assert_eq!(records[0].workclass, None);
        assert_eq!(records[0].occupation, None);
        assert_eq!(records[1].occupation, None);
        assert_eq!(records[1].native_country, None);
        assert_eq!(records[1].education, "HS-grad");
    }

    #[test]
    fn test_read_data_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            csv_with(&["25,Private,226802,11th,7,Never-married,Machine-op-inspct,Own-child,Black,Male,0,0,40,United-States,<=50K"])
        )
        .unwrap();
        let records = read_data(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].occupation.as_deref(), Some("Machine-op-inspct"));
        assert_eq!(records[0].hours_per_week, 40);
    }

    #[test]
    fn test_read_data_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_data(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DashboardError::Io(_)));
    }
}
