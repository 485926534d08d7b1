//! Group-by aggregations over the immutable [`Table`].
//!
//! Every function takes the table by reference plus the current filter
//! selection and builds a fresh aggregate. Nothing is cached between calls.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::csv_reader::{IncomeLabel, Record};
use crate::dataset::{NumericColumn, Table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationIncome {
    pub education: String,
    pub proportion_over_50k: f64,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeCount {
    pub income: IncomeLabel,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationEducationIncome {
    pub occupation: String,
    pub education: String,
    pub proportion_over_50k: f64,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoursCell {
    pub education: String,
    pub occupation: String,
    pub mean_hours: f64,
}

/// Column projection used by the parallel-coordinates chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub columns: Vec<NumericColumn>,
    pub rows: Vec<Vec<f64>>,
}

#[derive(Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Mean of `value` per key, keys sorted. Rows for which `key` is `None` are skipped.
fn mean_by<'a, K, I, F, V>(rows: I, key: F, value: V) -> BTreeMap<K, Mean>
where
    K: Ord,
    I: Iterator<Item = &'a Record>,
    F: Fn(&'a Record) -> Option<K>,
    V: Fn(&'a Record) -> f64,
{
    let mut groups: BTreeMap<K, Mean> = BTreeMap::new();
    for record in rows {
        if let Some(k) = key(record) {
            groups.entry(k).or_default().add(value(record));
        }
    }
    groups
}

fn income_value(record: &Record) -> f64 {
    record.income.value() as f64
}

/// Proportion of rows earning >50K per education level.
pub fn income_by_education(table: &Table) -> Vec<EducationIncome> {
    mean_by(table.records().iter(), |r| Some(r.education.as_str()), income_value)
        .into_iter()
        .map(|(education, mean)| EducationIncome {
            education: education.to_string(),
            proportion_over_50k: mean.value(),
            rows: mean.count,
        })
        .collect()
}

/// Row count per income label among rows of one sex, largest first.
/// An unknown sex matches nothing.
pub fn income_distribution_for_sex(table: &Table, sex: &str) -> Vec<IncomeCount> {
    let mut counts: BTreeMap<IncomeLabel, usize> = BTreeMap::new();
    for record in table.records().iter().filter(|r| r.sex == sex) {
        *counts.entry(record.income).or_default() += 1;
    }
    let mut out: Vec<IncomeCount> = counts
        .into_iter()
        .map(|(income, count)| IncomeCount { income, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then(a.income.cmp(&b.income)));
    out
}

/// Proportion earning >50K per (occupation, education) for the selected
/// occupations. Rows with a missing occupation never match.
pub fn income_by_occupation_and_education(table: &Table, occupations: &[String]) -> Vec<OccupationEducationIncome> {
    if occupations.is_empty() {
        return Vec::new();
    }
    let rows = table.records().iter().filter(|r| {
        r.occupation
            .as_ref()
            .map_or(false, |o| occupations.iter().any(|s| s == o))
    });
    mean_by(
        rows,
        |r| r.occupation.as_deref().map(|o| (o, r.education.as_str())),
        income_value,
    )
    .into_iter()
    .map(|((occupation, education), mean)| OccupationEducationIncome {
        occupation: occupation.to_string(),
        education: education.to_string(),
        proportion_over_50k: mean.value(),
        rows: mean.count,
    })
    .collect()
}

/// Mean hours-per-week per (education, occupation) among rows with the given
/// income label and sex.
pub fn hours_by_education_and_occupation(table: &Table, income: IncomeLabel, sex: &str) -> Vec<HoursCell> {
    let rows = table
        .records()
        .iter()
        .filter(|r| r.income == income && r.sex == sex);
    mean_by(
        rows,
        |r| r.occupation.as_deref().map(|o| (r.education.as_str(), o)),
        |r| r.hours_per_week as f64,
    )
    .into_iter()
    .map(|((education, occupation), mean)| HoursCell {
        education: education.to_string(),
        occupation: occupation.to_string(),
        mean_hours: mean.value(),
    })
    .collect()
}

/// Project every row onto `selected` plus the income label, columns in
/// canonical order.
pub fn project_numeric(table: &Table, selected: &[NumericColumn]) -> Projection {
    let columns: Vec<NumericColumn> = NumericColumn::ALL
        .iter()
        .copied()
        .filter(|c| *c == NumericColumn::IncomeLabel || selected.contains(c))
        .collect();
    let rows = table
        .records()
        .iter()
        .map(|r| columns.iter().map(|c| c.value(r)).collect())
        .collect();
    Projection { columns, rows }
}
