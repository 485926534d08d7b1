//! Reactive wiring between controls and charts.
//!
//! Each [`Binding`] reads a fixed set of controls and replaces exactly one
//! chart. A control change re-renders only the bindings that read it. Bindings
//! share no state besides the read-only table, so their order is irrelevant.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::aggregate;
use crate::chart::{self, ChartSpec};
use crate::config::UiConfig;
use crate::csv_reader::IncomeLabel;
use crate::dataset::{NumericColumn, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    GenderRadio,
    IncomeDropdown,
    SexDropdown,
    OccupationChecklist,
    EntryIntervalDropdown,
    ParallelDropdown,
}

impl ControlId {
    pub const ALL: [ControlId; 6] = [
        ControlId::GenderRadio,
        ControlId::IncomeDropdown,
        ControlId::SexDropdown,
        ControlId::OccupationChecklist,
        ControlId::EntryIntervalDropdown,
        ControlId::ParallelDropdown,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ControlId::GenderRadio => "gender-radioitems",
            ControlId::IncomeDropdown => "income-dropdown",
            ControlId::SexDropdown => "sex-dropdown",
            ControlId::OccupationChecklist => "occupation-checklist",
            ControlId::EntryIntervalDropdown => "entry-interval-dropdown",
            ControlId::ParallelDropdown => "parallel-dropdown",
        }
    }

    pub fn is_multi(self) -> bool {
        matches!(self, ControlId::OccupationChecklist | ControlId::ParallelDropdown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartTarget {
    EducationBar,
    IncomePie,
    Heatmap,
    GroupedBar,
    ParallelCoordinates,
}

impl ChartTarget {
    pub fn id(self) -> &'static str {
        match self {
            ChartTarget::EducationBar => "bar-chart",
            ChartTarget::IncomePie => "pie-chart",
            ChartTarget::Heatmap => "heatmap",
            ChartTarget::GroupedBar => "grouped-bar-chart",
            ChartTarget::ParallelCoordinates => "parallel-coordinates",
        }
    }
}

/// Entry-count thresholds offered by the entry-interval control.
pub fn entry_intervals() -> Vec<u32> {
    (5..50).step_by(5).map(|i| i * 1000).collect()
}

/// Current value of every control.
#[derive(Debug, Clone, PartialEq)]
pub struct Selections {
    pub gender: String,
    pub heatmap_income: IncomeLabel,
    pub heatmap_sex: String,
    pub occupations: Vec<String>,
    /// Not read by any binding.
    pub entry_interval: u32,
    pub parallel_columns: Vec<NumericColumn>,
}

impl Selections {
    pub fn from_config(ui: &UiConfig) -> Self {
        let heatmap_income = IncomeLabel::parse(&ui.default_income).unwrap_or_else(|| {
            warn!(value = %ui.default_income, "Unknown default income, using <=50K");
            IncomeLabel::AtMost50K
        });
        Selections {
            gender: ui.default_gender.clone(),
            heatmap_income,
            heatmap_sex: ui.default_sex.clone(),
            occupations: ui.default_occupations.clone(),
            entry_interval: 5000,
            parallel_columns: NumericColumn::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlChange {
    Gender(String),
    HeatmapIncome(IncomeLabel),
    HeatmapSex(String),
    Occupations(Vec<String>),
    EntryInterval(u32),
    ParallelColumns(Vec<NumericColumn>),
}

impl ControlChange {
    pub fn control(&self) -> ControlId {
        match self {
            ControlChange::Gender(_) => ControlId::GenderRadio,
            ControlChange::HeatmapIncome(_) => ControlId::IncomeDropdown,
            ControlChange::HeatmapSex(_) => ControlId::SexDropdown,
            ControlChange::Occupations(_) => ControlId::OccupationChecklist,
            ControlChange::EntryInterval(_) => ControlId::EntryIntervalDropdown,
            ControlChange::ParallelColumns(_) => ControlId::ParallelDropdown,
        }
    }

    fn apply_to(self, selections: &mut Selections) {
        match self {
            ControlChange::Gender(v) => selections.gender = v,
            ControlChange::HeatmapIncome(v) => selections.heatmap_income = v,
            ControlChange::HeatmapSex(v) => selections.heatmap_sex = v,
            ControlChange::Occupations(v) => selections.occupations = v,
            ControlChange::EntryInterval(v) => selections.entry_interval = v,
            ControlChange::ParallelColumns(v) => selections.parallel_columns = v,
        }
    }
}

pub struct Binding {
    pub target: ChartTarget,
    /// Controls whose change re-renders `target`. Empty means render once.
    pub inputs: &'static [ControlId],
    pub render: fn(&Table, &Selections) -> ChartSpec,
}

pub static BINDINGS: [Binding; 5] = [
    Binding {
        target: ChartTarget::EducationBar,
        inputs: &[],
        render: render_education_bar,
    },
    Binding {
        target: ChartTarget::IncomePie,
        inputs: &[ControlId::GenderRadio],
        render: render_income_pie,
    },
    Binding {
        target: ChartTarget::Heatmap,
        inputs: &[ControlId::IncomeDropdown, ControlId::SexDropdown],
        render: render_heatmap,
    },
    Binding {
        target: ChartTarget::GroupedBar,
        inputs: &[ControlId::OccupationChecklist],
        render: render_grouped_bar,
    },
    Binding {
        target: ChartTarget::ParallelCoordinates,
        inputs: &[ControlId::ParallelDropdown],
        render: render_parallel,
    },
];

fn render_education_bar(table: &Table, _: &Selections) -> ChartSpec {
    chart::education_bar(&aggregate::income_by_education(table))
}

fn render_income_pie(table: &Table, selections: &Selections) -> ChartSpec {
    let counts = aggregate::income_distribution_for_sex(table, &selections.gender);
    chart::income_pie(&selections.gender, &counts)
}

fn render_heatmap(table: &Table, selections: &Selections) -> ChartSpec {
    let cells = aggregate::hours_by_education_and_occupation(
        table,
        selections.heatmap_income,
        &selections.heatmap_sex,
    );
    chart::hours_heatmap(&cells)
}

fn render_grouped_bar(table: &Table, selections: &Selections) -> ChartSpec {
    chart::grouped_bar(&aggregate::income_by_occupation_and_education(table, &selections.occupations))
}

fn render_parallel(table: &Table, selections: &Selections) -> ChartSpec {
    chart::parallel_coordinates(&aggregate::project_numeric(table, &selections.parallel_columns))
}

/// Displayed charts plus the selections that produced them.
pub struct Dashboard<'a> {
    table: &'a Table,
    selections: Selections,
    charts: HashMap<ChartTarget, ChartSpec>,
}

impl<'a> Dashboard<'a> {
    /// Render every binding once with the initial selections.
    pub fn new(table: &'a Table, selections: Selections) -> Self {
        let mut dashboard = Dashboard { table, selections, charts: HashMap::new() };
        for binding in BINDINGS.iter() {
            dashboard.render(binding);
        }
        dashboard
    }

    /// Record a control change and re-render the charts bound to it.
    /// Returns the replaced targets.
    pub fn apply(&mut self, change: ControlChange) -> Vec<ChartTarget> {
        let control = change.control();
        change.apply_to(&mut self.selections);

        let mut updated = Vec::new();
        for binding in BINDINGS.iter().filter(|b| b.inputs.contains(&control)) {
            self.render(binding);
            updated.push(binding.target);
        }
        if updated.is_empty() {
            debug!(control = control.id(), "No chart bound to control");
        }
        updated
    }

    fn render(&mut self, binding: &Binding) {
        let started = Instant::now();
        let spec = (binding.render)(self.table, &self.selections);
        debug!(
            target_id = binding.target.id(),
            empty = spec.is_empty(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Rendered chart"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            match serde_json::to_string(&spec) {
                Ok(json) => trace!(target_id = binding.target.id(), %json, "Chart spec"),
                Err(e) => warn!(error = %e, "Could not serialize chart spec"),
            }
        }
        self.charts.insert(binding.target, spec);
    }

    pub fn chart(&self, target: ChartTarget) -> Option<&ChartSpec> {
        self.charts.get(&target)
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn table(&self) -> &Table {
        self.table
    }
}
