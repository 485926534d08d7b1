use crossterm::event::KeyCode;

use crate::bindings::{entry_intervals, ControlChange, ControlId, Selections};
use crate::csv_reader::IncomeLabel;
use crate::dataset::{NumericColumn, Table};

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Text(String),
    Income(IncomeLabel),
    Count(u32),
    Column(NumericColumn),
}

#[derive(Debug, Clone)]
pub struct ControlOption {
    pub label: String,
    pub value: OptionValue,
}

impl ControlOption {
    fn text(value: &str) -> Self {
        ControlOption { label: value.to_string(), value: OptionValue::Text(value.to_string()) }
    }
}

#[derive(Debug, Clone)]
pub struct Control {
    pub id: ControlId,
    pub title: &'static str,
    pub options: Vec<ControlOption>,
    pub cursor: usize,
}

/// Focus and cursor state of the six page controls. Selected values live in
/// [`Selections`]; the panel only turns keys into [`ControlChange`]s.
pub struct ControlPanel {
    controls: Vec<Control>,
    focus: usize,
}

impl ControlPanel {
    pub fn new(table: &Table) -> Self {
        let sexes: Vec<ControlOption> = table.sexes().iter().map(|s| ControlOption::text(s)).collect();
        let controls = ControlId::ALL
            .iter()
            .map(|&id| {
                let (title, options) = match id {
                    ControlId::GenderRadio => ("Gender", sexes.clone()),
                    ControlId::IncomeDropdown => (
                        "Income",
                        table
                            .income_labels()
                            .into_iter()
                            .map(|i| ControlOption { label: i.label().to_string(), value: OptionValue::Income(i) })
                            .collect(),
                    ),
                    ControlId::SexDropdown => ("Sex", sexes.clone()),
                    ControlId::OccupationChecklist => (
                        "Occupations",
                        table.occupations().iter().map(|o| ControlOption::text(o)).collect(),
                    ),
                    ControlId::EntryIntervalDropdown => (
                        "Entries",
                        entry_intervals()
                            .into_iter()
                            .map(|v| ControlOption {
                                label: format!("{},000 Entries", v / 1000),
                                value: OptionValue::Count(v),
                            })
                            .collect(),
                    ),
                    ControlId::ParallelDropdown => (
                        "Parallel axes",
                        NumericColumn::ALL
                            .iter()
                            .map(|&c| ControlOption { label: c.name().to_string(), value: OptionValue::Column(c) })
                            .collect(),
                    ),
                };
                Control { id, title, options, cursor: 0 }
            })
            .collect();
        ControlPanel { controls, focus: 0 }
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn focused(&self) -> ControlId {
        self.controls[self.focus].id
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.controls.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.controls.len() - 1) % self.controls.len();
    }

    /// Navigation keys return `None`; selecting or toggling an option returns
    /// the change, unless it would leave the selection as it is.
    pub fn handle_key(&mut self, code: KeyCode, selections: &Selections) -> Option<ControlChange> {
        match code {
            KeyCode::Tab => {
                self.focus_next();
                None
            }
            KeyCode::BackTab => {
                self.focus_prev();
                None
            }
            KeyCode::Right => {
                let control = &mut self.controls[self.focus];
                if !control.options.is_empty() {
                    control.cursor = (control.cursor + 1) % control.options.len();
                }
                None
            }
            KeyCode::Left => {
                let control = &mut self.controls[self.focus];
                if !control.options.is_empty() {
                    control.cursor = (control.cursor + control.options.len() - 1) % control.options.len();
                }
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let control = &self.controls[self.focus];
                let option = control.options.get(control.cursor)?;
                change_for(control.id, selections, &option.value)
            }
            _ => None,
        }
    }
}

pub fn is_selected(id: ControlId, selections: &Selections, value: &OptionValue) -> bool {
    match (id, value) {
        (ControlId::GenderRadio, OptionValue::Text(v)) => selections.gender == *v,
        (ControlId::IncomeDropdown, OptionValue::Income(v)) => selections.heatmap_income == *v,
        (ControlId::SexDropdown, OptionValue::Text(v)) => selections.heatmap_sex == *v,
        (ControlId::OccupationChecklist, OptionValue::Text(v)) => selections.occupations.contains(v),
        (ControlId::EntryIntervalDropdown, OptionValue::Count(v)) => selections.entry_interval == *v,
        (ControlId::ParallelDropdown, OptionValue::Column(c)) => selections.parallel_columns.contains(c),
        _ => false,
    }
}

fn change_for(id: ControlId, selections: &Selections, value: &OptionValue) -> Option<ControlChange> {
    if !id.is_multi() && is_selected(id, selections, value) {
        return None;
    }
    match (id, value) {
        (ControlId::GenderRadio, OptionValue::Text(v)) => Some(ControlChange::Gender(v.clone())),
        (ControlId::IncomeDropdown, OptionValue::Income(v)) => Some(ControlChange::HeatmapIncome(*v)),
        (ControlId::SexDropdown, OptionValue::Text(v)) => Some(ControlChange::HeatmapSex(v.clone())),
        (ControlId::OccupationChecklist, OptionValue::Text(v)) => {
            let mut occupations = selections.occupations.clone();
            match occupations.iter().position(|o| o == v) {
                Some(i) => {
                    occupations.remove(i);
                }
                None => occupations.push(v.clone()),
            }
            Some(ControlChange::Occupations(occupations))
        }
        (ControlId::EntryIntervalDropdown, OptionValue::Count(v)) => Some(ControlChange::EntryInterval(*v)),
        (ControlId::ParallelDropdown, OptionValue::Column(c)) => {
            let mut columns = selections.parallel_columns.clone();
            match columns.iter().position(|x| x == c) {
                Some(i) => {
                    columns.remove(i);
                }
                None => {
                    columns.push(*c);
                    columns.sort();
                }
            }
            Some(ControlChange::ParallelColumns(columns))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiConfig;
    use crate::dataset::fixtures::synthetic_table;

    fn defaults() -> Selections {
        Selections::from_config(&UiConfig::default())
    }

    #[test]
    fn test_panel_options_come_from_table() {
        let table = synthetic_table();
        let panel = ControlPanel::new(&table);
        let counts: Vec<usize> = panel.controls().iter().map(|c| c.options.len()).collect();
        assert_eq!(counts, vec![2, 2, 2, 5, 9, 7]);
        assert_eq!(panel.controls()[4].options[0].label, "5,000 Entries");
        assert_eq!(panel.controls()[4].options[8].label, "45,000 Entries");
    }

    #[test]
    fn test_focus_wraps_both_ways() {
        let table = synthetic_table();
        let mut panel = ControlPanel::new(&table);
        let selections = defaults();
        assert_eq!(panel.focused(), ControlId::GenderRadio);
        assert_eq!(panel.handle_key(KeyCode::BackTab, &selections), None);
        assert_eq!(panel.focused(), ControlId::ParallelDropdown);
        assert_eq!(panel.handle_key(KeyCode::Tab, &selections), None);
        assert_eq!(panel.focused(), ControlId::GenderRadio);
    }

    #[test]
    fn test_radio_select_and_reselect() {
        let table = synthetic_table();
        let mut panel = ControlPanel::new(&table);
        let selections = defaults();
        // "Male" is already selected
        assert_eq!(panel.handle_key(KeyCode::Enter, &selections), None);
        panel.handle_key(KeyCode::Right, &selections);
        assert_eq!(
            panel.handle_key(KeyCode::Enter, &selections),
            Some(ControlChange::Gender("Female".to_string()))
        );
    }

    #[test]
    fn test_checklist_toggles_membership() {
        let table = synthetic_table();
        let mut panel = ControlPanel::new(&table);
        let selections = defaults();
        for _ in 0..3 {
            panel.focus_next();
        }
        assert_eq!(panel.focused(), ControlId::OccupationChecklist);
        // first option, Exec-managerial, is selected by default
        match panel.handle_key(KeyCode::Char(' '), &selections) {
            Some(ControlChange::Occupations(v)) => {
                assert_eq!(v.len(), 3);
                assert!(!v.contains(&"Exec-managerial".to_string()));
            }
            other => panic!("unexpected change {:?}", other),
        }
        // Craft-repair is not
        panel.handle_key(KeyCode::Left, &selections);
        match panel.handle_key(KeyCode::Char(' '), &selections) {
            Some(ControlChange::Occupations(v)) => {
                assert_eq!(v.len(), 5);
                assert_eq!(v.last().map(String::as_str), Some("Craft-repair"));
            }
            other => panic!("unexpected change {:?}", other),
        }
    }

    #[test]
    fn test_parallel_toggle_keeps_canonical_order() {
        let table = synthetic_table();
        let mut panel = ControlPanel::new(&table);
        let mut selections = defaults();
        selections.parallel_columns = vec![NumericColumn::HoursPerWeek];
        panel.focus_prev();
        assert_eq!(panel.focused(), ControlId::ParallelDropdown);
        assert_eq!(
            panel.handle_key(KeyCode::Enter, &selections),
            Some(ControlChange::ParallelColumns(vec![NumericColumn::Age, NumericColumn::HoursPerWeek]))
        );
    }

    #[test]
    fn test_is_selected_ignores_mismatched_values() {
        let selections = defaults();
        assert!(is_selected(ControlId::IncomeDropdown, &selections, &OptionValue::Income(IncomeLabel::AtMost50K)));
        assert!(!is_selected(ControlId::IncomeDropdown, &selections, &OptionValue::Text("<=50K".to_string())));
    }
}
