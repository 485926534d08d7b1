//! Chart specifications and the renderers that build them from aggregates.
//!
//! A spec is plain data: titles, axis labels, colors and values. Styling is
//! fixed, so the same aggregate always yields the same spec. The terminal UI
//! draws specs; `--debug` logs them as JSON.

use serde::{Serialize, Serializer};

use crate::aggregate::{EducationIncome, HoursCell, IncomeCount, OccupationEducationIncome, Projection};
use crate::csv_reader::IncomeLabel;
use crate::dataset::NumericColumn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("rgb({}, {}, {})", self.0, self.1, self.2))
    }
}

pub const SKYBLUE: Rgb = Rgb(135, 206, 235);
pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const WHITE: Rgb = Rgb(255, 255, 255);
pub const DARKGREY: Rgb = Rgb(169, 169, 169);
pub const LIGHTGREY: Rgb = Rgb(211, 211, 211);

/// Qualitative pastel palette.
pub const PASTEL: [Rgb; 11] = [
    Rgb(102, 197, 204),
    Rgb(246, 207, 113),
    Rgb(248, 156, 116),
    Rgb(220, 176, 242),
    Rgb(135, 197, 95),
    Rgb(158, 185, 243),
    Rgb(254, 136, 177),
    Rgb(201, 219, 116),
    Rgb(139, 224, 164),
    Rgb(180, 151, 231),
    Rgb(179, 179, 179),
];

/// Brown to blue-green diverging scale.
pub const BRBG: [Rgb; 11] = [
    Rgb(84, 48, 5),
    Rgb(140, 81, 10),
    Rgb(191, 129, 45),
    Rgb(223, 194, 125),
    Rgb(246, 232, 195),
    Rgb(245, 245, 245),
    Rgb(199, 234, 229),
    Rgb(128, 205, 193),
    Rgb(53, 151, 143),
    Rgb(1, 102, 94),
    Rgb(0, 60, 48),
];

/// Teal to rose diverging scale.
pub const TEALROSE: [Rgb; 7] = [
    Rgb(0, 147, 146),
    Rgb(114, 170, 161),
    Rgb(177, 199, 179),
    Rgb(241, 234, 200),
    Rgb(229, 185, 173),
    Rgb(217, 137, 148),
    Rgb(208, 88, 126),
];

/// Pick the color for `t` in `[0, 1]` from a discrete scale.
pub fn scale_color(scale: &[Rgb], t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let idx = (t * (scale.len() - 1) as f64).round() as usize;
    scale[idx.min(scale.len() - 1)]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub plot_bgcolor: Rgb,
    pub paper_bgcolor: Rgb,
}

impl Layout {
    fn new(title: impl Into<String>, plot_bgcolor: Rgb) -> Self {
        Layout {
            title: title.into(),
            x_title: None,
            y_title: None,
            plot_bgcolor,
            paper_bgcolor: LIGHTGREY,
        }
    }

    fn axes(mut self, x: &str, y: &str) -> Self {
        self.x_title = Some(x.to_string());
        self.y_title = Some(y.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarMarker {
    pub color: Rgb,
    pub line_color: Rgb,
    pub line_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSpec {
    pub layout: Layout,
    pub marker: BarMarker,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: usize,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSpec {
    pub layout: Layout,
    pub slices: Vec<Slice>,
}

impl PieSpec {
    pub fn total(&self) -> usize {
        self.slices.iter().map(|s| s.value).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub color: Rgb,
    pub points: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedBarSpec {
    pub layout: Layout,
    pub legend_title: String,
    /// Union of the x categories of all series, sorted.
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapSpec {
    pub layout: Layout,
    pub colorbar_title: String,
    pub color_scale: Vec<Rgb>,
    pub x: Vec<String>,
    pub y: Vec<String>,
    /// `z[row][col]` for `y[row]`, `x[col]`; `None` where no group exists.
    pub z: Vec<Vec<Option<f64>>>,
    pub z_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub column: NumericColumn,
    pub label: String,
    pub range: (f64, f64),
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParallelSpec {
    pub layout: Layout,
    pub color_column: NumericColumn,
    pub color_scale: Vec<Rgb>,
    pub dimensions: Vec<Dimension>,
}

impl ParallelSpec {
    pub fn line_count(&self) -> usize {
        self.dimensions.first().map_or(0, |d| d.values.len())
    }

    pub fn color_values(&self) -> &[f64] {
        self.dimensions
            .iter()
            .find(|d| d.column == self.color_column)
            .map(|d| d.values.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Bar(BarSpec),
    Pie(PieSpec),
    GroupedBar(GroupedBarSpec),
    Heatmap(HeatmapSpec),
    ParallelCoordinates(ParallelSpec),
}

impl ChartSpec {
    pub fn layout(&self) -> &Layout {
        match self {
            ChartSpec::Bar(spec) => &spec.layout,
            ChartSpec::Pie(spec) => &spec.layout,
            ChartSpec::GroupedBar(spec) => &spec.layout,
            ChartSpec::Heatmap(spec) => &spec.layout,
            ChartSpec::ParallelCoordinates(spec) => &spec.layout,
        }
    }

    pub fn title(&self) -> &str {
        &self.layout().title
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ChartSpec::Bar(spec) => spec.categories.is_empty(),
            ChartSpec::Pie(spec) => spec.slices.is_empty(),
            ChartSpec::GroupedBar(spec) => spec.series.is_empty(),
            ChartSpec::Heatmap(spec) => spec.x.is_empty(),
            ChartSpec::ParallelCoordinates(spec) => spec.line_count() == 0,
        }
    }
}

pub fn education_bar(rows: &[EducationIncome]) -> ChartSpec {
    ChartSpec::Bar(BarSpec {
        layout: Layout::new("Proportion Earning >50K by Education Level", DARKGREY)
            .axes("Education Level", "Proportion Earning >50K"),
        marker: BarMarker { color: SKYBLUE, line_color: BLACK, line_width: 1.5 },
        categories: rows.iter().map(|r| r.education.clone()).collect(),
        values: rows.iter().map(|r| r.proportion_over_50k).collect(),
    })
}

pub fn income_pie(sex: &str, counts: &[IncomeCount]) -> ChartSpec {
    ChartSpec::Pie(PieSpec {
        layout: Layout::new(format!("Income Distribution for {}", sex), WHITE),
        slices: counts
            .iter()
            .map(|c| Slice {
                label: c.income.label().to_string(),
                value: c.count,
                color: income_color(c.income),
            })
            .collect(),
    })
}

fn income_color(income: IncomeLabel) -> Rgb {
    PASTEL[income.value() as usize]
}

pub fn grouped_bar(rows: &[OccupationEducationIncome]) -> ChartSpec {
    let mut categories: Vec<String> = rows.iter().map(|r| r.education.clone()).collect();
    categories.sort();
    categories.dedup();

    // rows arrive sorted by occupation, so each series is one contiguous run
    let mut series: Vec<Series> = Vec::new();
    for row in rows {
        let start_new = series.last().map_or(true, |s| s.name != row.occupation);
        if start_new {
            series.push(Series {
                name: row.occupation.clone(),
                color: PASTEL[series.len() % PASTEL.len()],
                points: Vec::new(),
            });
        }
        if let Some(current) = series.last_mut() {
            current.points.push((row.education.clone(), row.proportion_over_50k));
        }
    }

    ChartSpec::GroupedBar(GroupedBarSpec {
        layout: Layout::new("Income by Occupation and Education", DARKGREY)
            .axes("Education Level", "Proportion Earning >50K"),
        legend_title: "Occupation".to_string(),
        categories,
        series,
    })
}

pub fn hours_heatmap(cells: &[HoursCell]) -> ChartSpec {
    let mut x: Vec<String> = cells.iter().map(|c| c.education.clone()).collect();
    x.sort();
    x.dedup();
    let mut y: Vec<String> = cells.iter().map(|c| c.occupation.clone()).collect();
    y.sort();
    y.dedup();

    let mut z = vec![vec![None; x.len()]; y.len()];
    let mut z_range: Option<(f64, f64)> = None;
    for cell in cells {
        let (Ok(col), Ok(row)) = (x.binary_search(&cell.education), y.binary_search(&cell.occupation)) else {
            continue;
        };
        z[row][col] = Some(cell.mean_hours);
        z_range = Some(match z_range {
            Some((lo, hi)) => (lo.min(cell.mean_hours), hi.max(cell.mean_hours)),
            None => (cell.mean_hours, cell.mean_hours),
        });
    }

    ChartSpec::Heatmap(HeatmapSpec {
        layout: Layout::new(
            "Average Hours per Week by Education and Occupation based on Income Level",
            DARKGREY,
        )
        .axes("Education", "Occupation"),
        colorbar_title: "Avg # of hrs/week".to_string(),
        color_scale: BRBG.to_vec(),
        x,
        y,
        z,
        z_range,
    })
}

pub fn parallel_coordinates(projection: &Projection) -> ChartSpec {
    let dimensions = projection
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let values: Vec<f64> = projection.rows.iter().map(|row| row[i]).collect();
            let range = values.iter().fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            });
            Dimension {
                column: *column,
                label: column.name().to_string(),
                range: range.unwrap_or((0.0, 0.0)),
                values,
            }
        })
        .collect();

    ChartSpec::ParallelCoordinates(ParallelSpec {
        layout: Layout::new("Parallel Coordinates Plot", DARKGREY),
        color_column: NumericColumn::IncomeLabel,
        color_scale: TEALROSE.to_vec(),
        dimensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{
        hours_by_education_and_occupation, income_by_education, income_by_occupation_and_education,
        income_distribution_for_sex, project_numeric,
    };
    use crate::dataset::fixtures::synthetic_table;

    #[test]
    fn test_education_bar_styling_and_values() {
        let table = synthetic_table();
        let ChartSpec::Bar(spec) = education_bar(&income_by_education(&table)) else {
            panic!("expected bar chart");
        };
        assert_eq!(spec.categories, vec!["Bachelors", "HS-grad", "Masters", "Some-college"]);
        assert_eq!(spec.values[1], 0.25);
        assert_eq!(spec.marker.color, SKYBLUE);
        assert_eq!(spec.marker.line_width, 1.5);
        assert_eq!(spec.layout.plot_bgcolor, DARKGREY);
        assert_eq!(spec.layout.paper_bgcolor, LIGHTGREY);
        assert_eq!(spec.layout.x_title.as_deref(), Some("Education Level"));
    }

    #[test]
    fn test_income_pie_labels_and_title() {
        let table = synthetic_table();
        let ChartSpec::Pie(spec) = income_pie("Female", &income_distribution_for_sex(&table, "Female")) else {
            panic!("expected pie chart");
        };
        assert_eq!(spec.layout.title, "Income Distribution for Female");
        assert_eq!(spec.layout.plot_bgcolor, WHITE);
        let labels: Vec<&str> = spec.slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["<=50K", ">50K"]);
        assert_eq!(spec.total(), 5);
        assert_eq!(spec.slices[0].color, PASTEL[0]);
    }

    #[test]
    fn test_grouped_bar_one_series_per_occupation() {
        let table = synthetic_table();
        let rows = income_by_occupation_and_education(
            &table,
            &["Exec-managerial".to_string(), "Prof-specialty".to_string()],
        );
        let ChartSpec::GroupedBar(spec) = grouped_bar(&rows) else {
            panic!("expected grouped bar chart");
        };
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].name, "Exec-managerial");
        assert_eq!(
            spec.series[0].points,
            vec![("Bachelors".to_string(), 0.5), ("Masters".to_string(), 1.0)]
        );
        assert_eq!(spec.series[1].color, PASTEL[1]);
        assert_eq!(spec.categories, vec!["Bachelors", "Masters"]);
        assert_eq!(spec.legend_title, "Occupation");
    }

    #[test]
    fn test_heatmap_grid() {
        let table = synthetic_table();
        let cells = hours_by_education_and_occupation(&table, IncomeLabel::AtMost50K, "Male");
        let ChartSpec::Heatmap(spec) = hours_heatmap(&cells) else {
            panic!("expected heatmap");
        };
        assert_eq!(spec.x, vec!["Bachelors", "HS-grad"]);
        assert_eq!(spec.y, vec!["Exec-managerial", "Handlers-cleaners"]);
        assert_eq!(spec.z, vec![vec![Some(40.0), None], vec![None, Some(40.0)]]);
        assert_eq!(spec.z_range, Some((40.0, 40.0)));
        assert_eq!(spec.colorbar_title, "Avg # of hrs/week");
    }

    #[test]
    fn test_empty_inputs_render_empty_charts() {
        let table = synthetic_table();
        let cells = hours_by_education_and_occupation(&table, IncomeLabel::Over50K, "Nobody");
        let heatmap = hours_heatmap(&cells);
        assert!(heatmap.is_empty());
        if let ChartSpec::Heatmap(spec) = &heatmap {
            assert!(spec.z.is_empty());
            assert_eq!(spec.z_range, None);
        }
        assert!(income_pie("Nobody", &[]).is_empty());
        assert!(grouped_bar(&[]).is_empty());
        assert!(education_bar(&[]).is_empty());
    }

    #[test]
    fn test_parallel_coordinates_dimensions() {
        let table = synthetic_table();
        let projection = project_numeric(&table, &[NumericColumn::Age]);
        let ChartSpec::ParallelCoordinates(spec) = parallel_coordinates(&projection) else {
            panic!("expected parallel coordinates");
        };
        let labels: Vec<&str> = spec.dimensions.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["age", "income_label"]);
        assert_eq!(spec.dimensions[0].range, (19.0, 52.0));
        assert_eq!(spec.line_count(), 10);
        assert_eq!(spec.color_values().len(), 10);
        assert_eq!(spec.color_scale, TEALROSE.to_vec());
    }

    #[test]
    fn test_renderers_are_deterministic() {
        let table = synthetic_table();
        let rows = income_by_education(&table);
        assert_eq!(education_bar(&rows), education_bar(&rows));
        let projection = project_numeric(&table, &NumericColumn::ALL);
        assert_eq!(parallel_coordinates(&projection), parallel_coordinates(&projection));
    }

    #[test]
    fn test_spec_serializes_with_kind_tag() {
        let spec = income_pie("Male", &[IncomeCount { income: IncomeLabel::Over50K, count: 3 }]);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "pie");
        assert_eq!(json["layout"]["paper_bgcolor"], "rgb(211, 211, 211)");
        assert_eq!(json["slices"][0]["label"], ">50K");
        assert_eq!(json["slices"][0]["value"], 3);
    }

    #[test]
    fn test_scale_color_clamps() {
        assert_eq!(scale_color(&BRBG, -1.0), BRBG[0]);
        assert_eq!(scale_color(&BRBG, 2.0), BRBG[10]);
        assert_eq!(scale_color(&BRBG, 0.5), BRBG[5]);
        assert_eq!(scale_color(&BRBG, f64::NAN), BRBG[0]);
    }
}
