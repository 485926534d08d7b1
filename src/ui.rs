use std::path::Path;

use chrono::{DateTime, Local};
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Span, Spans},
    widgets::{
        canvas::{Canvas, Line, Points},
        BarChart, Block, Borders, Cell, Paragraph, Row, Table, Wrap,
    },
    Frame,
};

use crate::bindings::{ChartTarget, Dashboard};
use crate::chart::{scale_color, BarMarker, BarSpec, ChartSpec, GroupedBarSpec, HeatmapSpec, ParallelSpec, PieSpec, Rgb};
use crate::controls::{is_selected, ControlPanel};

pub struct Header<'a> {
    pub source: &'a Path,
    pub rows: usize,
    pub loaded_at: DateTime<Local>,
    pub fetched: bool,
}

fn rgb(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

pub fn draw<B: Backend>(
    rect: &mut Frame<B>,
    dashboard: &Dashboard,
    panel: &ControlPanel,
    header: &Header,
    parallel_max_lines: usize,
) {
    let size = rect.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(4),
                Constraint::Length(10),
                Constraint::Percentage(20),
                Constraint::Percentage(25),
                Constraint::Percentage(20),
                Constraint::Min(8),
            ]
            .as_ref(),
        )
        .split(size);

    rect.render_widget(header_widget(header), chunks[0]);
    rect.render_widget(controls_widget(dashboard, panel), chunks[1]);

    draw_chart(rect, chunks[2], dashboard.chart(ChartTarget::EducationBar), parallel_max_lines);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(chunks[3]);
    draw_chart(rect, middle[0], dashboard.chart(ChartTarget::IncomePie), parallel_max_lines);
    draw_chart(rect, middle[1], dashboard.chart(ChartTarget::Heatmap), parallel_max_lines);

    draw_chart(rect, chunks[4], dashboard.chart(ChartTarget::GroupedBar), parallel_max_lines);
    draw_chart(rect, chunks[5], dashboard.chart(ChartTarget::ParallelCoordinates), parallel_max_lines);
}

fn header_widget<'a>(header: &Header) -> Paragraph<'a> {
    let source = if header.fetched { "downloaded" } else { "cached" };
    let lines = vec![
        Spans::from(vec![Span::styled(
            "Income Insights Explorer",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Spans::from(vec![Span::styled(
            format!(
                "{} ({}), {} rows, loaded {}",
                header.source.display(),
                source,
                header.rows,
                header.loaded_at.format("%Y-%m-%d %H:%M:%S")
            ),
            Style::default().fg(Color::DarkGray),
        )]),
    ];
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::BOTTOM))
        .alignment(Alignment::Center)
}

fn controls_widget<'a>(dashboard: &Dashboard, panel: &'a ControlPanel) -> Paragraph<'a> {
    let selections = dashboard.selections();
    let mut lines = Vec::new();
    for control in panel.controls() {
        let focused = control.id == panel.focused();
        let title_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let mut spans = vec![Span::styled(format!("{:<14}", control.title), title_style)];
        for (i, option) in control.options.iter().enumerate() {
            let selected = is_selected(control.id, selections, &option.value);
            let mark = match (control.id.is_multi(), selected) {
                (true, true) => "[x]",
                (true, false) => "[ ]",
                (false, true) => "(*)",
                (false, false) => "( )",
            };
            let mut style = Style::default();
            if focused && i == control.cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(format!("{} {}", mark, option.label), style));
            spans.push(Span::raw("  "));
        }
        lines.push(Spans::from(spans));
    }
    lines.push(Spans::from(vec![Span::styled(
        "Tab/Shift-Tab focus  Left/Right move  Enter/Space select  q quit",
        Style::default().fg(Color::DarkGray),
    )]));
    Paragraph::new(lines)
        .block(Block::default().title("Filters").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

/// Chart title followed by its axis and legend titles.
fn chart_title(spec: &ChartSpec) -> String {
    let layout = spec.layout();
    let mut title = spec.title().to_string();
    if let Some(x) = &layout.x_title {
        title.push_str(&format!("  x: {}", x));
    }
    if let Some(y) = &layout.y_title {
        title.push_str(&format!("  y: {}", y));
    }
    if let ChartSpec::GroupedBar(grouped) = spec {
        title.push_str(&format!("  legend: {}", grouped.legend_title));
    }
    title
}

// the marker outline has no terminal equivalent, so it widens the gap between bars
fn bar_gap(marker: &BarMarker) -> u16 {
    marker.line_width.round().max(1.0) as u16
}

fn chart_block<'a>(spec: &ChartSpec) -> Block<'a> {
    Block::default()
        .title(chart_title(spec))
        .borders(Borders::ALL)
        .style(Style::default().bg(rgb(spec.layout().paper_bgcolor)).fg(Color::Black))
}

fn draw_chart<B: Backend>(rect: &mut Frame<B>, area: Rect, spec: Option<&ChartSpec>, parallel_max_lines: usize) {
    let Some(spec) = spec else {
        rect.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };
    if spec.is_empty() {
        let empty = Paragraph::new("No rows match the current selection")
            .block(chart_block(spec))
            .alignment(Alignment::Center);
        rect.render_widget(empty, area);
        return;
    }
    match spec {
        ChartSpec::Bar(bar) => draw_bar(rect, area, spec, bar),
        ChartSpec::Pie(pie) => draw_pie(rect, area, spec, pie),
        ChartSpec::GroupedBar(grouped) => draw_grouped(rect, area, spec, grouped),
        ChartSpec::Heatmap(heatmap) => draw_heatmap(rect, area, spec, heatmap),
        ChartSpec::ParallelCoordinates(parallel) => draw_parallel(rect, area, spec, parallel, parallel_max_lines),
    }
}

fn draw_bar<B: Backend>(rect: &mut Frame<B>, area: Rect, spec: &ChartSpec, bar: &BarSpec) {
    // proportions as whole percentages
    let data: Vec<(&str, u64)> = bar
        .categories
        .iter()
        .zip(&bar.values)
        .map(|(c, v)| (c.as_str(), (v * 100.0).round() as u64))
        .collect();
    let gap = bar_gap(&bar.marker);
    let bar_width = (area.width.saturating_sub(2) / data.len().max(1) as u16)
        .saturating_sub(gap)
        .max(1);
    let widget = BarChart::default()
        .block(chart_block(spec))
        .data(&data)
        .bar_width(bar_width)
        .bar_gap(gap)
        .max(100)
        .bar_style(Style::default().fg(rgb(bar.marker.color)))
        .value_style(Style::default().fg(rgb(bar.marker.line_color)).bg(rgb(bar.marker.color)))
        .label_style(Style::default().fg(Color::Black));
    rect.render_widget(widget, area);
}

fn draw_pie<B: Backend>(rect: &mut Frame<B>, area: Rect, spec: &ChartSpec, pie: &PieSpec) {
    let total = pie.total().max(1) as f64;
    let width = area.width.saturating_sub(2) as usize;

    let mut strip = Vec::new();
    let mut used = 0;
    for (i, slice) in pie.slices.iter().enumerate() {
        let cells = if i + 1 == pie.slices.len() {
            width.saturating_sub(used)
        } else {
            ((slice.value as f64 / total) * width as f64).round() as usize
        };
        used += cells;
        strip.push(Span::styled("█".repeat(cells), Style::default().fg(rgb(slice.color))));
    }

    let mut lines = vec![Spans::from(strip), Spans::from("")];
    for slice in &pie.slices {
        lines.push(Spans::from(vec![
            Span::styled("██ ", Style::default().fg(rgb(slice.color))),
            Span::raw(format!(
                "{:<6} {:>7} ({:.1}%)",
                slice.label,
                slice.value,
                slice.value as f64 / total * 100.0
            )),
        ]));
    }
    rect.render_widget(Paragraph::new(lines).block(chart_block(spec)), area);
}

fn draw_grouped<B: Backend>(rect: &mut Frame<B>, area: Rect, spec: &ChartSpec, grouped: &GroupedBarSpec) {
    let mut header = vec![Cell::from(grouped.layout.x_title.clone().unwrap_or_default())];
    header.extend(
        grouped
            .series
            .iter()
            .map(|s| Cell::from(s.name.clone()).style(Style::default().fg(rgb(s.color)).add_modifier(Modifier::BOLD))),
    );

    let rows: Vec<Row> = grouped
        .categories
        .iter()
        .map(|category| {
            let mut cells = vec![Cell::from(category.clone())];
            for series in &grouped.series {
                let value = series.points.iter().find(|(x, _)| x == category).map(|(_, v)| *v);
                cells.push(match value {
                    Some(v) => Cell::from(format!("{:>5.1}%", v * 100.0)).style(Style::default().fg(rgb(series.color))),
                    None => Cell::from("     -"),
                });
            }
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(16)];
    widths.extend(grouped.series.iter().map(|s| Constraint::Length(s.name.len().max(7) as u16)));
    let table = Table::new(rows)
        .header(Row::new(header))
        .block(chart_block(spec))
        .widths(&widths)
        .column_spacing(2);
    rect.render_widget(table, area);
}

fn draw_heatmap<B: Backend>(rect: &mut Frame<B>, area: Rect, spec: &ChartSpec, heatmap: &HeatmapSpec) {
    let (lo, hi) = heatmap.z_range.unwrap_or((0.0, 0.0));
    let mut header = vec![Cell::from("")];
    header.extend(heatmap.x.iter().map(|x| Cell::from(x.clone())));

    let rows: Vec<Row> = heatmap
        .y
        .iter()
        .zip(&heatmap.z)
        .map(|(label, values)| {
            let mut cells = vec![Cell::from(label.clone())];
            for value in values {
                cells.push(match value {
                    Some(v) => {
                        let t = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
                        let bg = scale_color(&heatmap.color_scale, t);
                        let fg = if (0.25..=0.75).contains(&t) { Color::Black } else { Color::White };
                        Cell::from(format!("{:>4.0}", v)).style(Style::default().bg(rgb(bg)).fg(fg))
                    }
                    None => Cell::from(""),
                });
            }
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(18)];
    widths.extend(heatmap.x.iter().map(|_| Constraint::Length(6)));
    let title = format!("{}  [{}: {:.0}-{:.0}]", chart_title(spec), heatmap.colorbar_title, lo, hi);
    let table = Table::new(rows)
        .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(chart_block(spec).title(title))
        .widths(&widths)
        .column_spacing(1);
    rect.render_widget(table, area);
}

fn normalize(value: f64, range: (f64, f64)) -> f64 {
    let (lo, hi) = range;
    if hi > lo {
        (value - lo) / (hi - lo)
    } else {
        0.5
    }
}

fn draw_parallel<B: Backend>(
    rect: &mut Frame<B>,
    area: Rect,
    spec: &ChartSpec,
    parallel: &ParallelSpec,
    max_lines: usize,
) {
    let block = chart_block(spec);
    let inner = block.inner(area);
    rect.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)].as_ref())
        .split(inner);

    let dims = &parallel.dimensions;
    let color_values = parallel.color_values();
    let color_range = dims
        .iter()
        .find(|d| d.column == parallel.color_column)
        .map_or((0.0, 1.0), |d| d.range);
    let stride = (parallel.line_count() / max_lines.max(1)).max(1);

    let mut lines = Vec::new();
    let mut points = Vec::new();
    for row in (0..parallel.line_count()).step_by(stride) {
        let color = rgb(scale_color(&parallel.color_scale, normalize(color_values[row], color_range)));
        if dims.len() == 1 {
            points.push((0.0, normalize(dims[0].values[row], dims[0].range)));
            continue;
        }
        for (i, pair) in dims.windows(2).enumerate() {
            lines.push(Line {
                x1: i as f64,
                y1: normalize(pair[0].values[row], pair[0].range),
                x2: (i + 1) as f64,
                y2: normalize(pair[1].values[row], pair[1].range),
                color,
            });
        }
    }

    let x_max = (dims.len().max(2) - 1) as f64;
    let canvas = Canvas::default()
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, x_max])
        .y_bounds([0.0, 1.0])
        .paint(|ctx| {
            for line in &lines {
                ctx.draw(line);
            }
            if !points.is_empty() {
                ctx.draw(&Points { coords: &points, color: Color::Black });
            }
        });
    rect.render_widget(canvas, parts[0]);

    // axis labels spread evenly under the canvas
    let width = parts[1].width as usize;
    let mut labels = vec![' '; width];
    for (i, dim) in dims.iter().enumerate() {
        let start = if dims.len() == 1 { 0 } else { i * width.saturating_sub(1) / (dims.len() - 1) };
        let start = start.min(width.saturating_sub(dim.label.len()));
        for (j, ch) in dim.label.chars().enumerate() {
            if let Some(slot) = labels.get_mut(start + j) {
                *slot = ch;
            }
        }
    }
    let axis = Paragraph::new(labels.into_iter().collect::<String>())
        .style(Style::default().add_modifier(Modifier::BOLD));
    rect.render_widget(axis, parts[1]);
}

#[cfg(test)]
mod tests {
    use tui::backend::TestBackend;
    use tui::Terminal;

    use super::*;
    use crate::aggregate::{income_by_education, income_by_occupation_and_education};
    use crate::chart::{education_bar, grouped_bar};
    use crate::dataset::fixtures::synthetic_table;

    fn render(spec: &ChartSpec, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| {
                let area = f.size();
                draw_chart(f, area, Some(spec), 300);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| (0..width).map(|x| buffer.get(x, y).symbol.as_str()).collect())
            .collect()
    }

    fn grouped_spec() -> ChartSpec {
        let table = synthetic_table();
        let occupations = vec!["Adm-clerical".to_string(), "Exec-managerial".to_string()];
        grouped_bar(&income_by_occupation_and_education(&table, &occupations))
    }

    #[test]
    fn test_chart_title_carries_axes_and_legend() {
        let bar = education_bar(&income_by_education(&synthetic_table()));
        assert_eq!(
            chart_title(&bar),
            "Proportion Earning >50K by Education Level  x: Education Level  y: Proportion Earning >50K"
        );
        assert_eq!(
            chart_title(&grouped_spec()),
            "Income by Occupation and Education  x: Education Level  y: Proportion Earning >50K  legend: Occupation"
        );
    }

    #[test]
    fn test_grouped_header_uses_layout_x_title() {
        let mut spec = grouped_spec();
        if let ChartSpec::GroupedBar(grouped) = &mut spec {
            grouped.layout.x_title = Some("Schooling".to_string());
        }
        let lines = render(&spec, 160, 8);
        // row 0 is the block border, row 1 the table header
        assert!(lines[1].contains("Schooling"), "{:?}", lines);
        assert!(!lines[1].contains("Education Level"), "{:?}", lines);
        assert!(lines[0].contains("legend: Occupation"), "{:?}", lines);
    }

    #[test]
    fn test_bar_gap_follows_marker_line_width() {
        let marker = |line_width| BarMarker { color: Rgb(0, 0, 0), line_color: Rgb(0, 0, 0), line_width };
        assert_eq!(bar_gap(&marker(1.5)), 2);
        assert_eq!(bar_gap(&marker(0.0)), 1);
        assert_eq!(bar_gap(&marker(3.0)), 3);
    }
}
