//! Chart pane for the virology dashboard.
//!
//! Draws the five report aggregations: positivity and turnaround time as
//! line charts, the age histogram and both volume series as bar charts. An
//! aggregation whose columns are missing is replaced by a message naming
//! the columns.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

use dashboard_core::formatting::{format_bin_label, format_mean, format_rate};
use dashboard_data::aggregator::{Aggregation, AggregationResult, Series};
use dashboard_data::analysis::DashboardReport;
use dashboard_data::histogram::HistogramBin;

use crate::themes::Theme;

/// Shown inside a chart whose selection produced no rows.
pub const EMPTY_SELECTION: &str = "No records for this selection.";

// ── Titles & messages ─────────────────────────────────────────────────────────

/// Chart title for `aggregation` over `year`.
pub fn chart_title(aggregation: Aggregation, year: i32) -> String {
    match aggregation {
        Aggregation::PositivityByWeek => format!("HIV Positivity Rate Per Week ({year})"),
        Aggregation::AgeHistogram => "Age Distribution of Patients".to_string(),
        Aggregation::MeanTatByWeek => format!("Average Turnaround Time Per Week ({year})"),
        Aggregation::VolumeByWeek => format!("Test Volume Per Week ({year})"),
        Aggregation::VolumeByMonth => format!("Test Volume Per Month ({year})"),
    }
}

/// Message shown in place of `aggregation` when its columns are missing.
pub fn unavailable_message(aggregation: Aggregation) -> &'static str {
    match aggregation {
        Aggregation::PositivityByWeek => {
            "Required columns 'WEEK' and 'HIVCOS - V0010 - HIV Combo Result' not found."
        }
        Aggregation::AgeHistogram => "Column 'Age' not found in dataset.",
        Aggregation::MeanTatByWeek => "Required columns 'WEEK' and 'TOTAL TAT' not found.",
        Aggregation::VolumeByWeek => "Column 'WEEK' not found in dataset.",
        Aggregation::VolumeByMonth => "Column 'MONTH' not found in dataset.",
    }
}

// ── Data preparation ──────────────────────────────────────────────────────────

/// Plot points for a line series.
///
/// Numeric buckets use their value as x; text buckets use their position.
/// Points with an undefined value are dropped, leaving a gap.
pub fn line_points(series: &Series<Option<f64>>) -> Vec<(f64, f64)> {
    series
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let x = p.bucket.as_f64().unwrap_or(i as f64);
            p.value.filter(|v| v.is_finite()).map(|y| (x, y))
        })
        .collect()
}

/// `(label, value)` bars for a count series.
pub fn bar_entries(series: &Series<u64>) -> Vec<(String, u64)> {
    series
        .iter()
        .map(|p| (p.bucket.to_string(), p.value))
        .collect()
}

/// `(label, count)` bars for a histogram.
pub fn histogram_entries(bins: &[HistogramBin]) -> Vec<(String, u64)> {
    bins.iter()
        .map(|b| (format_bin_label(b.start, b.end), b.count))
        .collect()
}

/// `[min, max]` x-axis bounds, widened by one when degenerate.
fn x_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        [0.0, 1.0]
    } else if min == max {
        [min - 0.5, max + 0.5]
    } else {
        [min, max]
    }
}

/// Upper y bound with 10% headroom; at least 1.
fn y_upper(points: &[(f64, f64)]) -> f64 {
    let max = points.iter().map(|p| p.1).fold(0.0_f64, f64::max);
    (max * 1.1).max(1.0)
}

/// Bar width that fits `n` bars into `width` columns with one-column gaps.
pub fn bar_width(width: u16, n: usize) -> u16 {
    if n == 0 {
        return 1;
    }
    let n = u16::try_from(n).unwrap_or(u16::MAX);
    let inner = width.saturating_sub(2);
    (inner.saturating_sub(n.saturating_sub(1)) / n).clamp(1, 9)
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Render every chart of `report` into `area`.
///
/// Layout: positivity and TAT side by side, then age and weekly volume, then
/// monthly volume across the full width.
pub fn render_charts(
    frame: &mut Frame,
    area: Rect,
    report: &DashboardReport,
    focused: bool,
    theme: &Theme,
) {
    let year = report.criteria.year();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);
    let halves = |r: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(r)
    };
    let top = halves(rows[0]);
    let middle = halves(rows[1]);

    let ctx = ChartContext { focused, theme };

    ctx.line(
        frame,
        top[0],
        Aggregation::PositivityByWeek,
        year,
        &report.positivity_by_week,
        LineKind::Rate,
    );
    ctx.line(
        frame,
        top[1],
        Aggregation::MeanTatByWeek,
        year,
        &report.mean_tat_by_week,
        LineKind::Mean,
    );
    ctx.bars(
        frame,
        middle[0],
        Aggregation::AgeHistogram,
        year,
        &report.age_histogram.clone().map(|b| histogram_entries(&b)),
    );
    ctx.bars(
        frame,
        middle[1],
        Aggregation::VolumeByWeek,
        year,
        &report.volume_by_week.clone().map(|s| bar_entries(&s)),
    );
    ctx.bars(
        frame,
        rows[2],
        Aggregation::VolumeByMonth,
        year,
        &report.volume_by_month.clone().map(|s| bar_entries(&s)),
    );
}

#[derive(Clone, Copy)]
enum LineKind {
    /// Fraction in `[0, 1]`, labelled as a percentage.
    Rate,
    /// Unbounded non-negative mean.
    Mean,
}

struct ChartContext<'t> {
    focused: bool,
    theme: &'t Theme,
}

impl ChartContext<'_> {
    fn block(&self, title: String) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused))
            .title(Span::styled(format!(" {title} "), self.theme.header))
    }

    fn message(&self, frame: &mut Frame, area: Rect, title: String, text: &str, warn: bool) {
        let style = if warn { self.theme.warning } else { self.theme.dim };
        let paragraph = Paragraph::new(Line::from(Span::styled(text.to_string(), style)))
            .wrap(Wrap { trim: true })
            .block(self.block(title));
        frame.render_widget(paragraph, area);
    }

    fn line(
        &self,
        frame: &mut Frame,
        area: Rect,
        aggregation: Aggregation,
        year: i32,
        result: &AggregationResult<Series<Option<f64>>>,
        kind: LineKind,
    ) {
        let title = chart_title(aggregation, year);
        let Some(series) = result.series() else {
            self.message(frame, area, title, unavailable_message(aggregation), true);
            return;
        };
        let points = line_points(series);
        if points.is_empty() {
            self.message(frame, area, title, EMPTY_SELECTION, false);
            return;
        }

        let x = x_bounds(&points);
        let (y_max, y_labels, style) = match kind {
            LineKind::Rate => (
                1.0,
                vec![format_rate(Some(0.0)), format_rate(Some(0.5)), format_rate(Some(1.0))],
                self.theme.positivity_line,
            ),
            LineKind::Mean => {
                let top = y_upper(&points);
                (
                    top,
                    vec![
                        format_mean(Some(0.0), 0),
                        format_mean(Some(top / 2.0), 1),
                        format_mean(Some(top), 1),
                    ],
                    self.theme.tat_line,
                )
            }
        };

        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(style)
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .block(self.block(title))
            .x_axis(
                Axis::default()
                    .title("WEEK")
                    .style(self.theme.chart_axis)
                    .bounds(x)
                    .labels(vec![format_axis(x[0]), format_axis(x[1])]),
            )
            .y_axis(
                Axis::default()
                    .style(self.theme.chart_axis)
                    .bounds([0.0, y_max])
                    .labels(y_labels),
            );
        frame.render_widget(chart, area);
    }

    fn bars(
        &self,
        frame: &mut Frame,
        area: Rect,
        aggregation: Aggregation,
        year: i32,
        result: &AggregationResult<Vec<(String, u64)>>,
    ) {
        let title = chart_title(aggregation, year);
        let Some(entries) = result.series() else {
            self.message(frame, area, title, unavailable_message(aggregation), true);
            return;
        };
        if entries.is_empty() {
            self.message(frame, area, title, EMPTY_SELECTION, false);
            return;
        }

        let bar_style = match aggregation {
            Aggregation::AgeHistogram => self.theme.age_bar,
            _ => self.theme.volume_bar,
        };
        let data: Vec<(&str, u64)> = entries.iter().map(|(l, v)| (l.as_str(), *v)).collect();

        let chart = BarChart::default()
            .block(self.block(title))
            .bar_width(bar_width(area.width, entries.len()))
            .bar_gap(1)
            .bar_style(bar_style)
            .value_style(self.theme.value)
            .label_style(self.theme.label)
            .data(data.as_slice());
        frame.render_widget(chart, area);
    }
}

/// Axis label for a bucket coordinate: integral values without decimals.
fn format_axis(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::models::{BucketKey, FilterCriteria};
    use dashboard_data::aggregator::SeriesPoint;
    use dashboard_data::analysis::build_report;
    use dashboard_data::loader::load_bytes;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn point<V>(bucket: f64, value: V) -> SeriesPoint<V> {
        SeriesPoint {
            bucket: BucketKey::Number(bucket),
            value,
        }
    }

    fn render(report: &DashboardReport, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_charts(frame, area, report, true, &theme);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    // ── Titles & messages ─────────────────────────────────────────────────────

    #[test]
    fn test_chart_titles_carry_year() {
        assert_eq!(
            chart_title(Aggregation::PositivityByWeek, 2024),
            "HIV Positivity Rate Per Week (2024)"
        );
        assert_eq!(
            chart_title(Aggregation::MeanTatByWeek, 2023),
            "Average Turnaround Time Per Week (2023)"
        );
        assert_eq!(
            chart_title(Aggregation::VolumeByWeek, 2022),
            "Test Volume Per Week (2022)"
        );
        assert_eq!(
            chart_title(Aggregation::VolumeByMonth, 2021),
            "Test Volume Per Month (2021)"
        );
    }

    #[test]
    fn test_unavailable_messages_name_required_columns() {
        for aggregation in Aggregation::ALL {
            let message = unavailable_message(aggregation);
            for column in aggregation.required_columns() {
                assert!(
                    message.contains(&format!("'{column}'")),
                    "{message} should name {column}"
                );
            }
        }
    }

    // ── Data preparation ──────────────────────────────────────────────────────

    #[test]
    fn test_line_points_skip_undefined_values() {
        let series = vec![point(1.0, Some(0.5)), point(2.0, None), point(3.0, Some(0.0))];
        assert_eq!(line_points(&series), vec![(1.0, 0.5), (3.0, 0.0)]);
    }

    #[test]
    fn test_line_points_text_buckets_use_position() {
        let series = vec![
            SeriesPoint {
                bucket: BucketKey::Text("W1".into()),
                value: Some(2.0),
            },
            SeriesPoint {
                bucket: BucketKey::Text("W2".into()),
                value: Some(4.0),
            },
        ];
        assert_eq!(line_points(&series), vec![(0.0, 2.0), (1.0, 4.0)]);
    }

    #[test]
    fn test_bar_entries_labels() {
        let series = vec![point(1.0, 3), point(2.0, 5)];
        assert_eq!(
            bar_entries(&series),
            vec![("1".to_string(), 3), ("2".to_string(), 5)]
        );
    }

    #[test]
    fn test_histogram_entries_labels() {
        let bins = [HistogramBin {
            start: 20.0,
            end: 30.0,
            count: 4,
        }];
        assert_eq!(histogram_entries(&bins), vec![("20–30".to_string(), 4)]);
    }

    #[test]
    fn test_bar_width_fits_area() {
        assert_eq!(bar_width(40, 0), 1);
        assert_eq!(bar_width(40, 4), 8);
        assert_eq!(bar_width(200, 2), 9);
        assert_eq!(bar_width(10, 50), 1);
        assert_eq!(bar_width(200, 65_536), 1);
        assert_eq!(bar_width(200, 131_072), 1);
    }

    #[test]
    fn test_x_bounds_degenerate() {
        assert_eq!(x_bounds(&[(5.0, 1.0)]), [4.5, 5.5]);
        assert_eq!(x_bounds(&[]), [0.0, 1.0]);
        assert_eq!(x_bounds(&[(1.0, 0.0), (9.0, 0.0)]), [1.0, 9.0]);
    }

    // ── Render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_full_report() {
        let csv = "\
Collection Date,WEEK,HIVCOS - V0010 - HIV Combo Result,Age,TOTAL TAT,MONTH
2024-01-02,1,P,30,10,1
2024-01-09,2,N,45,20,1
";
        let table = load_bytes(csv.as_bytes()).unwrap();
        let report = build_report(&table, FilterCriteria::new(2024, 1).unwrap());
        let text = render(&report, 160, 45);
        assert!(text.contains("HIV Positivity Rate Per Week (2024)"));
        assert!(text.contains("Test Volume Per Month (2024)"));
        assert!(!text.contains("not found"));
    }

    #[test]
    fn test_render_missing_columns_shows_messages() {
        let table = load_bytes(b"Collection Date,WEEK\n2024-01-02,1\n").unwrap();
        let report = build_report(&table, FilterCriteria::new(2024, 1).unwrap());
        let text = render(&report, 200, 45);
        assert!(text.contains("Column 'Age' not found in dataset."));
        assert!(text.contains("Column 'MONTH' not found in dataset."));
        assert!(text.contains("Test Volume Per Week (2024)"));
    }

    #[test]
    fn test_render_empty_selection() {
        let table = load_bytes(b"Collection Date,WEEK,Age\n2024-01-02,1,4\n").unwrap();
        let report = build_report(&table, FilterCriteria::new(2024, 7).unwrap());
        let text = render(&report, 160, 45);
        assert!(text.contains(EMPTY_SELECTION));
    }
}
