//! Filtered-table preview for the virology dashboard.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with the uploaded columns
//! followed by the derived `Year` and `Month`, one row per filtered record.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use dashboard_core::formatting::format_count;
use dashboard_core::models::Table as RecordTable;

use crate::themes::Theme;

/// Widest a single preview column may grow, in terminal cells.
pub const MAX_COLUMN_WIDTH: usize = 28;

/// Rows consumed by the border and header line.
const CHROME_ROWS: u16 = 3;

/// Display width of each preview column over `rows`, capped at
/// [`MAX_COLUMN_WIDTH`].
pub fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<u16> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let widest = rows
                .iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.width())
                .chain(std::iter::once(h.width()))
                .max()
                .unwrap_or(0);
            widest.clamp(1, MAX_COLUMN_WIDTH) as u16
        })
        .collect()
}

/// Number of data rows that fit inside `area`.
pub fn visible_rows(area: Rect) -> usize {
    area.height.saturating_sub(CHROME_ROWS) as usize
}

/// Clamp a scroll offset so the last page stays full.
pub fn clamp_scroll(offset: usize, total_rows: usize, visible: usize) -> usize {
    offset.min(total_rows.saturating_sub(visible.max(1)))
}

/// Render the filtered rows into `area`, starting at row `scroll`.
pub fn render_table_view(
    frame: &mut Frame,
    area: Rect,
    table: &RecordTable,
    scroll: usize,
    focused: bool,
    theme: &Theme,
) {
    let headers = table.display_headers();
    let schema_width = table.schema().len();
    let visible = visible_rows(area);
    let start = clamp_scroll(scroll, table.len(), visible);

    let page: Vec<Vec<String>> = table
        .records()
        .iter()
        .skip(start)
        .take(visible)
        .map(|r| r.display_cells(schema_width))
        .collect();

    let widths: Vec<Constraint> = column_widths(&headers, &page)
        .into_iter()
        .map(Constraint::Length)
        .collect();

    let header = Row::new(
        headers
            .iter()
            .map(|h| Cell::from(h.clone()).style(theme.table_header)),
    )
    .height(1);

    let rows: Vec<Row> = page
        .into_iter()
        .enumerate()
        .map(|(i, cells)| {
            let derived_from = cells.len().saturating_sub(2);
            Row::new(cells.into_iter().enumerate().map(|(j, c)| {
                if j >= derived_from {
                    Cell::from(c).style(theme.table_derived)
                } else {
                    Cell::from(c)
                }
            }))
            .style(theme.row_style(start + i))
        })
        .collect();

    let title = format!(
        " Filtered Data ({}–{} of {}) ",
        if table.is_empty() { 0 } else { start + 1 },
        start + rows.len(),
        format_count(table.len() as u64)
    );

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style(focused))
                .title(title),
        )
        .style(theme.text);

    frame.render_widget(widget, area);
}

/// Render a placeholder when the upload has no dated records to filter.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No dated records found", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Check that the upload has a 'Collection Date' column with valid dates.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'r' to reload or 'q' to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Filtered Data "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_data::loader::load_bytes;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    const DATA: &str = "\
Collection Date,WEEK,Age
2024-01-03,1,34
2024-01-09,2,
2024-01-20,3,71
";

    fn table() -> RecordTable {
        load_bytes(DATA.as_bytes()).unwrap()
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    // ── Data construction ─────────────────────────────────────────────────────

    #[test]
    fn test_display_headers_append_derived_columns() {
        let headers = table().display_headers();
        assert_eq!(headers, vec!["Collection Date", "WEEK", "Age", "Year", "Month"]);
    }

    #[test]
    fn test_display_cells_include_year_and_month() {
        let t = table();
        let cells = t.records()[1].display_cells(t.schema().len());
        assert_eq!(cells, vec!["2024-01-09", "2", "", "2024", "1"]);
    }

    #[test]
    fn test_column_widths_use_display_width_and_cap() {
        let headers = vec!["a".to_string(), "Ünïcödé".to_string(), "x".to_string()];
        let rows = vec![vec![
            "1234".to_string(),
            "é".to_string(),
            "y".repeat(100),
        ]];
        assert_eq!(
            column_widths(&headers, &rows),
            vec![4, 7, MAX_COLUMN_WIDTH as u16]
        );
    }

    #[test]
    fn test_clamp_scroll() {
        assert_eq!(clamp_scroll(0, 100, 10), 0);
        assert_eq!(clamp_scroll(95, 100, 10), 90);
        assert_eq!(clamp_scroll(5, 3, 10), 0);
        assert_eq!(clamp_scroll(5, 0, 0), 0);
    }

    // ── Render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_table_view_shows_rows() {
        let backend = TestBackend::new(100, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let t = table();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_table_view(frame, area, &t, 0, true, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Collection Date"));
        assert!(text.contains("2024-01-20"));
        assert!(text.contains("Filtered Data (1–3 of 3)"));
    }

    #[test]
    fn test_render_table_view_scrolls() {
        let backend = TestBackend::new(100, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let t = table();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_table_view(frame, area, &t, 2, false, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("2024-01-20"));
        assert!(!text.contains("2024-01-03"));
    }

    #[test]
    fn test_render_table_view_empty_does_not_panic() {
        let backend = TestBackend::new(80, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::light();
        let t = table().with_records(Vec::new());

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_table_view(frame, area, &t, 7, false, &theme);
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("Filtered Data (0–0 of 0)"));
    }

    #[test]
    fn test_render_no_data_does_not_panic() {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_no_data(frame, area, &theme);
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("No dated records found"));
    }
}
