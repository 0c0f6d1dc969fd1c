use crate::themes::Theme;
use dashboard_core::formatting::format_count;
use dashboard_core::models::FilterCriteria;
use dashboard_core::time_utils::month_name;
use ratatui::text::{Line, Span};

/// Application title shown on the first header line.
pub const TITLE: &str = "TYG NHLS VIROLOGY DASHBOARD";

/// Decoration placed either side of the title.
pub const ACCENT: &str = "✚";

/// Key hints shown on the last header line.
pub const KEY_HINTS: &str =
    "←/→ month  ↑/↓ year  Tab pane  j/k scroll  r reload  q quit";

/// Dashboard header rendering four lines:
///
/// 1. Application title with accent decorations.
/// 2. A 60-column `=` separator.
/// 3. The selection and row counts in `[ year | month | rows ]` format.
/// 4. Key hints.
pub struct Header<'a> {
    /// Active selection, `None` when the upload has no dated rows.
    pub criteria: Option<FilterCriteria>,
    /// Rows matching the selection.
    pub filtered_rows: usize,
    /// Rows in the whole upload.
    pub total_rows: usize,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(
        criteria: Option<FilterCriteria>,
        filtered_rows: usize,
        total_rows: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            criteria,
            filtered_rows,
            total_rows,
            theme,
        }
    }

    /// Number of terminal rows the header occupies.
    pub const HEIGHT: u16 = 4;

    /// Render the header as a `Vec<Line>` containing exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);

        let selection = match self.criteria {
            Some(c) => vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(c.year().to_string(), self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(
                    month_name(c.month()).unwrap_or("?").to_string(),
                    self.theme.value,
                ),
                Span::styled(" | ", self.theme.label),
                Span::styled(
                    format!(
                        "{} of {} rows",
                        format_count(self.filtered_rows as u64),
                        format_count(self.total_rows as u64)
                    ),
                    self.theme.value,
                ),
                Span::styled(" ]", self.theme.label),
            ],
            None => vec![Span::styled(
                format!(
                    "[ no dated records in {} rows ]",
                    format_count(self.total_rows as u64)
                ),
                self.theme.warning,
            )],
        };

        vec![
            Line::from(vec![
                Span::styled(ACCENT, self.theme.header_accent),
                Span::styled(format!(" {TITLE} "), self.theme.header),
                Span::styled(ACCENT, self.theme.header_accent),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(selection),
            Line::from(Span::styled(KEY_HINTS, self.theme.dim)),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_to_lines_count() {
        let theme = Theme::dark();
        let header = Header::new(FilterCriteria::new(2024, 1).ok(), 3, 10, &theme);
        assert_eq!(header.to_lines().len(), Header::HEIGHT as usize);
    }

    #[test]
    fn test_header_title_line_content() {
        let theme = Theme::dark();
        let lines = Header::new(None, 0, 0, &theme).to_lines();
        let title = text(&lines[0]);
        assert!(title.contains(TITLE), "got: {title}");
        assert!(title.starts_with(ACCENT));
    }

    #[test]
    fn test_header_selection_line() {
        let theme = Theme::dark();
        let header = Header::new(FilterCriteria::new(2024, 3).ok(), 1234, 56789, &theme);
        let info = text(&header.to_lines()[2]);
        assert_eq!(info, "[ 2024 | March | 1,234 of 56,789 rows ]");
    }

    #[test]
    fn test_header_without_dated_rows() {
        let theme = Theme::dark();
        let info = text(&Header::new(None, 0, 7, &theme).to_lines()[2]);
        assert!(info.contains("no dated records"), "got: {info}");
        assert!(info.contains('7'));
    }

    #[test]
    fn test_header_separator_line() {
        let theme = Theme::dark();
        let sep = text(&Header::new(None, 0, 0, &theme).to_lines()[1]);
        assert_eq!(sep.chars().count(), 60);
        assert!(sep.chars().all(|c| c == '='));
    }

    #[test]
    fn test_header_key_hints() {
        let theme = Theme::dark();
        let hints = text(&Header::new(None, 0, 0, &theme).to_lines()[3]);
        assert!(hints.contains("q quit"));
        assert!(hints.contains("r reload"));
    }
}
