//! Main application state and TUI event loop for the virology dashboard.
//!
//! [`App`] owns the theme, the focused pane and the [`DashboardSession`]. It
//! maps key presses onto session operations and redraws every tick.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};

use dashboard_core::models::CONTACT_INFO;
use dashboard_runtime::session::DashboardSession;

use crate::chart_view;
use crate::components::header::Header;
use crate::table_view;
use crate::themes::Theme;

const TICK_RATE: Duration = Duration::from_millis(250);

// ── Pane / KeyAction ──────────────────────────────────────────────────────────

/// Which body pane has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    /// Filtered-table preview.
    Table,
    /// Aggregation charts.
    Charts,
}

impl Pane {
    pub fn toggle(self) -> Self {
        match self {
            Pane::Table => Pane::Charts,
            Pane::Charts => Pane::Table,
        }
    }
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Reload,
    Quit,
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard TUI.
pub struct App {
    /// Active colour theme.
    pub theme: Theme,
    /// Focused body pane.
    pub pane: Pane,
    /// First visible row of the table preview.
    pub scroll: usize,
    /// Last reload outcome, shown on the status line.
    pub status: Option<String>,
    session: DashboardSession,
}

impl App {
    /// Construct a new application over an open session.
    pub fn new(theme_name: &str, session: DashboardSession) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            pane: Pane::Charts,
            scroll: 0,
            status: None,
            session,
        }
    }

    pub fn session(&self) -> &DashboardSession {
        &self.session
    }

    // ── Public event loops ────────────────────────────────────────────────────

    /// Run the interactive dashboard until `q` or `Ctrl+C`.
    pub async fn run(mut self) -> io::Result<()> {
        let mut terminal = enter_terminal()?;
        tracing::info!(
            source = %self.session.source().display(),
            rows = self.session.table().len(),
            "dashboard started"
        );

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match poll_key() {
                Ok(Some(key)) => match self.handle_key(key) {
                    KeyAction::Quit => break Ok(()),
                    KeyAction::Reload => self.reload().await,
                    KeyAction::Continue => {}
                },
                Ok(None) => {}
                Err(e) => break Err(e),
            }
        };

        // Restore terminal state unconditionally.
        leave_terminal(&mut terminal)?;
        result
    }

    /// Show a blocking error screen until `q` / `Ctrl+C`.
    ///
    /// Used when the upload cannot be parsed at all: nothing but the error
    /// and the contact line is rendered.
    pub async fn run_error_screen(theme_name: &str, message: &str) -> io::Result<()> {
        let theme = Theme::from_name(theme_name);
        let mut terminal = enter_terminal()?;

        let result = loop {
            if let Err(e) = terminal.draw(|frame| {
                let area = frame.area();
                render_error_screen(frame, area, message, &theme)
            }) {
                break Err(e);
            }
            match poll_key() {
                Ok(Some(key)) if is_quit(&key) => break Ok(()),
                Ok(_) => {}
                Err(e) => break Err(e),
            }
        };

        leave_terminal(&mut terminal)?;
        result
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    /// Apply one key press to the app state.
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.kind == KeyEventKind::Release {
            return KeyAction::Continue;
        }
        if is_quit(&key) {
            return KeyAction::Quit;
        }

        match key.code {
            KeyCode::Left => self.change_selection(DashboardSession::prev_month),
            KeyCode::Right => self.change_selection(DashboardSession::next_month),
            KeyCode::Up => self.change_selection(DashboardSession::prev_year),
            KeyCode::Down => self.change_selection(DashboardSession::next_year),
            KeyCode::Tab | KeyCode::BackTab => {
                self.pane = self.pane.toggle();
                tracing::debug!(pane = ?self.pane, "pane switched");
            }
            KeyCode::Char('j') if self.pane == Pane::Table => {
                let last = self.filtered_len().saturating_sub(1);
                self.scroll = (self.scroll + 1).min(last);
            }
            KeyCode::Char('k') if self.pane == Pane::Table => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => return KeyAction::Reload,
            _ => {}
        }
        KeyAction::Continue
    }

    /// Re-read the source file, recording the outcome on the status line.
    pub async fn reload(&mut self) {
        match self.session.reload().await {
            Ok(()) => {
                self.scroll = 0;
                self.status = Some(format!(
                    "Reloaded {} rows from {}",
                    self.session.table().len(),
                    self.session.source().display()
                ));
            }
            Err(e) => {
                self.status = Some(format!("Reload failed: {e}"));
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(Header::HEIGHT),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let report = self.session.report();
        let header = Header::new(
            self.session.criteria(),
            report.map(|r| r.filtered.len()).unwrap_or(0),
            self.session.table().len(),
            &self.theme,
        );
        frame.render_widget(Paragraph::new(header.to_lines()), chunks[0]);

        match report {
            None => table_view::render_no_data(frame, chunks[1], &self.theme),
            Some(report) => match self.pane {
                Pane::Table => table_view::render_table_view(
                    frame,
                    chunks[1],
                    &report.filtered,
                    self.scroll,
                    true,
                    &self.theme,
                ),
                Pane::Charts => {
                    chart_view::render_charts(frame, chunks[1], report, true, &self.theme)
                }
            },
        }

        if let Some(status) = &self.status {
            frame.render_widget(
                Paragraph::new(Span::styled(status.clone(), self.theme.info)),
                chunks[2],
            );
        }
        render_contact(frame, chunks[3], &self.theme);
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn change_selection(&mut self, step: fn(&mut DashboardSession)) {
        step(&mut self.session);
        self.scroll = 0;
    }

    fn filtered_len(&self) -> usize {
        self.session
            .report()
            .map(|r| r.filtered.len())
            .unwrap_or(0)
    }
}

// ── Free rendering helpers ────────────────────────────────────────────────────

/// Render the blocking error screen.
pub fn render_error_screen(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("The uploaded file could not be read", theme.error)),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.text)),
        Line::from(""),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.error)
                .title(" Error "),
        ),
        chunks[0],
    );
    render_contact(frame, chunks[1], theme);
}

fn render_contact(frame: &mut Frame, area: Rect, theme: &Theme) {
    frame.render_widget(Paragraph::new(Span::styled(CONTACT_INFO, theme.dim)), area);
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q') | KeyCode::Char('Q') => true,
        _ => false,
    }
}

/// Wait up to one tick for a key press.
fn poll_key() -> io::Result<Option<KeyEvent>> {
    if event::poll(TICK_RATE)? {
        if let Event::Key(key) = event::read()? {
            return Ok(Some(key));
        }
    }
    Ok(None)
}

fn enter_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn leave_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
