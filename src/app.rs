use std::io::{self, Stderr};

use anyhow::{Context, Result};
use crossterm::cursor;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};

use crate::highlight::Highlighter;
use crate::matcher;
use crate::model::Query;
use crate::viewport::ViewState;

/// Prompt, hint and header rows above the result list.
const CHROME_HEIGHT: u16 = 3;
const PROMPT: &str = "$ ";
const PLACEHOLDER: &str = "Filter...";
const HINT: &str = "Type to filter, UP/DOWN move, RET/TAB select";

type TuiTerminal = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Confirmed(String),
    Cancelled,
}

/// Runs the picker until the user confirms a line or gives up.
///
/// The terminal is restored before this returns, so the caller is free to
/// print or inject the selection.
pub fn run_tui(candidates: Vec<String>, query: Query) -> Result<Option<String>> {
    let mut terminal = init_terminal()?;
    let size = match terminal.size() {
        Ok(size) => size,
        Err(err) => {
            let _ = restore_terminal(&mut terminal);
            return Err(err).context("failed to query terminal size");
        }
    };
    let mut app = AppState::new(candidates, query, size.width, size.height);

    match run_loop(&mut terminal, &mut app) {
        Ok(selection) => {
            restore_terminal(&mut terminal)?;
            Ok(selection)
        }
        Err(err) => {
            let _ = restore_terminal(&mut terminal);
            Err(err)
        }
    }
}

fn init_terminal() -> Result<TuiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stderr = io::stderr();
    if let Err(err) = execute!(stderr, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err).context("failed to enter alternate screen");
    }
    let backend = CrosstermBackend::new(stderr);
    Terminal::new(backend)
        .inspect_err(|_| {
            let _ = execute!(io::stderr(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
        })
        .context("failed to create terminal")
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")
}

fn run_loop(terminal: &mut TuiTerminal, app: &mut AppState) -> Result<Option<String>> {
    loop {
        terminal.draw(|frame| draw_ui(frame, app))?;

        let state = match event::read().context("failed to read terminal event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
            Event::Resize(width, height) => app.on_resize(width, height),
            _ => continue,
        };

        match state {
            SessionState::Active => {}
            SessionState::Confirmed(line) => return Ok(Some(line)),
            SessionState::Cancelled => return Ok(None),
        }
    }
}

fn draw_ui(frame: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(frame.area());

    draw_prompt(frame, app, chunks[0]);
    frame.render_widget(
        Paragraph::new(HINT).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );
    draw_header(frame, app, chunks[2]);
    draw_results(frame, app, chunks[3]);
}

fn draw_prompt(frame: &mut Frame, app: &AppState, area: Rect) {
    let input = if app.query.text.is_empty() {
        Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(app.query.text.as_str())
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![Span::raw(PROMPT), input])),
        area,
    );

    let x = area
        .x
        .saturating_add(PROMPT.len() as u16)
        .saturating_add(app.query_cursor as u16);
    frame.set_cursor_position((x, area.y));
}

fn draw_header(frame: &mut Frame, app: &AppState, area: Rect) {
    let text = header_text(&app.query, app.width.min(area.width) as usize);
    let style = Style::default()
        .bg(Color::Rgb(107, 5, 130))
        .fg(Color::White);
    frame.render_widget(Paragraph::new(Span::styled(text, style)), area);
}

fn header_text(query: &Query, width: usize) -> String {
    let mut text = format!(
        " - HISTORY - match:{} (C-e) - case:{} (C-t) ",
        query.mode, query.case
    );
    let used = text.chars().count();
    if width > used {
        text.push_str(&"-".repeat(width - used));
    }
    text
}

fn draw_results(frame: &mut Frame, app: &AppState, area: Rect) {
    if app.filtered.is_empty() {
        frame.render_widget(
            Paragraph::new("  No matches").style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let highlighter = Highlighter::new(&app.query);
    let match_style = Style::default().fg(Color::Red);
    let text_width = (area.width as usize).saturating_sub(2);

    let lines: Vec<Line<'_>> = app
        .view
        .visible()
        .map(|row| {
            let display = fit_to_width(&sanitize_for_display(app.line_at(row)), text_width);
            let cursor = if row == app.view.selected { "> " } else { "  " };
            let mut spans = vec![Span::raw(cursor)];
            for segment in highlighter.highlight(&display) {
                let text = segment.text.to_string();
                if segment.matched {
                    spans.push(Span::styled(text, match_style));
                } else {
                    spans.push(Span::raw(text));
                }
            }
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

/// Shortens `line` to `width` characters by cutting out its middle.
fn fit_to_width(line: &str, width: usize) -> String {
    let len = line.chars().count();
    if len <= width || width < 10 {
        return line.to_string();
    }

    let part = (width - 3) / 2;
    let head: String = line.chars().take(part).collect();
    let tail: String = line.chars().skip(len - part).collect();
    format!("{head}...{tail}")
}

/// Drops escape sequences and control characters so a history line cannot
/// move the cursor or restyle the screen.
fn sanitize_for_display(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\u{1b}' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    for next in chars.by_ref() {
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            '\t' | '\n' | '\r' => result.push(' '),
            ch if ch.is_control() => {}
            ch => result.push(ch),
        }
    }
    result
}

/// The whole interactive session: candidates, query and view.
struct AppState {
    candidates: Vec<String>,
    filtered: Vec<usize>,
    query: Query,
    query_cursor: usize,
    view: ViewState,
    width: u16,
    height: u16,
}

impl AppState {
    fn new(candidates: Vec<String>, query: Query, width: u16, height: u16) -> Self {
        let filtered = matcher::filter(&candidates, &query);
        let view = ViewState::new(page_size(height), filtered.len());
        let query_cursor = query.text.chars().count();
        Self {
            candidates,
            filtered,
            query,
            query_cursor,
            view,
            width,
            height,
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> SessionState {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => SessionState::Cancelled,
            KeyCode::Char('c') if ctrl => SessionState::Cancelled,
            KeyCode::Enter | KeyCode::Tab => self.confirm(),
            KeyCode::Up => {
                self.view.move_up();
                SessionState::Active
            }
            KeyCode::Char('p') if ctrl => {
                self.view.move_up();
                SessionState::Active
            }
            KeyCode::Down => {
                self.view.move_down(self.filtered.len());
                SessionState::Active
            }
            KeyCode::Char('n') if ctrl => {
                self.view.move_down(self.filtered.len());
                SessionState::Active
            }
            KeyCode::Char('e') if ctrl => {
                self.query.mode = self.query.mode.next();
                self.refresh_filtered();
                SessionState::Active
            }
            KeyCode::Char('t') if ctrl => {
                self.query.case = self.query.case.next();
                self.refresh_filtered();
                SessionState::Active
            }
            KeyCode::Left => {
                self.query_cursor = self.query_cursor.saturating_sub(1);
                SessionState::Active
            }
            KeyCode::Right => {
                if self.query_cursor < self.query.text.chars().count() {
                    self.query_cursor += 1;
                }
                SessionState::Active
            }
            KeyCode::Home => {
                self.query_cursor = 0;
                SessionState::Active
            }
            KeyCode::End => {
                self.query_cursor = self.query.text.chars().count();
                SessionState::Active
            }
            KeyCode::Backspace => {
                if self.query_cursor > 0
                    && remove_char_at(&mut self.query.text, self.query_cursor - 1)
                {
                    self.query_cursor -= 1;
                    self.refresh_filtered();
                }
                SessionState::Active
            }
            KeyCode::Delete => {
                if remove_char_at(&mut self.query.text, self.query_cursor) {
                    self.refresh_filtered();
                }
                SessionState::Active
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                insert_char_at(&mut self.query.text, self.query_cursor, ch);
                self.query_cursor += 1;
                self.refresh_filtered();
                SessionState::Active
            }
            _ => SessionState::Active,
        }
    }

    fn on_resize(&mut self, width: u16, height: u16) -> SessionState {
        self.width = width;
        self.height = height;
        self.view.resize(page_size(self.height), self.filtered.len());
        SessionState::Active
    }

    fn confirm(&self) -> SessionState {
        match self.selected_line() {
            Some(line) => SessionState::Confirmed(line.to_string()),
            None => SessionState::Active,
        }
    }

    fn refresh_filtered(&mut self) {
        self.filtered = matcher::filter(&self.candidates, &self.query);
        self.view.invalidate(self.filtered.len());
        tracing::debug!(
            query = %self.query.text,
            mode = %self.query.mode,
            case = %self.query.case,
            matches = self.filtered.len(),
            "refiltered"
        );
    }

    fn selected_line(&self) -> Option<&str> {
        self.filtered
            .get(self.view.selected)
            .map(|&index| self.candidates[index].as_str())
    }

    fn line_at(&self, row: usize) -> &str {
        &self.candidates[self.filtered[row]]
    }
}

fn page_size(height: u16) -> usize {
    height.saturating_sub(CHROME_HEIGHT) as usize
}

fn insert_char_at(value: &mut String, char_index: usize, ch: char) {
    let byte_index = byte_index_for_char(value, char_index);
    value.insert(byte_index, ch);
}

fn remove_char_at(value: &mut String, char_index: usize) -> bool {
    let start = byte_index_for_char(value, char_index);
    if start >= value.len() {
        return false;
    }
    let end = byte_index_for_char(value, char_index + 1);
    value.replace_range(start..end, "");
    true
}

fn byte_index_for_char(value: &str, char_index: usize) -> usize {
    value
        .char_indices()
        .nth(char_index)
        .map(|(index, _)| index)
        .unwrap_or(value.len())
}
