//! Ratatui-based terminal UI.
//!
//! The TUI provides a filter form (DNO, LLF code, consumption, duration, green
//! energy) and re-evaluates the lookup on every change, showing the mapped band
//! and the matching pricing rows. Matches can be exported to CSV.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
    Terminal,
};

use crate::app::pipeline::{evaluate, Evaluation};
use crate::cli::parse_consumption;
use crate::domain::{green_label, NetworkId, PricingQuery, Tables, EXPORT_MIME};
use crate::error::{AppError, LookupError};

/// Widest a results column is allowed to grow.
const MAX_COLUMN_WIDTH: u16 = 24;

/// Start the TUI over already-loaded tables.
pub fn run(tables: &Tables, export_path: PathBuf) -> Result<(), AppError> {
    let mut app = App::new(tables, export_path)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Form fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Dno,
    LlfCode,
    Consumption,
    Duration,
    Green,
}

const FIELDS: [Field; 5] = [
    Field::Dno,
    Field::LlfCode,
    Field::Consumption,
    Field::Duration,
    Field::Green,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

struct App<'a> {
    tables: &'a Tables,
    network_ids: Vec<NetworkId>,
    durations: Vec<u32>,
    dno_idx: usize,
    duration_idx: usize,
    llf_input: String,
    consumption_input: String,
    annual_consumption: f64,
    green_energy: bool,
    selected_field: usize,
    /// Text captured when editing started, restored on Esc.
    editing: Option<String>,
    result: Result<Evaluation<'a>, LookupError>,
    scroll: usize,
    status: String,
    status_kind: StatusKind,
    export_path: PathBuf,
}

impl<'a> App<'a> {
    fn new(tables: &'a Tables, export_path: PathBuf) -> Result<Self, AppError> {
        let network_ids = tables.pricing.network_ids();
        let durations = tables.pricing.contract_durations();
        if network_ids.is_empty() || durations.is_empty() {
            return Err(AppError::new(2, "The pricing table has no selectable DNO ids or durations."));
        }

        let mut app = Self {
            tables,
            network_ids,
            durations,
            dno_idx: 0,
            duration_idx: 0,
            llf_input: String::new(),
            consumption_input: "0".to_string(),
            annual_consumption: 0.0,
            green_energy: false,
            selected_field: 0,
            editing: None,
            result: Err(LookupError::MissingInput),
            scroll: 0,
            status: String::new(),
            status_kind: StatusKind::Info,
            export_path,
        };
        app.refresh();
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn field(&self) -> Field {
        FIELDS[self.selected_field]
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down | KeyCode::Tab => {
                if self.selected_field + 1 < FIELDS.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => match self.field() {
                Field::LlfCode => self.start_edit(self.llf_input.clone(), "Editing LLF code"),
                Field::Consumption => self.start_edit(self.consumption_input.clone(), "Editing annual consumption (kWh)"),
                _ => self.adjust_field(1),
            },
            KeyCode::PageDown => {
                let max = self.result.as_ref().map(|e| e.len().saturating_sub(1)).unwrap_or(0);
                self.scroll = (self.scroll + 10).min(max);
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
            }
            KeyCode::Char('e') => self.export(),
            _ => {}
        }

        false
    }

    fn start_edit(&mut self, current: String, hint: &str) {
        self.editing = Some(current);
        self.set_status(
            StatusKind::Info,
            format!("{hint}. Enter to apply, Esc to cancel."),
        );
    }

    fn handle_edit(&mut self, code: KeyCode) {
        let field = self.field();
        match code {
            KeyCode::Esc => {
                if let Some(previous) = self.editing.take() {
                    match field {
                        Field::LlfCode => self.llf_input = previous,
                        Field::Consumption => self.consumption_input = previous,
                        _ => {}
                    }
                }
                self.refresh();
            }
            KeyCode::Enter => {
                self.editing = None;
                if field == Field::Consumption {
                    self.apply_consumption_input();
                }
                self.refresh();
            }
            KeyCode::Backspace => {
                match field {
                    Field::LlfCode => self.llf_input.pop(),
                    Field::Consumption => self.consumption_input.pop(),
                    _ => None,
                };
            }
            KeyCode::Char(c) => match field {
                Field::LlfCode if !c.is_control() => self.llf_input.push(c),
                Field::Consumption => {
                    let second_dot = c == '.' && self.consumption_input.contains('.');
                    if (c.is_ascii_digit() || c == '.') && !second_dot {
                        self.consumption_input.push(c);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn apply_consumption_input(&mut self) {
        let trimmed = self.consumption_input.trim();
        if trimmed.is_empty() {
            self.consumption_input = "0".to_string();
            self.annual_consumption = 0.0;
            return;
        }
        match parse_consumption(trimmed) {
            Ok(v) => self.annual_consumption = v,
            Err(_) => {
                self.consumption_input = format_consumption(self.annual_consumption);
            }
        }
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.field() {
            Field::Dno => self.dno_idx = cycle(self.dno_idx, self.network_ids.len(), delta),
            Field::Duration => self.duration_idx = cycle(self.duration_idx, self.durations.len(), delta),
            Field::Green => self.green_energy = !self.green_energy,
            Field::LlfCode | Field::Consumption => return,
        }
        self.refresh();
    }

    fn query(&self) -> PricingQuery {
        PricingQuery {
            network_id: self.network_ids[self.dno_idx],
            loss_factor_code: self.llf_input.clone(),
            annual_consumption: self.annual_consumption,
            contract_duration_months: self.durations[self.duration_idx],
            green_energy: self.green_energy,
        }
    }

    /// Re-run the lookup for the current form values.
    fn refresh(&mut self) {
        self.result = evaluate(self.tables, &self.query());
        self.scroll = 0;

        let (kind, message) = match &self.result {
            Ok(eval) if eval.is_empty() => (StatusKind::Warning, "No matching pricing records found.".to_string()),
            Ok(eval) => (
                StatusKind::Success,
                format!("Found {} matching record(s). Press e to export.", eval.len()),
            ),
            Err(err @ LookupError::MissingInput) => (StatusKind::Warning, err.to_string()),
            Err(err @ LookupError::NotFound { .. }) => (StatusKind::Error, err.to_string()),
        };
        self.set_status(kind, message);
    }

    fn export(&mut self) {
        let eval = match &self.result {
            Ok(eval) if !eval.is_empty() => eval,
            _ => {
                self.set_status(StatusKind::Warning, "Nothing to export.".to_string());
                return;
            }
        };

        let written = crate::io::export::write_results_csv(
            &self.export_path,
            &self.tables.pricing.headers,
            &eval.matches,
        );
        match written {
            Ok(()) => {
                let rows = eval.len();
                self.set_status(
                    StatusKind::Success,
                    format!(
                        "Exported {rows} row(s) to {} ({EXPORT_MIME}).",
                        self.export_path.display()
                    ),
                );
            }
            Err(err) => self.set_status(StatusKind::Error, format!("Export failed: {err}")),
        }
    }

    fn set_status(&mut self, kind: StatusKind, message: String) {
        self.status_kind = kind;
        self.status = message;
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("llf", Style::default().fg(Color::Cyan)),
            Span::raw(" - Electricity Pricing Tool"),
        ]));

        let band = match &self.result {
            Ok(eval) => eval.band.clone(),
            Err(_) => "-".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!(
                "Mapped LLF band: {band} | {}",
                crate::report::format_load_summary(self.tables)
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Min(0)])
            .split(area);

        self.draw_form(frame, chunks[0]);
        self.draw_results(frame, chunks[1]);
    }

    fn draw_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let editing = |field: Field| self.editing.is_some() && self.field() == field;
        let cursor = |field: Field| if editing(field) { "_" } else { "" };

        let llf = if self.llf_input.is_empty() && !editing(Field::LlfCode) {
            "(e.g. 199, N10, X20)".to_string()
        } else {
            format!("{}{}", self.llf_input, cursor(Field::LlfCode))
        };

        let items = vec![
            ListItem::new(format!("DNO ID: ◂ {} ▸", self.network_ids[self.dno_idx])),
            ListItem::new(format!("LLF Code: {llf}")),
            ListItem::new(format!(
                "Annual Consumption (kWh): {}{}",
                self.consumption_input,
                cursor(Field::Consumption)
            )),
            ListItem::new(format!(
                "Contract Duration (months): ◂ {} ▸",
                self.durations[self.duration_idx]
            )),
            ListItem::new(format!("Green Energy: {}", green_label(self.green_energy))),
        ];

        let list = List::new(items)
            .block(Block::default().title("Filter Criteria").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_results(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Results").borders(Borders::ALL);

        let eval = match &self.result {
            Ok(eval) if !eval.is_empty() => eval,
            Ok(_) => {
                let msg = Paragraph::new("No matching pricing records found.")
                    .style(Style::default().fg(Color::Yellow))
                    .block(block);
                frame.render_widget(msg, area);
                return;
            }
            Err(err) => {
                let color = match err {
                    LookupError::MissingInput => Color::Yellow,
                    LookupError::NotFound { .. } => Color::Red,
                };
                let msg = Paragraph::new(err.to_string())
                    .style(Style::default().fg(color))
                    .wrap(Wrap { trim: true })
                    .block(block);
                frame.render_widget(msg, area);
                return;
            }
        };

        let headers = &self.tables.pricing.headers;
        let widths: Vec<Constraint> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let widest = eval
                    .matches
                    .iter()
                    .filter_map(|r| r.fields.get(i))
                    .map(|c| c.trim().chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(1);
                Constraint::Length((widest as u16).clamp(1, MAX_COLUMN_WIDTH))
            })
            .collect();

        let header = Row::new(headers.iter().map(|h| h.trim().to_string()))
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        let rows = eval
            .matches
            .iter()
            .map(|r| Row::new(r.fields.iter().map(|c| c.trim().to_string())));

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .block(
                Block::default()
                    .title(format!("Results - {} row(s)", eval.len()))
                    .borders(Borders::ALL),
            );

        let mut state = TableState::default().with_offset(self.scroll);
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = if self.editing.is_some() {
            "type to edit  Enter apply  Esc cancel"
        } else {
            "↑/↓ select  ←/→ change  Enter edit  PgUp/PgDn scroll  e export  q quit"
        };
        let color = match self.status_kind {
            StatusKind::Info => Color::Gray,
            StatusKind::Success => Color::Green,
            StatusKind::Warning => Color::Yellow,
            StatusKind::Error => Color::Red,
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(color)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn cycle(idx: usize, len: usize, delta: i32) -> usize {
    if len == 0 {
        return 0;
    }
    if delta >= 0 {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    }
}

fn format_consumption(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BandMapping, BandTable, PricingRecord, PricingTable};
    use ratatui::backend::TestBackend;

    fn record(dno: u32, band: &str, duration: u32, green: bool, supplier: &str) -> PricingRecord {
        PricingRecord {
            network_id: NetworkId::new(dno),
            loss_factor_band: band.to_string(),
            contract_duration_months: duration,
            green_energy: green,
            min_annual_consumption: 0.0,
            max_annual_consumption: 5000.0,
            fields: vec![dno.to_string(), band.to_string(), supplier.to_string()],
        }
    }

    fn tables() -> Tables {
        Tables {
            pricing: PricingTable {
                headers: vec!["DNO_ID".to_string(), "LLF_Band".to_string(), "Supplier".to_string()],
                records: vec![
                    record(10, "A", 12, false, "Volt"),
                    record(10, "A", 24, false, "Amp"),
                    record(12, "A", 12, true, "Ohm"),
                ],
                ..PricingTable::default()
            },
            bands: BandTable {
                mappings: vec![BandMapping {
                    network_id: NetworkId::new(10),
                    loss_factor_code: "199".to_string(),
                    band: "A".to_string(),
                }],
                ..BandTable::default()
            },
        }
    }

    fn type_llf(app: &mut App<'_>, code: &str) {
        app.selected_field = 1;
        app.handle_key(KeyCode::Enter);
        for c in code.chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter);
    }

    fn render(app: &App<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 24)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn starts_waiting_for_an_llf_code() {
        let t = tables();
        let app = App::new(&t, PathBuf::from("unused.csv")).unwrap();
        assert_eq!(app.result, Err(LookupError::MissingInput));
        assert_eq!(app.status, "Please enter an LLF code.");
        assert!(render(&app).contains("Please enter an LLF code."));
    }

    #[test]
    fn typing_a_code_resolves_and_filters() {
        let t = tables();
        let mut app = App::new(&t, PathBuf::from("unused.csv")).unwrap();
        type_llf(&mut app, "199");

        let eval = app.result.as_ref().unwrap();
        assert_eq!(eval.band, "A");
        assert_eq!(eval.len(), 1);
        assert_eq!(eval.matches[0].fields[2], "Volt");
        assert_eq!(app.status_kind, StatusKind::Success);

        let screen = render(&app);
        assert!(screen.contains("Mapped LLF band: A"));
        assert!(screen.contains("Volt"));
    }

    #[test]
    fn changing_duration_re_evaluates() {
        let t = tables();
        let mut app = App::new(&t, PathBuf::from("unused.csv")).unwrap();
        type_llf(&mut app, "199");

        app.selected_field = 3;
        app.handle_key(KeyCode::Right);
        let eval = app.result.as_ref().unwrap();
        assert_eq!(eval.query.contract_duration_months, 24);
        assert_eq!(eval.matches[0].fields[2], "Amp");

        // Green on: nothing for DNO 10.
        app.selected_field = 4;
        app.handle_key(KeyCode::Right);
        assert!(app.result.as_ref().unwrap().is_empty());
        assert_eq!(app.status, "No matching pricing records found.");
    }

    #[test]
    fn unknown_code_shows_error() {
        let t = tables();
        let mut app = App::new(&t, PathBuf::from("unused.csv")).unwrap();
        type_llf(&mut app, "999");
        assert!(matches!(app.result, Err(LookupError::NotFound { .. })));
        assert_eq!(app.status_kind, StatusKind::Error);
        assert!(render(&app).contains("No LLF mapping found"));
    }

    #[test]
    fn escape_restores_previous_code() {
        let t = tables();
        let mut app = App::new(&t, PathBuf::from("unused.csv")).unwrap();
        type_llf(&mut app, "199");

        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Backspace);
        app.handle_key(KeyCode::Char('x'));
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.llf_input, "199");
        assert!(app.result.is_ok());
    }

    #[test]
    fn consumption_input_accepts_one_decimal_point() {
        let t = tables();
        let mut app = App::new(&t, PathBuf::from("unused.csv")).unwrap();
        type_llf(&mut app, "199");

        app.selected_field = 2;
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Backspace);
        for c in "60a00.5.1".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.consumption_input, "6000.51");
        assert_eq!(app.annual_consumption, 6000.51);
        assert!(app.result.as_ref().unwrap().is_empty());
    }

    #[test]
    fn export_writes_matches_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing_results.csv");
        let t = tables();
        let mut app = App::new(&t, path.clone()).unwrap();

        app.handle_key(KeyCode::Char('e'));
        assert_eq!(app.status, "Nothing to export.");
        assert!(!path.exists());

        type_llf(&mut app, "199");
        app.handle_key(KeyCode::Char('e'));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "DNO_ID,LLF_Band,Supplier\n10,A,Volt\n");
        assert!(app.status.starts_with("Exported 1 row(s)"));
    }

    #[test]
    fn dno_selector_wraps_around() {
        let t = tables();
        let mut app = App::new(&t, PathBuf::from("unused.csv")).unwrap();
        assert_eq!(app.network_ids, vec![NetworkId::new(10), NetworkId::new(12)]);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.query().network_id, NetworkId::new(12));
        app.handle_key(KeyCode::Right);
        assert_eq!(app.query().network_id, NetworkId::new(10));
        assert!(app.handle_key(KeyCode::Char('q')));
    }
}
