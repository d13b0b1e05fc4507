//! Terminal front end: draws a `PanelView` and turns key presses into `UiEvent`s.

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::app_services::AppServices;
use crate::models::panel::PanelView;
use crate::models::weather_model::{UiEvent, WeatherModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Recent,
}

/// What a key press means for the terminal app
#[derive(Debug, PartialEq)]
enum KeyAction {
    Quit,
    SwitchFocus,
    SelectPrevious,
    SelectNext,
    Dispatch(UiEventKind),
    Ignore,
}

/// Model events a key can produce (`UiEvent` itself is not `PartialEq`)
#[derive(Debug, PartialEq)]
enum UiEventKind {
    InsertChar(char),
    DeleteChar,
    Submit,
    SelectRecent,
    ToggleUnit,
}

pub struct TuiApp {
    model: WeatherModel,
    focus: Focus,
    selected: usize,
}

impl TuiApp {
    pub fn new(model: WeatherModel) -> Self {
        Self {
            model,
            focus: Focus::Input,
            selected: 0,
        }
    }

    pub fn model(&self) -> &WeatherModel {
        &self.model
    }

    fn key_action(&self, key: &KeyEvent) -> KeyAction {
        if key.kind != KeyEventKind::Press {
            return KeyAction::Ignore;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('c') if ctrl => KeyAction::Quit,
            KeyCode::F(2) => KeyAction::Dispatch(UiEventKind::ToggleUnit),
            KeyCode::Tab | KeyCode::BackTab => KeyAction::SwitchFocus,
            KeyCode::Enter => match self.focus {
                Focus::Input => KeyAction::Dispatch(UiEventKind::Submit),
                Focus::Recent => KeyAction::Dispatch(UiEventKind::SelectRecent),
            },
            KeyCode::Up if self.focus == Focus::Recent => KeyAction::SelectPrevious,
            KeyCode::Down if self.focus == Focus::Recent => KeyAction::SelectNext,
            KeyCode::Backspace if self.focus == Focus::Input => {
                KeyAction::Dispatch(UiEventKind::DeleteChar)
            }
            KeyCode::Char(c) if self.focus == Focus::Input && !ctrl => {
                KeyAction::Dispatch(UiEventKind::InsertChar(c))
            }
            _ => KeyAction::Ignore,
        }
    }

    /// Apply a key press. Returns false when the app should exit.
    fn on_key(&mut self, key: &KeyEvent, services: &AppServices) -> bool {
        let event = match self.key_action(key) {
            KeyAction::Quit => return false,
            KeyAction::Ignore => return true,
            KeyAction::SwitchFocus => {
                self.focus = match self.focus {
                    Focus::Input if !self.model.recent_cities().is_empty() => Focus::Recent,
                    _ => Focus::Input,
                };
                return true;
            }
            KeyAction::SelectPrevious => {
                self.selected = self.selected.saturating_sub(1);
                return true;
            }
            KeyAction::SelectNext => {
                let last = self.model.recent_cities().len().saturating_sub(1);
                self.selected = (self.selected + 1).min(last);
                return true;
            }
            KeyAction::Dispatch(kind) => match kind {
                UiEventKind::InsertChar(c) => UiEvent::InsertChar(c),
                UiEventKind::DeleteChar => UiEvent::DeleteChar,
                UiEventKind::Submit => UiEvent::Submit,
                UiEventKind::SelectRecent => UiEvent::SelectRecent(self.selected),
                UiEventKind::ToggleUnit => UiEvent::ToggleUnit,
            },
        };

        self.dispatch(event, services);
        true
    }

    fn dispatch(&mut self, event: UiEvent, services: &AppServices) {
        if let Some(request) = self.model.handle(event) {
            services.request_fetch(request);
        }
        // The list may have grown at the front or be shorter than the cursor
        let len = self.model.recent_cities().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn drain_results(&mut self, services: &AppServices) {
        while let Some(msg) = services.try_recv() {
            self.dispatch(msg.into(), services);
        }
    }
}

/// Take over the terminal and run until the user quits.
pub fn run_ui(app: &mut TuiApp, services: &AppServices, tick_rate: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut terminal = undo_on_error(enter_terminal, || {
        if let Err(e) = restore_terminal() {
            tracing::warn!("Failed to restore terminal: {}", e);
        }
    })?;

    let res = run_app(&mut terminal, app, services, tick_rate);

    restore_terminal()?;
    terminal.show_cursor()?;

    res
}

fn enter_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Run `setup`, calling `undo` before returning its error.
fn undo_on_error<T>(setup: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    setup().map_err(|e| {
        undo();
        e
    })
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut TuiApp,
    services: &AppServices,
    tick_rate: Duration,
) -> Result<()> {
    if let Some(request) = app.model.start() {
        services.request_fetch(request);
    }

    loop {
        let view = PanelView::from_model(&app.model);
        terminal.draw(|f| ui(f, &view, app.focus, app.selected))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if !app.on_key(&key, services) {
                    tracing::info!("Quit requested");
                    return Ok(());
                }
            }
        }

        app.drain_results(services);
    }
}

fn ui(f: &mut Frame, view: &PanelView, focus: Focus, selected: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input
            Constraint::Length(1), // Error / loading line
            Constraint::Min(0),    // Recent list + result panel
            Constraint::Length(1), // Key help
        ])
        .split(f.size());

    render_input(f, chunks[0], view, focus);
    render_status_line(f, chunks[1], view);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[2]);

    render_recent(f, body[0], view, focus, selected);
    render_reading(f, body[1], view);
    render_help(f, chunks[3], view);
}

fn focused_border(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_input(f: &mut Frame, area: Rect, view: &PanelView, focus: Focus) {
    let input = Paragraph::new(view.input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Enter city name...")
            .border_style(focused_border(focus == Focus::Input)),
    );
    f.render_widget(input, area);

    if focus == Focus::Input {
        let width = u16::try_from(view.input.chars().count()).unwrap_or(u16::MAX);
        let max_x = area.x + area.width.saturating_sub(2);
        f.set_cursor((area.x + 1).saturating_add(width).min(max_x), area.y + 1);
    }
}

fn render_status_line(f: &mut Frame, area: Rect, view: &PanelView) {
    let line = if view.loading {
        Line::from(Span::styled("Loading…", Style::default().fg(Color::Yellow)))
    } else if let Some(error) = &view.error {
        Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red)))
    } else {
        Line::from("")
    };
    f.render_widget(Paragraph::new(line), area);
}

fn render_recent(f: &mut Frame, area: Rect, view: &PanelView, focus: Focus, selected: usize) {
    let items: Vec<ListItem> = view
        .recent
        .iter()
        .map(|entry| {
            let style = if entry.active {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Blue)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(entry.city.as_str(), style)))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Recent Searches")
                .border_style(focused_border(focus == Focus::Recent)),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if focus == Focus::Recent && !view.recent.is_empty() {
        state.select(Some(selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_reading(f: &mut Frame, area: Rect, view: &PanelView) {
    let block = Block::default().borders(Borders::ALL).title("Current Weather");

    let Some(reading) = &view.reading else {
        f.render_widget(Paragraph::new("No city selected yet.").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().add_modifier(Modifier::BOLD);
    let row = |name: &'static str, text: &str| {
        Line::from(vec![
            Span::styled(name, label),
            Span::styled(text.to_string(), value),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(
            reading.header.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        row("Temperature: ", &reading.temperature),
        row("Condition: ", &reading.condition),
        row("Icon: ", &reading.icon_url),
        row("Humidity: ", &reading.humidity),
        row("Pressure: ", &reading.pressure),
        row("Visibility: ", &reading.visibility),
    ];

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_help(f: &mut Frame, area: Rect, view: &PanelView) {
    let help = Line::from(vec![
        Span::raw("Enter: search  Tab: recent list  F2: "),
        Span::styled(view.unit_label, Style::default().fg(Color::Yellow)),
        Span::raw(" (Celsius/Fahrenheit)  Esc: quit"),
    ]);
    f.render_widget(Paragraph::new(help), area);
}
