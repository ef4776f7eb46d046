use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use depboard_core::{
    ldb::LdbApi,
    session::{BoardPhase, Intent, RenderUpdate, SessionController, SessionEvent},
    stations::{StationCode, StationDirectory},
};

use crate::args::Startup;

const TICK_RATE: Duration = Duration::from_millis(250);
const ALL_DESTINATIONS: &str = "<All destinations>";

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            warning: Color::Yellow,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptStage {
    Origin,
    Destination,
}

/// Incremental station search, two stages: origin then destination.
struct StationPrompt {
    stage: PromptStage,
    input: String,
    matches: Vec<String>,
    cursor: usize,
    from: Option<StationCode>,
}

impl StationPrompt {
    fn origin(directory: &StationDirectory) -> Self {
        let mut prompt = Self {
            stage: PromptStage::Origin,
            input: String::new(),
            matches: Vec::new(),
            cursor: 0,
            from: None,
        };
        prompt.refresh_matches(directory);
        prompt
    }

    fn destination(from: StationCode, directory: &StationDirectory) -> Self {
        let mut prompt = Self {
            stage: PromptStage::Destination,
            input: String::new(),
            matches: Vec::new(),
            cursor: 0,
            from: Some(from),
        };
        prompt.refresh_matches(directory);
        prompt
    }

    fn title(&self) -> &'static str {
        match self.stage {
            PromptStage::Origin => "From station",
            PromptStage::Destination => "To station",
        }
    }

    fn refresh_matches(&mut self, directory: &StationDirectory) {
        let needle = self.input.to_lowercase();
        let mut matches: Vec<String> = Vec::new();
        if self.stage == PromptStage::Destination
            && ALL_DESTINATIONS.to_lowercase().contains(&needle)
        {
            matches.push(ALL_DESTINATIONS.to_string());
        }
        matches.extend(
            directory
                .names()
                .into_iter()
                .filter(|name| name.to_lowercase().contains(&needle))
                .map(str::to_string),
        );
        self.matches = matches;
        self.cursor = 0;
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.matches.is_empty() {
            return;
        }
        let last = self.matches.len() - 1;
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, last as isize) as usize;
    }

    fn current_choice(&self) -> Option<&str> {
        self.matches.get(self.cursor).map(String::as_str)
    }
}

struct UiState {
    title: String,
    board_rows: Vec<String>,
    detail_rows: Vec<String>,
    messages: Vec<String>,
    status: String,
    selected: usize,
    switch_enabled: bool,
    all_destinations_enabled: bool,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            title: "Departures".to_string(),
            board_rows: Vec::new(),
            detail_rows: Vec::new(),
            messages: Vec::new(),
            status: "Ready".to_string(),
            selected: 0,
            switch_enabled: false,
            all_destinations_enabled: false,
            should_quit: false,
        }
    }
}

/// The departure board terminal application.
pub struct BoardApp<C: LdbApi> {
    controller: SessionController<C>,
    directory: Arc<StationDirectory>,
    state: UiState,
    prompt: Option<StationPrompt>,
    confirm_quit: bool,
    show_about: bool,
    theme: Theme,
}

impl<C: LdbApi> BoardApp<C> {
    pub fn new(controller: SessionController<C>, directory: Arc<StationDirectory>) -> Self {
        Self {
            controller,
            directory,
            state: UiState::default(),
            prompt: None,
            confirm_quit: false,
            show_about: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(
        &mut self,
        mut session_rx: mpsc::Receiver<SessionEvent>,
        startup: Startup,
        notice: Option<String>,
    ) -> Result<()> {
        match startup {
            Startup::Filter { from, to } => {
                let updates = self.controller.handle_intent(Intent::SelectStation { from, to });
                self.apply_updates(updates);
            }
            Startup::PromptOrigin => {
                self.prompt = Some(StationPrompt::origin(&self.directory));
            }
            Startup::PromptDestination { from } => {
                self.prompt = Some(StationPrompt::destination(from, &self.directory));
            }
        }
        if let Some(notice) = notice {
            self.state.messages = vec![notice];
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            tokio::select! {
                maybe_event = event_rx.recv() => {
                    match maybe_event {
                        Some(AppEvent::Input(event)) => self.handle_input(event),
                        Some(AppEvent::Tick) => {}
                        None => break,
                    }
                }
                maybe_session = session_rx.recv() => {
                    match maybe_session {
                        Some(event) => {
                            let updates = self.controller.handle_event(event);
                            self.apply_updates(updates);
                        }
                        None => break,
                    }
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn apply_updates(&mut self, updates: Vec<RenderUpdate>) {
        for update in updates {
            match update {
                RenderUpdate::SetTitle(title) => self.state.title = title,
                RenderUpdate::SetBoardRows(rows) => {
                    self.state.board_rows = rows;
                    self.state.selected = 0;
                }
                RenderUpdate::SetDetailRows(rows) => self.state.detail_rows = rows,
                RenderUpdate::SetMessages(messages) => self.state.messages = messages,
                RenderUpdate::SetMenuEnablement {
                    switch,
                    all_destinations,
                } => {
                    self.state.switch_enabled = switch;
                    self.state.all_destinations_enabled = all_destinations;
                }
            }
        }
    }

    fn handle_input(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != event::KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return;
        }

        if self.confirm_quit {
            self.handle_confirm_key(key);
            return;
        }
        if self.show_about {
            self.show_about = false;
            return;
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        self.handle_board_key(key);
    }

    /// Only an explicit Yes quits; No and dismissal both cancel.
    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let choice = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(true),
            KeyCode::Char('n') | KeyCode::Char('N') => Some(false),
            KeyCode::Esc => None,
            _ => return,
        };
        self.confirm_quit = false;
        if choice == Some(true) {
            info!("quit confirmed");
            self.state.should_quit = true;
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.state.status = "Search cancelled".to_string();
            }
            KeyCode::Up => prompt.move_cursor(-1),
            KeyCode::Down => prompt.move_cursor(1),
            KeyCode::Backspace => {
                prompt.input.pop();
                prompt.refresh_matches(&self.directory);
            }
            KeyCode::Char(ch) => {
                prompt.input.push(ch);
                prompt.refresh_matches(&self.directory);
            }
            KeyCode::Enter => self.accept_prompt_choice(),
            _ => {}
        }
    }

    fn accept_prompt_choice(&mut self) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        let Some(choice) = prompt.current_choice().map(str::to_string) else {
            return;
        };

        match prompt.stage {
            PromptStage::Origin => {
                let Some(code) = self.directory.resolve(&choice) else {
                    self.state.status = format!("Unknown station: {choice}");
                    return;
                };
                debug!(%code, "origin chosen");
                let from = code;
                self.prompt = Some(StationPrompt::destination(from, &self.directory));
            }
            PromptStage::Destination => {
                let from = prompt.from.expect("destination stage without origin");
                let to = if choice == ALL_DESTINATIONS {
                    None
                } else {
                    match self.directory.resolve(&choice) {
                        Some(code) => Some(code),
                        None => {
                            self.state.status = format!("Unknown station: {choice}");
                            return;
                        }
                    }
                };
                self.prompt = None;
                self.state.status = "Searching…".to_string();
                let updates = self.controller.handle_intent(Intent::SelectStation { from, to });
                self.apply_updates(updates);
            }
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.confirm_quit = true,
            KeyCode::Char('r') | KeyCode::F(5) => {
                self.state.status = "Refreshing…".to_string();
                let updates = self.controller.handle_intent(Intent::RequestRefresh);
                self.apply_updates(updates);
            }
            KeyCode::Char('s') => {
                if self.state.switch_enabled {
                    self.state.status = "Direction switched".to_string();
                    let updates = self.controller.handle_intent(Intent::RequestSwitch);
                    self.apply_updates(updates);
                } else {
                    self.state.status = "Switch needs a destination filter".to_string();
                }
            }
            KeyCode::Char('a') => {
                if self.state.all_destinations_enabled {
                    self.state.status = "Showing all destinations".to_string();
                    let updates = self.controller.handle_intent(Intent::RequestAllDestinations);
                    self.apply_updates(updates);
                } else {
                    self.state.status = "Already showing all destinations".to_string();
                }
            }
            KeyCode::Char('n') => {
                self.prompt = Some(StationPrompt::origin(&self.directory));
            }
            KeyCode::F(1) => self.show_about = true,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.state.board_rows.is_empty() {
            return;
        }
        let last = self.state.board_rows.len() - 1;
        let next = (self.state.selected as isize + delta).clamp(0, last as isize) as usize;
        if next == self.state.selected {
            return;
        }
        self.state.selected = next;
        let updates = self.controller.handle_intent(Intent::SelectRow(next));
        self.apply_updates(updates);
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Percentage(45),
                Constraint::Min(5),
                Constraint::Length(5),
                Constraint::Length(1),
            ])
            .split(frame.size());

        self.render_title(frame, chunks[0]);
        self.render_board(frame, chunks[1]);
        self.render_details(frame, chunks[2]);
        self.render_messages(frame, chunks[3]);
        self.render_status(frame, chunks[4]);

        if let Some(prompt) = &self.prompt {
            Self::render_prompt(&self.theme, frame, prompt);
        }
        if self.confirm_quit {
            self.render_confirm(frame);
        }
        if self.show_about {
            self.render_about(frame);
        }
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let clock = Local::now().format("%H:%M:%S").to_string();
        let line = Line::from(vec![
            Span::styled(
                self.state.title.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(clock, Style::default().fg(self.theme.muted)),
        ]);
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Left), area);
    }

    fn render_board(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .state
            .board_rows
            .iter()
            .map(|row| ListItem::new(row.clone()))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Departures"))
            .style(Style::default().fg(self.theme.primary_fg))
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg)
                    .add_modifier(Modifier::BOLD),
            );
        let mut list_state = ListState::default();
        if !self.state.board_rows.is_empty() {
            list_state.select(Some(self.state.selected));
        }
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .state
            .detail_rows
            .iter()
            .map(|row| ListItem::new(row.clone()))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Calling points"))
            .style(Style::default().fg(self.theme.primary_fg));
        frame.render_widget(list, area);
    }

    fn render_messages(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .state
            .messages
            .iter()
            .map(|message| {
                ListItem::new(message.clone()).style(Style::default().fg(self.theme.warning))
            })
            .collect();
        let list =
            List::new(items).block(Block::default().borders(Borders::ALL).title("Messages"));
        frame.render_widget(list, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let phase = match self.controller.phase() {
            BoardPhase::Loading => "Loading…",
            BoardPhase::Idle => "No board",
            BoardPhase::Loaded => "Live",
        };
        let switch_hint = if self.state.switch_enabled {
            Span::raw("s switch  ")
        } else {
            Span::styled("s switch  ", Style::default().fg(self.theme.muted))
        };
        let all_hint = if self.state.all_destinations_enabled {
            Span::raw("a all dests  ")
        } else {
            Span::styled("a all dests  ", Style::default().fg(self.theme.muted))
        };
        let line = Line::from(vec![
            Span::styled(
                format!("{phase}  "),
                Style::default().fg(self.theme.accent),
            ),
            Span::raw("r refresh  "),
            switch_hint,
            all_hint,
            Span::raw("n new  q quit  "),
            Span::styled(&self.state.status, Style::default().fg(self.theme.muted)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_prompt(theme: &Theme, frame: &mut Frame, prompt: &StationPrompt) {
        let area = centered_rect(40, 14, frame.size());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(prompt.title())
            .style(Style::default().fg(theme.primary_fg));
        frame.render_widget(block, area);

        let inner = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(area);

        let input = Paragraph::new(Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.accent)),
            Span::raw(prompt.input.clone()),
        ]));
        frame.render_widget(input, inner[0]);

        let items: Vec<ListItem> = prompt
            .matches
            .iter()
            .map(|name| ListItem::new(name.clone()))
            .collect();
        let list = List::new(items).highlight_style(
            Style::default()
                .bg(theme.selection_bg)
                .fg(theme.selection_fg),
        );
        let mut list_state = ListState::default();
        if !prompt.matches.is_empty() {
            list_state.select(Some(prompt.cursor));
        }
        frame.render_stateful_widget(list, inner[1], &mut list_state);
    }

    fn render_confirm(&self, frame: &mut Frame) {
        let area = centered_rect(36, 5, frame.size());
        frame.render_widget(Clear, area);
        let text = vec![
            Line::from("Are you sure you want to quit?"),
            Line::from(""),
            Line::from(Span::styled(
                "[y]es   [n]o",
                Style::default().fg(self.theme.accent),
            )),
        ];
        let dialog = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Quit?"));
        frame.render_widget(dialog, area);
    }

    fn render_about(&self, frame: &mut Frame) {
        let area = centered_rect(36, 6, frame.size());
        frame.render_widget(Clear, area);
        let text = vec![
            Line::from("Live Departure Board"),
            Line::from(format!("Version {}", env!("CARGO_PKG_VERSION"))),
            Line::from(std::env::consts::OS.to_string()),
        ];
        let dialog = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("About"));
        frame.render_widget(dialog, area);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
