//! Symptom triage: interactive Ratatui TUI
//!
//! Layout:
//!   ┌─── header ──────────────────────────────────────────────────────────┐
//!   │  Symptom Triage Assistant       mode · priority                     │
//!   ├─── side panel ──────┬─── conversation ──────────────────────────────┤
//!   │  Allergies          │  transcript (scrollable)                      │
//!   │  Conditions         │                                               │
//!   │  notice             ├───────────────────────────────────────────────┤
//!   │                     │  input                                        │
//!   ├─────────────────────┴───────────────────────────────────────────────┤
//!   │  footer (key bindings, status)                                      │
//!   └─────────────────────────────────────────────────────────────────────┘

use std::{
    fs::File,
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::Parser;
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
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use triage_contracts::error::TriageResult;
use triage_session::{AppConfig, PrioritySetting, Role, TriageRuntime, TriageSession};

const LOG_FILE: &str = "triage-tui.log";

// ── CLI definition ────────────────────────────────────────────────────────────

/// Interactive symptom triage assistant (not medical advice).
#[derive(Parser)]
#[command(name = "triage-tui", version)]
struct Cli {
    /// Configuration file with [llm] and [triage] tables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Knowledge tables to use instead of the configured or built-in ones.
    #[arg(long)]
    knowledge: Option<PathBuf>,

    /// Use keyword extraction and canned advice; no network calls.
    #[arg(long)]
    offline: bool,

    /// Let emergencies preempt clarification requests.
    #[arg(long)]
    urgency_first: bool,
}

// ── App state ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Allergies,
    Conditions,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Input => Focus::Allergies,
            Focus::Allergies => Focus::Conditions,
            Focus::Conditions => Focus::Input,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Input => Focus::Conditions,
            Focus::Allergies => Focus::Input,
            Focus::Conditions => Focus::Allergies,
        }
    }
}

struct App {
    session: TriageSession,
    /// e.g. "offline · clarification first"
    mode_label: String,
    focus: Focus,

    input: String,
    allergies: String,
    conditions: String,

    // Submitted text waiting for the next loop iteration, so the
    // "analyzing" status is drawn before the blocking turn runs.
    pending: Option<String>,
    status: String,
    // Lines scrolled up from the bottom of the transcript.
    scroll_back: u16,
    should_quit: bool,
}

impl App {
    fn new(runtime: Arc<TriageRuntime>, mode_label: String) -> Self {
        Self {
            session: TriageSession::new(runtime),
            mode_label,
            focus: Focus::Input,
            input: String::new(),
            allergies: String::new(),
            conditions: String::new(),
            pending: None,
            status: "Describe your symptoms and press Enter.".to_string(),
            scroll_back: 0,
            should_quit: false,
        }
    }

    fn focused_field_mut(&mut self) -> &mut String {
        match self.focus {
            Focus::Input => &mut self.input,
            Focus::Allergies => &mut self.allergies,
            Focus::Conditions => &mut self.conditions,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('l') if ctrl => self.clear(),

            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),

            KeyCode::Enter => match self.focus {
                Focus::Input => self.submit(),
                Focus::Allergies | Focus::Conditions => self.apply_history(),
            },

            KeyCode::Up => self.scroll_back = self.scroll_back.saturating_add(1),
            KeyCode::Down => self.scroll_back = self.scroll_back.saturating_sub(1),
            KeyCode::PageUp => self.scroll_back = self.scroll_back.saturating_add(10),
            KeyCode::PageDown => self.scroll_back = self.scroll_back.saturating_sub(10),
            KeyCode::End => self.scroll_back = 0,

            KeyCode::Backspace => {
                self.focused_field_mut().pop();
            }
            KeyCode::Char(c) if !ctrl => self.focused_field_mut().push(c),
            _ => {}
        }
    }

    fn submit(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            self.status = "Please describe your symptoms".to_string();
            return;
        }
        self.input.clear();
        self.pending = Some(text);
        self.status = "⏳ Analyzing symptoms…".to_string();
    }

    /// Run the queued turn, if any.
    fn run_pending(&mut self) {
        let Some(text) = self.pending.take() else {
            return;
        };
        let report = self.session.submit(&text);
        self.scroll_back = 0;
        self.status = if report.outcome.is_some() {
            format!("Turn {} complete.", short_id(&report.turn_id.to_string()))
        } else {
            "The turn failed; see the response for details.".to_string()
        };
    }

    fn apply_history(&mut self) {
        self.session.update_history(&self.allergies, &self.conditions);
        let history = self.session.history();
        self.allergies = history.allergies_csv();
        self.conditions = history.conditions_csv();
        self.status = "Medical history updated.".to_string();
        info!(
            allergies = history.allergies.len(),
            conditions = history.conditions.len(),
            "history updated from side panel"
        );
    }

    fn clear(&mut self) {
        self.session.clear();
        self.scroll_back = 0;
        self.status = "Conversation cleared.".to_string();
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn ui(f: &mut Frame, app: &App) {
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(8),    // side panel + conversation
            Constraint::Length(3), // footer
        ])
        .split(f.area());

    render_header(f, outer_chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(outer_chunks[1]);

    render_side_panel(f, body[0], app);

    let conversation = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(body[1]);

    render_transcript(f, conversation[0], app);
    render_field(
        f,
        conversation[1],
        "Describe your symptoms",
        &app.input,
        app.focus == Focus::Input,
    );
    render_footer(f, outer_chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let title_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let line = Line::from(vec![
        Span::styled("🏥 Symptom Triage Assistant    ", title_style),
        Span::styled(app.mode_label.clone(), Style::default().fg(Color::DarkGray)),
    ]);
    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(header, area);
}

fn render_side_panel(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    render_field(f, chunks[0], "Allergies", &app.allergies, app.focus == Focus::Allergies);
    render_field(f, chunks[1], "Conditions", &app.conditions, app.focus == Focus::Conditions);

    let notice = Paragraph::new(vec![
        Line::from("Comma-separated; Enter saves."),
        Line::from(""),
        Line::from(Span::styled(
            "⚠️ Not medical advice.",
            Style::default().fg(Color::Yellow),
        )),
        Line::from("In an emergency, call your local emergency number."),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(" Medical History ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(notice, chunks[2]);
}

fn render_field(f: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let field = Paragraph::new(value.to_string()).block(
        Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(field, area);

    if focused {
        let max_x = area.x + area.width.saturating_sub(2);
        let x = (area.x + 1 + value.chars().count() as u16).min(max_x);
        f.set_cursor_position((x, area.y + 1));
    }
}

fn render_transcript(f: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = Vec::new();
    for entry in app.session.transcript() {
        let color = match entry.role {
            Role::User => Color::Green,
            Role::Assistant => Color::Cyan,
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", entry.at.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("{}:", entry.role),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]));
        for text in entry.content.lines() {
            lines.push(Line::from(text.to_string()));
        }
        lines.push(Line::from(""));
    }

    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let inner_height = area.height.saturating_sub(2);
    let total = wrapped_height(&lines, inner_width);
    let top = total
        .saturating_sub(inner_height)
        .saturating_sub(app.scroll_back);

    let transcript = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((top, 0))
        .block(
            Block::default()
                .title(" Conversation ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(transcript, area);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Cyan);
    let spans = vec![
        Span::styled(" [Enter] ", key),
        Span::raw("Submit/Save  "),
        Span::styled("[Tab] ", key),
        Span::raw("Focus  "),
        Span::styled("[Ctrl-L] ", key),
        Span::raw("Clear  "),
        Span::styled("[↑/↓] ", key),
        Span::raw("Scroll  "),
        Span::styled("[Esc] ", key),
        Span::raw("Quit   "),
        Span::styled(app.status.clone(), Style::default().fg(Color::Yellow)),
    ];
    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}

// ── Utility helpers ───────────────────────────────────────────────────────────

/// Rows `lines` occupy when wrapped at `width` columns (approximate).
fn wrapped_height(lines: &[Line], width: usize) -> u16 {
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// First segment of a UUID.
fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

// ── Setup ─────────────────────────────────────────────────────────────────────

/// Log to a file, and only when `RUST_LOG` is set; stdout belongs to the UI.
fn init_logging() {
    let Ok(filter) = EnvFilter::try_from_default_env() else {
        return;
    };
    let Ok(file) = File::create(LOG_FILE) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
}

fn build_runtime(cli: &Cli) -> TriageResult<(TriageRuntime, String)> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.knowledge {
        config.triage.knowledge = Some(path.clone());
    }
    if cli.urgency_first {
        config.triage.priority = PrioritySetting::UrgencyFirst;
    }

    let runtime = TriageRuntime::from_config(&config, cli.offline)?;
    let mode = if cli.offline { "offline" } else { config.llm.model.as_str() };
    let priority = match config.triage.priority {
        PrioritySetting::ClarificationFirst => "clarification first",
        PrioritySetting::UrgencyFirst => "urgency first",
    };
    Ok((runtime, format!("{} · {}", mode, priority)))
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

// ── Main event loop ───────────────────────────────────────────────────────────

fn main() -> io::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let (runtime, mode_label) = match build_runtime(&cli) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("triage-tui: {}", e);
            if !cli.offline {
                eprintln!("hint: pass --offline to run without a language model");
            }
            std::process::exit(1);
        }
    };

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let mut terminal = setup_terminal()?;
    let mut app = App::new(Arc::new(runtime), mode_label);

    while !app.should_quit {
        terminal.draw(|f| ui(f, &app))?;

        if app.pending.is_some() {
            app.run_pending();
            continue;
        }

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
