//! Main chat event loop and UI rendering.
//!
//! Owns the transcript, the input line, and the per-turn plumbing: one turn
//! at a time, with display updates rewriting the trailing assistant message
//! in place while the pacer reveals it. Turns are numbered so updates from
//! a cancelled turn are discarded instead of clobbering the next one.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tui_textarea::{Input as TAInput, TextArea};
use unicode_width::UnicodeWidthStr;

use crate::core::config::Config;
use crate::core::constants::PROCESSING_PLACEHOLDER;
use crate::core::message::Message;
use crate::core::orchestrator::{spawn_turn, TurnEvent, TurnParams};
use crate::core::pacer::TypingSpeed;
use crate::ui::markdown::render_message;
use crate::ui::theme::Theme;

const EXAMPLE_PROMPTS: &[&str] = &[
    "Can you explain quantum computing in simple terms?",
    "Help me optimize this Python code for better performance",
    "Analyze the environmental impact of electric vehicles",
    "Design a system architecture for a social media platform",
    "Write a research proposal on AI safety",
];

struct ChatApp {
    config: Config,
    client: reqwest::Client,
    theme: Theme,
    messages: Vec<Message>,
    textarea: TextArea<'static>,
    busy: bool,
    /// Id of the most recently spawned turn; events tagged with any other
    /// id are stale and dropped.
    turn_counter: u64,
    /// None while pinned to the bottom; Some once the user scrolls up.
    scroll: Option<u16>,
    speed_tx: watch::Sender<TypingSpeed>,
    speed_rx: watch::Receiver<TypingSpeed>,
    cancel_token: CancellationToken,
    exit_requested: bool,
}

fn new_input_textarea() -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_cursor_line_style(Style::default());
    textarea.set_block(Block::default().borders(Borders::ALL).title("Message"));
    textarea
}

impl ChatApp {
    fn new(config: Config, initial_speed: TypingSpeed) -> Self {
        let (speed_tx, speed_rx) = watch::channel(initial_speed);
        Self {
            config,
            client: reqwest::Client::new(),
            theme: Theme::dark_default(),
            messages: Vec::new(),
            textarea: new_input_textarea(),
            busy: false,
            turn_counter: 0,
            scroll: None,
            speed_tx,
            speed_rx,
            cancel_token: CancellationToken::new(),
            exit_requested: false,
        }
    }

    fn submit(&mut self, tx: &mpsc::UnboundedSender<TurnEvent>) {
        let input = self.textarea.lines().join("\n").trim().to_string();
        if input.is_empty() || self.busy {
            return;
        }
        self.textarea = new_input_textarea();
        self.messages.push(Message::user(&input));

        let history = self.messages.clone();
        // Placeholder the display updates will rewrite; seeded with the
        // processing indicator the pacer also starts from.
        self.messages.push(Message::assistant(PROCESSING_PLACEHOLDER));

        self.busy = true;
        self.scroll = None;
        self.turn_counter += 1;
        self.cancel_token = CancellationToken::new();
        spawn_turn(
            TurnParams {
                client: self.client.clone(),
                config: self.config.clone(),
                history,
                input,
                turn: self.turn_counter,
                speed: self.speed_rx.clone(),
                cancel_token: self.cancel_token.clone(),
            },
            tx.clone(),
        );
    }

    fn apply_event(&mut self, event: TurnEvent) {
        match event {
            TurnEvent::Display { turn, update } => {
                if turn != self.turn_counter {
                    return;
                }
                if let Some(last) = self.messages.last_mut() {
                    last.content = update.content;
                }
                if update.done {
                    self.busy = false;
                }
            }
            TurnEvent::Failed { turn, message } => {
                if turn != self.turn_counter {
                    return;
                }
                self.messages.push(Message::assistant(&message));
                self.busy = false;
            }
        }
    }

    fn cycle_speed(&mut self) {
        let next = self.speed_rx.borrow().next();
        let _ = self.speed_tx.send(next);
    }

    fn cancel_turn(&mut self) {
        if self.busy {
            self.cancel_token.cancel();
            // Bump the counter so in-flight events from the cancelled turn
            // can no longer match.
            self.turn_counter += 1;
            self.busy = false;
        }
    }

    fn transcript_lines(&self) -> Vec<Line<'static>> {
        if self.messages.is_empty() {
            return welcome_lines(&self.theme);
        }
        let mut lines = Vec::new();
        for message in &self.messages {
            lines.extend(render_message(message, &self.theme));
        }
        lines
    }

    fn status_line(&self) -> Line<'static> {
        let speed = self.speed_rx.borrow().label();
        let state = if self.busy { "responding" } else { "ready" };
        Line::from(vec![
            Span::styled(
                format!(" {} · speed: {speed} · {state} ", self.config.reasoning_model),
                self.theme.hint_text,
            ),
            Span::styled(
                "Enter send · Ctrl+T speed · Esc cancel · Ctrl+C quit",
                self.theme.hint_text,
            ),
        ])
    }
}

fn welcome_lines(theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            "Bodhi AI".to_string(),
            theme.user_prefix,
        )),
        Line::from(Span::styled(
            "Ask anything, or try one of these:".to_string(),
            theme.system_text,
        )),
        Line::from(""),
    ];
    for prompt in EXAMPLE_PROMPTS {
        lines.push(Line::from(vec![
            Span::styled("• ".to_string(), theme.list_marker),
            Span::styled((*prompt).to_string(), theme.hint_text),
        ]));
    }
    lines
}

/// Rows the transcript occupies once wrapped to the viewport width. An
/// estimate: ratatui wraps at word boundaries, so a line can take one row
/// more than its width alone implies, but this keeps pinned-bottom scrolling
/// close for long wrapped transcripts.
fn wrapped_rows(lines: &[Line<'_>], width: u16) -> usize {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| {
            let line_width: usize = line
                .spans
                .iter()
                .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
                .sum();
            line_width.div_ceil(width).max(1)
        })
        .sum()
}

fn draw(frame: &mut Frame, app: &mut ChatApp) {
    let [transcript_area, status_area, input_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(frame.area());

    let lines = app.transcript_lines();
    let viewport = transcript_area.height as usize;
    let total = wrapped_rows(&lines, transcript_area.width);
    let max_scroll = total.saturating_sub(viewport) as u16;
    let scroll = match app.scroll {
        Some(offset) => offset.min(max_scroll),
        None => max_scroll,
    };

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        transcript_area,
    );
    frame.render_widget(Paragraph::new(app.status_line()), status_area);
    frame.render_widget(&app.textarea, input_area);
}

fn handle_key(
    app: &mut ChatApp,
    key: event::KeyEvent,
    tx: &mpsc::UnboundedSender<TurnEvent>,
) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.exit_requested = true,
            KeyCode::Char('t') => app.cycle_speed(),
            KeyCode::Char('l') => {
                app.cancel_turn();
                app.messages.clear();
                app.scroll = None;
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit(tx),
        KeyCode::Esc => app.cancel_turn(),
        KeyCode::Up => {
            let current = app.scroll.unwrap_or(u16::MAX);
            app.scroll = Some(current.saturating_sub(1));
        }
        KeyCode::Down => {
            if let Some(offset) = app.scroll {
                // Clamped to the bottom at draw time; End re-pins.
                app.scroll = Some(offset.saturating_add(1));
            }
        }
        KeyCode::PageUp => {
            let current = app.scroll.unwrap_or(u16::MAX);
            app.scroll = Some(current.saturating_sub(10));
        }
        KeyCode::End => app.scroll = None,
        _ => {
            app.textarea.input(TAInput::from(key));
        }
    }
}

/// Run the interactive session until the user quits.
pub async fn run_chat(
    config: Config,
    initial_speed: TypingSpeed,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = ChatApp::new(config, initial_speed);
    let (tx, mut rx) = mpsc::unbounded_channel::<TurnEvent>();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = loop {
        if app.exit_requested {
            break Ok(());
        }
        if let Err(e) = terminal.draw(|f| draw(f, &mut app)) {
            break Err(e.into());
        }

        while let Ok(turn_event) = rx.try_recv() {
            app.apply_event(turn_event);
        }

        match event::poll(Duration::from_millis(50)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    handle_key(&mut app, key, &tx);
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {
                // Yield so spawned turn tasks make progress between polls.
                tokio::task::yield_now().await;
            }
            Err(e) => break Err(e.into()),
        }
    };

    app.cancel_token.cancel();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
