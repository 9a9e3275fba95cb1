//! TUI module using ratatui.
//!
//! One screen per [`SessionState`]: article input with recent history,
//! a loading notice, the running quiz and the final score. Key handling lives
//! on [`App`] and is independent of the terminal so it can be tested.

use crate::article::ArticleResolver;
use crate::config::Config;
use crate::history::{HistoryRecord, HistoryStore};
use crate::session::{start_quiz, QuestionResult, QuizError, QuizSession, SessionState};
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{DefaultTerminal, Frame};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long to wait for a key before redrawing
const TICK: Duration = Duration::from_millis(100);

/// History entries shown on the start screen
const HISTORY_ROWS: usize = 10;

/// Work the event loop must perform on behalf of the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch an article and build a quiz from it
    Fetch(String),
    /// Persist a finished quiz
    Record(HistoryRecord),
}

/// TUI application state
#[derive(Debug, Default)]
pub struct App {
    pub state: SessionState,
    pub input: String,
    pub selected: usize,
    pub message: Option<String>,
    pub feedback: Option<QuestionResult>,
    pub history: Vec<HistoryRecord>,
    pub should_quit: bool,
}

impl App {
    pub fn new(history: Vec<HistoryRecord>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    /// Apply a key press, returning any work the caller must carry out
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        match self.state {
            SessionState::Idle => self.handle_input_key(key),
            // Input is ignored until the fetch resolves
            SessionState::Loading { .. } => None,
            SessionState::InProgress(_) => self.handle_quiz_key(key),
            SessionState::Completed(_) => {
                match key.code {
                    KeyCode::Enter | KeyCode::Esc => self.reset(),
                    KeyCode::Char('q') => self.should_quit = true,
                    _ => {}
                }
                None
            }
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => {
                let input = self.input.trim().to_string();
                if input.is_empty() {
                    self.message = Some(QuizError::NoInput.user_message());
                    return None;
                }
                self.message = None;
                self.state = SessionState::Loading {
                    input: input.clone(),
                };
                return Some(Command::Fetch(input));
            }
            _ => {}
        }
        None
    }

    fn handle_quiz_key(&mut self, key: KeyEvent) -> Option<Command> {
        let SessionState::InProgress(session) = &mut self.state else {
            return None;
        };
        let options = session
            .current_question()
            .map_or(0, |question| question.options.len());

        let choice = match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.checked_sub(1).unwrap_or(options.saturating_sub(1));
                return None;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = if self.selected + 1 >= options { 0 } else { self.selected + 1 };
                return None;
            }
            KeyCode::Char(c @ '1'..='9') => c as usize - '1' as usize,
            KeyCode::Enter => self.selected,
            KeyCode::Esc => {
                self.reset();
                return None;
            }
            _ => return None,
        };

        // Out-of-range digits are ignored
        let result = session.submit(choice).ok()?;
        self.feedback = Some(result);
        self.selected = 0;

        if !session.is_complete() {
            return None;
        }
        let record = session.to_history_record(Utc::now());
        if let SessionState::InProgress(session) = std::mem::take(&mut self.state) {
            self.state = SessionState::Completed(session);
        }
        Some(Command::Record(record))
    }

    /// Move from loading to the quiz, or back to input with an error
    pub fn finish_loading(&mut self, outcome: Result<QuizSession, QuizError>) {
        match outcome {
            Ok(session) => {
                self.state = SessionState::InProgress(session);
                self.selected = 0;
                self.feedback = None;
                self.message = None;
            }
            Err(e) => {
                log::warn!("could not start quiz: {}", e);
                self.state = SessionState::Idle;
                self.message = Some(e.user_message());
            }
        }
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.input.clear();
        self.selected = 0;
        self.feedback = None;
    }
}

/// Launch the TUI
pub async fn run(config: &Config, store: &HistoryStore) -> anyhow::Result<()> {
    let resolver = Arc::new(ArticleResolver::new(&config.api)?);
    let mut app = App::new(store.recent(HISTORY_ROWS)?);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut app, resolver, config, store).await;
    ratatui::restore();
    result
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    resolver: Arc<ArticleResolver>,
    config: &Config,
    store: &HistoryStore,
) -> anyhow::Result<()> {
    let limit = config.question_count();
    let mut pending: Option<JoinHandle<Result<QuizSession, QuizError>>> = None;

    while !app.should_quit {
        terminal.draw(|frame| draw(frame, app))?;

        if pending.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = pending.take() {
                match handle.await {
                    Ok(outcome) => app.finish_loading(outcome),
                    Err(e) => {
                        log::error!("quiz task failed: {}", e);
                        app.state = SessionState::Idle;
                        app.message = Some("Something went wrong, please try again".to_string());
                    }
                }
            }
        }

        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_key(key) {
            Some(Command::Fetch(input)) => {
                let resolver = Arc::clone(&resolver);
                pending = Some(tokio::spawn(async move {
                    start_quiz(&resolver, &input, limit).await
                }));
            }
            Some(Command::Record(record)) => match store.append(record) {
                Ok(_) => app.history = store.recent(HISTORY_ROWS)?,
                Err(e) => {
                    log::error!("failed to save history: {}", e);
                    app.message = Some(format!("Could not save result: {}", e));
                }
            },
            None => {}
        }
    }

    Ok(())
}

fn draw(frame: &mut Frame, app: &App) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Line::from(vec![" wikiquiz ".bold().reversed(), " quizzes from Wikipedia".into()]),
        header,
    );

    let help = match &app.state {
        SessionState::Idle => "Enter: start quiz  Esc: quit",
        SessionState::Loading { .. } => "Fetching article...  Ctrl-C: quit",
        SessionState::InProgress(_) => "↑/↓: choose  Enter or 1-4: answer  Esc: give up",
        SessionState::Completed(_) => "Enter: new quiz  q: quit",
    };
    frame.render_widget(Line::from(help).dim(), footer);

    match &app.state {
        SessionState::Idle => draw_input(frame, app, body),
        SessionState::Loading { input } => {
            let text = Paragraph::new(format!("Fetching '{}'...", input))
                .block(Block::bordered().title(" Loading "));
            frame.render_widget(text, body);
        }
        SessionState::InProgress(session) => draw_question(frame, app, session, body),
        SessionState::Completed(session) => draw_results(frame, session, body),
    }
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let [input_area, message_area, history_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    let input = Paragraph::new(app.input.as_str())
        .block(Block::bordered().title(" Article title or Wikipedia link "));
    frame.render_widget(input, input_area);

    if let Some(message) = &app.message {
        frame.render_widget(Line::from(message.as_str()).red(), message_area);
    }

    let items: Vec<ListItem> = app
        .history
        .iter()
        .map(|record| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{}  ", record.timestamp.format("%Y-%m-%d %H:%M"))),
                Span::raw(record.topic.clone()).bold(),
                Span::raw(format!("  {}/{}", record.score, record.total)),
            ]))
        })
        .collect();
    frame.render_widget(
        List::new(items).block(Block::bordered().title(" Recent quizzes ")),
        history_area,
    );
}

fn draw_question(frame: &mut Frame, app: &App, session: &QuizSession, area: Rect) {
    let Some(question) = session.current_question() else {
        return;
    };

    let [question_area, options_area, feedback_area] = Layout::vertical([
        Constraint::Min(5),
        Constraint::Length(question.options.len() as u16 + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    let title = format!(
        " {}  question {}/{}  score {} ",
        session.topic,
        session.position() + 1,
        session.total(),
        session.score()
    );
    let text = Paragraph::new(question.question.as_str())
        .wrap(Wrap { trim: true })
        .block(Block::bordered().title(title));
    frame.render_widget(text, question_area);

    let items: Vec<ListItem> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| ListItem::new(format!("{}. {}", i + 1, option)))
        .collect();
    let list = List::new(items)
        .block(Block::bordered().title(" Options "))
        .highlight_style(Style::new().reversed())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, options_area, &mut state);

    if let Some(feedback) = &app.feedback {
        frame.render_widget(feedback_line(feedback), feedback_area);
    }
}

fn draw_results(frame: &mut Frame, session: &QuizSession, area: Rect) {
    let mut lines = vec![
        Line::from(format!(
            "You scored {}/{} on {}",
            session.score(),
            session.total(),
            session.topic
        ))
        .bold(),
        Line::from(session.url.as_str()).dim(),
        Line::default(),
    ];
    for result in session.results() {
        lines.push(feedback_line(result));
        lines.push(Line::from(format!("   {}", result.question)).dim());
    }

    let text = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(Block::bordered().title(" Results "));
    frame.render_widget(text, area);
}

fn feedback_line(result: &QuestionResult) -> Line<'static> {
    if result.correct {
        Line::from(format!("✓ {}", result.answer)).green()
    } else {
        Line::from(format!(
            "✗ {} (answer: {})",
            result.selected, result.answer
        ))
        .red()
    }
}
