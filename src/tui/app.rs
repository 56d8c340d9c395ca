//! Application state for the terminal interface
//!
//! The `App` owns the session context; all reads and writes of session state
//! happen on the interface task. Network work (fetching, model calls) is
//! requested from the worker task and comes back as application events.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEventKind};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use tokio::sync::mpsc;

use bookscout::pipeline::{self, FetchedAnalysis};
use bookscout::respond;
use bookscout::session::{BookMetadata, FeedbackCategory, Role, SessionContext};

use crate::tui::WorkRequest;
use crate::tui::error::{Error, Result};
use crate::tui::event::{AppEvent, Event, EventHandler};
use crate::tui::markdown::markdown_to_ratatui_text;

const WELCOME: &str = "# Welcome to bookscout\n\n\
* Paste a book page URL on the search tab and press Enter to analyze it.\n\
* Use the discussion tab for free-form literary chat.\n\
* Press F1/F2 to switch tabs, Tab to move focus, F5 to cycle the feedback category.\n\
* Press Esc or Ctrl+C to exit.";

/// The two primary views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Search,
    Chat,
}

/// Focused input on the search tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    Url,
    Query,
    Feedback,
}

/// A single-line text input with a cursor
#[derive(Debug, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
}

impl InputField {
    pub fn insert_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.value[..self.cursor]
                .chars()
                .next_back()
                .map(|c| c.len_utf8())
                .unwrap_or(0);
            self.cursor -= prev;
            self.value.remove(self.cursor);
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            let prev = self.value[..self.cursor]
                .chars()
                .next_back()
                .map(|c| c.len_utf8())
                .unwrap_or(0);
            self.cursor -= prev;
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.value.len() {
            let next = self.value[self.cursor..]
                .chars()
                .next()
                .map(|c| c.len_utf8())
                .unwrap_or(0);
            self.cursor += next;
        }
    }

    /// Take the trimmed value, clearing the field
    pub fn take(&mut self) -> String {
        let value = self.value.trim().to_string();
        self.value.clear();
        self.cursor = 0;
        value
    }
}

/// Application state
pub struct App {
    /// All session state; read and mutated only on the interface task
    pub session: SessionContext,
    /// Active tab
    pub tab: Tab,
    /// Focused input on the search tab
    pub focus: SearchFocus,
    /// Seed URL input
    pub url_input: InputField,
    /// Deep-query input
    pub query_input: InputField,
    /// Feedback input
    pub feedback_input: InputField,
    /// Discussion input
    pub chat_input: InputField,
    /// Index into [`FeedbackCategory::ALL`]
    pub feedback_category: usize,
    /// Rendered cards for the latest search results
    pub result_cards: Vec<Text<'static>>,
    /// Rendered deep-query exchanges
    pub query_messages: Vec<(String, Text<'static>)>,
    /// Rendered discussion messages
    pub chat_messages: Vec<(String, Text<'static>)>,
    /// Status line message (warnings, confirmations)
    pub status: Option<String>,
    /// Whether a network chain is in flight
    pub is_loading: bool,
    /// Counter for spinner animation frames
    pub spinner_frame: usize,
    /// Scroll position of the search tab content
    pub search_scroll: usize,
    /// Scroll position of the discussion tab content
    pub chat_scroll: usize,
    /// Flag to indicate if the application should quit
    pub should_quit: bool,
    /// Whether a model credential is available
    pub api_key_set: bool,
    /// Model name, for the sidebar
    pub model: String,
    /// Event handler
    event_handler: EventHandler,
    /// Channel to the network worker
    work_tx: mpsc::UnboundedSender<WorkRequest>,
}

impl App {
    /// Create a new application state
    pub fn new(api_key_set: bool, model: String, work_tx: mpsc::UnboundedSender<WorkRequest>) -> Self {
        let mut app = Self {
            session: SessionContext::new(),
            tab: Tab::Search,
            focus: SearchFocus::Url,
            url_input: InputField::default(),
            query_input: InputField::default(),
            feedback_input: InputField::default(),
            chat_input: InputField::default(),
            feedback_category: 0,
            result_cards: Vec::new(),
            query_messages: Vec::new(),
            chat_messages: Vec::new(),
            status: None,
            is_loading: false,
            spinner_frame: 0,
            search_scroll: 0,
            chat_scroll: 0,
            should_quit: false,
            api_key_set,
            model,
            event_handler: EventHandler::new(),
            work_tx,
        };

        app.chat_messages
            .push(("ui".to_string(), markdown_to_ratatui_text(WELCOME)));
        if !api_key_set {
            app.status =
                Some("No API key set. Export GEMINI_API_KEY to enable AI analysis.".to_string());
        }
        app
    }

    /// Get the next event
    pub async fn next_event(&mut self) -> Option<Event> {
        if let Some(event) = self.event_handler.next().await {
            match &event {
                Event::Terminal(term_event) => {
                    if let Err(e) = self.handle_terminal_event(term_event) {
                        tracing::error!(error = %e, "terminal event handling failed");
                    }
                }
                Event::Tick => {
                    self.tick_spinner();
                }
                Event::App(app_event) => {
                    if let Err(e) = self.handle_app_event(app_event) {
                        tracing::error!(error = %e, "app event handling failed");
                    }
                }
            }
            Some(event)
        } else {
            None
        }
    }

    /// Get the event sender
    pub fn event_sender(&self) -> mpsc::UnboundedSender<Event> {
        self.event_handler.sender()
    }

    fn send_app_event(&self, event: AppEvent) -> Result<()> {
        self.event_handler
            .sender()
            .send(Event::App(event))
            .map_err(|e| Error::Event(e.to_string()))
    }

    fn send_work(&self, request: WorkRequest) -> Result<()> {
        self.work_tx
            .send(request)
            .map_err(|e| Error::Event(e.to_string()))
    }

    /// Handle terminal events
    fn handle_terminal_event(&mut self, event: &crossterm::event::Event) -> Result<()> {
        match event {
            crossterm::event::Event::Key(key) => self.handle_key_event(*key)?,
            crossterm::event::Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => self.scroll_by(-5),
                MouseEventKind::ScrollDown => self.scroll_by(5),
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    /// Handle key events
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.send_app_event(AppEvent::Quit)?;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.send_app_event(AppEvent::Quit)?;
            }
            KeyCode::F(1) => {
                self.tab = Tab::Search;
            }
            KeyCode::F(2) => {
                self.tab = Tab::Chat;
            }
            KeyCode::F(5) => {
                self.feedback_category = (self.feedback_category + 1) % FeedbackCategory::ALL.len();
            }
            KeyCode::Tab if self.tab == Tab::Search => {
                self.focus = match self.focus {
                    SearchFocus::Url => SearchFocus::Query,
                    SearchFocus::Query => SearchFocus::Feedback,
                    SearchFocus::Feedback => SearchFocus::Url,
                };
            }
            KeyCode::Enter => {
                self.submit_focused_input()?;
            }
            KeyCode::Char(c) => {
                self.active_input_mut().insert_char(c);
            }
            KeyCode::Backspace => {
                self.active_input_mut().backspace();
            }
            KeyCode::Delete => {
                self.active_input_mut().delete_char();
            }
            KeyCode::Left => {
                self.active_input_mut().move_left();
            }
            KeyCode::Right => {
                self.active_input_mut().move_right();
            }
            KeyCode::Up => {
                self.scroll_by(-1);
            }
            KeyCode::Down => {
                self.scroll_by(1);
            }
            _ => {}
        }
        Ok(())
    }

    /// The input the current tab/focus combination edits
    pub fn active_input(&self) -> &InputField {
        match self.tab {
            Tab::Chat => &self.chat_input,
            Tab::Search => match self.focus {
                SearchFocus::Url => &self.url_input,
                SearchFocus::Query => &self.query_input,
                SearchFocus::Feedback => &self.feedback_input,
            },
        }
    }

    fn active_input_mut(&mut self) -> &mut InputField {
        match self.tab {
            Tab::Chat => &mut self.chat_input,
            Tab::Search => match self.focus {
                SearchFocus::Url => &mut self.url_input,
                SearchFocus::Query => &mut self.query_input,
                SearchFocus::Feedback => &mut self.feedback_input,
            },
        }
    }

    fn submit_focused_input(&mut self) -> Result<()> {
        match self.tab {
            Tab::Chat => {
                let remark = self.chat_input.take();
                if !remark.is_empty() {
                    self.send_app_event(AppEvent::SubmitChat(remark))?;
                }
            }
            Tab::Search => match self.focus {
                SearchFocus::Url => {
                    let url = self.url_input.take();
                    if !url.is_empty() {
                        self.send_app_event(AppEvent::SubmitSearch(url))?;
                    }
                }
                SearchFocus::Query => {
                    let question = self.query_input.take();
                    if !question.is_empty() {
                        self.send_app_event(AppEvent::SubmitQuery(question))?;
                    }
                }
                SearchFocus::Feedback => {
                    self.save_feedback();
                }
            },
        }
        Ok(())
    }

    /// Handle application events
    fn handle_app_event(&mut self, event: &AppEvent) -> Result<()> {
        match event {
            AppEvent::SubmitSearch(url) => {
                if !self.api_key_set {
                    self.status =
                        Some("Set GEMINI_API_KEY to enable AI analysis.".to_string());
                } else if !self.is_loading {
                    self.status = None;
                    self.is_loading = true;
                    self.send_work(WorkRequest::Search { url: url.clone() })?;
                }
            }
            AppEvent::SearchComplete(results) => {
                self.is_loading = false;
                self.apply_search_results(results.clone());
            }
            AppEvent::SubmitQuery(question) => {
                if !self.api_key_set {
                    self.status =
                        Some("Set GEMINI_API_KEY to enable AI analysis.".to_string());
                } else if self.session.latest_book().is_none() {
                    self.status = Some("Run a book search first.".to_string());
                } else if !self.is_loading {
                    self.status = None;
                    self.is_loading = true;
                    let context = self
                        .session
                        .latest_book()
                        .map(|book| book.ai_metadata.clone())
                        .unwrap_or_default();
                    self.send_work(WorkRequest::Query {
                        question: question.clone(),
                        context,
                    })?;
                }
            }
            AppEvent::QueryAnswered { question, answer } => {
                self.is_loading = false;
                self.session.query_log.push(Role::User, question.clone());
                self.session.query_log.push(Role::Model, answer.clone());
                self.query_messages
                    .push(("user".to_string(), markdown_to_ratatui_text(question)));
                self.query_messages
                    .push(("model".to_string(), markdown_to_ratatui_text(answer)));
            }
            AppEvent::QueryFailed(message) => {
                self.is_loading = false;
                self.status = Some(format!("Query failed: {message}"));
            }
            AppEvent::SubmitChat(remark) => {
                if !self.api_key_set {
                    self.status =
                        Some("Set GEMINI_API_KEY to enable AI analysis.".to_string());
                } else if !self.is_loading {
                    self.status = None;
                    self.is_loading = true;
                    // The user entry lands in the transcript before the call;
                    // a failed call leaves it in place.
                    self.session.chat_log.push(Role::User, remark.clone());
                    self.chat_messages
                        .push(("user".to_string(), markdown_to_ratatui_text(remark)));
                    let context = respond::chat_context(&self.session);
                    self.send_work(WorkRequest::Chat {
                        remark: remark.clone(),
                        context,
                    })?;
                }
            }
            AppEvent::ChatReplied(reply) => {
                self.is_loading = false;
                self.session.chat_log.push(Role::Model, reply.clone());
                self.chat_messages
                    .push(("model".to_string(), markdown_to_ratatui_text(reply)));
            }
            AppEvent::ChatFailed(message) => {
                self.is_loading = false;
                self.status = Some(format!("Chat failed: {message}"));
            }
            AppEvent::Quit => {
                self.should_quit = true;
            }
        }
        Ok(())
    }

    /// Commit a finished search pass into the session and rebuild the cards
    fn apply_search_results(&mut self, results: Vec<FetchedAnalysis>) {
        if results.is_empty() {
            self.status = Some("No book information found. Check the URL.".to_string());
            return;
        }

        let stored = pipeline::commit_results(&mut self.session, results);
        self.result_cards = stored.iter().map(build_result_card).collect();
        self.search_scroll = 0;
        self.status = Some(format!("Analyzed {} page(s).", stored.len()));
    }

    /// Append feedback for the most recently analyzed book
    fn save_feedback(&mut self) {
        let Some(title) = self
            .session
            .latest_book()
            .map(|book| book.page.title.clone())
        else {
            self.status = Some("Run a book search before leaving feedback.".to_string());
            return;
        };

        let text = self.feedback_input.take();
        if text.is_empty() {
            return;
        }

        let category = FeedbackCategory::ALL[self.feedback_category];
        self.session.add_feedback(&title, category, text);
        self.status = Some(format!("Feedback saved for \"{title}\" ({category})."));
    }

    /// Current feedback category
    pub fn current_category(&self) -> FeedbackCategory {
        FeedbackCategory::ALL[self.feedback_category]
    }

    /// Total rendered height of the active tab's content
    fn content_height(&self) -> usize {
        match self.tab {
            Tab::Search => {
                let cards: usize = self.result_cards.iter().map(|t| t.height() + 1).sum();
                let queries: usize = self
                    .query_messages
                    .iter()
                    .map(|(_, t)| t.height() + 2)
                    .sum();
                cards + queries
            }
            Tab::Chat => self
                .chat_messages
                .iter()
                .map(|(_, t)| t.height() + 2)
                .sum(),
        }
    }

    /// Scroll by a number of lines (positive = down, negative = up)
    pub fn scroll_by(&mut self, delta: i32) {
        let max_pos = self.content_height().saturating_sub(1);
        let scroll = match self.tab {
            Tab::Search => &mut self.search_scroll,
            Tab::Chat => &mut self.chat_scroll,
        };
        *scroll = if delta < 0 {
            scroll.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            scroll.saturating_add(delta as usize).min(max_pos)
        };
    }

    /// Scroll position of the active tab
    pub fn scroll_position(&self) -> usize {
        match self.tab {
            Tab::Search => self.search_scroll,
            Tab::Chat => self.chat_scroll,
        }
    }

    /// Update spinner frame
    pub fn tick_spinner(&mut self) {
        if self.is_loading {
            self.spinner_frame = (self.spinner_frame + 1) % 8;
        }
    }
}

/// Render one stored book as a card
fn build_result_card(book: &BookMetadata) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(Line::from(Span::styled(
        book.page.title.clone(),
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(vec![
        Span::styled("Summary: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(book.page.summary.clone()),
    ]));
    lines.push(Line::from(Span::styled(
        format!(
            "Loan rank #{} · borrowed {} times",
            book.loan_rank, book.loan_count
        ),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));

    lines.extend(markdown_to_ratatui_text(&book.ai_metadata).lines);

    for link in &book.page.external_links {
        lines.push(Line::from(Span::styled(
            format!("[{}] {}", book.page.platform, link),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        )));
    }

    Text::from(lines)
}
