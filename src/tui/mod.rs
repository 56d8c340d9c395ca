//! Terminal interface
//!
//! Two tabs (search-and-analyze, free discussion) plus a sidebar. Network
//! chains (page fetch, model calls) run on a single worker task so the
//! interface can animate; requests are serialized and all session state
//! stays on the interface task.

pub mod app;
pub mod error;
pub mod event;
pub mod logging;
pub mod markdown;
pub mod ui;

use std::io;

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use bookscout::fetcher::FetcherConfig;
use bookscout::gemini::Client;
use bookscout::pipeline;
use bookscout::respond;

use crate::tui::app::App;
use crate::tui::error::Result;
use crate::tui::event::{AppEvent, Event};
use crate::tui::ui::draw;

/// Network work the interface hands to the worker task
#[derive(Debug)]
pub enum WorkRequest {
    /// Fetch and analyze pages from a seed URL
    Search { url: String },
    /// Answer a deep query with the latest book's metadata as context
    Query { question: String, context: String },
    /// Post a free remark, optionally with keyword context
    Chat {
        remark: String,
        context: Option<String>,
    },
}

/// Run the terminal interface
pub async fn run(api_key: Option<String>, model: String) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (work_tx, mut work_rx) = mpsc::unbounded_channel::<WorkRequest>();
    let mut app = App::new(api_key.is_some(), model.clone(), work_tx);
    let event_sender = app.event_sender();

    // Without a credential the interface still runs; model-dependent
    // actions are blocked in the App with a visible warning.
    if let Some(key) = api_key {
        let client = Client::with_api_key_rate_limited(key);
        let models = client.models();
        let chat = client.chats().create(&model);
        let config = FetcherConfig::default();

        tokio::spawn(async move {
            while let Some(request) = work_rx.recv().await {
                match request {
                    WorkRequest::Search { url } => {
                        let results =
                            pipeline::fetch_and_analyze(&models, &config, &url, &model).await;
                        let _ = event_sender.send(Event::App(AppEvent::SearchComplete(results)));
                    }
                    WorkRequest::Query { question, context } => {
                        let event =
                            match respond::query_model(&models, &model, &context, &question).await
                            {
                                Ok(answer) => AppEvent::QueryAnswered { question, answer },
                                Err(e) => AppEvent::QueryFailed(e.to_string()),
                            };
                        let _ = event_sender.send(Event::App(event));
                    }
                    WorkRequest::Chat { remark, context } => {
                        let event = match respond::chat_model(&chat, context.as_deref(), &remark)
                            .await
                        {
                            Ok(reply) => AppEvent::ChatReplied(reply),
                            Err(e) => AppEvent::ChatFailed(e.to_string()),
                        };
                        let _ = event_sender.send(Event::App(event));
                    }
                }
            }
        });
    }

    terminal.clear()?;

    // Main event loop
    while !app.should_quit {
        terminal.draw(|f| draw(f, &app))?;

        if app.next_event().await.is_none() {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}
