//! Layout and rendering for the terminal interface

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Tabs, Wrap,
    },
};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{App, InputField, SearchFocus, Tab};

const SPINNER_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

const NOTICE: &str = "Crawling must comply with each platform's robots.txt and \
copyright policy. AI answers aim for direct quotation, keyword consistency, and \
feedback reflection. A production deployment needs database integration and \
deeper log/feedback analysis.";

/// Draw the UI
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Body
            Constraint::Length(3), // Status line
        ])
        .split(f.area());

    render_tabs(f, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(38)])
        .split(chunks[1]);

    match app.tab {
        Tab::Search => render_search_tab(f, app, body[0]),
        Tab::Chat => render_chat_tab(f, app, body[0]),
    }
    render_sidebar(f, app, body[1]);
    render_status(f, app, chunks[2]);
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let selected = match app.tab {
        Tab::Search => 0,
        Tab::Chat => 1,
    };

    let tabs = Tabs::new(vec!["Search & Analyze [F1]", "Discussion [F2]"])
        .block(Block::default().borders(Borders::ALL).title(Span::styled(
            "bookscout",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )))
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn render_search_tab(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // URL input
            Constraint::Min(1),    // Results and deep-query exchanges
            Constraint::Length(3), // Deep-query input
            Constraint::Length(3), // Feedback input
        ])
        .split(area);

    render_input(
        f,
        chunks[0],
        "Book page URL",
        &app.url_input,
        app.focus == SearchFocus::Url,
    );

    render_search_content(f, app, chunks[1]);

    render_input(
        f,
        chunks[2],
        "Deep query (book, era, emotion, keywords)",
        &app.query_input,
        app.focus == SearchFocus::Query,
    );

    let feedback_title = format!("Feedback · {} [F5]", app.current_category());
    render_input(
        f,
        chunks[3],
        &feedback_title,
        &app.feedback_input,
        app.focus == SearchFocus::Feedback,
    );
}

fn render_search_content(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        "Results",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ));

    let mut lines: Vec<Line> = Vec::new();

    if app.result_cards.is_empty() && app.query_messages.is_empty() && !app.is_loading {
        lines.push(Line::from(Span::styled(
            "Paste a book page URL above and press Enter to fetch and analyze it.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for (i, card) in app.result_cards.iter().enumerate() {
        lines.extend(card.lines.clone());
        if i < app.result_cards.len() - 1 {
            lines.push(separator());
        }
    }

    if !app.query_messages.is_empty() {
        lines.push(separator());
        lines.push(Line::from(Span::styled(
            "Deep query",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));
        append_messages(&mut lines, &app.query_messages);
    }

    if app.is_loading {
        lines.push(spinner_line(app));
    }

    render_scrolled(f, area, block, lines, app.scroll_position());
}

fn render_chat_tab(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        "Discussion",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ));

    let mut lines: Vec<Line> = Vec::new();
    append_messages(&mut lines, &app.chat_messages);

    if app.is_loading {
        lines.push(spinner_line(app));
    }

    render_scrolled(f, chunks[0], block, lines, app.scroll_position());

    render_input(
        f,
        chunks[1],
        "Share an opinion (books, literature, feelings)",
        &app.chat_input,
        true,
    );
}

fn append_messages(lines: &mut Vec<Line<'static>>, messages: &[(String, ratatui::text::Text<'static>)]) {
    for (i, (role, text)) in messages.iter().enumerate() {
        let (role_text, role_style) = match role.as_str() {
            "user" => (
                "You",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            "model" => (
                "AI",
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
            ),
            _ => (
                role.as_str(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        };

        lines.push(Line::from(Span::styled(
            format!("{}: ", role_text),
            role_style,
        )));
        lines.extend(text.lines.clone());

        if i < messages.len() - 1 {
            lines.push(separator());
        }
    }
}

fn separator() -> Line<'static> {
    Line::from(Span::styled(
        "────────────────────────────────────────────────────────────────────────────────",
        Style::default().fg(Color::DarkGray),
    ))
}

fn spinner_line(app: &App) -> Line<'static> {
    Line::from(Span::styled(
        format!("{} Analyzing...", SPINNER_FRAMES[app.spinner_frame]),
        Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    ))
}

fn render_scrolled(f: &mut Frame, area: Rect, block: Block, lines: Vec<Line>, scroll: usize) {
    let total_height = lines.len();

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((scroll as u16, 0));

    f.render_widget(paragraph, area);

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));

    let mut scrollbar_state = ScrollbarState::default()
        .content_length(total_height)
        .position(scroll);

    f.render_stateful_widget(
        scrollbar,
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

fn render_input(f: &mut Frame, area: Rect, title: &str, field: &InputField, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(
            title.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner_area = input_block.inner(area);

    let input = Paragraph::new(field.value.as_str()).block(input_block);
    f.render_widget(input, area);

    if focused && field.cursor <= field.value.len() {
        let cursor_x = field.value[..field.cursor].width() as u16;
        f.set_cursor_position((inner_area.x + cursor_x, inner_area.y));
    }
}

fn render_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Settings
            Constraint::Min(1),    // Feedback counts
            Constraint::Length(9), // Usage notice
        ])
        .split(area);

    let key_status = if app.api_key_set {
        Span::styled("configured", Style::default().fg(Color::Green))
    } else {
        Span::styled("missing", Style::default().fg(Color::Red))
    };

    let settings = Paragraph::new(vec![
        Line::from(vec![Span::raw("API key: "), key_status]),
        Line::from(format!("Model: {}", app.model)),
        Line::from(format!("Feedback category: {}", app.current_category())),
    ])
    .block(Block::default().borders(Borders::ALL).title("Settings"));
    f.render_widget(settings, chunks[0]);

    let mut feedback_lines: Vec<Line> = Vec::new();
    if app.session.feedback().is_empty() {
        feedback_lines.push(Line::from(Span::styled(
            "No feedback yet.",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for record in app.session.feedback() {
            feedback_lines.push(Line::from(format!(
                "{} · {}: {}",
                record.title,
                record.category,
                record.comments.len()
            )));
        }
    }

    let feedback = Paragraph::new(feedback_lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Feedback"));
    f.render_widget(feedback, chunks[1]);

    let notice = Paragraph::new(NOTICE)
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Notice"));
    f.render_widget(notice, chunks[2]);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = match &app.status {
        Some(message) => (message.clone(), Style::default().fg(Color::Yellow)),
        None => (
            "F1 search · F2 chat · Tab focus · F5 category · Enter submit · Esc quit".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };

    let status = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}
