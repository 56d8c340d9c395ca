//! Markdown rendering for the terminal interface
//!
//! Converts model output to styled ratatui text. Headings, emphasis, lists,
//! block quotes, and inline code are enough for the bullet-list metadata the
//! model produces.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
};

/// Converts markdown text to ratatui Text for rendering
pub fn markdown_to_ratatui_text(markdown: &str) -> Text<'static> {
    let parser = Parser::new_ext(markdown, Options::all());
    let mut builder = TextBuilder::default();

    for event in parser {
        builder.handle(event);
    }

    builder.finish()
}

#[derive(Default)]
struct TextBuilder {
    lines: Vec<Line<'static>>,
    current_line: Vec<Span<'static>>,
    style: Style,
    list_level: usize,
}

impl TextBuilder {
    fn flush_line(&mut self) {
        if !self.current_line.is_empty() {
            let spans: Vec<Span<'static>> = self.current_line.drain(..).collect();
            self.lines.push(Line::from(spans));
        }
    }

    fn blank_line(&mut self) {
        self.flush_line();
        self.lines.push(Line::from(""));
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Text(text) => {
                self.current_line
                    .push(Span::styled(text.to_string(), self.style));
            }
            Event::Code(code) => {
                self.current_line.push(Span::styled(
                    format!("`{}`", code),
                    Style::default().fg(Color::Green),
                ));
            }
            Event::Start(tag) => self.handle_start(tag),
            Event::End(tag_end) => self.handle_end(tag_end),
            Event::SoftBreak => {
                self.current_line.push(Span::raw(" "));
            }
            Event::HardBreak => self.flush_line(),
            _ => {}
        }
    }

    fn handle_start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                let level_color = match level {
                    HeadingLevel::H1 => Color::Magenta,
                    HeadingLevel::H2 => Color::Blue,
                    _ => Color::Cyan,
                };
                self.style = Style::default().fg(level_color).add_modifier(Modifier::BOLD);
                if level == HeadingLevel::H1 {
                    self.lines.push(Line::from(""));
                }
            }
            Tag::Paragraph => self.flush_line(),
            Tag::Strong => {
                self.style = self.style.add_modifier(Modifier::BOLD);
            }
            Tag::Emphasis => {
                self.style = self.style.add_modifier(Modifier::ITALIC);
            }
            Tag::BlockQuote(_) => {
                self.style = Style::default().fg(Color::Yellow);
                self.current_line.push(Span::raw("  │ "));
            }
            Tag::CodeBlock(kind) => {
                self.style = Style::default().fg(Color::Green);
                self.blank_line();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines.push(Line::from(vec![Span::styled(
                            format!("[{}]", lang),
                            Style::default().fg(Color::Blue).add_modifier(Modifier::ITALIC),
                        )]));
                    }
                }
            }
            Tag::List(start) => {
                self.list_level += 1;
                if let Some(num) = start {
                    self.current_line.push(Span::raw(format!(
                        "{}{}. ",
                        "  ".repeat(self.list_level - 1),
                        num
                    )));
                }
            }
            Tag::Item => {
                if self.list_level > 0 && self.current_line.is_empty() {
                    self.current_line
                        .push(Span::raw(format!("{}• ", "  ".repeat(self.list_level - 1))));
                }
            }
            Tag::Link { dest_url, .. } => {
                let style = Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED);
                self.current_line
                    .push(Span::styled(dest_url.to_string(), style));
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Heading(_) => {
                self.style = Style::default();
                self.blank_line();
            }
            TagEnd::Paragraph => self.blank_line(),
            TagEnd::Strong => {
                self.style = self.style.remove_modifier(Modifier::BOLD);
            }
            TagEnd::Emphasis => {
                self.style = self.style.remove_modifier(Modifier::ITALIC);
            }
            TagEnd::BlockQuote(_) | TagEnd::CodeBlock => {
                self.style = Style::default();
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.list_level -= 1;
                if self.list_level == 0 {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::Link => {
                self.current_line.push(Span::raw(" "));
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Text<'static> {
        self.flush_line();
        Text::from(self.lines)
    }
}
