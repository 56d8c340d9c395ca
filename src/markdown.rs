//! Terminal markdown formatting
//!
//! Renders model output (which tends to arrive as markdown bullet lists)
//! with colors and styling for the one-shot CLI commands.

use crate::error::{Error, Result};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Formats markdown text for terminal output with colors and styling
pub fn format_markdown(markdown: &str) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let parser = Parser::new_ext(markdown, Options::all());
    let mut state = FormatState::new();

    for event in parser {
        state.handle_event(&mut stdout, event)?;
    }

    stdout.reset().map_err(Error::Io)?;
    Ok(())
}

/// Tracks the current formatting state
struct FormatState {
    list_level: usize,
    format_stack: Vec<ColorSpec>,
    ordered_list: bool,
}

impl FormatState {
    fn new() -> Self {
        Self {
            list_level: 0,
            format_stack: Vec::new(),
            ordered_list: false,
        }
    }

    fn handle_event(&mut self, stdout: &mut StandardStream, event: Event) -> Result<()> {
        match event {
            Event::Start(tag) => self.handle_start(stdout, tag),
            Event::End(tag_end) => self.handle_end(stdout, tag_end),
            Event::Text(text) => write!(stdout, "{}", text).map_err(Error::Io),
            Event::Code(code) => self.write_inline_code(stdout, &code),
            Event::SoftBreak | Event::HardBreak => writeln!(stdout).map_err(Error::Io),
            _ => Ok(()),
        }
    }

    fn push_spec(&mut self, stdout: &mut StandardStream, spec: ColorSpec) -> Result<()> {
        stdout.set_color(&spec).map_err(Error::Io)?;
        self.format_stack.push(spec);
        Ok(())
    }

    fn pop_spec(&mut self, stdout: &mut StandardStream) -> Result<()> {
        self.format_stack.pop();
        match self.format_stack.last() {
            Some(spec) => stdout.set_color(spec).map_err(Error::Io),
            None => stdout.reset().map_err(Error::Io),
        }
    }

    fn handle_start(&mut self, stdout: &mut StandardStream, tag: Tag) -> Result<()> {
        match tag {
            Tag::Heading { level, .. } => {
                let level_color = match level {
                    HeadingLevel::H1 => Color::Magenta,
                    HeadingLevel::H2 => Color::Blue,
                    _ => Color::Cyan,
                };
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(level_color)).set_bold(true);
                self.push_spec(stdout, spec)?;
                if level == HeadingLevel::H1 {
                    writeln!(stdout).map_err(Error::Io)?;
                }
            }
            Tag::Paragraph => writeln!(stdout).map_err(Error::Io)?,
            Tag::Strong => {
                let mut spec = ColorSpec::new();
                spec.set_bold(true);
                self.push_spec(stdout, spec)?;
            }
            Tag::Emphasis => {
                let mut spec = ColorSpec::new();
                spec.set_italic(true);
                self.push_spec(stdout, spec)?;
            }
            Tag::BlockQuote(_) => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Yellow));
                self.push_spec(stdout, spec)?;
                write!(stdout, "  │ ").map_err(Error::Io)?;
            }
            Tag::CodeBlock(kind) => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Green));
                self.push_spec(stdout, spec)?;
                writeln!(stdout).map_err(Error::Io)?;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        writeln!(stdout, "[{}]", lang).map_err(Error::Io)?;
                    }
                }
            }
            Tag::List(start) => {
                self.list_level += 1;
                self.ordered_list = start.is_some();
                if let Some(num) = start {
                    write!(stdout, "{}{:2}. ", "  ".repeat(self.list_level - 1), num)
                        .map_err(Error::Io)?;
                }
            }
            Tag::Item => {
                if self.list_level > 0 && !self.ordered_list {
                    write!(stdout, "{}• ", "  ".repeat(self.list_level - 1)).map_err(Error::Io)?;
                }
            }
            Tag::Link { dest_url, .. } => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Blue)).set_underline(true);
                self.push_spec(stdout, spec)?;
                write!(stdout, "{}", dest_url).map_err(Error::Io)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_end(&mut self, stdout: &mut StandardStream, tag_end: TagEnd) -> Result<()> {
        match tag_end {
            TagEnd::Heading(_) => {
                self.pop_spec(stdout)?;
                writeln!(stdout).map_err(Error::Io)?;
            }
            TagEnd::Paragraph => writeln!(stdout).map_err(Error::Io)?,
            TagEnd::Strong | TagEnd::Emphasis => self.pop_spec(stdout)?,
            TagEnd::Link => {
                self.pop_spec(stdout)?;
                write!(stdout, " ").map_err(Error::Io)?;
            }
            TagEnd::BlockQuote(_) | TagEnd::CodeBlock => {
                self.pop_spec(stdout)?;
                writeln!(stdout).map_err(Error::Io)?;
            }
            TagEnd::List(_) => {
                self.list_level -= 1;
                if self.list_level == 0 {
                    self.ordered_list = false;
                    writeln!(stdout).map_err(Error::Io)?;
                }
            }
            TagEnd::Item => writeln!(stdout).map_err(Error::Io)?,
            _ => {}
        }
        Ok(())
    }

    fn write_inline_code(&self, stdout: &mut StandardStream, code: &str) -> Result<()> {
        stdout
            .set_color(ColorSpec::new().set_fg(Some(Color::Green)))
            .map_err(Error::Io)?;
        write!(stdout, "`{}`", code).map_err(Error::Io)?;

        match self.format_stack.last() {
            Some(spec) => stdout.set_color(spec).map_err(Error::Io),
            None => stdout.reset().map_err(Error::Io),
        }
    }
}
