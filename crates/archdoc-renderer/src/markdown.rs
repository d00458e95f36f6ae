//! Markdown to HTML conversion.
//!
//! Wraps pulldown-cmark with the extensions documents are written in
//! (tables, strikethrough, task lists, footnotes, smart punctuation) and
//! post-processes the event stream:
//!
//! - headings get unique slug ids and are collected into a table of contents
//! - the first H1 becomes the document title
//! - raw HTML is emitted as literal text
//! - line breaks inside paragraphs are kept

use std::collections::HashMap;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Result of converting a Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFragment {
    /// Body HTML.
    pub html: String,
    /// Text of the first H1, if any.
    pub title: Option<String>,
    /// Headings after the title, in document order.
    pub toc: Vec<TocEntry>,
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_SMART_PUNCTUATION
}

struct OpenHeading {
    start: usize,
    level: u8,
    text: String,
}

/// Convert Markdown to an HTML fragment.
///
/// Never fails: malformed Markdown renders as whatever CommonMark makes of it.
pub fn markdown_to_html(markdown: &str) -> HtmlFragment {
    let mut events: Vec<Event<'_>> = Parser::new_ext(markdown, parser_options())
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::SoftBreak => Event::HardBreak,
            other => other,
        })
        .collect();

    let mut ids = HeadingIds::default();
    let mut title = None;
    let mut toc = Vec::new();
    let mut open: Option<OpenHeading> = None;

    for i in 0..events.len() {
        let closed = match &events[i] {
            Event::Start(Tag::Heading { level, .. }) => {
                open = Some(OpenHeading {
                    start: i,
                    level: heading_level_to_num(*level),
                    text: String::new(),
                });
                None
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = open.as_mut() {
                    heading.text.push_str(text);
                }
                None
            }
            Event::End(TagEnd::Heading(_)) => open.take(),
            _ => None,
        };

        let Some(heading) = closed else {
            continue;
        };
        let text = heading.text.trim().to_owned();
        let id = ids.next(&text);
        if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[heading.start] {
            *slot = Some(id.clone().into());
        }

        if heading.level == 1 && title.is_none() {
            title = Some(text);
        } else {
            toc.push(TocEntry {
                level: heading.level,
                title: text,
                id,
            });
        }
    }

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, events.into_iter());

    HtmlFragment {
        html: output,
        title,
        toc,
    }
}

/// Convert heading level enum to number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Allocates unique heading ids.
#[derive(Default)]
struct HeadingIds {
    counts: HashMap<String, usize>,
}

impl HeadingIds {
    fn next(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base.push_str("section");
        }
        let count = self.counts.entry(base.clone()).or_default();
        let id = match *count {
            0 => base,
            n => format!("{base}-{n}"),
        };
        *count += 1;
        id
    }
}

/// Convert text to URL-safe slug.
///
/// Lowercases, collapses whitespace, dashes and underscores into single
/// dashes, and drops other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}
