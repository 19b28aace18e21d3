//! Markdown → speakable plain text.
//!
//! Renders a StoryCode document with `pulldown-cmark` and keeps only the text a
//! listener should hear. Fenced and indented code blocks are dropped entirely,
//! images contribute nothing, and raw HTML is reduced to its text content.
//! Block elements are separated by exactly one blank line so later stages can
//! treat `"\n\n"` as the paragraph boundary.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;

use crate::pauses::{heading_marker, HEADING, PAUSE};

static RE_HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static RE_LINE_EDGES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());
static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// What the cleaner keeps from markdown syntax.
///
/// The plain [`clean`] contract strips everything. The synthesis pipeline keeps
/// heading markers (so headings can be emphasised) and inline code backticks
/// (so code spans get their own pronunciation rule). Heading markers are the
/// in-band [`HEADING`] sentinel, not `#`, so literal `#` text stays text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOptions {
    /// Emit [`HEADING`]×level before heading text.
    pub keep_heading_markers: bool,
    /// Re-emit inline code wrapped in backticks.
    pub keep_code_spans: bool,
}

/// Strip markdown syntax, returning visible text only.
pub fn clean(markdown: &str) -> String {
    clean_with(markdown, CleanOptions::default())
}

/// Strip markdown syntax according to `opts`.
pub fn clean_with(markdown: &str, opts: CleanOptions) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut code_block_depth = 0usize;
    let mut image_depth = 0usize;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => code_block_depth += 1,
            Event::End(TagEnd::CodeBlock) => {
                code_block_depth = code_block_depth.saturating_sub(1);
                out.push_str("\n\n");
            }
            _ if code_block_depth > 0 => {}

            Event::Start(Tag::Image { .. }) => image_depth += 1,
            Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
            _ if image_depth > 0 => {}

            Event::Start(Tag::Heading { level, .. }) => {
                out.push_str("\n\n");
                if opts.keep_heading_markers {
                    out.push_str(&heading_marker(heading_depth(level)));
                }
            }
            Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::BlockQuote { .. })
            | Event::End(TagEnd::List(_))
            | Event::Rule => out.push_str("\n\n"),
            Event::End(TagEnd::Item) => out.push('\n'),

            Event::Text(t) => push_source(&mut out, &t),
            Event::Code(t) => {
                if opts.keep_code_spans {
                    out.push('`');
                    push_source(&mut out, &t);
                    out.push('`');
                } else {
                    push_source(&mut out, &t);
                }
            }
            Event::Html(t) | Event::InlineHtml(t) => {
                push_source(&mut out, &RE_HTML_TAG.replace_all(&t, ""));
            }
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            _ => {}
        }
    }

    normalize_whitespace(&out)
}

/// Append document text, dropping any in-band sentinel it happens to contain.
fn push_source(out: &mut String, text: &str) {
    out.extend(text.chars().filter(|&c| c != PAUSE && c != HEADING));
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Collapse blank-line runs to one blank line and horizontal runs to one space.
fn normalize_whitespace(text: &str) -> String {
    let text = RE_HSPACE.replace_all(text, " ");
    let text = RE_LINE_EDGES.replace_all(&text, "\n");
    let text = RE_BLANK_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}
