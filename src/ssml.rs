//! SSML assembly.
//!
//! Optimised text is split into blank-line separated paragraphs. Heading
//! paragraphs become an emphasised title followed by a break; every other
//! paragraph becomes a `<p>` in which each pause sentinel is a half-second
//! `<break/>`. The output is always a single `<speak>` root, even for empty
//! input.
//!
//! Headings are recognised by the in-band [`HEADING`] marker the cleaner emits,
//! never by a literal `#`.

use std::time::Duration;

use once_cell::sync::Lazy;
use quick_xml::escape::partial_escape;
use regex::Regex;

use crate::pauses::{strip_pauses, HEADING, PAUSE};

/// Break after level 1–2 headings.
pub const HEADING_BREAK: Duration = Duration::from_secs(1);

/// Break after level 3–6 headings and at every inline pause.
pub const SHORT_BREAK: Duration = Duration::from_millis(500);

static RE_PARAGRAPH_SEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^({}{{1,6}})[ \t]+([^\n]+)", HEADING)).unwrap());
static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

// `<speak>\n` + `</speak>`; every node adds its own length plus one newline.
const ROOT_CHARS: usize = 16;
// `<p></p>` plus the newline after it.
const PARAGRAPH_CHARS: usize = 8;

/// `<emphasis level="…">`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmphasisLevel {
    Strong,
    Moderate,
}

impl EmphasisLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EmphasisLevel::Strong => "strong",
            EmphasisLevel::Moderate => "moderate",
        }
    }
}

/// Content of a body paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Already XML-escaped text.
    Text(String),
    Break(Duration),
}

/// A child of the `<speak>` root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsmlNode {
    /// `<p><emphasis level="…">title</emphasis></p>`; title is XML-escaped.
    Heading { level: EmphasisLevel, title: String },
    Paragraph(Vec<Inline>),
    Break(Duration),
}

/// A `<speak>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsmlDocument {
    pub nodes: Vec<SsmlNode>,
}

impl SsmlDocument {
    /// Build the node list from optimised text.
    pub fn from_text(text: &str) -> Self {
        let mut nodes = Vec::new();

        for para in RE_PARAGRAPH_SEP.split(text) {
            let para = para.trim();
            if para.is_empty() {
                continue;
            }

            if let Some(caps) = RE_HEADING.captures(para) {
                let depth = caps[1].chars().count();
                let title = strip_pauses(&caps[2]);
                let title = RE_HSPACE.replace_all(title.trim(), " ").into_owned();
                let title = partial_escape(title.as_str()).into_owned();
                let (level, pause) = if depth <= 2 {
                    (EmphasisLevel::Strong, HEADING_BREAK)
                } else {
                    (EmphasisLevel::Moderate, SHORT_BREAK)
                };
                nodes.push(SsmlNode::Heading { level, title });
                nodes.push(SsmlNode::Break(pause));
                continue;
            }

            nodes.push(SsmlNode::Paragraph(body_inlines(para)));
        }

        Self { nodes }
    }

    /// Serialise to SSML markup, one child per line.
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.nodes.len() + 2);
        parts.push("<speak>".to_string());
        for node in &self.nodes {
            parts.push(render_node(node));
        }
        parts.push("</speak>".to_string());
        parts.join("\n")
    }

    /// Length of [`render`](Self::render) output, in characters.
    pub fn rendered_chars(&self) -> usize {
        ROOT_CHARS + self.nodes.iter().map(|n| node_chars(n) + 1).sum::<usize>()
    }

    /// Shrink the document until its markup is at most `limit` characters.
    ///
    /// Nodes are kept from the start; the first one that does not fit is cut
    /// at a word boundary when it is a paragraph and dropped otherwise, and
    /// `marker` is appended as a final paragraph. Returns `false` when the
    /// document already fits. Below the size of an empty root plus the marker
    /// paragraph, the marker is left out as well.
    pub fn fit_within(&mut self, limit: usize, marker: &str) -> bool {
        if self.rendered_chars() <= limit {
            return false;
        }

        let marker = partial_escape(marker.trim()).into_owned();
        let marker = SsmlNode::Paragraph(vec![Inline::Text(marker)]);
        let reserved = ROOT_CHARS + node_chars(&marker) + 1;
        let mut budget = limit.saturating_sub(reserved);

        let mut kept = Vec::new();
        for node in self.nodes.drain(..) {
            let len = node_chars(&node) + 1;
            if len <= budget {
                budget -= len;
                kept.push(node);
                continue;
            }
            if let SsmlNode::Paragraph(inlines) = node {
                if let Some(cut) = cut_paragraph(inlines, budget) {
                    kept.push(cut);
                }
            }
            break;
        }
        if reserved <= limit {
            kept.push(marker);
        }

        self.nodes = kept;
        true
    }
}

fn node_chars(node: &SsmlNode) -> usize {
    render_node(node).chars().count()
}

/// Leading part of a paragraph that renders in at most `budget` characters
/// (newline included).
fn cut_paragraph(inlines: Vec<Inline>, budget: usize) -> Option<SsmlNode> {
    let mut room = budget.checked_sub(PARAGRAPH_CHARS)?;
    let mut kept = Vec::new();

    for inline in inlines {
        match inline {
            Inline::Break(d) => {
                let len = render_break(d).chars().count();
                if len > room {
                    break;
                }
                room -= len;
                kept.push(Inline::Break(d));
            }
            Inline::Text(t) => {
                let len = t.chars().count();
                if len <= room {
                    room -= len;
                    kept.push(Inline::Text(t));
                    continue;
                }
                let cut = cut_escaped(&t, room);
                if !cut.is_empty() {
                    kept.push(Inline::Text(cut.to_string()));
                }
                break;
            }
        }
    }

    if kept.iter().any(|i| matches!(i, Inline::Text(_))) {
        Some(SsmlNode::Paragraph(kept))
    } else {
        None
    }
}

/// Prefix of escaped text, at most `max` characters, ending at a word
/// boundary and never inside an entity.
fn cut_escaped(text: &str, max: usize) -> &str {
    let end = text.char_indices().nth(max).map(|(i, _)| i).unwrap_or(text.len());
    let mut prefix = &text[..end];
    if end < text.len() {
        if let Some(space) = prefix.rfind(char::is_whitespace) {
            prefix = &prefix[..space];
        }
    }
    if let Some(amp) = prefix.rfind('&') {
        if !prefix[amp..].contains(';') {
            prefix = &prefix[..amp];
        }
    }
    prefix.trim_end()
}

fn body_inlines(para: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    for (i, piece) in para.split(PAUSE).enumerate() {
        if i > 0 {
            inlines.push(Inline::Break(SHORT_BREAK));
        }
        if !piece.is_empty() {
            inlines.push(Inline::Text(partial_escape(piece).into_owned()));
        }
    }
    inlines
}

fn render_break(d: Duration) -> String {
    format!("<break time=\"{}s\"/>", d.as_secs_f32())
}

fn render_node(node: &SsmlNode) -> String {
    match node {
        SsmlNode::Heading { level, title } => {
            format!("<p><emphasis level=\"{}\">{}</emphasis></p>", level.as_str(), title)
        }
        SsmlNode::Paragraph(inlines) => {
            let mut body = String::new();
            for inline in inlines {
                match inline {
                    Inline::Text(t) => body.push_str(t),
                    Inline::Break(d) => body.push_str(&render_break(*d)),
                }
            }
            format!("<p>{}</p>", body)
        }
        SsmlNode::Break(d) => render_break(*d),
    }
}

/// Assemble optimised text into SSML markup.
pub fn assemble(text: &str) -> String {
    SsmlDocument::from_text(text).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pauses::{heading_marker, insert_pauses, PAUSE_STR};

    #[test]
    fn test_empty_input_has_root() {
        assert_eq!(assemble(""), "<speak>\n</speak>");
        assert_eq!(assemble("  \n\n \n"), "<speak>\n</speak>");
    }

    #[test]
    fn test_root_wraps_any_input() {
        for text in ["hello", "# only a heading", "a\n\n\n\nb", "<&>"] {
            let out = assemble(text);
            assert!(out.starts_with("<speak>"), "got: {}", out);
            assert!(out.ends_with("</speak>"), "got: {}", out);
        }
    }

    #[test]
    fn test_heading_levels_and_breaks() {
        for depth in 1..=6 {
            let text = format!("{}Title", heading_marker(depth));
            let doc = SsmlDocument::from_text(&text);
            let expected = if depth <= 2 {
                (EmphasisLevel::Strong, HEADING_BREAK)
            } else {
                (EmphasisLevel::Moderate, SHORT_BREAK)
            };
            assert_eq!(
                doc.nodes,
                vec![
                    SsmlNode::Heading { level: expected.0, title: "Title".into() },
                    SsmlNode::Break(expected.1),
                ],
                "depth {}",
                depth
            );
        }
    }

    #[test]
    fn test_break_rendering() {
        assert_eq!(render_break(HEADING_BREAK), "<break time=\"1s\"/>");
        assert_eq!(render_break(SHORT_BREAK), "<break time=\"0.5s\"/>");
    }

    #[test]
    fn test_heading_title_drops_pauses() {
        let text = format!("{}Part 1:{} Intro{}", heading_marker(2), PAUSE_STR, PAUSE_STR);
        let out = assemble(&text);
        assert_eq!(
            out,
            "<speak>\n\
             <p><emphasis level=\"strong\">Part 1: Intro</emphasis></p>\n\
             <break time=\"1s\"/>\n\
             </speak>"
        );
    }

    #[test]
    fn test_body_pauses_become_breaks() {
        let text = format!("Note:{} this", PAUSE_STR);
        let out = assemble(&text);
        assert_eq!(out, "<speak>\n<p>Note:<break time=\"0.5s\"/> this</p>\n</speak>");
    }

    #[test]
    fn test_literal_ellipsis_stays_text() {
        let out = assemble("And then... silence");
        assert_eq!(out, "<speak>\n<p>And then... silence</p>\n</speak>");
    }

    #[test]
    fn test_markup_characters_escaped() {
        let out = assemble(&format!("{}A & B\n\nuse <T> here", heading_marker(1)));
        assert!(out.contains("A &amp; B"), "got: {}", out);
        assert!(out.contains("use &lt;T&gt; here"), "got: {}", out);
    }

    #[test]
    fn test_hash_without_space_is_body() {
        let out = assemble("#hashtag");
        assert_eq!(out, "<speak>\n<p>#hashtag</p>\n</speak>");
    }

    #[test]
    fn test_literal_hash_line_is_body() {
        let out = assemble("# not a heading, just text");
        assert_eq!(out, "<speak>\n<p># not a heading, just text</p>\n</speak>");
    }

    #[test]
    fn test_heading_dash_leaves_single_space() {
        let text = insert_pauses(&format!("{}A — B", heading_marker(1)));
        let out = assemble(&text);
        assert!(out.contains("<emphasis level=\"strong\">A B</emphasis>"), "got: {}", out);
    }

    #[test]
    fn test_rendered_chars_matches_render() {
        let text = format!("{}Título\n\nNote:{} ünïcode & more", heading_marker(3), PAUSE_STR);
        let doc = SsmlDocument::from_text(&text);
        assert_eq!(doc.rendered_chars(), doc.render().chars().count());
        assert_eq!(SsmlDocument::default().rendered_chars(), assemble("").chars().count());
    }

    #[test]
    fn test_fit_within_leaves_small_documents() {
        let mut doc = SsmlDocument::from_text("short");
        assert!(!doc.fit_within(1000, "..."));
        assert_eq!(doc.render(), "<speak>\n<p>short</p>\n</speak>");
    }

    #[test]
    fn test_fit_within_cuts_nodes_and_appends_marker() {
        let text: String = (0..50)
            .map(|i| {
                let heading = heading_marker(3);
                format!("{}Step {}{}\n\nNote:{} run it.\n\n", heading, i, PAUSE_STR, PAUSE_STR)
            })
            .collect();
        let mut doc = SsmlDocument::from_text(&text);
        assert!(doc.fit_within(600, "... more."));
        let out = doc.render();
        assert!(out.chars().count() <= 600, "got {} chars", out.chars().count());
        assert!(out.starts_with("<speak>\n<p><emphasis"), "got: {}", out);
        assert!(out.ends_with("<p>... more.</p>\n</speak>"), "got: {}", out);
    }

    #[test]
    fn test_fit_within_cuts_long_paragraph_at_word() {
        let mut doc = SsmlDocument::from_text(&"word ".repeat(50));
        assert!(doc.fit_within(120, "... and the story continues."));
        let out = doc.render();
        assert!(out.chars().count() <= 120, "got {} chars", out.chars().count());
        assert!(out.starts_with("<speak>\n<p>word word"), "got: {}", out);
        assert!(out.contains("word</p>\n<p>... and the story continues.</p>"), "got: {}", out);
    }

    #[test]
    fn test_cut_never_splits_entity() {
        assert_eq!(cut_escaped("a&amp;b", 4), "a");
        assert_eq!(cut_escaped("x &lt;y", 100), "x &lt;y");
    }

    #[test]
    fn test_fit_within_tiny_limit_keeps_root() {
        let mut doc = SsmlDocument::from_text("some text here");
        assert!(doc.fit_within(10, "... and the story continues."));
        assert_eq!(doc.render(), "<speak>\n</speak>");
    }

    #[test]
    fn test_end_to_end_markup() {
        let text = format!(
            "{}Setup{}\n\nUse dash dash force in dot slash run.sh.",
            heading_marker(1),
            PAUSE_STR
        );
        let out = assemble(&text);
        assert_eq!(
            out,
            "<speak>\n\
             <p><emphasis level=\"strong\">Setup</emphasis></p>\n\
             <break time=\"1s\"/>\n\
             <p>Use dash dash force in dot slash run.sh.</p>\n\
             </speak>"
        );
    }
}
