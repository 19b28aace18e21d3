//! Chapter segmentation for per-chapter audio.
//!
//! A chapter starts at a level 1 or 2 ATX heading line and runs up to the next
//! one, or to the end of the document. Headings inside fenced code blocks do
//! not start chapters. Identifiers are derived from the heading text and are
//! not guaranteed unique.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_CHAPTER_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,2}[ \t]+\S").unwrap());
static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,2}[ \t]+([^\n]+)").unwrap());
static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static RE_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

/// One heading-delimited segment of a StoryCode document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Filesystem-safe identifier derived from the heading.
    pub id: String,
    /// Markdown from the heading line up to the next chapter, trimmed.
    pub content: String,
}

/// Derive a filesystem-safe identifier from a heading title.
///
/// Non-word characters (other than whitespace and `-`) are removed, the
/// result is trimmed, and runs of whitespace or hyphens become `_`.
///
/// ```
/// assert_eq!(storycode_audio::chapters::chapter_id("Setup & Config!"), "Setup_Config");
/// ```
pub fn chapter_id(title: &str) -> String {
    let cleaned = RE_NON_WORD.replace_all(title, "");
    RE_SEPARATORS.replace_all(cleaned.trim(), "_").into_owned()
}

/// Byte offsets of every line that opens a chapter.
fn chapter_starts(markdown: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut fence: Option<&str> = None;
    let mut offset = 0;

    for line in markdown.split_inclusive('\n') {
        let trimmed = line.trim_start();
        match fence {
            Some(marker) => {
                if trimmed.starts_with(marker) {
                    fence = None;
                }
            }
            None if trimmed.starts_with("```") => fence = Some("```"),
            None if trimmed.starts_with("~~~") => fence = Some("~~~"),
            None => {
                if RE_CHAPTER_HEADING.is_match(line) {
                    starts.push(offset);
                }
            }
        }
        offset += line.len();
    }
    starts
}

/// Split `markdown` into chapters at level 1 and 2 headings.
///
/// Text before the first such heading belongs to no chapter. A document with
/// no level 1 or 2 heading yields an empty list.
pub fn split(markdown: &str) -> Vec<Chapter> {
    let starts = chapter_starts(markdown);
    let mut chapters = Vec::with_capacity(starts.len());

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(markdown.len());
        let content = markdown[start..end].trim();

        let id = RE_TITLE
            .captures(content)
            .map(|caps| chapter_id(&caps[1]))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| chapter_id(&format!("Chapter {}", i + 1)));

        chapters.push(Chapter { id, content: content.to_string() });
    }
    chapters
}
