//! Speech preprocessing pipeline.
//!
//! Runs a StoryCode document through the text stages in a fixed order:
//!
//! 1. **Clean** — markdown → visible text ([`crate::markdown`]).
//! 2. **Rewrite** — technical notation → spoken words ([`crate::pronounce`]).
//! 3. **Pauses** — pause sentinels after headings, at em-dashes and colons
//!    ([`crate::pauses`]).
//!
//! The result feeds [`crate::ssml::assemble`].

use crate::{
    markdown::{clean_with, CleanOptions},
    pauses::insert_pauses,
    pronounce::rewrite,
};

/// Stage toggles for [`SpeechPreprocessor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessorConfig {
    pub strip_markdown: bool,
    /// Keep `#` markers so headings can be emphasised.
    pub keep_heading_markers: bool,
    /// Keep backticks so code spans get their own pronunciation.
    pub keep_code_spans: bool,
    pub rewrite_pronunciations: bool,
    pub insert_pauses: bool,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            strip_markdown: true,
            keep_heading_markers: true,
            keep_code_spans: true,
            rewrite_pronunciations: true,
            insert_pauses: true,
        }
    }
}

impl PreprocessorConfig {
    /// Plain-text output with no markers or pauses, for text (non-SSML) input.
    pub fn plain() -> Self {
        Self {
            keep_heading_markers: false,
            keep_code_spans: false,
            insert_pauses: false,
            ..Self::default()
        }
    }
}

/// Full text pipeline for one document.
#[derive(Debug, Clone, Default)]
pub struct SpeechPreprocessor {
    pub config: PreprocessorConfig,
}

impl SpeechPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PreprocessorConfig) -> Self {
        Self { config }
    }

    pub fn process(&self, markdown: &str) -> String {
        let cfg = &self.config;
        let mut text = markdown.to_string();

        if cfg.strip_markdown {
            let opts = CleanOptions {
                keep_heading_markers: cfg.keep_heading_markers,
                keep_code_spans: cfg.keep_code_spans,
            };
            text = clean_with(&text, opts);
        }
        if cfg.rewrite_pronunciations {
            text = rewrite(&text);
        }
        if cfg.insert_pauses {
            text = insert_pauses(&text);
        }

        text
    }
}

/// Cut plain `text` to a request budget.
///
/// Text of at most `limit` characters is returned unchanged. Longer text keeps
/// its first `keep` characters and gets `marker` appended; `keep` is lowered
/// when needed so the result never exceeds `limit`. Counts are in characters,
/// not bytes.
pub fn truncate_for_synthesis(text: &str, limit: usize, keep: usize, marker: &str) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = keep.min(limit.saturating_sub(marker.chars().count()));
    let cut = text.char_indices().nth(keep).map(|(i, _)| i).unwrap_or(text.len());
    format!("{}{}", &text[..cut], marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pauses::{heading_marker, PAUSE};
    use crate::ssml::assemble;

    #[test]
    fn test_plain_pipeline_matches_stages() {
        let pp = SpeechPreprocessor::with_config(PreprocessorConfig {
            insert_pauses: false,
            keep_heading_markers: false,
            keep_code_spans: false,
            ..Default::default()
        });
        let out = pp.process("# Setup\n\nUse `--force` in `./run.sh`.");
        assert_eq!(out, "Setup\n\nUse dash dash force in dot slash run.sh.");
    }

    #[test]
    fn test_full_pipeline_marks_heading() {
        let out = SpeechPreprocessor::new().process("# Setup\n\nUse `--force` in `./run.sh`.");
        let expected = format!(
            "{}Setup{}\n\nUse dash dash force in dot slash run.sh.",
            heading_marker(1),
            PAUSE
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_code_span_path_in_pipeline() {
        let out = SpeechPreprocessor::new().process("Open `docs/guide.md` today.");
        assert_eq!(out, "Open docs slash guide dot markdown today.");
    }

    #[test]
    fn test_stages_can_be_disabled() {
        let pp = SpeechPreprocessor::with_config(PreprocessorConfig {
            strip_markdown: false,
            rewrite_pronunciations: false,
            insert_pauses: false,
            ..Default::default()
        });
        assert_eq!(pp.process("**raw** API"), "**raw** API");
    }

    #[test]
    fn test_plain_config_has_no_pauses() {
        let pp = SpeechPreprocessor::with_config(PreprocessorConfig::plain());
        let out = pp.process("# Title\n\nWhy: because — reasons");
        assert!(!out.contains(PAUSE), "got: {:?}", out);
        assert!(!out.contains('#'), "got: {:?}", out);
    }

    #[test]
    fn test_escaped_hash_stays_body_text() {
        let out = assemble(&SpeechPreprocessor::new().process("\\# not a heading, just text"));
        assert_eq!(out, "<speak>\n<p># not a heading, just text</p>\n</speak>");
    }

    #[test]
    fn test_real_heading_still_emphasised() {
        let out = assemble(&SpeechPreprocessor::new().process("## Body\n\n\\# tag"));
        assert!(out.contains("<emphasis level=\"strong\">Body</emphasis>"), "got: {}", out);
        assert!(out.contains("<p># tag</p>"), "got: {}", out);
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_for_synthesis("hello", 10, 5, "..."), "hello");
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "a".repeat(5001);
        let out = truncate_for_synthesis(&text, 5000, 4950, "... and the story continues.");
        assert_eq!(out.len(), 4950 + "... and the story continues.".len());
        assert!(out.ends_with("... and the story continues."));
    }

    #[test]
    fn test_truncate_keep_clamped_to_limit() {
        let out = truncate_for_synthesis(&"a".repeat(20), 10, 50, "~~");
        assert_eq!(out, format!("{}~~", "a".repeat(8)));
        assert!(out.chars().count() <= 10);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(20);
        let out = truncate_for_synthesis(&text, 10, 5, "~");
        assert_eq!(out, format!("{}~", "é".repeat(5)));
    }
}
