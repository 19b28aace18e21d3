//! Pronunciation dictionary for technical narratives.
//!
//! Technical notation reads badly through a speech engine: `config.json`,
//! `--force`, `API`. This module rewrites it into phonetic-friendly words by
//! applying an ordered table of [`RewriteRule`]s.
//!
//! Rules run strictly in table order and each rule sees the output of the
//! previous one. Template rules match case-insensitively; transform rules
//! match exactly as written.

use std::fmt;

use fancy_regex::{Captures, Regex};
use once_cell::sync::Lazy;

// ─────────────────────────────────────────────────────────────────────────────
// Rule model
// ─────────────────────────────────────────────────────────────────────────────

/// How a matched span is replaced.
#[derive(Clone, Copy)]
pub enum Replacement {
    /// Template string; `${1}` refers to the first capture group.
    Template(&'static str),
    /// Function of the match.
    Transform(fn(&Captures<'_>) -> String),
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Replacement::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// One `(pattern, replacement)` entry of the pronunciation table.
#[derive(Debug)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: Replacement,
}

impl RewriteRule {
    /// Case-insensitive literal template rule.
    ///
    /// Panics on an invalid pattern; rule tables are static.
    pub fn template(pattern: &str, template: &'static str) -> Self {
        Self {
            pattern: Regex::new(&format!("(?i){}", pattern)).unwrap(),
            replacement: Replacement::Template(template),
        }
    }

    /// Case-sensitive function rule.
    pub fn transform(pattern: &str, f: fn(&Captures<'_>) -> String) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            replacement: Replacement::Transform(f),
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Apply this rule to every match in `text`.
    pub fn apply(&self, text: &str) -> String {
        match self.replacement {
            Replacement::Template(t) => self.pattern.replace_all(text, t).into_owned(),
            Replacement::Transform(f) => self
                .pattern
                .replace_all(text, |caps: &Captures| f(caps))
                .into_owned(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Code spans
// ─────────────────────────────────────────────────────────────────────────────

/// Whether an inline code span reads as a shell command.
fn is_command_like(code: &str) -> bool {
    code.contains("docker compose")
        || code.starts_with('-')
        || code.split_whitespace().skip(1).any(|w| w.starts_with('-'))
}

/// Speak an inline code span (capture group 1, backticks excluded).
///
/// - commands expand `--` to "dash dash"
/// - relative paths expand `./` and `../`
/// - other paths (with `/`, no spaces) expand every slash
/// - anything else is padded with spaces
pub fn speak_code_span(caps: &Captures<'_>) -> String {
    let code = &caps[1];

    if is_command_like(code) {
        code.replace("--", "dash dash ")
    } else if code.starts_with("./") || code.starts_with("../") {
        code.replace("../", "dot dot slash ").replace("./", "dot slash ")
    } else if code.contains('/') && !code.contains(' ') {
        code.replace('/', " slash ")
    } else {
        format!(" {} ", code)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Default table
// ─────────────────────────────────────────────────────────────────────────────

/// The StoryCode pronunciation table, in application order.
pub static DEFAULT_RULES: Lazy<Vec<RewriteRule>> = Lazy::new(|| {
    vec![
        // Code elements
        RewriteRule::transform(r"`([^`]+)`", speak_code_span),
        // File extensions
        RewriteRule::template(r"\.md\b", " dot markdown"),
        RewriteRule::template(r"\.yaml\b", " dot yaml"),
        RewriteRule::template(r"\.yml\b", " dot yaml"),
        RewriteRule::template(r"\.toml\b", " dot tom l"),
        RewriteRule::template(r"\.json\b", " dot jason"),
        RewriteRule::template(r"\.py\b", " dot pie"),
        RewriteRule::template(r"\.js\b", " dot jay ess"),
        RewriteRule::template(r"\.ts\b", " dot tee ess"),
        // Acronyms, spelled out
        RewriteRule::template(r"\bAPI\b", "A P I"),
        RewriteRule::template(r"\bCLI\b", "C L I"),
        RewriteRule::template(r"\bGPU\b", "G P U"),
        RewriteRule::template(r"\bCPU\b", "C P U"),
        RewriteRule::template(r"\bURL\b", "U R L"),
        RewriteRule::template(r"\bHTTP\b", "H T T P"),
        RewriteRule::template(r"\bSSL\b", "S S L"),
        RewriteRule::template(r"\bTLS\b", "T L S"),
        RewriteRule::template(r"\bMCP\b", "M C P"),
        // Framework names
        RewriteRule::template(r"\bA2A\b", "A two A"),
        RewriteRule::template(r"\bADK\b", "A D K"),
        RewriteRule::template(r"\bYAML\b", "yam l"),
        RewriteRule::template(r"\bJSON\b", "jay son"),
        // Command flags; a dash inside a word (well-known) is not a flag
        RewriteRule::template(r"(?<![\w-])--([a-z][a-z-]*)", "dash dash ${1}"),
        RewriteRule::template(r"(?<![\w-])-([a-z])", "dash ${1}"),
        // Relative path prefixes left bare by the cleaner
        RewriteRule::template(r"(?<![\w./])\.\./", "dot dot slash "),
        RewriteRule::template(r"(?<![\w./])\./", "dot slash "),
        // Padding introduced above
        RewriteRule::template(r"[ \t]{2,}", " "),
    ]
});

/// Apply `rules` to `text` in order.
pub fn rewrite_with(text: &str, rules: &[RewriteRule]) -> String {
    let mut out = text.to_string();
    for rule in rules {
        out = rule.apply(&out);
    }
    out
}

/// Apply the default StoryCode pronunciation table.
pub fn rewrite(text: &str) -> String {
    rewrite_with(text, &DEFAULT_RULES)
}
