//! Prosodic pause markers.
//!
//! Pauses are inserted as a private-use sentinel character rather than a
//! literal ellipsis, so an ellipsis already present in the prose is never
//! mistaken for a pause. The SSML assembler turns each sentinel into a timed
//! `<break/>`.
//!
//! Headings travel the same way: the cleaner marks a heading with [`HEADING`]
//! repeated once per level, so a literal `#` in the prose is never read as one.

use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use regex::Regex;

/// In-band pause marker (U+E000, Private Use Area).
pub const PAUSE: char = '\u{E000}';

/// [`PAUSE`] as a string slice, for replacement templates.
pub const PAUSE_STR: &str = "\u{E000}";

/// In-band heading level marker (U+E001), one per level.
pub const HEADING: char = '\u{E001}';

/// Marker prefix for a heading of `level` (1–6): the markers and a space.
pub fn heading_marker(level: usize) -> String {
    let mut marker: String = std::iter::repeat(HEADING).take(level).collect();
    marker.push(' ');
    marker
}

// A marked heading line whose last character is not already a pause.
static RE_HEADING_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?m)^([ \t]*{}{{1,6}} [^\n]*[^\n{}])$", HEADING, PAUSE)).unwrap()
});
static RE_EM_DASH: Lazy<Regex> = Lazy::new(|| Regex::new("—").unwrap());
// A lone colon: no colon on either side, not already followed by a pause.
static RE_LONE_COLON: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(&format!(r"(?<=[^:]):(?=[^:{}])", PAUSE)).unwrap());

/// Append a pause to every marked heading line.
pub fn pause_after_headings(text: &str) -> String {
    RE_HEADING_LINE
        .replace_all(text, format!("${{1}}{}", PAUSE_STR).as_str())
        .into_owned()
}

/// Replace each em-dash with a pause followed by a space.
pub fn pause_at_em_dashes(text: &str) -> String {
    RE_EM_DASH
        .replace_all(text, format!("{} ", PAUSE_STR).as_str())
        .into_owned()
}

/// Pause after explanatory colons, leaving `::` untouched.
pub fn pause_after_colons(text: &str) -> String {
    RE_LONE_COLON
        .replace_all(text, format!(":{}", PAUSE_STR).as_str())
        .into_owned()
}

/// Run all pause rules: headings, em-dashes, then colons.
pub fn insert_pauses(text: &str) -> String {
    let text = pause_after_headings(text);
    let text = pause_at_em_dashes(&text);
    pause_after_colons(&text)
}

/// Remove every pause sentinel from `text`.
pub fn strip_pauses(text: &str) -> String {
    text.replace(PAUSE, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(text: &str) -> String {
        text.replace(PAUSE, "<P>").replace(HEADING, "#")
    }

    #[test]
    fn test_heading_gets_pause() {
        let out = insert_pauses(&format!("{}Setup\n\nBody text", heading_marker(1)));
        assert_eq!(visible(&out), "# Setup<P>\n\nBody text");
    }

    #[test]
    fn test_literal_hash_is_not_a_heading() {
        assert_eq!(pause_after_headings("# Setup"), "# Setup");
    }

    #[test]
    fn test_seven_markers_is_not_a_heading() {
        let line = format!("{}Nope", heading_marker(7));
        assert_eq!(pause_after_headings(&line), line);
    }

    #[test]
    fn test_marker_needs_space() {
        let line = format!("{}hashtag", HEADING);
        assert_eq!(pause_after_headings(&line), line);
    }

    #[test]
    fn test_em_dash() {
        let out = pause_at_em_dashes("wait—then go");
        assert_eq!(visible(&out), "wait<P> then go");
    }

    #[test]
    fn test_colon_pause() {
        let out = pause_after_colons("Note: this matters");
        assert_eq!(visible(&out), "Note:<P> this matters");
    }

    #[test]
    fn test_double_colon_untouched() {
        assert_eq!(pause_after_colons("std::fs::read"), "std::fs::read");
    }

    #[test]
    fn test_colon_at_edges_untouched() {
        assert_eq!(pause_after_colons(":start"), ":start");
        assert_eq!(pause_after_colons("end:"), "end:");
    }

    #[test]
    fn test_literal_ellipsis_is_not_a_pause() {
        let out = insert_pauses("And then... nothing");
        assert_eq!(out, "And then... nothing");
    }

    #[test]
    fn test_insert_twice_is_stable() {
        let text = format!("{}Part 1: Intro\n\nWhy: because — reasons", heading_marker(2));
        let once = insert_pauses(&text);
        let twice = insert_pauses(&once);
        assert_eq!(once, twice, "got: {}", visible(&twice));
    }

    #[test]
    fn test_strip_pauses() {
        let out = insert_pauses("# Title: Sub");
        assert_eq!(strip_pauses(&out), "# Title: Sub");
    }
}
