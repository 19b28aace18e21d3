//! Transcript → narrative markdown.
//!
//! A fixed template wrapped around the start of a session transcript. The
//! output is itself a StoryCode document and can be fed to the generator.

use std::path::Path;

use anyhow::{Context, Result};

pub const DEFAULT_INPUT: &str = "data/session_transcript.txt";
pub const DEFAULT_OUTPUT: &str = "data/narrative_output.md";

/// Characters of transcript quoted in the story.
pub const SNIPPET_CHARS: usize = 500;

const HEADER: &str = "# The Story of a Conversation\n\n";
const OPENING: &str =
    "Once upon a time, in a land of code and commands, a conversation unfolded...\n\n";
const CLOSING: &str = "\n\nAnd from that conversation, a new idea was born!";

pub fn weave_story(transcript: &str) -> String {
    let end = transcript
        .char_indices()
        .nth(SNIPPET_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(transcript.len());
    format!(
        "{}{}--- Transcript Snippet ---\n{}...\n--- End Snippet ---{}",
        HEADER,
        OPENING,
        &transcript[..end],
        CLOSING
    )
}

/// Read `input`, weave it, and write the story to `output`.
pub fn weave_file(input: &Path, output: &Path) -> Result<()> {
    let transcript = std::fs::read_to_string(input)
        .with_context(|| format!("Input file not found at {}", input.display()))?;
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create {}", dir.display()))?;
    }
    std::fs::write(output, weave_story(&transcript))
        .with_context(|| format!("Cannot write {}", output.display()))?;
    log::info!("Story successfully written to {}", output.display());
    Ok(())
}
