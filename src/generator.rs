//! StoryCode audio generator.
//!
//! Turns one StoryCode markdown file into a full-narrative audio file plus one
//! file per chapter:
//!
//! | Output                                   | Content                     |
//! |------------------------------------------|-----------------------------|
//! | `<prefix><stem>.<ext>`                   | whole document              |
//! | `<prefix><stem>_<chapter_id>.<ext>`      | one chapter (level 1–2)     |
//!
//! Each target is synthesised independently. A failure is recorded in the
//! [`GenerationReport`] and the remaining targets are still attempted.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::{
    chapters,
    config::Config,
    preprocess::{truncate_for_synthesis, PreprocessorConfig, SpeechPreprocessor},
    ssml::SsmlDocument,
    tts::{SynthesisInput, SynthesisRequest, Synthesizer},
    voice::VoiceProfile,
};

/// Narrative spoken by [`StoryCodeAudioGenerator::demo`].
pub const DEMO_STORY: &str = "\
# The Voice Synthesis Magic We Just Created

We have just accomplished something remarkable in our repository journey.
We built a complete voice synthesis system that can transform technical
stories into spoken audio, perfect for walking meditation.

Our system handles complex technical terms like the API, the CLI, and
`docker compose up --build` with careful pronunciation.

This demonstrates the recursive magic of our StoryCode pattern:
we created tools to make technical stories speakable, and now we are
using those very tools to tell the story of their creation.

The result is a self-demonstrating system that grows stronger with
each use, making complex software architectures accessible to more
people in more learning contexts.
";

/// File name of the demo narrative.
pub const DEMO_FILE_NAME: &str = "voice_synthesis_demo";

// ─────────────────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────────────────

/// Result of one synthesis target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Generated { path: PathBuf },
    Failed { target: PathBuf, reason: String },
}

/// Per-target outcomes of [`StoryCodeAudioGenerator::process_file`], in
/// generation order (full document first, then chapters).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub outcomes: Vec<Outcome>,
}

impl GenerationReport {
    pub fn generated(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                Outcome::Generated { path } => Some(path.as_path()),
                Outcome::Failed { .. } => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<(&Path, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                Outcome::Failed { target, reason } => Some((target.as_path(), reason.as_str())),
                Outcome::Generated { .. } => None,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generator
// ─────────────────────────────────────────────────────────────────────────────

pub struct StoryCodeAudioGenerator<S: Synthesizer> {
    synthesizer: S,
    config: Config,
    preprocessor: SpeechPreprocessor,
}

impl<S: Synthesizer> StoryCodeAudioGenerator<S> {
    pub fn new(synthesizer: S, config: Config) -> Self {
        Self { synthesizer, config, preprocessor: SpeechPreprocessor::new() }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn budget(&self, text: &str) -> String {
        let cfg = &self.config;
        let len = text.chars().count();
        if len > cfg.max_input_chars {
            log::warn!(
                "Text of {} chars exceeds the {}-char budget, truncating",
                len,
                cfg.max_input_chars
            );
        }
        truncate_for_synthesis(
            text,
            cfg.max_input_chars,
            cfg.truncate_to,
            &cfg.continuation_marker,
        )
    }

    /// Markdown → optimised text → SSML of at most `max_input_chars`.
    ///
    /// The budget applies to the markup actually sent; over-long documents
    /// lose their tail and end with the continuation marker.
    pub fn build_ssml(&self, markdown: &str) -> String {
        let cfg = &self.config;
        let optimized = self.preprocessor.process(markdown);
        let mut doc = SsmlDocument::from_text(&optimized);
        let len = doc.rendered_chars();
        if doc.fit_within(cfg.max_input_chars, &cfg.continuation_marker) {
            log::warn!(
                "SSML of {} chars exceeds the {}-char budget, truncating",
                len,
                cfg.max_input_chars
            );
        }
        doc.render()
    }

    fn write_audio(
        &self,
        input: SynthesisInput,
        output_path: &Path,
        voice: VoiceProfile,
    ) -> Result<PathBuf> {
        let request = SynthesisRequest {
            input,
            voice: voice.voice(),
            audio_config: self.config.audio.clone(),
        };
        let audio = self
            .synthesizer
            .synthesize(&request)
            .with_context(|| format!("Synthesis failed for {}", output_path.display()))?;
        std::fs::write(output_path, &audio)
            .with_context(|| format!("Cannot write audio: {}", output_path.display()))?;
        log::info!("Audio content written to {} ({} bytes)", output_path.display(), audio.len());
        Ok(output_path.to_path_buf())
    }

    /// Synthesise a markdown document as SSML and save the audio.
    pub fn synthesize_to_file(
        &self,
        markdown: &str,
        output_path: &Path,
        voice: VoiceProfile,
    ) -> Result<PathBuf> {
        let ssml = self.build_ssml(markdown);
        self.write_audio(SynthesisInput::Ssml(ssml), output_path, voice)
    }

    /// Synthesise markdown as plain text input (no SSML, no pause markers).
    pub fn synthesize_plain_to_file(
        &self,
        markdown: &str,
        output_path: &Path,
        voice: VoiceProfile,
    ) -> Result<PathBuf> {
        let text = SpeechPreprocessor::with_config(PreprocessorConfig::plain()).process(markdown);
        self.write_audio(SynthesisInput::Text(self.budget(&text)), output_path, voice)
    }

    fn output_path(&self, output_dir: &Path, stem: &str, chapter: Option<&str>) -> PathBuf {
        let ext = self.config.audio.audio_encoding.extension();
        let name = match chapter {
            Some(id) => format!("{}{}_{}.{}", self.config.file_prefix, stem, id, ext),
            None => format!("{}{}.{}", self.config.file_prefix, stem, ext),
        };
        output_dir.join(name)
    }

    fn attempt(&self, markdown: &str, target: PathBuf, voice: VoiceProfile) -> Outcome {
        match self.synthesize_to_file(markdown, &target, voice) {
            Ok(path) => Outcome::Generated { path },
            Err(e) => {
                let reason = format!("{:#}", e);
                log::warn!("Error synthesizing {}: {}", target.display(), reason);
                Outcome::Failed { target, reason }
            }
        }
    }

    /// Generate the full narrative and, when `with_chapters`, one file per chapter.
    ///
    /// Fails only when the input cannot be read or the output directory cannot
    /// be created; synthesis failures are reported per target.
    pub fn process_file(
        &self,
        input_path: &Path,
        output_dir: &Path,
        voice: VoiceProfile,
        with_chapters: bool,
    ) -> Result<GenerationReport> {
        let markdown = std::fs::read_to_string(input_path)
            .with_context(|| format!("Cannot read StoryCode file: {}", input_path.display()))?;
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Cannot create output directory: {}", output_dir.display()))?;

        let stem = input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "story".to_string());

        let mut report = GenerationReport::default();
        let full = self.output_path(output_dir, &stem, None);
        report.outcomes.push(self.attempt(&markdown, full, voice));

        if with_chapters {
            let chapters = chapters::split(&markdown);
            log::info!("Found {} chapters in {}", chapters.len(), input_path.display());
            for chapter in &chapters {
                let target = self.output_path(output_dir, &stem, Some(&chapter.id));
                report.outcomes.push(self.attempt(&chapter.content, target, voice));
            }
        }

        Ok(report)
    }

    /// Speak [`DEMO_STORY`] into `output_dir`.
    pub fn demo(&self, output_dir: &Path, voice: VoiceProfile) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Cannot create output directory: {}", output_dir.display()))?;
        let ext = self.config.audio.audio_encoding.extension();
        let target = output_dir.join(format!("{}.{}", DEMO_FILE_NAME, ext));
        log::info!("Generating voice synthesis demo…");
        self.synthesize_plain_to_file(DEMO_STORY, &target, voice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::TtsError;
    use std::cell::RefCell;

    /// Records requests; fails any SSML request containing `fail_on`.
    struct FakeSynth {
        fail_on: Option<&'static str>,
        requests: RefCell<Vec<SynthesisRequest>>,
    }

    impl FakeSynth {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self { fail_on, requests: RefCell::new(Vec::new()) }
        }
    }

    impl Synthesizer for FakeSynth {
        fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
            self.requests.borrow_mut().push(request.clone());
            let body = match &request.input {
                SynthesisInput::Ssml(s) | SynthesisInput::Text(s) => s,
            };
            if let Some(needle) = self.fail_on {
                if body.contains(needle) {
                    return Err(TtsError::Status { status: 500, message: "boom".into() });
                }
            }
            Ok(b"ID3fake".to_vec())
        }
    }

    const STORY: &str = "# Intro\n\nWelcome to the API.\n\n## Body\n\nRun `./go.sh` — now.\n";

    #[test]
    fn test_build_ssml() {
        let generator = StoryCodeAudioGenerator::new(FakeSynth::new(None), Config::default());
        let ssml = generator.build_ssml("# Setup\n\nUse `--force` in `./run.sh`.");
        assert_eq!(
            ssml,
            "<speak>\n\
             <p><emphasis level=\"strong\">Setup</emphasis></p>\n\
             <break time=\"1s\"/>\n\
             <p>Use dash dash force in dot slash run.sh.</p>\n\
             </speak>"
        );
    }

    #[test]
    fn test_build_ssml_cuts_long_paragraph() {
        let cfg = Config { max_input_chars: 120, ..Config::default() };
        let generator = StoryCodeAudioGenerator::new(FakeSynth::new(None), cfg);
        let ssml = generator.build_ssml(&"word ".repeat(50));
        assert!(ssml.chars().count() <= 120, "got: {}", ssml);
        assert!(ssml.ends_with("<p>... and the story continues.</p>\n</speak>"), "got: {}", ssml);
    }

    #[test]
    fn test_build_ssml_markup_within_budget() {
        let story: String = (0..200)
            .map(|i| format!("### Step {}\n\nNote: run it — then: check.\n\n", i))
            .collect();
        let generator = StoryCodeAudioGenerator::new(FakeSynth::new(None), Config::default());
        let ssml = generator.build_ssml(&story);
        let max = generator.config().max_input_chars;
        assert!(ssml.chars().count() <= max, "got {} chars", ssml.chars().count());
        assert!(ssml.starts_with("<speak>\n<p><emphasis level=\"moderate\">Step 0</emphasis></p>"));
        assert!(ssml.ends_with("<p>... and the story continues.</p>\n</speak>"), "got: {}", ssml);
    }

    #[test]
    fn test_plain_text_within_budget() {
        let cfg = Config { max_input_chars: 100, truncate_to: 500, ..Config::default() };
        let generator = StoryCodeAudioGenerator::new(FakeSynth::new(None), cfg);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("p.mp3");
        generator
            .synthesize_plain_to_file(&"word ".repeat(100), &target, VoiceProfile::Default)
            .unwrap();
        let requests = generator.synthesizer.requests.borrow();
        match &requests[0].input {
            SynthesisInput::Text(t) => assert!(t.chars().count() <= 100, "got: {}", t),
            other => panic!("expected text input, got {:?}", other),
        }
    }

    #[test]
    fn test_process_file_full_and_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("journey.md");
        std::fs::write(&input, STORY).unwrap();
        let out = dir.path().join("audio");

        let generator = StoryCodeAudioGenerator::new(FakeSynth::new(None), Config::default());
        let report = generator
            .process_file(&input, &out, VoiceProfile::Technical, true)
            .unwrap();

        let names: Vec<String> = report
            .generated()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "StoryCode_journey.mp3",
                "StoryCode_journey_Intro.mp3",
                "StoryCode_journey_Body.mp3",
            ]
        );
        assert!(report.is_complete());
        assert_eq!(std::fs::read(out.join("StoryCode_journey.mp3")).unwrap(), b"ID3fake");

        let requests = generator.synthesizer.requests.borrow();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.voice.name == "en-US-Neural2-A"));
    }

    #[test]
    fn test_chapter_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("journey.md");
        std::fs::write(&input, STORY).unwrap();

        // The full document and the Body chapter both carry the code span.
        let synth = FakeSynth::new(Some("dot slash go"));
        let generator = StoryCodeAudioGenerator::new(synth, Config::default());
        let report = generator
            .process_file(&input, dir.path(), VoiceProfile::Default, true)
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.generated().len(), 1);
        let failures = report.failures();
        assert_eq!(failures.len(), 2);
        assert!(failures[0].1.contains("API error 500"), "got: {}", failures[0].1);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_without_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tale.md");
        std::fs::write(&input, STORY).unwrap();
        let generator = StoryCodeAudioGenerator::new(FakeSynth::new(None), Config::default());
        let report = generator
            .process_file(&input, dir.path(), VoiceProfile::Default, false)
            .unwrap();
        assert_eq!(report.outcomes.len(), 1);
    }

    #[test]
    fn test_missing_input_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let generator = StoryCodeAudioGenerator::new(FakeSynth::new(None), Config::default());
        let err = generator
            .process_file(&dir.path().join("absent.md"), dir.path(), VoiceProfile::Default, true)
            .unwrap_err();
        let io = err.downcast_ref::<std::io::Error>().expect("io error in chain");
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_demo_uses_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let generator = StoryCodeAudioGenerator::new(FakeSynth::new(None), Config::default());
        let path = generator.demo(dir.path(), VoiceProfile::Default).unwrap();
        assert_eq!(path.file_name().unwrap(), "voice_synthesis_demo.mp3");

        let requests = generator.synthesizer.requests.borrow();
        match &requests[0].input {
            SynthesisInput::Text(t) => {
                assert!(t.contains("A P I"), "got: {}", t);
                assert!(t.contains("dash dash build"), "got: {}", t);
                assert!(!t.contains('#'), "got: {}", t);
            }
            other => panic!("expected text input, got {:?}", other),
        }
    }
}
