//! # storycode-audio
//!
//! Turn StoryCode markdown narratives into spoken audio.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::{path::Path, time::Duration};
//! use storycode_audio::{Config, Credentials, StoryCodeAudioGenerator, TtsClient, VoiceProfile};
//!
//! let config = Config::default();
//! let client = TtsClient::new(
//!     &config.endpoint,
//!     Credentials::from_env().unwrap(),
//!     Duration::from_secs(config.timeout_secs),
//! );
//! let generator = StoryCodeAudioGenerator::new(client, config);
//! let report = generator
//!     .process_file(Path::new("story.md"), Path::new("audio"), VoiceProfile::Default, true)
//!     .unwrap();
//! for path in report.generated() {
//!     println!("{}", path.display());
//! }
//! ```
//!
//! The text stages are usable on their own and need no network:
//!
//! ```
//! use storycode_audio::{preprocess::SpeechPreprocessor, ssml::assemble};
//!
//! let text = SpeechPreprocessor::new().process("# Intro\n\nRun `./build.sh` now.");
//! let ssml = assemble(&text);
//! assert!(ssml.starts_with("<speak>"));
//! assert!(ssml.contains("dot slash build.sh"));
//! ```
//!
//! ## Pipeline
//! 1. **Clean** — markdown syntax removed, visible text kept, headings marked.
//! 2. **Rewrite** — flags, paths, extensions, acronyms → spoken words.
//! 3. **Pauses** — pause sentinels after headings, at em-dashes and colons.
//! 4. **SSML** — headings emphasised, paragraphs wrapped, pauses → `<break>`.
//! 5. **Budget** — over-long markup cut with a continuation marker.
//! 6. **Synthesis** — Cloud Text-to-Speech `text:synthesize`.
//! 7. **Chapters** — the same steps per `#`/`##` section.

pub mod audio;
pub mod chapters;
pub mod config;
pub mod generator;
#[cfg(feature = "cli")]
pub mod logging;
pub mod markdown;
pub mod narrative;
pub mod pauses;
pub mod preprocess;
pub mod pronounce;
pub mod ssml;
pub mod tts;
pub mod voice;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use config::Config;
pub use generator::{GenerationReport, Outcome, StoryCodeAudioGenerator};
pub use tts::{Credentials, Synthesizer, TtsClient, TtsError};
pub use voice::VoiceProfile;
