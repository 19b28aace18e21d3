//! storycode - StoryCode narrative → speech toolkit

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use storycode_audio::{
    audio::{self, EncoderConfig, Tags},
    chapters, logging, narrative,
    preprocess::SpeechPreprocessor,
    ssml::SsmlDocument,
    Config, Credentials, StoryCodeAudioGenerator, TtsClient, VoiceProfile,
};

#[derive(Parser)]
#[command(name = "storycode")]
#[command(version, about = "Turn StoryCode markdown narratives into spoken audio")]
#[command(long_about = None)]
#[command(after_help = "EXAMPLES:
    storycode generate story.md -o audio     Full narrative + one file per chapter
    storycode ssml story.md                  Print the markup without calling the API
    storycode prep take.wav take.mp3 --title \"Episode 1\"
    storycode weave --input session.txt")]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesise a StoryCode file (and its chapters) to audio
    Generate {
        /// StoryCode markdown file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "audio")]
        output_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = VoiceProfile::Default)]
        voice: VoiceProfile,

        /// Only generate the full narrative
        #[arg(long)]
        no_chapters: bool,

        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Print the SSML that would be sent for a file
    Ssml {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Only this chapter (by identifier)
        #[arg(long)]
        chapter: Option<String>,

        /// JSON config file (request budget)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List chapter identifiers of a file
    Chapters {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Speak the built-in demo narrative
    Demo {
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = VoiceProfile::Default)]
        voice: VoiceProfile,

        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Convert an audio file to MP3 and embed ID3 tags
    Prep {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output MP3 (required unless --save)
        #[arg(value_name = "OUTPUT", required_unless_present = "save")]
        output: Option<PathBuf>,

        /// Tag the input MP3 in place
        #[arg(long, conflicts_with = "output")]
        save: bool,

        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        album: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        year: Option<String>,

        /// MP3 bitrate
        #[arg(long, default_value = "320k")]
        bitrate: String,

        /// Keep all channels instead of downmixing to mono
        #[arg(long)]
        stereo: bool,

        #[arg(long, default_value = "ffmpeg")]
        ffmpeg: PathBuf,

        #[arg(long, default_value = "ffprobe")]
        ffprobe: PathBuf,
    },

    /// Wrap a session transcript in a narrative template
    Weave {
        #[arg(long, default_value = narrative::DEFAULT_INPUT)]
        input: PathBuf,

        #[arg(long, default_value = narrative::DEFAULT_OUTPUT)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct ServiceArgs {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// API key (default: GOOGLE_API_KEY, then GOOGLE_ACCESS_TOKEN)
    #[arg(long)]
    api_key: Option<String>,

    /// Project billed for requests
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    project_id: Option<String>,
}

impl ServiceArgs {
    fn generator(&self) -> Result<StoryCodeAudioGenerator<TtsClient>> {
        let config = Config::load_or_default(self.config.as_deref())?;
        let credentials = match &self.api_key {
            Some(key) => Credentials::ApiKey(key.clone()),
            None => Credentials::from_env()?,
        };
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = TtsClient::new(&config.endpoint, credentials, timeout)
            .with_project_id(self.project_id.clone());
        Ok(StoryCodeAudioGenerator::new(client, config))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Generate { input, output_dir, voice, no_chapters, service } => {
            let generator = service.generator()?;
            let report = generator.process_file(&input, &output_dir, voice, !no_chapters)?;

            println!("Generated {} audio file(s):", report.generated().len());
            for path in report.generated() {
                println!("  {}", path.display());
            }
            let failures = report.failures();
            if !failures.is_empty() {
                bail!("{} of {} target(s) failed", failures.len(), report.outcomes.len());
            }
            Ok(())
        }

        Command::Ssml { input, chapter, config } => {
            let config = Config::load_or_default(config.as_deref())?;
            let markdown = read(&input)?;
            let markdown = match chapter {
                Some(id) => chapters::split(&markdown)
                    .into_iter()
                    .find(|c| c.id == id)
                    .map(|c| c.content)
                    .with_context(|| format!("No chapter '{}' in {}", id, input.display()))?,
                None => markdown,
            };
            let mut doc = SsmlDocument::from_text(&SpeechPreprocessor::new().process(&markdown));
            doc.fit_within(config.max_input_chars, &config.continuation_marker);
            println!("{}", doc.render());
            Ok(())
        }

        Command::Chapters { input } => {
            for chapter in chapters::split(&read(&input)?) {
                println!("{}", chapter.id);
            }
            Ok(())
        }

        Command::Demo { output_dir, voice, service } => {
            let path = service.generator()?.demo(&output_dir, voice)?;
            println!("{}", path.display());
            Ok(())
        }

        Command::Prep {
            input,
            output,
            save,
            title,
            artist,
            album,
            genre,
            year,
            bitrate,
            stereo,
            ffmpeg,
            ffprobe,
        } => {
            let config = EncoderConfig { ffmpeg, ffprobe, bitrate, mono: !stereo };
            let tags = Tags { title, artist, album, genre, date: year };
            let output = if save { None } else { output.as_deref() };
            let report = audio::prepare(&input, output, &tags, &config)?;

            println!("{} ({} bytes)", report.output.display(), report.size);
            for (key, value) in &report.tags {
                println!("  {}: {}", key, value);
            }
            Ok(())
        }

        Command::Weave { input, output } => narrative::weave_file(&input, &output),
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}
