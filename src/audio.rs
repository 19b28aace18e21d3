//! Audio conversion and ID3 tagging for the StoryCode → MP3 pipeline.
//!
//! Encoding is delegated to an external `ffmpeg`; the binaries and encoding
//! parameters come from an [`EncoderConfig`] passed to every call, so nothing
//! here touches process-wide state. WAV durations are read in-process with
//! `hound`; other formats are probed with `ffprobe`.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

/// Anything smaller is treated as empty or corrupt, on input and output.
pub const MIN_FILE_BYTES: u64 = 1_000;

/// Shortest input worth converting.
pub const MIN_DURATION_MS: u64 = 100;

/// Tag values longer than this are cut and suffixed with `...`.
pub const MAX_TAG_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("input file too small ({0} bytes), likely corrupted or empty")]
    TooSmall(u64),

    #[error("audio content too short ({0} ms), check the input file")]
    TooShort(u64),

    #[error("output file must have a .mp3 extension: {}", .0.display())]
    NotMp3(PathBuf),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Process {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("cannot determine duration of {}: {reason}", .path.display())]
    Probe { path: PathBuf, reason: String },

    #[error("MP3 output missing or too small: {}", .0.display())]
    OutputInvalid(PathBuf),

    #[error("WAV read error: {0}")]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Encoder binaries and MP3 parameters, scoped to a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// ffmpeg bitrate string, e.g. `"320k"`.
    pub bitrate: String,
    /// Downmix to one channel (voice content).
    pub mono: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            bitrate: "320k".to_string(),
            mono: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tags
// ─────────────────────────────────────────────────────────────────────────────

/// ID3 text tags. Empty or whitespace-only values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    /// Year.
    pub date: Option<String>,
}

impl Tags {
    /// `(key, value)` pairs actually written: trimmed, non-empty, length-capped.
    pub fn normalized(&self) -> Vec<(&'static str, String)> {
        let fields = [
            ("title", &self.title),
            ("artist", &self.artist),
            ("album", &self.album),
            ("genre", &self.genre),
            ("date", &self.date),
        ];
        fields
            .into_iter()
            .filter_map(|(key, value)| {
                let value = value.as_deref()?.trim();
                if value.is_empty() {
                    return None;
                }
                let value = if value.chars().count() > MAX_TAG_CHARS {
                    let cut: String = value.chars().take(MAX_TAG_CHARS).collect();
                    format!("{}...", cut)
                } else {
                    value.to_string()
                };
                Some((key, value))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn run(mut command: Command) -> Result<String, AudioError> {
    let program = command.get_program().to_string_lossy().into_owned();
    log::debug!("{:?}", command);
    let output = command
        .output()
        .map_err(|source| AudioError::Spawn { program: program.clone(), source })?;
    if !output.status.success() {
        return Err(AudioError::Process {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn file_size(path: &Path) -> Result<u64, AudioError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(AudioError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Duration of an audio file in milliseconds.
pub fn duration_ms(path: &Path, config: &EncoderConfig) -> Result<u64, AudioError> {
    if has_extension(path, "wav") {
        let reader = hound::WavReader::open(path)?;
        let rate = u64::from(reader.spec().sample_rate.max(1));
        return Ok(u64::from(reader.duration()) * 1000 / rate);
    }

    let mut probe = Command::new(&config.ffprobe);
    probe
        .args(["-v", "error", "-show_entries", "format=duration"])
        .args(["-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path);
    let stdout = run(probe)?;
    let seconds: f64 = stdout.trim().parse().map_err(|_| AudioError::Probe {
        path: path.to_path_buf(),
        reason: format!("unexpected ffprobe output {:?}", stdout.trim()),
    })?;
    Ok((seconds * 1000.0).round() as u64)
}

fn check_output(path: &Path) -> Result<(), AudioError> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() >= MIN_FILE_BYTES => Ok(()),
        _ => Err(AudioError::OutputInvalid(path.to_path_buf())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Convert any ffmpeg-readable audio file to MP3.
pub fn convert_to_mp3(
    input: &Path,
    output: &Path,
    config: &EncoderConfig,
) -> Result<(), AudioError> {
    let size = file_size(input)?;
    if size < MIN_FILE_BYTES {
        return Err(AudioError::TooSmall(size));
    }
    let ms = duration_ms(input, config)?;
    if ms < MIN_DURATION_MS {
        return Err(AudioError::TooShort(ms));
    }

    let mut ffmpeg = Command::new(&config.ffmpeg);
    ffmpeg
        .args(["-y", "-i"])
        .arg(input)
        .args(["-vn", "-codec:a", "libmp3lame", "-b:a"])
        .arg(&config.bitrate);
    if config.mono {
        ffmpeg.args(["-ac", "1"]);
    }
    ffmpeg.arg(output);

    run(ffmpeg)?;
    check_output(output)?;
    log::info!("Converted {} → {} ({} ms)", input.display(), output.display(), ms);
    Ok(())
}

/// Write `tags` into an MP3 file as ID3v2.3 and return what was written.
///
/// The audio stream is copied, not re-encoded.
pub fn embed_tags(
    mp3: &Path,
    tags: &Tags,
    config: &EncoderConfig,
) -> Result<Vec<(&'static str, String)>, AudioError> {
    file_size(mp3)?;
    let pairs = tags.normalized();
    if pairs.is_empty() {
        return Ok(pairs);
    }

    let tmp = mp3.with_extension("tagging.mp3");

    let mut ffmpeg = Command::new(&config.ffmpeg);
    ffmpeg
        .args(["-y", "-i"])
        .arg(mp3)
        .args(["-map", "0", "-c", "copy", "-id3v2_version", "3"]);
    for (key, value) in &pairs {
        ffmpeg.arg("-metadata").arg(format!("{}={}", key, value));
    }
    ffmpeg.arg(&tmp);

    let result = run(ffmpeg).and_then(|_| fs::rename(&tmp, mp3).map_err(AudioError::from));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(pairs)
}

/// Summary of a [`prepare`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepReport {
    pub output: PathBuf,
    pub converted: bool,
    pub tags: Vec<(&'static str, String)>,
    pub size: u64,
}

/// Produce a tagged MP3 from `input`.
///
/// With `output = None` the input is edited in place (it must already be an
/// MP3). Non-MP3 inputs are converted, MP3 inputs are copied.
pub fn prepare(
    input: &Path,
    output: Option<&Path>,
    tags: &Tags,
    config: &EncoderConfig,
) -> Result<PrepReport, AudioError> {
    file_size(input)?;
    let output = output.unwrap_or(input);
    if !has_extension(output, "mp3") {
        return Err(AudioError::NotMp3(output.to_path_buf()));
    }
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let converted = !has_extension(input, "mp3");
    if converted {
        log::debug!("Converting {} to MP3…", input.display());
        convert_to_mp3(input, output, config)?;
    } else if output != input {
        log::debug!("Copying MP3 file…");
        fs::copy(input, output)?;
    }

    let written = embed_tags(output, tags, config)?;
    if written.is_empty() {
        log::info!("No tags provided to embed.");
    } else {
        log::info!("Tags have been embedded into '{}'.", output.display());
    }

    let size = file_size(output)?;
    if size < MIN_FILE_BYTES {
        return Err(AudioError::OutputInvalid(output.to_path_buf()));
    }
    Ok(PrepReport { output: output.to_path_buf(), converted, tags: written, size })
}
