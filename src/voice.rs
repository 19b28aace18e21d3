//! Voice profiles and audio encoding parameters.
//!
//! Field names serialise to the Cloud Text-to-Speech REST schema
//! (`languageCode`, `ssmlGender`, `audioEncoding`, …) so these structs are
//! embedded in requests as-is.

use serde::{Deserialize, Serialize};

/// Named voice selection for a narrative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum VoiceProfile {
    /// Warm narrator voice.
    #[default]
    Default,
    /// Crisper voice for dense technical content.
    Technical,
}

impl VoiceProfile {
    pub fn voice(self) -> VoiceSelection {
        match self {
            VoiceProfile::Default => VoiceSelection {
                language_code: "en-US".into(),
                name: "en-US-Journey-F".into(),
                ssml_gender: SsmlGender::Female,
            },
            VoiceProfile::Technical => VoiceSelection {
                language_code: "en-US".into(),
                name: "en-US-Neural2-A".into(),
                ssml_gender: SsmlGender::Male,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoiceProfile::Default => "default",
            VoiceProfile::Technical => "technical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SsmlGender {
    Female,
    Male,
    Neutral,
}

/// `voice` object of a synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelection {
    pub language_code: String,
    pub name: String,
    pub ssml_gender: SsmlGender,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoding {
    #[default]
    #[serde(rename = "MP3")]
    Mp3,
    #[serde(rename = "LINEAR16")]
    Linear16,
    #[serde(rename = "OGG_OPUS")]
    OggOpus,
}

impl AudioEncoding {
    /// File extension for audio in this encoding.
    pub fn extension(self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "mp3",
            AudioEncoding::Linear16 => "wav",
            AudioEncoding::OggOpus => "ogg",
        }
    }
}

/// `audioConfig` object of a synthesis request, shared by every profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioConfig {
    pub audio_encoding: AudioEncoding,
    /// Slightly slow by default; technical narration needs the room.
    pub speaking_rate: f32,
    pub pitch: f32,
    pub volume_gain_db: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            audio_encoding: AudioEncoding::Mp3,
            speaking_rate: 0.9,
            pitch: 0.0,
            volume_gain_db: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles() {
        let d = VoiceProfile::Default.voice();
        assert_eq!(d.name, "en-US-Journey-F");
        assert_eq!(d.ssml_gender, SsmlGender::Female);
        let t = VoiceProfile::Technical.voice();
        assert_eq!(t.name, "en-US-Neural2-A");
        assert_eq!(t.ssml_gender, SsmlGender::Male);
    }

    #[test]
    fn test_voice_json_shape() {
        let json = serde_json::to_value(VoiceProfile::Default.voice()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "languageCode": "en-US",
                "name": "en-US-Journey-F",
                "ssmlGender": "FEMALE"
            })
        );
    }

    #[test]
    fn test_audio_config_json_shape() {
        let json = serde_json::to_value(AudioConfig::default()).unwrap();
        assert_eq!(json["audioEncoding"], "MP3");
        assert_eq!(json["volumeGainDb"], 0.0);
        assert!((json["speakingRate"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_profile_names_round_trip() {
        let p: VoiceProfile = serde_json::from_str("\"technical\"").unwrap();
        assert_eq!(p, VoiceProfile::Technical);
        assert_eq!(p.as_str(), "technical");
    }
}
