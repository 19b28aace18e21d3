//! Cloud Text-to-Speech REST client.
//!
//! Sends `POST {endpoint}/text:synthesize` with a JSON body of the form
//!
//! ```json
//! { "input": { "ssml": "<speak>…</speak>" },
//!   "voice": { "languageCode": "en-US", "name": "en-US-Journey-F", "ssmlGender": "FEMALE" },
//!   "audioConfig": { "audioEncoding": "MP3", "speakingRate": 0.9,
//!                    "pitch": 0.0, "volumeGainDb": 0.0 } }
//! ```
//!
//! and decodes the base64 `audioContent` of the reply. Retries and backoff are
//! left to the caller.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::voice::{AudioConfig, VoiceSelection};

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("no credentials: set GOOGLE_API_KEY or GOOGLE_ACCESS_TOKEN")]
    MissingCredentials,

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("audio content is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// How requests are authorised.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Sent as the `key` query parameter.
    ApiKey(String),
    /// OAuth access token, sent as `Authorization: Bearer …`.
    Bearer(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(***)"),
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

impl Credentials {
    /// `GOOGLE_API_KEY`, then `GOOGLE_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self, TtsError> {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty("GOOGLE_API_KEY") {
            return Ok(Credentials::ApiKey(key));
        }
        if let Some(token) = non_empty("GOOGLE_ACCESS_TOKEN") {
            return Ok(Credentials::Bearer(token));
        }
        Err(TtsError::MissingCredentials)
    }
}

/// `input` object: exactly one of `text` or `ssml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisInput {
    Text(String),
    Ssml(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub input: SynthesisInput,
    pub voice: VoiceSelection,
    pub audio_config: AudioConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    audio_content: String,
}

/// Anything that turns a synthesis request into encoded audio bytes.
pub trait Synthesizer {
    fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError>;
}

/// Decode the base64 `audioContent` field.
pub fn decode_audio(audio_content: &str) -> Result<Vec<u8>, TtsError> {
    Ok(STANDARD.decode(audio_content.trim())?)
}

/// Blocking HTTP client for the `text:synthesize` method.
pub struct TtsClient {
    agent: ureq::Agent,
    endpoint: String,
    credentials: Credentials,
    project_id: Option<String>,
}

impl TtsClient {
    pub fn new(endpoint: &str, credentials: Credentials, timeout: Duration) -> Self {
        // Error statuses are read as responses so their bodies reach the caller.
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credentials,
            project_id: None,
        }
    }

    /// Bill requests to `project_id` (`x-goog-user-project`).
    pub fn with_project_id(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id.filter(|p| !p.is_empty());
        self
    }

    pub fn url(&self) -> String {
        format!("{}/text:synthesize", self.endpoint)
    }
}

impl Synthesizer for TtsClient {
    fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        let url = self.url();
        let mut builder = self.agent.post(url.as_str());
        builder = match &self.credentials {
            Credentials::ApiKey(key) => builder.query("key", key),
            Credentials::Bearer(token) => {
                builder.header("Authorization", format!("Bearer {}", token))
            }
        };
        if let Some(project) = &self.project_id {
            builder = builder.header("x-goog-user-project", project.as_str());
        }

        log::debug!("POST {} ({:?})", url, request.voice.name);
        let mut response = builder
            .send_json(request)
            .map_err(|source| TtsError::Transport { url: url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.body_mut().read_to_string().unwrap_or_default();
            return Err(TtsError::Status { status: status.as_u16(), message });
        }

        let body: SynthesisResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| TtsError::Malformed(e.to_string()))?;
        decode_audio(&body.audio_content)
    }
}
