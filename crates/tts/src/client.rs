//! HTTP-backed [`TtsBackend`], grounded on
//! `original_source/app/tts_service.py::GoogleCloudTtsService`: a
//! `synthesize_speech` call taking `(text, voice_id, speaking_rate, pitch)`
//! and a `list_voices` inventory call, generalized to a plain JSON/base64
//! HTTP contract so this crate doesn't depend on a specific cloud SDK.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use podcast_core::{RawVoice, Result, TtsBackend, TtsRequest};
use serde::{Deserialize, Serialize};

use crate::error::TtsError;

#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for HttpTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5002".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct HttpTtsBackend {
    client: reqwest::Client,
    config: HttpTtsConfig,
}

impl HttpTtsBackend {
    pub fn new(config: HttpTtsConfig) -> std::result::Result<Self, TtsError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build().map_err(TtsError::Network)?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    speaking_rate: f32,
    pitch: f32,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    /// Base64-encoded audio content, mirroring Google Cloud TTS's
    /// `audio_content` field.
    audio_content: String,
    #[serde(default = "default_ext")]
    format: String,
}

fn default_ext() -> String {
    "mp3".to_string()
}

#[derive(Debug, Deserialize)]
struct VoiceListResponse {
    voices: Vec<RawVoiceDto>,
}

#[derive(Debug, Deserialize)]
struct RawVoiceDto {
    name: String,
    language_codes: Vec<String>,
    ssml_gender: String,
}

#[async_trait]
impl TtsBackend for HttpTtsBackend {
    async fn synthesize(&self, request: &TtsRequest) -> Result<String> {
        let body = SynthesizeRequest {
            text: &request.text,
            voice_id: &request.voice_id,
            speaking_rate: request.speaking_rate,
            pitch: request.pitch,
        };

        let response = self
            .client
            .post(format!("{}/v1/text:synthesize", self.config.endpoint))
            .header("authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(TtsError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Api { status, body }.into());
        }

        let parsed: SynthesizeResponse = response.json().await.map_err(TtsError::Network)?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| TtsError::Configuration(format!("invalid base64 audio payload: {e}")))?;
        if audio.is_empty() {
            return Err(TtsError::EmptyAudio { voice_id: request.voice_id.clone() }.into());
        }

        let output_path = if Path::new(&request.output_path).extension().is_none() {
            format!("{}.{}", request.output_path, parsed.format)
        } else {
            request.output_path.clone()
        };

        if let Some(parent) = Path::new(&output_path).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| TtsError::Write { path: output_path.clone(), source })?;
        }
        tokio::fs::write(&output_path, &audio)
            .await
            .map_err(|source| TtsError::Write { path: output_path.clone(), source })?;

        Ok(output_path)
    }

    async fn list_voices(&self) -> Result<Vec<RawVoice>> {
        let response = self
            .client
            .get(format!("{}/v1/voices", self.config.endpoint))
            .header("authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await
            .map_err(TtsError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Api { status, body }.into());
        }

        let parsed: VoiceListResponse = response.json().await.map_err(TtsError::Network)?;
        Ok(parsed
            .voices
            .into_iter()
            .filter(|v| v.language_codes.iter().any(|c| c.starts_with("en")))
            .map(|v| RawVoice { voice_id: v.name, language_codes: v.language_codes, ssml_gender: v.ssml_gender })
            .collect())
    }
}
