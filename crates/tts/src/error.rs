use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error("TTS configuration error: {0}")]
    Configuration(String),

    #[error("TTS request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("TTS backend returned HTTP {status}: {body}")]
    Api { status: reqwest::StatusCode, body: String },

    #[error("failed to write synthesized audio to {path}: {source}")]
    Write { path: String, source: std::io::Error },

    #[error("TTS backend returned no audio data for voice {voice_id}")]
    EmptyAudio { voice_id: String },

    #[error("no audio segments succeeded; cannot stitch an episode")]
    NoSegments,

    #[error("failed to stitch audio segments into {output_path}: {reason}")]
    Stitch { output_path: String, reason: String },
}

impl From<TtsError> for podcast_core::Error {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::NoSegments => podcast_core::Error::Audio(err.to_string()),
            TtsError::Stitch { .. } => podcast_core::Error::Audio(err.to_string()),
            other => podcast_core::Error::Tts(other.to_string()),
        }
    }
}
