//! Trait seams for the external collaborators the orchestrator consumes but
//! does not itself implement in full: content extraction, the LLM, the TTS
//! backend, and audio stitching. Each has a thin HTTP-backed implementation
//! elsewhere in the workspace, but pipeline code only ever depends on these
//! traits so a caller can substitute a mock or a different provider.

use crate::error::Result;
use async_trait::async_trait;

/// Fetches and normalizes source material from a URL (article, transcript
/// page, PDF, ...) into plain text suitable for LLM consumption.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedContent>;
}

#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub text: String,
    pub attribution: String,
}

/// A text-generation backend. Implementations are expected to be cheap to
/// clone (wrap an `Arc`-shared HTTP client) since the pipeline holds one
/// instance per task rather than per call.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Synthesizes a single line of dialogue into an audio file on disk and
/// returns the path written.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    async fn synthesize(&self, request: &TtsRequest) -> Result<String>;

    /// Lists the backend's available English-family voices, for the
    /// `VoiceCatalog` refresh described in spec.md §4.5.
    async fn list_voices(&self) -> Result<Vec<RawVoice>>;
}

#[derive(Debug, Clone)]
pub struct TtsRequest {
    pub text: String,
    pub voice_id: String,
    pub speaking_rate: f32,
    pub pitch: f32,
    pub output_path: String,
}

/// One voice as reported by the TTS backend's inventory endpoint, before
/// `VoiceCatalog` selects and distributes `(rate, pitch)` combinations.
#[derive(Debug, Clone)]
pub struct RawVoice {
    pub voice_id: String,
    pub language_codes: Vec<String>,
    pub ssml_gender: String,
}

/// Concatenates an ordered list of audio segment files into one episode
/// file.
#[async_trait]
pub trait AudioStitcher: Send + Sync {
    async fn stitch(&self, segment_paths: &[String], output_path: &str) -> Result<()>;
}
