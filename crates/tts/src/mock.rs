//! In-memory [`TtsBackend`] test double: writes a tiny placeholder file
//! instead of calling a real synthesis backend, so pipeline/runner tests
//! can run the full per-turn synthesis path without network access.

use async_trait::async_trait;
use parking_lot::Mutex;
use podcast_core::{RawVoice, Result, TtsBackend, TtsRequest};

pub struct MockTtsBackend {
    pub voices: Vec<RawVoice>,
    /// Voice ids in this set fail synthesis, to exercise per-turn failure
    /// isolation (spec.md §4.7 step 4).
    pub failing_voice_ids: Vec<String>,
    calls: Mutex<Vec<TtsRequest>>,
}

impl MockTtsBackend {
    pub fn new(voices: Vec<RawVoice>) -> Self {
        Self { voices, failing_voice_ids: Vec::new(), calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<TtsRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TtsBackend for MockTtsBackend {
    async fn synthesize(&self, request: &TtsRequest) -> Result<String> {
        self.calls.lock().push(request.clone());
        if self.failing_voice_ids.contains(&request.voice_id) {
            return Err(podcast_core::Error::Tts(format!("synthesis failed for voice {}", request.voice_id)));
        }
        if let Some(parent) = std::path::Path::new(&request.output_path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&request.output_path, b"MOCK-AUDIO").await?;
        Ok(request.output_path.clone())
    }

    async fn list_voices(&self) -> Result<Vec<RawVoice>> {
        Ok(self.voices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_placeholder_file_and_records_call() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockTtsBackend::new(vec![]);
        let path = dir.path().join("turn_001.wav");
        let request = TtsRequest {
            text: "hello".to_string(),
            voice_id: "v1".to_string(),
            speaking_rate: 1.0,
            pitch: 0.0,
            output_path: path.to_string_lossy().to_string(),
        };
        let written = backend.synthesize(&request).await.unwrap();
        assert_eq!(written, request.output_path);
        assert!(path.exists());
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn configured_failing_voice_errors() {
        let mut backend = MockTtsBackend::new(vec![]);
        backend.failing_voice_ids.push("bad".to_string());
        let request = TtsRequest {
            text: "hi".to_string(),
            voice_id: "bad".to_string(),
            speaking_rate: 1.0,
            pitch: 0.0,
            output_path: "/tmp/unused.wav".to_string(),
        };
        assert!(backend.synthesize(&request).await.is_err());
    }
}
