//! [`AudioStitcher`] implementation: concatenates ordered segment files
//! into one episode file.
//!
//! The real audio-concatenation library is an external collaborator
//! (spec.md §1); this is a best-effort local implementation so the crate
//! runs end to end without extra glue. For containers that support naive
//! byte concatenation (raw PCM/WAV-without-header streams the TTS backend
//! is configured to emit, or formats players tolerate back-to-back such as
//! MP3), concatenating the byte streams of same-format segments in order
//! produces a playable file; anything fancier (re-encoding, crossfades)
//! belongs to that external library, not this crate.

use async_trait::async_trait;
use podcast_core::{AudioStitcher, Result};

use crate::error::TtsError;

pub struct ConcatenatingStitcher;

impl Default for ConcatenatingStitcher {
    fn default() -> Self {
        Self
    }
}

#[async_trait]
impl AudioStitcher for ConcatenatingStitcher {
    async fn stitch(&self, segment_paths: &[String], output_path: &str) -> Result<()> {
        if segment_paths.is_empty() {
            return Err(TtsError::NoSegments.into());
        }

        if let Some(parent) = std::path::Path::new(output_path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut combined = Vec::new();
        for path in segment_paths {
            let bytes = tokio::fs::read(path).await.map_err(|e| TtsError::Stitch {
                output_path: output_path.to_string(),
                reason: format!("could not read segment {path}: {e}"),
            })?;
            combined.extend_from_slice(&bytes);
        }

        tokio::fs::write(output_path, combined).await.map_err(|e| TtsError::Stitch {
            output_path: output_path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn concatenates_segments_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        tokio::fs::write(&a, b"AAA").await.unwrap();
        tokio::fs::write(&b, b"BBB").await.unwrap();
        let output = dir.path().join("final.wav");

        let stitcher = ConcatenatingStitcher::default();
        stitcher
            .stitch(
                &[a.to_string_lossy().to_string(), b.to_string_lossy().to_string()],
                &output.to_string_lossy(),
            )
            .await
            .unwrap();

        let contents = tokio::fs::read(&output).await.unwrap();
        assert_eq!(contents, b"AAABBB");
    }

    #[tokio::test]
    async fn empty_segment_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("final.wav");
        let stitcher = ConcatenatingStitcher::default();
        assert!(stitcher.stitch(&[], &output.to_string_lossy()).await.is_err());
    }
}
