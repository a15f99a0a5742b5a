//! Content extraction: generic HTTP, YouTube transcript, and PDF sources.
//!
//! Everything in this crate implements [`podcast_core::ContentExtractor`];
//! the `Pipeline`'s ingestion phase depends only on that trait. [`classify`]
//! implements spec.md §4.3 phase 1's "classify as YouTube vs generic HTTP"
//! dispatch so the pipeline doesn't need to know about this crate's
//! concrete extractors at all.

use async_trait::async_trait;
use podcast_core::{ContentExtractor, ExtractedContent, Result};

pub mod error;
pub mod html;
pub mod pdf;
pub mod youtube;

pub use error::ExtractionError;
pub use html::GenericHttpExtractor;
pub use pdf::PdfExtractor;
pub use youtube::YoutubeExtractor;

/// A single extraction source, already classified, ready for the
/// `Pipeline` to dispatch to the matching extractor without its own
/// URL-sniffing logic.
#[derive(Debug, Clone)]
pub enum SourceKind {
    Youtube(String),
    Http(String),
}

/// Classifies a source URL as YouTube or generic HTTP, per spec.md §4.3
/// phase 1. Grounded on `original_source/app/content_extractor.py`'s
/// `YOUTUBE_VIDEO_ID_REGEX`.
pub fn classify(url: &str) -> SourceKind {
    if youtube::extract_video_id(url).is_some() {
        SourceKind::Youtube(url.to_string())
    } else {
        SourceKind::Http(url.to_string())
    }
}

/// A single [`ContentExtractor`] over URL sources that internally
/// [`classify`]s each URL and dispatches to the matching concrete
/// extractor, so the caller (the `Pipeline`'s ingestion phase) only ever
/// needs one injected extractor for all non-PDF sources.
pub struct CompositeUrlExtractor {
    pub youtube: YoutubeExtractor,
    pub http: GenericHttpExtractor,
}

impl CompositeUrlExtractor {
    pub fn new(youtube: YoutubeExtractor, http: GenericHttpExtractor) -> Self {
        Self { youtube, http }
    }
}

#[async_trait]
impl ContentExtractor for CompositeUrlExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedContent> {
        match classify(url) {
            SourceKind::Youtube(u) => self.youtube.extract(&u).await,
            SourceKind::Http(u) => self.http.extract(&u).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_youtube_urls() {
        assert!(matches!(classify("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), SourceKind::Youtube(_)));
        assert!(matches!(classify("https://youtu.be/dQw4w9WgXcQ"), SourceKind::Youtube(_)));
    }

    #[test]
    fn classifies_generic_urls_as_http() {
        assert!(matches!(classify("https://example.com/article"), SourceKind::Http(_)));
    }
}
