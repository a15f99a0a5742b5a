use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("HTTP request for {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: reqwest::StatusCode },

    #[error("{url} did not return HTML or a recognized text content-type ({content_type})")]
    UnsupportedContentType { url: String, content_type: String },

    #[error("no text content found in {url}")]
    EmptyContent { url: String },

    #[error("could not resolve a YouTube video id from {0}")]
    InvalidYoutubeUrl(String),

    #[error("transcript unavailable for YouTube video {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("PDF file not found at {0}")]
    PdfNotFound(String),

    #[error("failed to extract text from PDF {path}: {reason}")]
    PdfExtraction { path: String, reason: String },
}

impl From<ExtractionError> for podcast_core::Error {
    fn from(err: ExtractionError) -> Self {
        podcast_core::Error::Extraction(err.to_string())
    }
}
