//! Crate-wide error type.
//!
//! Every crate-local error enum (`LlmError`, `TtsError`, `ExtractionError`, ...)
//! bridges into this one via `From` so callers at the pipeline boundary can
//! propagate with a single `?`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("content extraction failed: {0}")]
    Extraction(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("audio assembly failed: {0}")]
    Audio(String),

    #[error("status store error: {0}")]
    Status(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("task not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("task runner at capacity")]
    AtCapacity,

    #[error("invalid task state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("task {0} was cancelled")]
    Cancelled(uuid::Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
