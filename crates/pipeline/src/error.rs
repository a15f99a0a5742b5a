//! Pipeline-local error type. Most phase failures are recovered as
//! warnings on the running `Task` rather than returned here; this enum
//! only covers the fatal cases spec.md §4.3/§7 call out explicitly.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no content could be extracted from any source")]
    NoContentExtracted,

    #[error("outline generation produced no usable structure: {0}")]
    OutlineUnusable(String),

    #[error("dialogue generation produced no usable turns")]
    DialogueUnusable,

    #[error("audio synthesis failed for every turn")]
    AllAudioFailed,

    #[error("task was cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] podcast_core::Error),
}

impl From<PipelineError> for podcast_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NoContentExtracted => {
                podcast_core::Error::Extraction("No Content Extracted".to_string())
            }
            PipelineError::OutlineUnusable(detail) => podcast_core::Error::Llm(detail),
            PipelineError::DialogueUnusable => {
                podcast_core::Error::Llm("dialogue generation produced no usable turns".to_string())
            }
            PipelineError::AllAudioFailed => {
                podcast_core::Error::Tts("audio synthesis failed for every turn".to_string())
            }
            PipelineError::Cancelled => podcast_core::Error::Cancelled(uuid::Uuid::nil()),
            PipelineError::Core(e) => e,
        }
    }
}

impl From<podcast_status::StatusError> for PipelineError {
    fn from(err: podcast_status::StatusError) -> Self {
        PipelineError::Core(err.into())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
