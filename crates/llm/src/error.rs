use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("LLM returned HTTP {status}: {body}")]
    Api { status: reqwest::StatusCode, body: String },

    #[error("LLM response could not be parsed as the expected structure: {0}")]
    InvalidResponse(String),

    #[error("LLM call timed out after {0}s")]
    Timeout(u64),
}

impl From<LlmError> for podcast_core::Error {
    fn from(err: LlmError) -> Self {
        podcast_core::Error::Llm(err.to_string())
    }
}
