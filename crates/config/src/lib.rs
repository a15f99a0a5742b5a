//! Layered configuration: `config/default.toml`, an optional
//! `config/{env}.toml`, then `PODCAST__`-prefixed environment variables,
//! in increasing priority.

pub mod settings;

pub use settings::{
    CleanupPolicy, LlmConfig, ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings,
    TtsConfig, WebhookConfig, WorkerConfig, load_settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("config source error: {0}")]
    Source(#[from] config::ConfigError),
}

impl From<ConfigError> for podcast_core::Error {
    fn from(err: ConfigError) -> Self {
        podcast_core::Error::Configuration(err.to_string())
    }
}
