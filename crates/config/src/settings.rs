//! Layered settings for the podcast orchestrator.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment, used to decide how strictly settings are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Retention policy applied by the `CleanupManager` once a task terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Never delete anything unless explicitly asked to.
    #[default]
    Manual,
    /// Eligible for deletion once the task has been terminal for N hours.
    AutoAfterHours,
    /// Eligible for deletion once the task has been terminal for N days.
    AutoAfterDays,
    /// Delete every artifact except the final audio file.
    RetainAudioOnly,
    /// Apply immediately when the task reaches a terminal state.
    OnCompletion,
}

/// Concurrency limits for the three shared worker pools described in
/// spec.md §5 (task pool, TTS pool, LLM pool).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// `TASK_WORKERS` — bounded pool size for concurrent pipeline jobs.
    #[serde(default = "default_task_workers")]
    pub task_workers: usize,

    /// `TTS_WORKERS` — shared semaphore size for concurrent TTS calls.
    #[serde(default = "default_tts_workers")]
    pub tts_workers: usize,

    /// `LLM_WORKERS` — shared semaphore size for concurrent LLM calls.
    #[serde(default = "default_llm_workers")]
    pub llm_workers: usize,
}

fn default_task_workers() -> usize {
    4
}
fn default_tts_workers() -> usize {
    16
}
fn default_llm_workers() -> usize {
    18
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            task_workers: default_task_workers(),
            tts_workers: default_tts_workers(),
            llm_workers: default_llm_workers(),
        }
    }
}

/// HTTP server configuration for `podcast-server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Filesystem or object-storage base URI each task's artifacts are
    /// written under (`OUTPUT_ROOT`).
    #[serde(default = "default_output_root")]
    pub output_root: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_output_root() -> String {
    "./output".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
            output_root: default_output_root(),
        }
    }
}

/// LLM backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Timeout for short calls (source analysis): spec.md §5, 180s.
    #[serde(default = "default_short_timeout_secs")]
    pub short_timeout_secs: u64,

    /// Timeout for long calls (persona research, outline): spec.md §5, 420s.
    #[serde(default = "default_long_timeout_secs")]
    pub long_timeout_secs: u64,
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434/api/generate".to_string()
}
fn default_llm_model() -> String {
    "llama3.1:8b-instruct".to_string()
}
fn default_short_timeout_secs() -> u64 {
    180
}
fn default_long_timeout_secs() -> u64 {
    420
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_llm_model(),
            short_timeout_secs: default_short_timeout_secs(),
            long_timeout_secs: default_long_timeout_secs(),
        }
    }
}

/// TTS backend connection settings and voice-catalog cache policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// `VOICE_CACHE_TTL_SECONDS`, default 86_400 (24h).
    #[serde(default = "default_voice_cache_ttl")]
    pub voice_cache_ttl_seconds: u64,

    /// Path to the on-disk voice catalog cache file.
    #[serde(default = "default_voice_cache_path")]
    pub voice_cache_path: String,
}

fn default_tts_endpoint() -> String {
    "http://localhost:5002/v1/audio/speech".to_string()
}
fn default_voice_cache_ttl() -> u64 {
    86_400
}
fn default_voice_cache_path() -> String {
    "tts_voices_cache.json".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tts_endpoint(),
            api_key: None,
            voice_cache_ttl_seconds: default_voice_cache_ttl(),
            voice_cache_path: default_voice_cache_path(),
        }
    }
}

/// Webhook delivery retry policy: spec.md §4.8.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_webhook_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_webhook_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_webhook_timeout_secs")]
    pub per_attempt_timeout_secs: u64,
}

fn default_webhook_max_retries() -> u32 {
    3
}
fn default_webhook_base_delay_ms() -> u64 {
    1_000
}
fn default_webhook_timeout_secs() -> u64 {
    10
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            max_retries: default_webhook_max_retries(),
            base_delay_ms: default_webhook_base_delay_ms(),
            per_attempt_timeout_secs: default_webhook_timeout_secs(),
        }
    }
}

/// Logging/tracing/metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_metrics_port() -> u16 {
    9090
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
            metrics_port: default_metrics_port(),
        }
    }
}

/// Top-level settings loaded by `load_settings`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub workers: WorkerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub tts: TtsConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub cleanup_default_policy: CleanupPolicy,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers.task_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers.task_workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.workers.tts_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers.tts_workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.workers.llm_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers.llm_workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "port cannot be 0".to_string(),
            });
        }
        if self.environment.is_production() && self.server.cors_enabled && self.server.cors_origins.is_empty() {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured; all cross-origin requests will be rejected"
            );
        }
        Ok(())
    }
}

/// Load settings from `config/default.toml`, an optional
/// `config/{env}.toml`, then `PODCAST_`-prefixed environment variables, in
/// increasing priority.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();
    builder = builder.add_source(File::with_name("config/default").required(false));
    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }
    builder = builder.add_source(
        Environment::with_prefix("PODCAST")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let settings = Settings::default();
        assert_eq!(settings.workers.task_workers, 4);
        assert_eq!(settings.workers.tts_workers, 16);
        assert_eq!(settings.workers.llm_workers, 18);
        assert_eq!(settings.tts.voice_cache_ttl_seconds, 86_400);
        assert_eq!(settings.webhook.max_retries, 3);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let mut settings = Settings::default();
        settings.workers.task_workers = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn production_without_cors_origins_warns_not_errors() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.server.cors_enabled = true;
        assert!(settings.validate().is_ok());
    }
}
