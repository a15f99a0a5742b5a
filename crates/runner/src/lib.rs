//! `podcast-runner`: wires the bounded `TaskRunner`, the `Pipeline`'s
//! collaborators, `WebhookNotifier`, and `CleanupManager` into a single
//! facade the HTTP surface (`podcast-server`) submits work through.

pub mod cleanup;
pub mod error;
pub mod task_runner;
pub mod webhook;

pub use cleanup::{CleanupManager, CleanupReport, RetentionFlags};
pub use error::{Result, RunnerError};
pub use task_runner::{ActiveJob, QueueStatus, TaskRunner};
pub use webhook::WebhookNotifier;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use podcast_config::{CleanupPolicy, Settings};
use podcast_core::{ContentExtractor, LanguageModel, PodcastRequest, Task, TtsBackend};
use podcast_extract::{CompositeUrlExtractor, GenericHttpExtractor, PdfExtractor, YoutubeExtractor};
use podcast_llm::{HttpLanguageModel, HttpLlmConfig};
use podcast_pipeline::{Pipeline, PipelineDeps};
use podcast_status::StatusStore;
use podcast_tts::{ConcatenatingStitcher, HttpTtsBackend, HttpTtsConfig};
use podcast_voice::VoiceCatalog;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Collaborators shared by every submitted task; built once at startup
/// from `Settings` and cheap to clone (everything is an `Arc`).
struct SharedDeps {
    url_extractor: Arc<dyn ContentExtractor>,
    pdf_extractor: Arc<dyn ContentExtractor>,
    llm: Arc<dyn LanguageModel>,
    llm_semaphore: Arc<Semaphore>,
    tts_backend: Arc<dyn TtsBackend>,
    tts_semaphore: Arc<Semaphore>,
    audio_stitcher: Arc<dyn podcast_core::AudioStitcher>,
    voice_catalog: Arc<VoiceCatalog>,
    output_root: PathBuf,
}

impl SharedDeps {
    fn pipeline_deps(&self, status: Arc<StatusStore>) -> PipelineDeps {
        PipelineDeps {
            url_extractor: self.url_extractor.clone(),
            pdf_extractor: self.pdf_extractor.clone(),
            llm: self.llm.clone(),
            llm_semaphore: self.llm_semaphore.clone(),
            tts_backend: self.tts_backend.clone(),
            tts_semaphore: self.tts_semaphore.clone(),
            audio_stitcher: self.audio_stitcher.clone(),
            voice_catalog: self.voice_catalog.clone(),
            status,
            output_root: self.output_root.clone(),
        }
    }
}

/// Top-level facade: submit, inspect, cancel, and clean up generation
/// tasks. Owns every long-lived collaborator the `Pipeline` needs.
pub struct Runner {
    deps: SharedDeps,
    status: Arc<StatusStore>,
    task_runner: Arc<TaskRunner>,
    webhook: Arc<WebhookNotifier>,
    cleanup: Arc<CleanupManager>,
    default_cleanup_policy: CleanupPolicy,
}

impl Runner {
    /// Builds every collaborator from `settings`. Fails only if the LLM
    /// or TTS HTTP clients can't be constructed (e.g. a missing API key),
    /// matching spec.md §9's call to surface configuration errors at
    /// startup rather than on first use.
    pub fn new(settings: &Settings) -> Result<Self> {
        let llm = HttpLanguageModel::new(HttpLlmConfig {
            endpoint: settings.llm.endpoint.clone(),
            api_key: settings.llm.api_key.clone().unwrap_or_default(),
            model: settings.llm.model.clone(),
            max_tokens: 4096,
            timeout: Duration::from_secs(settings.llm.short_timeout_secs),
        })
        .map_err(|e| RunnerError::Core(e.into()))?;

        let tts_backend = HttpTtsBackend::new(HttpTtsConfig {
            endpoint: settings.tts.endpoint.clone(),
            api_key: settings.tts.api_key.clone().unwrap_or_default(),
            timeout: Duration::from_secs(60),
        })
        .map_err(|e| RunnerError::Core(e.into()))?;

        let url_extractor = CompositeUrlExtractor::new(
            YoutubeExtractor::new(reqwest::Client::new(), Default::default()),
            GenericHttpExtractor::default(),
        );

        let deps = SharedDeps {
            url_extractor: Arc::new(url_extractor),
            pdf_extractor: Arc::new(PdfExtractor::default()),
            llm: Arc::new(llm),
            llm_semaphore: Arc::new(Semaphore::new(settings.workers.llm_workers)),
            tts_backend: Arc::new(tts_backend),
            tts_semaphore: Arc::new(Semaphore::new(settings.workers.tts_workers)),
            audio_stitcher: Arc::new(ConcatenatingStitcher::default()),
            voice_catalog: Arc::new(VoiceCatalog::new(
                PathBuf::from(&settings.tts.voice_cache_path),
                Duration::from_secs(settings.tts.voice_cache_ttl_seconds),
            )),
            output_root: PathBuf::from(&settings.server.output_root),
        };

        Ok(Self {
            deps,
            status: Arc::new(StatusStore::new()),
            task_runner: Arc::new(TaskRunner::new(settings.workers.task_workers)),
            webhook: Arc::new(WebhookNotifier::new(settings.webhook.clone())),
            cleanup: Arc::new(CleanupManager::new()),
            default_cleanup_policy: settings.cleanup_default_policy,
        })
    }

    pub fn status_store(&self) -> Arc<StatusStore> {
        self.status.clone()
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.task_runner.queue_status()
    }

    pub fn active_jobs(&self) -> Vec<ActiveJob> {
        self.task_runner.active()
    }

    /// Validates and submits a new generation request. The task record
    /// is written at `queued` before the `TaskRunner` is asked to run it,
    /// so a capacity rejection still leaves a `failed` record a caller
    /// can poll, per spec.md §4.2.
    pub fn submit(&self, request: PodcastRequest) -> Result<Uuid> {
        request.validate().map_err(|msg| RunnerError::Core(podcast_core::Error::Configuration(msg)))?;

        let task_id = Uuid::new_v4();
        self.status.create(task_id, request.clone());

        if !self.task_runner.can_accept() {
            let _ = self.status.set_error(task_id, "System at capacity", "no worker slots available");
            return Err(RunnerError::AtCapacity);
        }

        let pipeline = Arc::new(Pipeline::new(self.deps.pipeline_deps(self.status.clone())));
        let status = self.status.clone();
        let webhook = self.webhook.clone();
        let cleanup = self.cleanup.clone();
        let output_root = self.deps.output_root.clone();
        let default_policy = self.default_cleanup_policy;
        let webhook_url = request.webhook_url.clone();

        self.task_runner.submit(task_id, pipeline, request, move || async move {
            let Some(task) = status.get(task_id) else { return };
            if let Some(url) = webhook_url {
                webhook.notify(&url, &task).await;
            }
            if default_policy != CleanupPolicy::Manual {
                let task_dir = output_root.join(task_id.to_string());
                let _ = cleanup
                    .apply(&task, &task_dir, default_policy, RetentionFlags::default(), chrono::Utc::now())
                    .await;
            }
        })?;

        Ok(task_id)
    }

    pub fn get(&self, task_id: Uuid) -> Option<Task> {
        self.status.get(task_id)
    }

    pub fn list(&self, limit: usize, offset: usize) -> Vec<Task> {
        self.status.list(limit, offset)
    }

    /// Requests cancellation. Returns `true` if the task was actively
    /// running and the cancellation flag was set; a task that already
    /// finished (or was never submitted) returns `false`.
    pub fn cancel(&self, task_id: Uuid) -> bool {
        self.task_runner.cancel(task_id)
    }

    /// Removes the task's status record and output directory
    /// unconditionally, regardless of cleanup policy — spec.md §4.10
    /// allows `delete` even on terminal tasks.
    pub async fn delete(&self, task_id: Uuid) -> Result<CleanupReport> {
        if !self.status.exists(task_id) {
            return Err(RunnerError::NotTracked(task_id));
        }
        let task_dir = self.deps.output_root.join(task_id.to_string());
        let report = self.cleanup.force_delete(&task_dir).await;
        self.status.delete(task_id);
        Ok(report)
    }

    /// Applies a one-off cleanup pass with an explicit policy/retention
    /// override, without touching the status record.
    pub async fn cleanup_task(
        &self,
        task_id: Uuid,
        policy: CleanupPolicy,
        retention: RetentionFlags,
    ) -> Result<CleanupReport> {
        let task = self.status.get(task_id).ok_or(RunnerError::NotTracked(task_id))?;
        let task_dir = self.deps.output_root.join(task_id.to_string());
        Ok(self.cleanup.apply(&task, &task_dir, policy, retention, chrono::Utc::now()).await)
    }
}
