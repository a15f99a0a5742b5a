//! `TaskRunner`: the bounded worker pool described in spec.md §4.2/§5.
//! Capacity is a semaphore of fixed size N; `submit` never blocks — a
//! `try_acquire` that fails is surfaced immediately as a capacity error
//! rather than queueing the caller indefinitely.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use podcast_core::PodcastRequest;
use podcast_pipeline::Pipeline;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{Result, RunnerError};

struct JobEntry {
    cancellation: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ActiveJob {
    pub task_id: Uuid,
    pub running: bool,
    pub cancelled: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct QueueStatus {
    pub max: usize,
    pub active: usize,
    pub available: usize,
    pub total_submitted: u64,
    pub task_ids: Vec<Uuid>,
}

/// Bounded pool of concurrent pipeline jobs, purpose-built for running
/// full generation tasks (as opposed to the separate TTS/LLM call pools
/// the `Pipeline` itself draws on).
pub struct TaskRunner {
    semaphore: Arc<Semaphore>,
    max_workers: usize,
    jobs: Arc<DashMap<Uuid, JobEntry>>,
    total_submitted: AtomicU64,
}

impl TaskRunner {
    pub fn new(max_workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            jobs: Arc::new(DashMap::new()),
            total_submitted: AtomicU64::new(0),
        }
    }

    pub fn can_accept(&self) -> bool {
        self.semaphore.available_permits() > 0
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Submits `task_id` to run `pipeline` with `request`. Acquires a
    /// permit synchronously (never awaits capacity); a permit-less
    /// submission is rejected with [`RunnerError::AtCapacity`] so the
    /// caller can record the task as `failed` with "System at capacity",
    /// per spec.md §4.2.
    ///
    /// `on_finish` runs after the pipeline completes (and before the job
    /// is dropped from the active set) so the caller can fire a webhook
    /// or cleanup pass without the `TaskRunner` itself depending on
    /// those collaborators.
    pub fn submit<F, Fut>(&self, task_id: Uuid, pipeline: Arc<Pipeline>, request: PodcastRequest, on_finish: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let permit = self.semaphore.clone().try_acquire_owned().map_err(|_| RunnerError::AtCapacity)?;
        let cancellation = CancellationToken::new();
        let jobs = self.jobs.clone();
        let token_for_task = cancellation.clone();

        let handle = tokio::spawn(async move {
            let _permit = permit;
            if let Err(err) = pipeline.run(task_id, request, token_for_task).await {
                tracing::error!(task_id = %task_id, error = %err, "pipeline run returned an error");
            }
            on_finish().await;
            jobs.remove(&task_id);
        });

        self.jobs.insert(task_id, JobEntry { cancellation, handle });
        self.total_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Cooperatively requests cancellation of `task_id`. Returns `true`
    /// iff the task was tracked (it may still finish naturally before
    /// the next checkpoint, per spec.md §5's cancellation semantics).
    pub fn cancel(&self, task_id: Uuid) -> bool {
        if let Some(entry) = self.jobs.get(&task_id) {
            entry.cancellation.cancel();
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Vec<ActiveJob> {
        self.jobs
            .iter()
            .map(|entry| ActiveJob {
                task_id: *entry.key(),
                running: !entry.value().handle.is_finished(),
                cancelled: entry.value().cancellation.is_cancelled(),
            })
            .collect()
    }

    pub fn queue_status(&self) -> QueueStatus {
        let active = self.jobs.len();
        QueueStatus {
            max: self.max_workers,
            active,
            available: self.max_workers.saturating_sub(active),
            total_submitted: self.total_submitted.load(Ordering::Relaxed),
            task_ids: self.jobs.iter().map(|e| *e.key()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcast_core::{ContentExtractor, ExtractedContent, LanguageModel, RawVoice, TtsBackend, TtsRequest};
    use podcast_pipeline::PipelineDeps;
    use podcast_status::StatusStore;
    use podcast_tts::{ConcatenatingStitcher, MockTtsBackend};
    use podcast_voice::VoiceCatalog;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::Semaphore as TokioSemaphore;

    struct StubExtractor;
    #[async_trait::async_trait]
    impl ContentExtractor for StubExtractor {
        async fn extract(&self, url: &str) -> podcast_core::Result<ExtractedContent> {
            Ok(ExtractedContent { text: "some source text".to_string(), attribution: url.to_string() })
        }
    }

    struct StubLlm;
    #[async_trait::async_trait]
    impl LanguageModel for StubLlm {
        async fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> podcast_core::Result<String> {
            Ok(r#"{"summary_points":[],"detailed_analysis":"x"}"#.to_string())
        }
    }

    fn sample_request() -> PodcastRequest {
        PodcastRequest {
            source_urls: vec!["https://example.com/a".to_string()],
            source_text: None,
            source_pdf_path: None,
            prominent_persons: Vec::new(),
            desired_podcast_length: "1 minute".to_string(),
            webhook_url: None,
            user_id: None,
            custom_name_overrides: HashMap::new(),
            custom_outline_prompt: None,
            custom_dialogue_prompt: None,
            host_invented_name: None,
            host_gender: None,
        }
    }

    fn build_pipeline(dir: &std::path::Path) -> Arc<Pipeline> {
        let deps = PipelineDeps {
            url_extractor: Arc::new(StubExtractor),
            pdf_extractor: Arc::new(StubExtractor),
            llm: Arc::new(StubLlm),
            llm_semaphore: Arc::new(TokioSemaphore::new(4)),
            tts_backend: Arc::new(MockTtsBackend::new(vec![RawVoice {
                voice_id: "v1".to_string(),
                language_codes: vec!["en-US".to_string()],
                ssml_gender: "FEMALE".to_string(),
            }])),
            tts_semaphore: Arc::new(TokioSemaphore::new(4)),
            audio_stitcher: Arc::new(ConcatenatingStitcher::default()),
            voice_catalog: Arc::new(VoiceCatalog::new(dir.join("cache.json"), Duration::from_secs(86_400))),
            status: Arc::new(StatusStore::new()),
            output_root: dir.to_path_buf(),
        };
        Arc::new(Pipeline::new(deps))
    }

    #[tokio::test]
    async fn capacity_one_rejects_a_second_submission() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TaskRunner::new(1);
        let pipeline_a = build_pipeline(dir.path());
        let pipeline_b = build_pipeline(dir.path());

        let status_a = Arc::new(StatusStore::new());
        let task_a = Uuid::new_v4();
        status_a.create(task_a, sample_request());

        assert!(runner.can_accept());
        runner.submit(task_a, pipeline_a, sample_request(), || async {}).unwrap();

        let task_b = Uuid::new_v4();
        let result = runner.submit(task_b, pipeline_b, sample_request(), || async {});
        assert!(matches!(result, Err(RunnerError::AtCapacity)));
    }

    #[tokio::test]
    async fn cancel_returns_false_for_an_untracked_task() {
        let runner = TaskRunner::new(2);
        assert!(!runner.cancel(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn queue_status_reflects_submitted_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TaskRunner::new(4);
        let pipeline = build_pipeline(dir.path());
        let task_id = Uuid::new_v4();
        runner.submit(task_id, pipeline, sample_request(), || async {}).unwrap();
        let status = runner.queue_status();
        assert_eq!(status.max, 4);
        assert_eq!(status.total_submitted, 1);
    }
}
