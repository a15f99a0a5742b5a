//! `StatusStore`: the durable per-task record the rest of the orchestrator
//! reads and the `Pipeline` is the sole mutator of, per spec.md §4.1.
//!
//! Modeled on the teacher's `SessionManager`
//! (`server/src/session.rs`): a `DashMap`-backed map keyed by an opaque id,
//! guarded per-entry rather than behind one global lock, with a pluggable
//! persistence trait mirroring the teacher's `SessionStore` so a future
//! durable backend can be swapped in without touching callers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use podcast_core::{PodcastEpisode, PodcastRequest, Task, TaskStatus};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("task not found: {0}")]
    NotFound(Uuid),

    #[error("invalid transition from {from:?} to {to:?} for task {task_id}")]
    InvalidTransition {
        task_id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("task {0} already has a result episode")]
    EpisodeAlreadySet(Uuid),
}

impl From<StatusError> for podcast_core::Error {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::NotFound(id) => podcast_core::Error::NotFound(id),
            StatusError::InvalidTransition { from, to, .. } => {
                podcast_core::Error::InvalidTransition {
                    from: format!("{from:?}"),
                    to: format!("{to:?}"),
                }
            }
            StatusError::EpisodeAlreadySet(id) => {
                podcast_core::Error::Status(format!("episode already set for task {id}"))
            }
        }
    }
}

/// Mapping accepted by `ArtifactFlags` setters; kept as a small enum rather
/// than a string so callers can't typo a flag name. One variant per
/// spec.md §3 `ArtifactFlags` boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    SourceContent,
    SourceAnalysis,
    PersonaResearch,
    Outline,
    DialogueScript,
    AudioSegments,
    FinalAudio,
    FinalTranscript,
}

/// Durable per-task record store. Cheap to clone — internally an
/// `Arc<DashMap<...>>` — so every crate that needs a handle (the runner,
/// the pipeline, the server) holds its own clone rather than a reference.
#[derive(Clone, Default)]
pub struct StatusStore {
    tasks: Arc<DashMap<Uuid, Arc<RwLock<Task>>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes a task at `queued`/0%. spec.md §4.1.
    pub fn create(&self, task_id: Uuid, request: PodcastRequest) -> Task {
        let now = Utc::now();
        let task = Task::new(task_id, request, now);
        self.tasks.insert(task_id, Arc::new(RwLock::new(task.clone())));
        task
    }

    /// Atomically transitions `task_id` to `new_state`, rejecting any
    /// transition out of a terminal state. `progress` overrides the
    /// phase's anchor percentage when `Some` (used for within-phase
    /// interpolation, e.g. audio synthesis progress).
    pub fn update(
        &self,
        task_id: Uuid,
        new_state: TaskStatus,
        description: impl Into<String>,
        progress: Option<f32>,
    ) -> Result<(), StatusError> {
        let entry = self.entry(task_id)?;
        let mut task = entry.write();
        if !task.status.can_transition_to(new_state) {
            return Err(StatusError::InvalidTransition {
                task_id,
                from: task.status,
                to: new_state,
            });
        }
        task.status = new_state;
        task.status_message = description.into();
        task.progress_percent = progress.unwrap_or_else(|| new_state.anchor_percent());
        task.updated_at = Utc::now();
        Ok(())
    }

    /// Same as `update` but only touches `progress_percent`, for the
    /// linear 75->90% interpolation across per-turn audio synthesis.
    pub fn update_progress(&self, task_id: Uuid, progress: f32) -> Result<(), StatusError> {
        let entry = self.entry(task_id)?;
        let mut task = entry.write();
        if task.status.is_terminal() {
            return Ok(());
        }
        task.progress_percent = progress;
        task.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_artifact(&self, task_id: Uuid, flag: ArtifactKind) -> Result<(), StatusError> {
        let entry = self.entry(task_id)?;
        let mut task = entry.write();
        match flag {
            ArtifactKind::SourceContent => task.artifacts.has_source_content = true,
            ArtifactKind::SourceAnalysis => task.artifacts.has_source_analysis = true,
            ArtifactKind::PersonaResearch => task.artifacts.has_persona_research = true,
            ArtifactKind::Outline => task.artifacts.has_outline = true,
            ArtifactKind::DialogueScript => task.artifacts.has_dialogue_script = true,
            ArtifactKind::AudioSegments => task.artifacts.has_audio_segments = true,
            ArtifactKind::FinalAudio => task.artifacts.has_final_audio = true,
            ArtifactKind::FinalTranscript => task.artifacts.has_final_transcript = true,
        }
        task.updated_at = Utc::now();
        Ok(())
    }

    pub fn append_warning(&self, task_id: Uuid, message: impl Into<String>) -> Result<(), StatusError> {
        let entry = self.entry(task_id)?;
        let mut task = entry.write();
        task.warnings.push(message.into());
        task.updated_at = Utc::now();
        Ok(())
    }

    /// Transitions to `failed` unless the task is already terminal, in
    /// which case this is a no-op (a late error after cancellation must
    /// not clobber the write-once terminal state).
    pub fn set_error(&self, task_id: Uuid, title: &str, detail: &str) -> Result<(), StatusError> {
        let entry = self.entry(task_id)?;
        let mut task = entry.write();
        if task.status.is_terminal() {
            return Ok(());
        }
        task.status = TaskStatus::Failed;
        task.error_message = Some(format!("{title}: {detail}"));
        task.status_message = title.to_string();
        task.updated_at = Utc::now();
        Ok(())
    }

    /// Attaches the final episode. Write-once: a second call returns
    /// `EpisodeAlreadySet` rather than silently overwriting.
    pub fn set_episode(&self, task_id: Uuid, episode: PodcastEpisode) -> Result<(), StatusError> {
        let entry = self.entry(task_id)?;
        let mut task = entry.write();
        if task.result.is_some() {
            return Err(StatusError::EpisodeAlreadySet(task_id));
        }
        task.result = Some(episode);
        task.updated_at = Utc::now();
        Ok(())
    }

    /// A consistent point-in-time snapshot — no torn reads of
    /// progress/status/warnings, since the whole `Task` is cloned under
    /// one read lock.
    pub fn get(&self, task_id: Uuid) -> Option<Task> {
        self.tasks.get(&task_id).map(|entry| entry.read().clone())
    }

    pub fn list(&self, limit: usize, offset: usize) -> Vec<Task> {
        let mut all: Vec<Task> = self.tasks.iter().map(|entry| entry.value().read().clone()).collect();
        all.sort_by_key(|t| t.created_at);
        all.into_iter().skip(offset).take(limit).collect()
    }

    /// Idempotent-safe: removing an id that isn't present is not an
    /// error at this layer (the `APIFacade` surfaces the distinction as
    /// 404 on the *first* miss by checking existence beforehand).
    pub fn delete(&self, task_id: Uuid) -> bool {
        self.tasks.remove(&task_id).is_some()
    }

    pub fn exists(&self, task_id: Uuid) -> bool {
        self.tasks.contains_key(&task_id)
    }

    pub fn created_at(&self, task_id: Uuid) -> Option<DateTime<Utc>> {
        self.tasks.get(&task_id).map(|e| e.read().created_at)
    }

    fn entry(&self, task_id: Uuid) -> Result<Arc<RwLock<Task>>, StatusError> {
        self.tasks
            .get(&task_id)
            .map(|e| e.value().clone())
            .ok_or(StatusError::NotFound(task_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcast_core::PodcastRequest;

    fn sample_request() -> PodcastRequest {
        PodcastRequest {
            source_urls: vec!["https://example.com/article".to_string()],
            source_text: None,
            source_pdf_path: None,
            prominent_persons: vec![],
            desired_podcast_length: "5 minutes".to_string(),
            webhook_url: None,
            user_id: None,
            custom_name_overrides: Default::default(),
            custom_outline_prompt: None,
            custom_dialogue_prompt: None,
            host_invented_name: None,
            host_gender: None,
        }
    }

    #[test]
    fn create_starts_queued_at_zero() {
        let store = StatusStore::new();
        let id = Uuid::new_v4();
        let task = store.create(id, sample_request());
        assert_eq!(task.status, TaskStatus::Queued);
        assert_eq!(task.progress_percent, 0.0);
    }

    #[test]
    fn transitions_follow_the_phase_graph() {
        let store = StatusStore::new();
        let id = Uuid::new_v4();
        store.create(id, sample_request());
        store
            .update(id, TaskStatus::Preprocessing, "preprocessing sources", None)
            .unwrap();
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Preprocessing);
        assert_eq!(task.progress_percent, 5.0);

        let err = store
            .update(id, TaskStatus::GeneratingAudio, "skip ahead", None)
            .unwrap_err();
        assert!(matches!(err, StatusError::InvalidTransition { .. }));
    }

    #[test]
    fn terminal_states_are_write_once() {
        let store = StatusStore::new();
        let id = Uuid::new_v4();
        store.create(id, sample_request());
        store.update(id, TaskStatus::Cancelled, "cancelled by user", None).unwrap();
        let err = store
            .update(id, TaskStatus::Preprocessing, "too late", None)
            .unwrap_err();
        assert!(matches!(err, StatusError::InvalidTransition { .. }));
    }

    #[test]
    fn set_error_is_noop_after_terminal() {
        let store = StatusStore::new();
        let id = Uuid::new_v4();
        store.create(id, sample_request());
        store.update(id, TaskStatus::Cancelled, "cancelled", None).unwrap();
        store.set_error(id, "Boom", "late failure").unwrap();
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert!(task.error_message.is_none());
    }

    #[test]
    fn set_episode_is_write_once() {
        let store = StatusStore::new();
        let id = Uuid::new_v4();
        store.create(id, sample_request());
        let episode = PodcastEpisode {
            title: "t".into(),
            summary: "s".into(),
            transcript: "Host: hi".into(),
            audio_filepath: "final.mp3".into(),
            source_attributions: vec![],
            warnings: vec![],
            source_analysis_path: None,
            persona_research_paths: vec![],
            outline_path: None,
            dialogue_turns_path: None,
        };
        store.set_episode(id, episode.clone()).unwrap();
        let err = store.set_episode(id, episode).unwrap_err();
        assert!(matches!(err, StatusError::EpisodeAlreadySet(_)));
    }

    #[test]
    fn delete_is_idempotent_safe() {
        let store = StatusStore::new();
        let id = Uuid::new_v4();
        store.create(id, sample_request());
        assert!(store.delete(id));
        assert!(!store.delete(id));
    }

    #[test]
    fn list_is_paginated_and_ordered_by_creation() {
        let store = StatusStore::new();
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            store.create(*id, sample_request());
        }
        let page = store.list(2, 1);
        assert_eq!(page.len(), 2);
    }
}
