//! `CleanupManager`: policy-driven artifact retention, per spec.md §4.9.
//! Cleanup never touches the `TaskStatus` lifecycle field — it only
//! removes files the Pipeline wrote under a task's output directory.
//!
//! The source leaves whether `auto_after_hours`/`auto_after_days` are
//! swept by a background timer or applied passively as an open question
//! (spec.md §9's "Cleanup policies are exposed but never scheduled").
//! This crate takes the passive reading: `apply` is called explicitly
//! (by the API facade's cleanup endpoint, or an operator-driven sweep),
//! and age-based policies are evaluated against the caller-supplied
//! `now` rather than run by an internal timer.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use podcast_config::CleanupPolicy;
use podcast_core::Task;

const AUTO_AFTER_HOURS_THRESHOLD: i64 = 24;
const AUTO_AFTER_DAYS_THRESHOLD: i64 = 7;

/// Which file categories a policy run is allowed to delete. All `true`
/// (nothing retained) unless the caller narrows it per spec.md §4.9's
/// per-task override.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetentionFlags {
    pub retain_audio_files: bool,
    pub retain_transcripts: bool,
    pub retain_llm_outputs: bool,
    pub retain_audio_segments: bool,
}

impl Default for RetentionFlags {
    fn default() -> Self {
        Self {
            retain_audio_files: false,
            retain_transcripts: false,
            retain_llm_outputs: false,
            retain_audio_segments: false,
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CleanupReport {
    pub cleaned_files: Vec<String>,
    pub failed_files: Vec<String>,
    pub total_size_freed: u64,
}

pub struct CleanupManager;

impl CleanupManager {
    pub fn new() -> Self {
        Self
    }

    /// Applies `policy` to `task`'s artifacts under `task_dir`. Returns
    /// an empty report if the task isn't yet eligible under the policy
    /// (e.g. `manual`, or an age-based policy whose threshold hasn't
    /// elapsed). Eligibility always requires the task be terminal.
    pub async fn apply(
        &self,
        task: &Task,
        task_dir: &Path,
        policy: CleanupPolicy,
        retention: RetentionFlags,
        now: DateTime<Utc>,
    ) -> CleanupReport {
        if !task.status.is_terminal() || !self.is_eligible(task, policy, now) {
            return CleanupReport::default();
        }

        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(episode) = &task.result {
            if !retention.retain_audio_files && policy != CleanupPolicy::RetainAudioOnly {
                candidates.push(PathBuf::from(&episode.audio_filepath));
            }
            if !retention.retain_llm_outputs {
                if let Some(p) = &episode.source_analysis_path {
                    candidates.push(PathBuf::from(p));
                }
                for p in &episode.persona_research_paths {
                    candidates.push(PathBuf::from(p));
                }
                if let Some(p) = &episode.outline_path {
                    candidates.push(PathBuf::from(p));
                }
                if let Some(p) = &episode.dialogue_turns_path {
                    candidates.push(PathBuf::from(p));
                }
            }
        }
        if !retention.retain_audio_segments {
            candidates.extend(self.segment_files(task_dir).await);
        }

        self.remove_all(candidates).await
    }

    /// Unconditional removal of a task's entire output directory,
    /// bypassing policy — used by the API facade's explicit `delete`
    /// operation, which spec.md §4.10 allows even on terminal tasks.
    pub async fn force_delete(&self, task_dir: &Path) -> CleanupReport {
        let mut report = CleanupReport::default();
        let size = dir_size(task_dir).await;
        match tokio::fs::remove_dir_all(task_dir).await {
            Ok(()) => {
                report.cleaned_files.push(task_dir.to_string_lossy().to_string());
                report.total_size_freed = size;
            }
            Err(e) => {
                report.failed_files.push(task_dir.to_string_lossy().to_string());
                tracing::warn!(path = %task_dir.display(), error = %e, "failed to remove task directory");
            }
        }
        report
    }

    fn is_eligible(&self, task: &Task, policy: CleanupPolicy, now: DateTime<Utc>) -> bool {
        match policy {
            CleanupPolicy::Manual => false,
            CleanupPolicy::OnCompletion | CleanupPolicy::RetainAudioOnly => true,
            CleanupPolicy::AutoAfterHours => {
                now.signed_duration_since(task.updated_at).num_hours() >= AUTO_AFTER_HOURS_THRESHOLD
            }
            CleanupPolicy::AutoAfterDays => {
                now.signed_duration_since(task.updated_at).num_days() >= AUTO_AFTER_DAYS_THRESHOLD
            }
        }
    }

    async fn segment_files(&self, task_dir: &Path) -> Vec<PathBuf> {
        let dir = task_dir.join("audio_segments");
        let mut out = Vec::new();
        if let Ok(mut entries) = tokio::fs::read_dir(&dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                out.push(entry.path());
            }
        }
        out
    }

    async fn remove_all(&self, paths: Vec<PathBuf>) -> CleanupReport {
        let mut report = CleanupReport::default();
        for path in paths {
            let size = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    report.cleaned_files.push(path.to_string_lossy().to_string());
                    report.total_size_freed += size;
                }
                Err(e) => {
                    report.failed_files.push(path.to_string_lossy().to_string());
                    tracing::debug!(path = %path.display(), error = %e, "cleanup could not remove file");
                }
            }
        }
        report
    }
}

impl Default for CleanupManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn dir_size(dir: &Path) -> u64 {
    let mut total = 0u64;
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        if let Ok(mut entries) = tokio::fs::read_dir(&current).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if let Ok(meta) = entry.metadata().await {
                    if meta.is_dir() {
                        stack.push(entry.path());
                    } else {
                        total += meta.len();
                    }
                }
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcast_core::{PodcastEpisode, PodcastRequest, TaskStatus};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn sample_request() -> PodcastRequest {
        PodcastRequest {
            source_urls: vec!["https://example.com".to_string()],
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

    #[tokio::test]
    async fn manual_policy_never_cleans() {
        let dir = tempfile::tempdir().unwrap();
        let audio_path = dir.path().join("final.wav");
        tokio::fs::write(&audio_path, b"audio").await.unwrap();

        let mut task = podcast_core::Task::new(Uuid::new_v4(), sample_request(), Utc::now());
        task.status = TaskStatus::Completed;
        task.result = Some(PodcastEpisode {
            title: "T".to_string(),
            summary: "S".to_string(),
            transcript: "Host: hi".to_string(),
            audio_filepath: audio_path.to_string_lossy().to_string(),
            source_attributions: Vec::new(),
            warnings: Vec::new(),
            source_analysis_path: None,
            persona_research_paths: Vec::new(),
            outline_path: None,
            dialogue_turns_path: None,
        });

        let manager = CleanupManager::new();
        let report = manager.apply(&task, dir.path(), CleanupPolicy::Manual, RetentionFlags::default(), Utc::now()).await;
        assert!(report.cleaned_files.is_empty());
        assert!(audio_path.exists());
    }

    #[tokio::test]
    async fn on_completion_removes_audio_unless_retained() {
        let dir = tempfile::tempdir().unwrap();
        let audio_path = dir.path().join("final.wav");
        tokio::fs::write(&audio_path, b"audio").await.unwrap();

        let mut task = podcast_core::Task::new(Uuid::new_v4(), sample_request(), Utc::now());
        task.status = TaskStatus::Completed;
        task.result = Some(PodcastEpisode {
            title: "T".to_string(),
            summary: "S".to_string(),
            transcript: "Host: hi".to_string(),
            audio_filepath: audio_path.to_string_lossy().to_string(),
            source_attributions: Vec::new(),
            warnings: Vec::new(),
            source_analysis_path: None,
            persona_research_paths: Vec::new(),
            outline_path: None,
            dialogue_turns_path: None,
        });

        let manager = CleanupManager::new();
        let report = manager
            .apply(&task, dir.path(), CleanupPolicy::OnCompletion, RetentionFlags::default(), Utc::now())
            .await;
        assert_eq!(report.cleaned_files.len(), 1);
        assert!(!audio_path.exists());
    }

    #[tokio::test]
    async fn retain_audio_only_keeps_the_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let audio_path = dir.path().join("final.wav");
        let analysis_path = dir.path().join("source_analysis.json");
        tokio::fs::write(&audio_path, b"audio").await.unwrap();
        tokio::fs::write(&analysis_path, b"{}").await.unwrap();

        let mut task = podcast_core::Task::new(Uuid::new_v4(), sample_request(), Utc::now());
        task.status = TaskStatus::Completed;
        task.result = Some(PodcastEpisode {
            title: "T".to_string(),
            summary: "S".to_string(),
            transcript: "Host: hi".to_string(),
            audio_filepath: audio_path.to_string_lossy().to_string(),
            source_attributions: Vec::new(),
            warnings: Vec::new(),
            source_analysis_path: Some(analysis_path.to_string_lossy().to_string()),
            persona_research_paths: Vec::new(),
            outline_path: None,
            dialogue_turns_path: None,
        });

        let manager = CleanupManager::new();
        let report = manager
            .apply(&task, dir.path(), CleanupPolicy::RetainAudioOnly, RetentionFlags::default(), Utc::now())
            .await;
        assert_eq!(report.cleaned_files.len(), 1);
        assert!(audio_path.exists());
        assert!(!analysis_path.exists());
    }
}
