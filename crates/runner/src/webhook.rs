//! Best-effort webhook delivery on task completion, per spec.md §4.8.
//! A delivery failure never mutates the task: the webhook is a side
//! channel, not part of the state machine.

use podcast_config::WebhookConfig;
use podcast_core::{PodcastEpisode, Task, TaskStatus};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct WebhookResult<'a> {
    title: &'a str,
    summary: &'a str,
    audio_filepath: &'a str,
    has_transcript: bool,
    source_count: usize,
    warnings: &'a [String],
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    task_id: Uuid,
    status: TaskStatus,
    timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<WebhookResult<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn payload_for<'a>(task: &'a Task, episode: Option<&'a PodcastEpisode>) -> WebhookPayload<'a> {
    WebhookPayload {
        task_id: task.task_id,
        status: task.status,
        timestamp: task.updated_at,
        result: episode.map(|e| WebhookResult {
            title: &e.title,
            summary: &e.summary,
            audio_filepath: &e.audio_filepath,
            has_transcript: !e.transcript.is_empty(),
            source_count: e.source_attributions.len(),
            warnings: &e.warnings,
        }),
        error: task.error_message.as_deref(),
    }
}

/// Delivers terminal-status notifications with bounded retry. Never
/// returns an error to the caller; a permanently-failed delivery is
/// only logged, matching the original's "fire and forget" webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Self {
        Self { client: reqwest::Client::new(), config }
    }

    pub async fn notify(&self, webhook_url: &str, task: &Task) {
        let payload = payload_for(task, task.result.as_ref());
        let body = match serde_json::to_vec(&payload) {
            Ok(b) => b,
            Err(e) => {
                tracing::error!(task_id = %task.task_id, error = %e, "failed to serialize webhook payload");
                return;
            }
        };

        let mut delay_ms = self.config.base_delay_ms;
        for attempt in 1..=self.config.max_retries {
            let result = self
                .client
                .post(webhook_url)
                .header("Content-Type", "application/json")
                .body(body.clone())
                .timeout(std::time::Duration::from_secs(self.config.per_attempt_timeout_secs))
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(task_id = %task.task_id, attempt, "webhook delivered");
                    return;
                }
                Ok(response) => {
                    tracing::warn!(
                        task_id = %task.task_id,
                        attempt,
                        status = %response.status(),
                        "webhook attempt returned a non-success status"
                    );
                }
                Err(e) => {
                    tracing::warn!(task_id = %task.task_id, attempt, error = %e, "webhook attempt failed");
                }
            }

            if attempt < self.config.max_retries {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                delay_ms *= 2;
            }
        }

        tracing::error!(
            task_id = %task.task_id,
            attempts = self.config.max_retries,
            "webhook delivery exhausted all retries, giving up"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcast_core::PodcastRequest;
    use std::collections::HashMap;

    fn sample_task(status: TaskStatus) -> Task {
        let request = PodcastRequest {
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
        };
        let mut task = Task::new(Uuid::new_v4(), request, chrono::Utc::now());
        task.status = status;
        task
    }

    #[test]
    fn payload_omits_result_when_task_has_none() {
        let task = sample_task(TaskStatus::Failed);
        let payload = payload_for(&task, None);
        assert!(payload.result.is_none());
    }

    #[test]
    fn payload_includes_result_fields_when_present() {
        let episode = PodcastEpisode {
            title: "T".to_string(),
            summary: "S".to_string(),
            transcript: "Host: hi".to_string(),
            audio_filepath: "final.wav".to_string(),
            source_attributions: vec!["a".to_string(), "b".to_string()],
            warnings: vec!["w".to_string()],
            source_analysis_path: None,
            persona_research_paths: Vec::new(),
            outline_path: None,
            dialogue_turns_path: None,
        };
        let task = sample_task(TaskStatus::Completed);
        let payload = payload_for(&task, Some(&episode));
        let result = payload.result.unwrap();
        assert_eq!(result.source_count, 2);
        assert!(result.has_transcript);
    }

    #[tokio::test]
    async fn notify_gives_up_quietly_against_an_unreachable_host() {
        let mut config = WebhookConfig::default();
        config.max_retries = 1;
        config.base_delay_ms = 1;
        config.per_attempt_timeout_secs = 1;
        let notifier = WebhookNotifier::new(config);
        let task = sample_task(TaskStatus::Completed);
        // Port 0 on localhost never accepts connections; this exercises
        // the retry-exhaustion path without a real network dependency.
        notifier.notify("http://127.0.0.1:0/webhook", &task).await;
    }
}
