//! End-to-end exercises of `TaskRunner` driving the real `Pipeline`
//! against mock LLM/TTS/extractor collaborators, covering spec.md §8's
//! seed scenarios.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use podcast_core::{ContentExtractor, ExtractedContent, PodcastRequest, RawVoice, TaskStatus};
use podcast_llm::mock::MockLanguageModel;
use podcast_pipeline::{Pipeline, PipelineDeps};
use podcast_runner::TaskRunner;
use podcast_status::StatusStore;
use podcast_tts::{ConcatenatingStitcher, MockTtsBackend};
use podcast_voice::VoiceCatalog;
use tokio::sync::Semaphore;
use uuid::Uuid;

struct StubExtractor {
    text: &'static str,
    fail_for: Option<&'static str>,
}

#[async_trait::async_trait]
impl ContentExtractor for StubExtractor {
    async fn extract(&self, url: &str) -> podcast_core::Result<ExtractedContent> {
        if self.fail_for == Some(url) {
            return Err(podcast_core::Error::Extraction(format!("unreachable: {url}")));
        }
        Ok(ExtractedContent { text: self.text.to_string(), attribution: url.to_string() })
    }
}

fn many_voices() -> MockTtsBackend {
    MockTtsBackend::new(vec![
        RawVoice { voice_id: "v-female-1".to_string(), language_codes: vec!["en-US".to_string()], ssml_gender: "FEMALE".to_string() },
        RawVoice { voice_id: "v-female-2".to_string(), language_codes: vec!["en-US".to_string()], ssml_gender: "FEMALE".to_string() },
        RawVoice { voice_id: "v-male-1".to_string(), language_codes: vec!["en-US".to_string()], ssml_gender: "MALE".to_string() },
        RawVoice { voice_id: "v-male-2".to_string(), language_codes: vec!["en-US".to_string()], ssml_gender: "MALE".to_string() },
    ])
}

fn sample_request(source_urls: Vec<&str>, prominent_persons: Vec<&str>) -> PodcastRequest {
    PodcastRequest {
        source_urls: source_urls.into_iter().map(String::from).collect(),
        source_text: None,
        source_pdf_path: None,
        prominent_persons: prominent_persons.into_iter().map(String::from).collect(),
        desired_podcast_length: "3 minutes".to_string(),
        webhook_url: None,
        user_id: None,
        custom_name_overrides: HashMap::new(),
        custom_outline_prompt: None,
        custom_dialogue_prompt: None,
        host_invented_name: None,
        host_gender: None,
    }
}

async fn await_terminal(status: &StatusStore, task_id: Uuid) -> podcast_core::Task {
    for _ in 0..200 {
        if let Some(task) = status.get(task_id) {
            if task.status.is_terminal() {
                return task;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {task_id} did not reach a terminal state in time");
}

fn build_deps(
    dir: &std::path::Path,
    url_extractor: Arc<dyn ContentExtractor>,
    responses: Vec<String>,
    status: Arc<StatusStore>,
) -> PipelineDeps {
    PipelineDeps {
        url_extractor,
        pdf_extractor: Arc::new(StubExtractor { text: "pdf text", fail_for: None }),
        llm: Arc::new(MockLanguageModel::new(responses)),
        llm_semaphore: Arc::new(Semaphore::new(8)),
        tts_backend: Arc::new(many_voices()),
        tts_semaphore: Arc::new(Semaphore::new(8)),
        audio_stitcher: Arc::new(ConcatenatingStitcher::default()),
        voice_catalog: Arc::new(VoiceCatalog::new(dir.join("cache.json"), Duration::from_secs(86_400))),
        status,
        output_root: dir.to_path_buf(),
    }
}

#[tokio::test]
async fn two_personas_get_distinct_voice_ids() {
    let dir = tempfile::tempdir().unwrap();
    let status = Arc::new(StatusStore::new());
    let responses = vec![
        r#"{"summary_points":["a","b"],"detailed_analysis":"analysis text"}"#.to_string(),
        r#"{"detailed_profile":"profile of Ada","gender":"Female"}"#.to_string(),
        r#"{"detailed_profile":"profile of Bob","gender":"Male"}"#.to_string(),
        r#"{"title_suggestion":"T","summary_suggestion":"S","segments":[{"segment_id":"s1","segment_title":"Intro","speaker_id":"person_0","content_cue":"cue","estimated_duration_seconds":60},{"segment_id":"s2","segment_title":"Discussion","speaker_id":"person_1","content_cue":"cue2","estimated_duration_seconds":60}]}"#.to_string(),
        r#"[{"speaker_id":"person_0","speaker_gender":"Female","text":"Hello from Ada.","source_mentions":[]}]"#.to_string(),
        r#"[{"speaker_id":"person_1","speaker_gender":"Male","text":"Hello from Bob.","source_mentions":[]}]"#.to_string(),
    ];
    let deps = build_deps(
        dir.path(),
        Arc::new(StubExtractor { text: "plenty of source words describing the topic", fail_for: None }),
        responses,
        status.clone(),
    );
    let pipeline = Arc::new(Pipeline::new(deps));
    let task_runner = TaskRunner::new(4);
    let request = sample_request(vec!["https://example.com/a"], vec!["Ada", "Bob"]);
    let task_id = Uuid::new_v4();
    status.create(task_id, request.clone());

    task_runner.submit(task_id, pipeline, request, || async {}).unwrap();
    let task = await_terminal(&status, task_id).await;

    assert_eq!(task.status, TaskStatus::Completed);
    let episode = task.result.expect("completed task has an episode");
    assert_eq!(episode.persona_research_paths.len(), 2);

    let mut voice_ids = Vec::new();
    for path in &episode.persona_research_paths {
        let body = tokio::fs::read_to_string(path).await.unwrap();
        let persona: podcast_core::PersonaResearch = serde_json::from_str(&body).unwrap();
        voice_ids.push(persona.tts_voice_id.expect("persona has an assigned voice"));
    }
    assert_ne!(voice_ids[0], voice_ids[1], "distinct personas must not share a voice id");
    assert!(episode.transcript.contains("Hello from Ada."));
    assert!(episode.transcript.contains("Hello from Bob."));
}

#[tokio::test]
async fn one_failing_source_of_two_still_completes_with_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let status = Arc::new(StatusStore::new());
    let responses = vec![
        r#"{"summary_points":["a"],"detailed_analysis":"analysis"}"#.to_string(),
        r#"{"title_suggestion":"T","summary_suggestion":"S","segments":[{"segment_id":"s1","segment_title":"Intro","speaker_id":"Host","content_cue":"cue","estimated_duration_seconds":60}]}"#.to_string(),
        r#"[{"speaker_id":"Host","speaker_gender":"Male","text":"Welcome to the show.","source_mentions":[]}]"#.to_string(),
    ];
    let extractor = StubExtractor { text: "good source content here", fail_for: Some("https://example.com/broken") };
    let deps = build_deps(dir.path(), Arc::new(extractor), responses, status.clone());
    let pipeline = Arc::new(Pipeline::new(deps));
    let task_runner = TaskRunner::new(4);
    let request = sample_request(vec!["https://example.com/broken", "https://example.com/good"], vec![]);
    let task_id = Uuid::new_v4();
    status.create(task_id, request.clone());

    task_runner.submit(task_id, pipeline, request, || async {}).unwrap();
    let task = await_terminal(&status, task_id).await;

    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.warnings.iter().any(|w| w.contains("broken")));
}

#[tokio::test]
async fn all_sources_failing_marks_the_task_failed() {
    let dir = tempfile::tempdir().unwrap();
    let status = Arc::new(StatusStore::new());
    let extractor = StubExtractor { text: "unused", fail_for: Some("https://example.com/a") };
    let deps = build_deps(dir.path(), Arc::new(extractor), vec![String::new()], status.clone());
    let pipeline = Arc::new(Pipeline::new(deps));
    let task_runner = TaskRunner::new(4);
    let request = sample_request(vec!["https://example.com/a"], vec![]);
    let task_id = Uuid::new_v4();
    status.create(task_id, request.clone());

    task_runner.submit(task_id, pipeline, request, || async {}).unwrap();
    let task = await_terminal(&status, task_id).await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.result.is_none());
}

#[tokio::test]
async fn a_single_worker_pool_frees_its_slot_after_completion() {
    let dir = tempfile::tempdir().unwrap();
    let status = Arc::new(StatusStore::new());
    let task_runner = TaskRunner::new(1);

    let responses = vec![
        r#"{"summary_points":["a"],"detailed_analysis":"analysis"}"#.to_string(),
        r#"{"title_suggestion":"T","summary_suggestion":"S","segments":[{"segment_id":"s1","segment_title":"Intro","speaker_id":"Host","content_cue":"cue","estimated_duration_seconds":60}]}"#.to_string(),
        r#"[{"speaker_id":"Host","speaker_gender":"Male","text":"Welcome.","source_mentions":[]}]"#.to_string(),
    ];
    let extractor = StubExtractor { text: "source text", fail_for: None };
    let deps = build_deps(dir.path(), Arc::new(extractor), responses, status.clone());
    let pipeline = Arc::new(Pipeline::new(deps));
    let request = sample_request(vec!["https://example.com/a"], vec![]);
    let task_id = Uuid::new_v4();
    status.create(task_id, request.clone());
    task_runner.submit(task_id, pipeline, request, || async {}).unwrap();

    let second_request = sample_request(vec!["https://example.com/b"], vec![]);
    let second_task_id = Uuid::new_v4();
    status.create(second_task_id, second_request.clone());
    let responses_two = vec![
        r#"{"summary_points":["a"],"detailed_analysis":"analysis"}"#.to_string(),
        r#"{"title_suggestion":"T","summary_suggestion":"S","segments":[{"segment_id":"s1","segment_title":"Intro","speaker_id":"Host","content_cue":"cue","estimated_duration_seconds":60}]}"#.to_string(),
        r#"[{"speaker_id":"Host","speaker_gender":"Male","text":"Welcome again.","source_mentions":[]}]"#.to_string(),
    ];
    let extractor_two = StubExtractor { text: "source text two", fail_for: None };
    let deps_two = build_deps(dir.path(), Arc::new(extractor_two), responses_two, status.clone());
    let pipeline_two = Arc::new(Pipeline::new(deps_two));

    // Immediately at capacity: the first job holds the pool's only slot.
    assert!(task_runner.submit(second_task_id, pipeline_two.clone(), second_request.clone(), || async {}).is_err());

    await_terminal(&status, task_id).await;
    // The slot is released once the first job's on_finish hook has run.
    for _ in 0..50 {
        if task_runner.can_accept() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(task_runner.can_accept());
    task_runner.submit(second_task_id, pipeline_two, second_request, || async {}).unwrap();
    let second_task = await_terminal(&status, second_task_id).await;
    assert_eq!(second_task.status, TaskStatus::Completed);
}
