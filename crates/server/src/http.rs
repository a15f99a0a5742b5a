//! REST surface over the `Runner` facade, per spec.md §4.10/§6: submit,
//! inspect, list, cancel, and delete generation tasks; read derived
//! resources (transcript, audio, metadata, outline, per-person research,
//! logs, warnings); configuration and health resources.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use podcast_core::{PodcastRequest, Task};
use podcast_runner::{CleanupReport, RetentionFlags};

use crate::error::ApiError;
use crate::metrics::metrics_handler;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let config = state.config();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    drop(config);

    Router::new()
        .route("/api/podcasts", post(submit_podcast))
        .route("/api/podcasts", get(list_podcasts))
        .route("/api/podcasts/:task_id", get(get_podcast_status))
        .route("/api/podcasts/:task_id", delete(delete_podcast))
        .route("/api/podcasts/:task_id/cancel", post(cancel_podcast))
        .route("/api/podcast/:task_id/transcript", get(get_transcript))
        .route("/api/podcast/:task_id/audio", get(get_audio))
        .route("/api/podcast/:task_id/metadata", get(get_metadata))
        .route("/api/podcast/:task_id/outline", get(get_outline))
        .route("/api/research/:task_id/:person_id", get(get_research))
        .route("/api/jobs/:task_id/status", get(get_podcast_status))
        .route("/api/jobs/:task_id/logs", get(get_logs))
        .route("/api/jobs/:task_id/warnings", get(get_warnings))
        .route("/api/config/cleanup", get(get_cleanup_config))
        .route("/api/config/input-types", get(get_input_types))
        .route("/api/config/limits", get(get_limits))
        .route("/api/files/:task_id/cleanup", post(apply_cleanup))
        .route("/admin/reload-config", post(reload_config))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        tracing::info!("no CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()).collect();
    if parsed.is_empty() {
        tracing::error!("all configured CORS origins are invalid, falling back to localhost");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(true)
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    task_id: Uuid,
}

async fn submit_podcast(
    State(state): State<AppState>,
    Json(request): Json<PodcastRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let task_id = state.runner().submit(request)?;
    crate::metrics::record_submission();
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { task_id })))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_limit() -> usize {
    50
}

async fn list_podcasts(State(state): State<AppState>, Query(q): Query<ListQuery>) -> Json<serde_json::Value> {
    let tasks: Vec<serde_json::Value> = state.runner().list(q.limit, q.offset).iter().map(status_record).collect();
    Json(serde_json::json!({ "tasks": tasks, "count": tasks.len() }))
}

/// Renders the status-record shape specified in spec.md §6.
fn status_record(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "task_id": task.task_id,
        "status": task.status,
        "status_description": task.status_message,
        "progress_percentage": task.progress_percent,
        "request_data": task.request,
        "created_at": task.created_at,
        "last_updated_at": task.updated_at,
        "artifacts": {
            "source_content_extracted": task.artifacts.has_source_content,
            "source_analysis_complete": task.artifacts.has_source_analysis,
            "persona_research_complete": task.artifacts.has_persona_research,
            "podcast_outline_complete": task.artifacts.has_outline,
            "dialogue_script_complete": task.artifacts.has_dialogue_script,
            "individual_audio_segments_complete": task.artifacts.has_audio_segments,
            "final_podcast_audio_available": task.artifacts.has_final_audio,
            "final_podcast_transcript_available": task.artifacts.has_final_transcript,
        },
        "warnings": task.warnings,
        "error_details": task.error_message.as_ref().map(|m| serde_json::json!({ "title": "Task Failed", "detail": m })),
        "result_episode": task.result,
    })
}

async fn get_podcast_status(State(state): State<AppState>, Path(task_id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let task = state.runner().get(task_id).ok_or(ApiError::NotFound(task_id))?;
    Ok(Json(status_record(&task)))
}

async fn delete_podcast(State(state): State<AppState>, Path(task_id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    state.runner().delete(task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cancel_podcast(State(state): State<AppState>, Path(task_id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.runner().get(task_id).map(|t| !t.status.is_terminal()).unwrap_or(false) {
        return Err(ApiError::NotFound(task_id));
    }
    let cancelled = state.runner().cancel(task_id);
    Ok(Json(serde_json::json!({ "task_id": task_id, "cancel_requested": cancelled })))
}

fn completed_task_or_404(state: &AppState, task_id: Uuid) -> Result<Task, ApiError> {
    let task = state.runner().get(task_id).ok_or(ApiError::NotFound(task_id))?;
    if task.result.is_none() {
        return Err(ApiError::Conflict(format!("task {task_id} has no completed result yet")));
    }
    Ok(task)
}

async fn get_transcript(State(state): State<AppState>, Path(task_id): Path<Uuid>) -> Result<String, ApiError> {
    let task = completed_task_or_404(&state, task_id)?;
    Ok(task.result.unwrap().transcript)
}

async fn get_audio(State(state): State<AppState>, Path(task_id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    let task = completed_task_or_404(&state, task_id)?;
    let path = task.result.unwrap().audio_filepath;
    let bytes = tokio::fs::read(&path).await.map_err(|e| ApiError::Internal(format!("failed to read audio file: {e}")))?;
    let content_type = match std::path::Path::new(&path).extension().and_then(|e| e.to_str()) {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    };
    Ok(([(axum::http::header::CONTENT_TYPE, content_type)], bytes))
}

async fn get_metadata(State(state): State<AppState>, Path(task_id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let task = completed_task_or_404(&state, task_id)?;
    let episode = task.result.unwrap();
    Ok(Json(serde_json::json!({
        "title": episode.title,
        "summary": episode.summary,
        "source_attributions": episode.source_attributions,
        "warnings": episode.warnings,
    })))
}

#[derive(Debug, Deserialize)]
struct OutlineQuery {
    #[serde(default)]
    markdown: bool,
}

async fn get_outline(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Query(q): Query<OutlineQuery>,
) -> Result<String, ApiError> {
    let task = completed_task_or_404(&state, task_id)?;
    let outline_path = task
        .result
        .unwrap()
        .outline_path
        .ok_or_else(|| ApiError::NotFound(task_id))?;
    let body = tokio::fs::read_to_string(&outline_path)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to read outline: {e}")))?;
    let outline: podcast_core::PodcastOutline =
        serde_json::from_str(&body).map_err(|e| ApiError::Internal(format!("corrupt outline artifact: {e}")))?;
    Ok(outline.format_for_display(q.markdown))
}

async fn get_research(
    State(state): State<AppState>,
    Path((task_id, person_id)): Path<(Uuid, String)>,
) -> Result<Json<podcast_core::PersonaResearch>, ApiError> {
    let task = completed_task_or_404(&state, task_id)?;
    for path in &task.result.unwrap().persona_research_paths {
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to read persona research: {e}")))?;
        let persona: podcast_core::PersonaResearch =
            serde_json::from_str(&body).map_err(|e| ApiError::Internal(format!("corrupt persona artifact: {e}")))?;
        if persona.person_id == person_id {
            return Ok(Json(persona));
        }
    }
    Err(ApiError::NotFound(task_id))
}

/// No structured log history is retained beyond the current status
/// message; this synthesizes a single-entry log until a ring-buffer of
/// phase transitions is added.
async fn get_logs(State(state): State<AppState>, Path(task_id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let task = state.runner().get(task_id).ok_or(ApiError::NotFound(task_id))?;
    Ok(Json(serde_json::json!({
        "logs": [{
            "timestamp": task.updated_at,
            "status": task.status,
            "message": task.status_message,
        }]
    })))
}

async fn get_warnings(State(state): State<AppState>, Path(task_id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let task = state.runner().get(task_id).ok_or(ApiError::NotFound(task_id))?;
    Ok(Json(serde_json::json!({ "warnings": task.warnings })))
}

async fn get_cleanup_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    Json(serde_json::json!({
        "default_policy": config.cleanup_default_policy,
        "policy_set": ["manual", "auto_after_hours", "auto_after_days", "retain_audio_only", "on_completion"],
    }))
}

async fn get_input_types() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "supported_input_types": ["source_urls", "source_text", "source_pdf_path"] }))
}

async fn get_limits(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    Json(serde_json::json!({
        "task_workers": config.workers.task_workers,
        "tts_workers": config.workers.tts_workers,
        "llm_workers": config.workers.llm_workers,
        "llm_short_timeout_secs": config.llm.short_timeout_secs,
        "llm_long_timeout_secs": config.llm.long_timeout_secs,
        "webhook_max_retries": config.webhook.max_retries,
    }))
}

#[derive(Debug, Deserialize, Default)]
struct CleanupRequest {
    #[serde(default)]
    policy: Option<podcast_config::CleanupPolicy>,
    #[serde(default)]
    retention: Option<RetentionFlags>,
}

async fn apply_cleanup(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(body): Json<CleanupRequest>,
) -> Result<Json<CleanupReport>, ApiError> {
    let policy = body.policy.unwrap_or(state.config().cleanup_default_policy);
    let retention = body.retention.unwrap_or_default();
    let report = state.runner().cleanup_task(task_id, policy, retention).await?;
    crate::metrics::record_cleanup(report.total_size_freed);
    Ok(Json(report))
}

/// POST /admin/reload-config — reloads settings from disk without a
/// restart. Some fields (CORS, worker pool sizes) only take effect at
/// `Runner` construction and are unaffected by a reload.
async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_config() {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "success" }))),
        Err(e) => {
            tracing::error!(error = %e, "config reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "status": "error", "message": e })))
        }
    }
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let queue = state.runner().queue_status();
    crate::metrics::record_queue_depth(queue.active, queue.max);
    let healthy = queue.active <= queue.max;
    let status_code = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status_code,
        Json(serde_json::json!({
            "status": if healthy { "healthy" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "queue": queue,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_cors_is_permissive() {
        let _ = build_cors_layer(&[], false);
    }

    #[test]
    fn empty_origins_falls_back_to_localhost() {
        let _ = build_cors_layer(&[], true);
    }

    #[test]
    fn invalid_origins_are_filtered_out() {
        let _ = build_cors_layer(&["not a valid header value \n".to_string()], true);
    }

    #[test]
    fn status_record_reports_no_final_audio_until_result_is_set() {
        use podcast_core::{PodcastRequest, Task};
        use std::collections::HashMap;

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
        let task = Task::new(Uuid::new_v4(), request, chrono::Utc::now());
        let record = status_record(&task);
        assert_eq!(record["artifacts"]["final_podcast_audio_available"], false);
        assert_eq!(record["result_episode"], serde_json::Value::Null);
    }
}
