//! Maps `podcast-core`/`podcast-runner` errors onto the HTTP status codes
//! spec.md §6 assigns them: capacity -> 429, validation -> 400,
//! not-found -> 404, conflict (e.g. cancelling a terminal task) -> 400.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

#[derive(Debug)]
pub enum ApiError {
    NotFound(Uuid),
    Validation(String),
    Conflict(String),
    AtCapacity,
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::AtCapacity => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::NotFound(id) => format!("task not found: {id}"),
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::AtCapacity => "task runner at capacity".to_string(),
            ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.message() }));
        tracing::warn!(status = %status, error = %self.message(), "request failed");
        (status, body).into_response()
    }
}

impl From<podcast_core::Error> for ApiError {
    fn from(err: podcast_core::Error) -> Self {
        match err {
            podcast_core::Error::NotFound(id) => ApiError::NotFound(id),
            podcast_core::Error::AtCapacity => ApiError::AtCapacity,
            podcast_core::Error::Configuration(msg) => ApiError::Validation(msg),
            podcast_core::Error::InvalidTransition { from, to } => {
                ApiError::Conflict(format!("cannot transition from {from} to {to}"))
            }
            podcast_core::Error::Cancelled(id) => ApiError::Conflict(format!("task {id} was cancelled")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<podcast_runner::RunnerError> for ApiError {
    fn from(err: podcast_runner::RunnerError) -> Self {
        match err {
            podcast_runner::RunnerError::AtCapacity => ApiError::AtCapacity,
            podcast_runner::RunnerError::NotTracked(id) => ApiError::NotFound(id),
            podcast_runner::RunnerError::Core(inner) => inner.into(),
        }
    }
}
