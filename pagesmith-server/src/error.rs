use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pagesmith_core::{MediaError, PathError, ScanError, StoreError};
use serde_json::json;

/// Error half of every handler. Serialized as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// The detail is logged, never sent to the client.
    Internal(String),
}

impl ApiError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(message) | ApiError::NotFound(message) => message,
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<PathError> for ApiError {
    fn from(err: PathError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Path(e) => e.into(),
            StoreError::NotFound(_) => ApiError::NotFound("Page not found.".to_string()),
            StoreError::AlreadyExists(_) => {
                ApiError::BadRequest("New page path already exists.".to_string())
            }
            e @ StoreError::IntoItself { .. } => ApiError::BadRequest(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Path(e) => e.into(),
            MediaError::Empty => ApiError::BadRequest("No file uploaded.".to_string()),
            MediaError::NotFound(name) => ApiError::NotFound(format!("File doesn't exist: {name}")),
            e @ MediaError::Io(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker task failed: {err}"))
    }
}
