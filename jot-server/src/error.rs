//! Error types for jot-server
//!
//! Every error response body is `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm::LlmError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// jot-common error
    #[error(transparent)]
    Common(#[from] jot_common::Error),

    /// LLM call failed or is unavailable
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Common(err) => match err {
                jot_common::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                jot_common::Error::NoteNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Llm(err) => match err {
                LlmError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                LlmError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Message shown to clients; validation errors are shown without their category prefix
    fn message(&self) -> String {
        match self {
            ApiError::Common(jot_common::Error::InvalidInput(msg)) => msg.clone(),
            ApiError::Common(jot_common::Error::NoteNotFound(_)) => "Note not found".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", message);
        }

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
