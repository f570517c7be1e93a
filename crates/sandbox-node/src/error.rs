use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sandbox_core::SandboxError;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session `{0}` not found")]
    SessionNotFound(String),

    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("session limit of {0} reached")]
    TooManySessions(usize),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) | ApiError::BlockNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManySessions(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Sandbox(e) => match e {
                SandboxError::InvalidDifficulty { .. } | SandboxError::InvalidTimestampMode(_) => {
                    StatusCode::BAD_REQUEST
                }
                SandboxError::BlockOutOfRange { .. } | SandboxError::UnknownJob(_) => {
                    StatusCode::NOT_FOUND
                }
                SandboxError::Cancelled | SandboxError::Stale => StatusCode::CONFLICT,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(%status, error = %self, "request failed");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
