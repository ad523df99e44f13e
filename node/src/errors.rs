// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use graffiti_kernel::error::KernelError;
use graffiti_kernel::Stamp;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Storage error: {0}")]
    Storage(String),
    /// Another writer holds the slot this session just wrote.
    #[error("Write collision at index {index}: expected {expected:?}, found {found:?}")]
    Collision {
        index: u64,
        expected: Stamp,
        found: Option<Stamp>,
    },
    /// The read-back found nothing: the upload itself did not land.
    #[error("Write at index {index} is not visible on read-back")]
    WriteNotVisible { index: u64 },
    #[error("Gave up after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: Box<EngineError> },
    #[error("Critical: {0}")]
    Critical(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Engine is not running")]
    NotRunning,
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn is_collision(&self) -> bool {
        matches!(self, EngineError::Collision { .. })
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::Kernel(KernelError::SignatureMismatch)
            | EngineError::Kernel(KernelError::AuthorMismatch { .. })
            | EngineError::Kernel(KernelError::MalformedSignature(_))
            | EngineError::Unauthorized => StatusCode::UNAUTHORIZED,
            EngineError::Kernel(_) | EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EngineError::Collision { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
