//! Error handling for the API
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::srs::ClockError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    StoreError(StoreError),
    ClockError(ClockError),
    HTTPError(axum::http::Error),
    InvalidGrade(i32),
    MalformedGrade(String),
    InvalidCard(String),
    InvalidBackup(String),
    SessionNotFound,
    SessionExhausted,
    Internal(anyhow::Error),
}

fn error_body(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(serde_json::json!({"status": "error", "message": message})),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::StoreError(StoreError::NotFound(id)) => {
                error_body(StatusCode::NOT_FOUND, format!("Card {id} not found"))
            }
            Self::StoreError(e @ StoreError::DuplicateId(_)) => {
                error_body(StatusCode::BAD_REQUEST, format!("Invalid cards: {e}"))
            }
            Self::StoreError(e) => {
                error!("Card store failure: {}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, format!("Store error: {e}"))
            }
            Self::ClockError(e) => {
                error!("Clock unavailable: {}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, format!("Clock error: {e}"))
            }
            Self::HTTPError(e) => {
                error_body(StatusCode::INTERNAL_SERVER_ERROR, format!("HTTP error: {e}"))
            }
            Self::InvalidGrade(grade) => error_body(
                StatusCode::BAD_REQUEST,
                format!("Grade must be between 0 and 5, got {grade}"),
            ),
            Self::MalformedGrade(msg) => {
                error_body(StatusCode::BAD_REQUEST, format!("Invalid grade request: {msg}"))
            }
            Self::InvalidCard(msg) => {
                error_body(StatusCode::BAD_REQUEST, format!("Invalid card: {msg}"))
            }
            Self::InvalidBackup(msg) => {
                error_body(StatusCode::BAD_REQUEST, format!("Invalid backup: {msg}"))
            }
            Self::SessionNotFound => {
                error_body(StatusCode::NOT_FOUND, "Review session not found".to_string())
            }
            Self::SessionExhausted => error_body(
                StatusCode::CONFLICT,
                "Review session has no cards left".to_string(),
            ),
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::StoreError(e)
    }
}

impl From<ClockError> for ApiError {
    fn from(e: ClockError) -> Self {
        Self::ClockError(e)
    }
}

impl From<axum::http::Error> for ApiError {
    fn from(e: axum::http::Error) -> Self {
        Self::HTTPError(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}
