use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::engine::RoundError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Round(RoundError),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RoundError> for AppError {
    fn from(err: RoundError) -> Self {
        match err {
            RoundError::Storage(e) => AppError::Internal(e.to_string()),
            RoundError::Directory(e) => AppError::Internal(e.to_string()),
            other => AppError::Round(other),
        }
    }
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "unauthorized"),
            AppError::Round(err) => {
                let status = match err {
                    RoundError::NotFound { .. } => StatusCode::NOT_FOUND,
                    RoundError::Unauthorized(_) | RoundError::NotLockedManager { .. } => {
                        StatusCode::FORBIDDEN
                    }
                    RoundError::InvalidPrice(_) => StatusCode::BAD_REQUEST,
                    RoundError::Storage(_) | RoundError::Directory(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                    RoundError::NoManager(_)
                    | RoundError::EmptyCatalog(_)
                    | RoundError::RoundClosed(_)
                    | RoundError::OutsideWindow { .. }
                    | RoundError::ProductNotInRound { .. }
                    | RoundError::DuplicateDate { .. }
                    | RoundError::DataExists { .. } => StatusCode::CONFLICT,
                };
                (status, err.kind())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let error_message = match &self {
            AppError::Round(err) => err.to_string(),
            AppError::Internal(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Forbidden(msg) => msg.clone(),
        };

        if status.is_server_error() {
            tracing::error!(error = %error_message, "request failed");
        }

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}
