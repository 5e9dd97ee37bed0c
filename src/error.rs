use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A backing-store error.
    #[error("Store error: {0}")]
    Store(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A token signing or decoding error.
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Missing or invalid credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The caller's identity does not own the resource or lacks the role.
    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    /// A resource not found error.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An open work session already exists for today.
    #[error("An open work session already exists for today")]
    DuplicateClockIn,

    /// No open work session exists for today.
    #[error("No open work session found for today")]
    NoOpenSession,

    /// A routine was submitted without any task.
    #[error("A routine needs at least one task")]
    EmptyTaskList,

    /// The row changed between read and write.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// The stable, machine-readable kind reported to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Store(_) | AppError::Pool(_) => "store_error",
            AppError::Token(_) | AppError::Internal(_) => "internal_error",
            AppError::Authentication(_) => "authentication_error",
            AppError::Unauthorized(_) => "authorization_error",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::DuplicateClockIn => "duplicate_clock_in",
            AppError::NoOpenSession => "no_open_session",
            AppError::EmptyTaskList => "empty_task_list",
            AppError::ConcurrentModification(_) => "concurrent_modification",
        }
    }
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        AppError::Validation(report.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Store(ref e) => {
                tracing::error!("Store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable".to_string())
            }

            AppError::Token(ref e) => {
                tracing::error!("Token error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::Unauthorized(ref msg) => {
                tracing::warn!("Authorization failed: {}", msg);
                (StatusCode::FORBIDDEN, msg.clone())
            }

            AppError::NotFound(_) => {
                tracing::debug!("{}", self);
                (StatusCode::NOT_FOUND, self.to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::EmptyTaskList => {
                tracing::debug!("{}", self);
                (StatusCode::BAD_REQUEST, self.to_string())
            }

            AppError::DuplicateClockIn | AppError::NoOpenSession => {
                tracing::warn!("{}", self);
                (StatusCode::CONFLICT, self.to_string())
            }

            AppError::ConcurrentModification(ref msg) => {
                tracing::warn!("Concurrent modification: {}", msg);
                (StatusCode::CONFLICT, msg.clone())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message,
            "kind": self.kind(),
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error","kind":"internal_error"}"#.to_string());

        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}
