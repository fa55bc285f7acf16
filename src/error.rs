// src/error.rs
use crate::models::thesis::ThesisStatus;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("database migration error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),

    #[error("environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    // Malformed or missing required input (blank title, unknown decision
    // token, non-lecturer email target, duplicate registration email).
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    // Operation not legal in the thesis's current status. Reports the actual
    // status so the caller can correct itself.
    #[error("cannot {attempted}: thesis is currently {current}")]
    InvalidState {
        attempted: &'static str,
        current: ThesisStatus,
    },

    // Lost update detected at commit time: another request moved the thesis
    // between our read and our write.
    #[error("concurrent update detected: {0}")]
    Conflict(String),

    #[error("error processing password")]
    PasswordHashing,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("session error: {0}")]
    Session(String),

    #[error("not authenticated")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("unexpected internal error")]
    InternalServerError,
}

// How an AppError turns into an HTTP response: a JSON body with the error
// message and a status code per category.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Full details go to the server log, not to the client.
        tracing::error!("request failed: {:?}", self);

        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            AppError::InvalidState { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidCredentials => {
                // Generic message on purpose: do not reveal which part failed.
                (StatusCode::UNAUTHORIZED, "invalid email or password".to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "not authenticated".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Sqlx(_) | AppError::SqlxMigrate(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "error accessing data".to_string())
            }
            AppError::EnvVar(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration error".to_string())
            }
            AppError::Storage(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "file storage failed".to_string())
            }
            AppError::PasswordHashing => {
                (StatusCode::INTERNAL_SERVER_ERROR, "error processing credentials".to_string())
            }
            AppError::Session(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "session handling failed".to_string())
            }
            AppError::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "an unexpected error occurred".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// Standard Result type for the application.
pub type AppResult<T = ()> = Result<T, AppError>;
