// src/services/auth_service.rs
use crate::error::{AppError, AppResult};

// bcrypt is CPU-bound, so both operations run on the blocking pool instead
// of stalling the async runtime.

/// Check a candidate password against a stored bcrypt hash.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &stored_hash))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking failed (verify_password): {:?}", e);
            AppError::InternalServerError
        })?
        .map_err(|e| {
            tracing::error!("bcrypt verify failed: {:?}", e);
            AppError::PasswordHashing
        })
}

/// Hash a raw password for storage.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking failed (hash_password): {:?}", e);
            AppError::InternalServerError
        })?
        .map_err(|e| {
            tracing::error!("bcrypt hash failed: {:?}", e);
            AppError::PasswordHashing
        })
}
