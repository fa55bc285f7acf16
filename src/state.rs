// src/state.rs
use crate::services::storage_service::StorageService;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub storage: StorageService,
}

// Allows extracting the pool directly in handlers that only need the db.
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for StorageService {
    fn from_ref(state: &AppState) -> StorageService {
        state.storage.clone()
    }
}
