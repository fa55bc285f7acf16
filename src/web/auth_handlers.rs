// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{AdminRegister, LecturerRegister, LoginForm, StudentRegister, User},
    services::{auth_service, user_service},
    state::AppState,
    web::mw_auth::CurrentUser,
};
use axum::{
    extract::{Extension, Json, State},
    response::IntoResponse,
};
use serde_json::json;
use tower_sessions::Session;

fn account_response(user: &User) -> Json<serde_json::Value> {
    Json(json!({
        "id": user.id,
        "email": user.email,
        "role": user.role,
    }))
}

// POST /api/auth/register-student
pub async fn register_student(
    State(state): State<AppState>,
    Json(payload): Json<StudentRegister>,
) -> AppResult<impl IntoResponse> {
    let user = user_service::register_student(&state.db_pool, payload).await?;
    Ok(account_response(&user))
}

// POST /api/auth/register-lecturer
pub async fn register_lecturer(
    State(state): State<AppState>,
    Json(payload): Json<LecturerRegister>,
) -> AppResult<impl IntoResponse> {
    let user = user_service::register_lecturer(&state.db_pool, payload).await?;
    Ok(account_response(&user))
}

// POST /api/auth/register-admin
pub async fn register_admin(
    State(state): State<AppState>,
    Json(payload): Json<AdminRegister>,
) -> AppResult<impl IntoResponse> {
    let user = user_service::register_admin(&state.db_pool, payload).await?;
    Ok(account_response(&user))
}

// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("Login attempt for: {}", form.email);

    // 1. Look the account up; a missing account and a wrong password must be
    //    indistinguishable to the caller.
    let Some(user) = user_service::find_user_by_email(&state.db_pool, &form.email).await? else {
        tracing::warn!("Login failed: unknown email {}", form.email);
        return Err(AppError::InvalidCredentials);
    };

    // 2. Verify the password.
    if !auth_service::verify_password(&form.password, &user.password_hash).await? {
        tracing::warn!("Login failed: wrong password for {}", form.email);
        return Err(AppError::InvalidCredentials);
    }

    // 3. Authenticate the session under a fresh id.
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Session(format!("failed to cycle session id: {}", e)))?;
    session
        .insert("user_id", &user.id)
        .await
        .map_err(|e| AppError::Session(format!("failed to write session: {}", e)))?;

    tracing::info!("✅ Login successful for {} ({})", user.email, user.role);
    Ok(account_response(&user))
}

// GET /api/auth/logout
pub async fn logout(session: Session) -> AppResult<impl IntoResponse> {
    session
        .delete()
        .await
        .map_err(|e| AppError::Session(format!("failed to delete session: {}", e)))?;
    tracing::info!("🚪 Session logged out.");
    Ok(Json(json!({ "message": "logged out" })))
}

// GET /api/auth/me
pub async fn me(Extension(current): Extension<CurrentUser>) -> impl IntoResponse {
    Json(json!({
        "id": current.id,
        "email": current.email,
        "role": current.role,
    }))
}
