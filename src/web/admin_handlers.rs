// src/web/admin_handlers.rs
//
// Library reviewer portal: the review queue, the checklist, decisions and
// publication, plus account lookups for verification.
use crate::{
    error::{AppError, AppResult},
    models::{
        checklist::ChecklistPayload,
        thesis::{DecisionPayload, ThesisStatus},
    },
    services::{checklist_service, thesis_service, user_service},
    state::AppState,
    web::mw_auth::CurrentUser,
};
use axum::{
    extract::{Extension, Json, Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StudentFilter {
    pub email: Option<String>,
    pub student_number: Option<String>,
}

/// GET /api/admin/theses?status=LIBRARY_REVIEW — the queue, optionally
/// narrowed to one status.
pub async fn list_theses(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> AppResult<impl IntoResponse> {
    let status = match filter.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(ThesisStatus::parse(raw).ok_or_else(|| {
            AppError::Validation(format!("unknown thesis status '{}'", raw))
        })?),
    };

    let theses = thesis_service::list_by_status(&state.db_pool, status).await?;
    Ok(Json(theses))
}

/// GET /api/admin/submissions — queue rows with student identity attached.
pub async fn list_submissions(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = thesis_service::list_submissions(&state.db_pool).await?;
    Ok(Json(rows))
}

/// GET /api/admin/theses/{id}/checklist — currently ticked keys, so the UI
/// can pre-fill.
pub async fn get_checklist(
    State(state): State<AppState>,
    Path(thesis_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let checked = checklist_service::get_checked(&state.db_pool, &thesis_id).await?;
    Ok(Json(json!({ "thesis_id": thesis_id, "checked": checked })))
}

/// POST /api/admin/theses/{id}/checklist — save ticks.
///
/// Accepts either {"keys": [...], "replace": bool} or
/// {"selections": [{"key","label","category"}, ...], "replace": bool};
/// unknown keys in selections are created in the catalog on first use.
pub async fn save_checklist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(thesis_id): Path<String>,
    Json(payload): Json<ChecklistPayload>,
) -> AppResult<impl IntoResponse> {
    let replace = payload.replace;
    let selections = payload.into_selections();

    let checked =
        checklist_service::apply(&state.db_pool, &thesis_id, &current.id, &selections, replace)
            .await?;
    Ok(Json(json!({ "thesis_id": thesis_id, "checked": checked })))
}

/// POST /api/admin/theses/{id}/decision — approve or request revisions.
pub async fn decision(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(thesis_id): Path<String>,
    Json(payload): Json<DecisionPayload>,
) -> AppResult<impl IntoResponse> {
    let outcome = thesis_service::decide(
        &state.db_pool,
        &thesis_id,
        &current.id,
        &payload.status,
        payload.notes,
    )
    .await?;

    Ok(Json(json!({
        "thesis_id": outcome.thesis.id,
        "status": outcome.thesis.current_status,
    })))
}

/// POST /api/admin/theses/{id}/publish — move an APPROVED thesis into the
/// public repository.
pub async fn publish(
    State(state): State<AppState>,
    Path(thesis_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let thesis = thesis_service::publish(&state.db_pool, &thesis_id).await?;

    Ok(Json(json!({
        "thesis_id": thesis.id,
        "status": thesis.current_status,
        "published_at": thesis.published_at,
        "year_published": thesis.year_published,
    })))
}

/// GET /api/admin/students — list/search student accounts.
pub async fn list_students(
    State(state): State<AppState>,
    Query(filter): Query<StudentFilter>,
) -> AppResult<impl IntoResponse> {
    let students = user_service::list_students(
        &state.db_pool,
        filter.email.as_deref(),
        filter.student_number.as_deref(),
    )
    .await?;
    Ok(Json(students))
}

/// GET /api/admin/lecturers — all lecturer accounts.
pub async fn list_lecturers(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let lecturers = user_service::list_lecturers(&state.db_pool).await?;
    Ok(Json(lecturers))
}
