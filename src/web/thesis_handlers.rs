// src/web/thesis_handlers.rs
//
// Student portal: submitting thesis attempts, reading feedback, and managing
// supervisor links. All routes here sit behind require_auth + require_student.
use crate::{
    error::{AppError, AppResult},
    models::thesis::SubmitMeta,
    services::{supervisor_service, thesis_service, user_service},
    state::AppState,
    web::mw_auth::CurrentUser,
};
use axum::{
    extract::{Extension, Json, Multipart, Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct AddSupervisorRequest {
    pub email: String,
}

/// GET /api/theses/mine — the student's own submissions, every attempt.
pub async fn mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let theses = thesis_service::list_by_student(&state.db_pool, &current.id).await?;
    Ok(Json(theses))
}

/// POST /api/theses — submit a new attempt.
///
/// Multipart body with two parts: "meta" (JSON: title, abstract_text,
/// keywords, faculty, major) and "file" (the PDF bytes).
pub async fn submit(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut meta: Option<SubmitMeta> = None;
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "meta" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable meta part: {}", e)))?;
                meta = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| AppError::Validation(format!("invalid meta JSON: {}", e)))?,
                );
            }
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable file part: {}", e)))?;
                file_bytes = Some(bytes.to_vec());
            }
            other => {
                tracing::debug!("Ignoring unexpected multipart part '{}'", other);
            }
        }
    }

    let meta = meta.ok_or_else(|| AppError::Validation("meta part is required".to_string()))?;
    let file_bytes =
        file_bytes.ok_or_else(|| AppError::Validation("PDF file is required".to_string()))?;

    let thesis =
        thesis_service::submit_thesis(&state.db_pool, &state.storage, &current.id, meta, &file_bytes)
            .await?;

    Ok(Json(json!({
        "id": thesis.id,
        "status": thesis.current_status,
        "file": thesis.file_path,
    })))
}

/// GET /api/theses/{id}/feedback — checklist + decision history, owner only.
pub async fn feedback(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(thesis_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let thesis = thesis_service::require_thesis(&state.db_pool, &thesis_id).await?;
    if thesis.student_id != current.id {
        return Err(AppError::Forbidden("not your thesis".to_string()));
    }

    let feedback = thesis_service::feedback(&state.db_pool, &thesis_id).await?;
    Ok(Json(feedback))
}

/// GET /api/theses/lecturers — lecturer directory for the supervisor dropdown.
pub async fn list_lecturers(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let lecturers = user_service::list_lecturers(&state.db_pool).await?;
    Ok(Json(lecturers))
}

/// GET /api/theses/supervisors — the student's current supervisors.
pub async fn my_supervisors(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let supervisors = supervisor_service::list_supervisors_of(&state.db_pool, &current.id).await?;
    Ok(Json(supervisors))
}

/// POST /api/theses/supervisors — add a lecturer (by email) as supervisor.
/// Re-adding the same lecturer is a no-op success.
pub async fn add_supervisor(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<AddSupervisorRequest>,
) -> AppResult<impl IntoResponse> {
    let assignment =
        supervisor_service::add_supervisor(&state.db_pool, &current.id, &payload.email).await?;

    Ok(Json(json!({
        "lecturer_id": assignment.lecturer_id,
        "student_id": assignment.student_id,
        "role_main": assignment.role_main,
    })))
}
