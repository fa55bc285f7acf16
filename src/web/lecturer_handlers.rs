// src/web/lecturer_handlers.rs
//
// Lecturer portal: read-only visibility into supervisees and their theses.
// Lecturers do not decide anything in the current flow; the supervisor stage
// is legacy.
use crate::{
    error::{AppError, AppResult},
    services::{supervisor_service, thesis_service},
    state::AppState,
    web::mw_auth::CurrentUser,
};
use axum::{
    extract::{Extension, Json, Path, State},
    response::IntoResponse,
};

/// GET /api/lecturers/my-supervisees — students supervised by the caller,
/// with their submission counts.
pub async fn my_supervisees(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let supervisees = supervisor_service::list_supervisees_of(&state.db_pool, &current.id).await?;
    Ok(Json(supervisees))
}

/// GET /api/lecturers/theses — every thesis submitted by a supervisee.
pub async fn supervisee_theses(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let theses = supervisor_service::list_supervisee_theses(&state.db_pool, &current.id).await?;
    Ok(Json(theses))
}

/// GET /api/lecturers/theses/{id}/feedback — checklist + decision history
/// for a supervisee's thesis; rejected when the caller does not supervise
/// that student.
pub async fn thesis_feedback(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(thesis_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let thesis = thesis_service::require_thesis(&state.db_pool, &thesis_id).await?;

    let supervising =
        supervisor_service::is_supervising(&state.db_pool, &current.id, &thesis.student_id).await?;
    if !supervising {
        return Err(AppError::Forbidden("you are not supervising this student".to_string()));
    }

    let feedback = thesis_service::feedback(&state.db_pool, &thesis_id).await?;
    Ok(Json(feedback))
}
