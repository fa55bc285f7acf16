// src/services/supervisor_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        thesis::{SuperviseeRow, SupervisorAssignment, SupervisorRow},
        user::Role,
    },
    services::user_service,
};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Link a lecturer (looked up by email) to a student. Calling this again for
/// the same pair is a no-op success; a (lecturer, student) pair can never
/// appear twice.
pub async fn add_supervisor(
    pool: &SqlitePool,
    student_id: &str,
    lecturer_email: &str,
) -> AppResult<SupervisorAssignment> {
    let lecturer = user_service::find_user_by_email(pool, lecturer_email.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("lecturer".to_string()))?;

    if lecturer.role != Role::Lecturer {
        tracing::warn!(
            "Supervisor add rejected: '{}' is a {} account, not a lecturer.",
            lecturer.email,
            lecturer.role
        );
        return Err(AppError::Validation("email is not a lecturer account".to_string()));
    }

    // INSERT OR IGNORE leans on the UNIQUE(lecturer_id, student_id)
    // constraint, so concurrent first adds cannot race into a duplicate.
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT OR IGNORE INTO supervisor_assignments (id, lecturer_id, student_id, role_main)
         VALUES (?1, ?2, ?3, 1)",
    )
    .bind(&id)
    .bind(&lecturer.id)
    .bind(student_id)
    .execute(pool)
    .await?;

    // Read back whichever row won (ours or a pre-existing one).
    let assignment = sqlx::query_as::<_, SupervisorAssignment>(
        "SELECT id, lecturer_id, student_id, role_main FROM supervisor_assignments
         WHERE lecturer_id = ?1 AND student_id = ?2",
    )
    .bind(&lecturer.id)
    .bind(student_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        "Supervisor link ensured: lecturer {} ↔ student {}",
        lecturer.email,
        student_id
    );
    Ok(assignment)
}

/// Supervisors of one student, with lecturer display data.
pub async fn list_supervisors_of(pool: &SqlitePool, student_id: &str) -> AppResult<Vec<SupervisorRow>> {
    let rows = sqlx::query_as::<_, SupervisorRow>(
        "SELECT sa.lecturer_id, u.email, p.name, p.department, sa.role_main
         FROM supervisor_assignments sa
         JOIN users u ON u.id = sa.lecturer_id
         LEFT JOIN lecturer_profiles p ON p.user_id = sa.lecturer_id
         WHERE sa.student_id = ?1
         ORDER BY u.email ASC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Supervisees of one lecturer, each with how many theses they have submitted.
pub async fn list_supervisees_of(pool: &SqlitePool, lecturer_id: &str) -> AppResult<Vec<SuperviseeRow>> {
    let rows = sqlx::query_as::<_, SuperviseeRow>(
        "SELECT sa.student_id, u.email, p.name, sa.role_main,
                (SELECT COUNT(*) FROM theses t WHERE t.student_id = sa.student_id) AS submission_count
         FROM supervisor_assignments sa
         JOIN users u ON u.id = sa.student_id
         LEFT JOIN student_profiles p ON p.user_id = sa.student_id
         WHERE sa.lecturer_id = ?1
         ORDER BY u.email ASC",
    )
    .bind(lecturer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Every thesis submitted by any supervisee of this lecturer.
pub async fn list_supervisee_theses(
    pool: &SqlitePool,
    lecturer_id: &str,
) -> AppResult<Vec<crate::models::thesis::SubmissionRow>> {
    let rows = sqlx::query_as::<_, crate::models::thesis::SubmissionRow>(
        "SELECT t.id AS thesis_id, t.student_id, u.email AS student_email, p.name AS student_name,
                t.title, t.current_status, t.submitted_at
         FROM supervisor_assignments sa
         JOIN theses t ON t.student_id = sa.student_id
         JOIN users u ON u.id = t.student_id
         LEFT JOIN student_profiles p ON p.user_id = t.student_id
         WHERE sa.lecturer_id = ?1
         ORDER BY t.submitted_at ASC",
    )
    .bind(lecturer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Does this lecturer supervise this student?
pub async fn is_supervising(pool: &SqlitePool, lecturer_id: &str, student_id: &str) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM supervisor_assignments WHERE lecturer_id = ?1 AND student_id = ?2)",
    )
    .bind(lecturer_id)
    .bind(student_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}
