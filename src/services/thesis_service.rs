// src/services/thesis_service.rs
//
// The review/publication workflow engine. Every mutating operation here is
// one transaction: the status transition and its matching ledger row commit
// together or not at all.
use crate::{
    error::{AppError, AppResult},
    models::{
        checklist::ChecklistFeedbackRow,
        thesis::{
            Approval, ApprovalStatus, Decision, Stage, SubmissionRow, SubmitMeta, Thesis,
            ThesisStatus,
        },
    },
    services::{checklist_service, storage_service::StorageService},
};
use chrono::{Datelike, Utc};
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

const THESIS_COLUMNS: &str = "id, student_id, title, abstract_text, keywords, faculty, major, \
     file_path, submitted_at, published_at, year_published, current_status";

/// Result of a reviewer decision: the thesis after the transition plus the
/// ledger row that was appended for it.
#[derive(Debug, Serialize)]
pub struct DecisionOutcome {
    pub thesis: Thesis,
    pub approval: Approval,
}

/// Feedback bundle shown to the student (and to supervising lecturers).
#[derive(Debug, Serialize)]
pub struct ThesisFeedback {
    pub thesis_id: String,
    pub title: String,
    pub current_status: ThesisStatus,
    pub checklist: Vec<ChecklistFeedbackRow>,
    pub approvals: Vec<Approval>,
}

// --- Lookups ---

pub async fn find_thesis(pool: &SqlitePool, thesis_id: &str) -> AppResult<Option<Thesis>> {
    let thesis = sqlx::query_as::<_, Thesis>(&format!(
        "SELECT {} FROM theses WHERE id = ?1",
        THESIS_COLUMNS
    ))
    .bind(thesis_id)
    .fetch_optional(pool)
    .await?;
    Ok(thesis)
}

pub async fn require_thesis(pool: &SqlitePool, thesis_id: &str) -> AppResult<Thesis> {
    find_thesis(pool, thesis_id)
        .await?
        .ok_or_else(|| AppError::NotFound("thesis".to_string()))
}

/// All attempts of one student, newest first.
pub async fn list_by_student(pool: &SqlitePool, student_id: &str) -> AppResult<Vec<Thesis>> {
    let theses = sqlx::query_as::<_, Thesis>(&format!(
        "SELECT {} FROM theses WHERE student_id = ?1 ORDER BY submitted_at DESC",
        THESIS_COLUMNS
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    Ok(theses)
}

/// All theses, optionally narrowed to one status (admin queue view).
pub async fn list_by_status(pool: &SqlitePool, status: Option<ThesisStatus>) -> AppResult<Vec<Thesis>> {
    let theses = match status {
        Some(status) => {
            sqlx::query_as::<_, Thesis>(&format!(
                "SELECT {} FROM theses WHERE current_status = ?1 ORDER BY submitted_at ASC",
                THESIS_COLUMNS
            ))
            .bind(status)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Thesis>(&format!(
                "SELECT {} FROM theses ORDER BY submitted_at ASC",
                THESIS_COLUMNS
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(theses)
}

/// Review-queue rows with the submitting student's identity attached.
pub async fn list_submissions(pool: &SqlitePool) -> AppResult<Vec<SubmissionRow>> {
    let rows = sqlx::query_as::<_, SubmissionRow>(
        "SELECT t.id AS thesis_id, t.student_id, u.email AS student_email, p.name AS student_name,
                t.title, t.current_status, t.submitted_at
         FROM theses t
         JOIN users u ON u.id = t.student_id
         LEFT JOIN student_profiles p ON p.user_id = t.student_id
         ORDER BY t.submitted_at ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// --- Submission ---

/// Create a new thesis attempt for a student. The file goes to the storage
/// collaborator first; the row is inserted with the returned locator and
/// lands directly in the library review queue.
pub async fn submit_thesis(
    pool: &SqlitePool,
    storage: &StorageService,
    student_id: &str,
    meta: SubmitMeta,
    file_bytes: &[u8],
) -> AppResult<Thesis> {
    // Both preconditions are checked before anything is stored.
    if meta.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if file_bytes.is_empty() {
        return Err(AppError::Validation("PDF file is required".to_string()));
    }

    let now = Utc::now();
    let object_key = format!("{}/{}.pdf", now.format("%Y-%m"), Uuid::new_v4());
    let locator = storage.store(file_bytes, &object_key).await?;

    let thesis = Thesis {
        id: Uuid::new_v4().to_string(),
        student_id: student_id.to_string(),
        title: meta.title.trim().to_string(),
        abstract_text: meta.abstract_text,
        keywords: meta.keywords,
        faculty: meta.faculty,
        major: meta.major,
        file_path: locator,
        submitted_at: now,
        published_at: None,
        year_published: None,
        current_status: ThesisStatus::LibraryReview,
    };

    sqlx::query(
        "INSERT INTO theses (id, student_id, title, abstract_text, keywords, faculty, major,
                             file_path, submitted_at, published_at, year_published, current_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )
    .bind(&thesis.id)
    .bind(&thesis.student_id)
    .bind(&thesis.title)
    .bind(&thesis.abstract_text)
    .bind(&thesis.keywords)
    .bind(&thesis.faculty)
    .bind(&thesis.major)
    .bind(&thesis.file_path)
    .bind(thesis.submitted_at)
    .bind(thesis.published_at)
    .bind(thesis.year_published)
    .bind(thesis.current_status)
    .execute(pool)
    .await?;

    tracing::info!(
        "📄 Thesis {} submitted by student {} → {}",
        thesis.id,
        student_id,
        thesis.current_status
    );
    Ok(thesis)
}

// --- Decisions ---

/// Record a library reviewer's decision on a thesis.
///
/// The token is parsed against the fixed mapping table before anything is
/// touched; an unknown token mutates nothing. The status transition uses a
/// compare-and-set against the status we just read, so a concurrent decision
/// on the same thesis surfaces as a conflict instead of a lost update.
pub async fn decide(
    pool: &SqlitePool,
    thesis_id: &str,
    reviewer_id: &str,
    token: &str,
    notes: Option<String>,
) -> AppResult<DecisionOutcome> {
    let decision = Decision::parse(token).ok_or_else(|| {
        AppError::Validation(
            "status must be APPROVE or NOT_APPROVED/REVISIONS_REQUIRED".to_string(),
        )
    })?;

    let mut tx = pool.begin().await?;

    let thesis = sqlx::query_as::<_, Thesis>(&format!(
        "SELECT {} FROM theses WHERE id = ?1",
        THESIS_COLUMNS
    ))
    .bind(thesis_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("thesis".to_string()))?;

    if !thesis.current_status.accepts_library_decision() {
        return Err(AppError::InvalidState {
            attempted: "record a review decision",
            current: thesis.current_status,
        });
    }

    let next = decision.next_status();
    let updated = sqlx::query(
        "UPDATE theses SET current_status = ?1 WHERE id = ?2 AND current_status = ?3",
    )
    .bind(next)
    .bind(thesis_id)
    .bind(thesis.current_status)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::Conflict(format!(
            "thesis {} was updated by another request",
            thesis_id
        )));
    }

    let approval = append_approval(
        &mut tx,
        thesis_id,
        Stage::Library,
        decision.approval_status(),
        notes,
        reviewer_id,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        "✅ Decision {:?} on thesis {}: {} → {}",
        decision,
        thesis_id,
        thesis.current_status,
        next
    );
    Ok(DecisionOutcome {
        thesis: Thesis { current_status: next, ..thesis },
        approval,
    })
}

// --- Publication ---

/// Move an APPROVED thesis to the terminal PUBLISHED state, stamping the
/// publication time and backfilling year_published from the submission year
/// when it was never set.
pub async fn publish(pool: &SqlitePool, thesis_id: &str) -> AppResult<Thesis> {
    let mut tx = pool.begin().await?;

    let thesis = sqlx::query_as::<_, Thesis>(&format!(
        "SELECT {} FROM theses WHERE id = ?1",
        THESIS_COLUMNS
    ))
    .bind(thesis_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("thesis".to_string()))?;

    if thesis.current_status != ThesisStatus::Approved {
        return Err(AppError::InvalidState {
            attempted: "publish",
            current: thesis.current_status,
        });
    }

    let published_at = Utc::now();
    let year_published = thesis
        .year_published
        .unwrap_or_else(|| i64::from(thesis.submitted_at.year()));

    let updated = sqlx::query(
        "UPDATE theses
         SET current_status = ?1, published_at = ?2, year_published = ?3
         WHERE id = ?4 AND current_status = ?5",
    )
    .bind(ThesisStatus::Published)
    .bind(published_at)
    .bind(year_published)
    .bind(thesis_id)
    .bind(ThesisStatus::Approved)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::Conflict(format!(
            "thesis {} was updated by another request",
            thesis_id
        )));
    }

    tx.commit().await?;

    tracing::info!("📚 Thesis {} published (year {})", thesis_id, year_published);
    Ok(Thesis {
        current_status: ThesisStatus::Published,
        published_at: Some(published_at),
        year_published: Some(year_published),
        ..thesis
    })
}

// --- Approval ledger ---
// Append-only by construction: the only write is this INSERT, and nothing in
// the codebase updates or deletes an approvals row.

async fn append_approval(
    tx: &mut Transaction<'_, Sqlite>,
    thesis_id: &str,
    stage: Stage,
    status: ApprovalStatus,
    notes: Option<String>,
    decided_by: &str,
) -> AppResult<Approval> {
    let approval = Approval {
        id: Uuid::new_v4().to_string(),
        thesis_id: thesis_id.to_string(),
        stage,
        status,
        notes,
        decided_by: decided_by.to_string(),
        decided_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO approvals (id, thesis_id, stage, status, notes, decided_by, decided_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&approval.id)
    .bind(&approval.thesis_id)
    .bind(approval.stage)
    .bind(approval.status)
    .bind(&approval.notes)
    .bind(&approval.decided_by)
    .bind(approval.decided_at)
    .execute(&mut **tx)
    .await?;

    Ok(approval)
}

/// Full decision history for a thesis, in decision order.
pub async fn list_approvals(pool: &SqlitePool, thesis_id: &str) -> AppResult<Vec<Approval>> {
    let approvals = sqlx::query_as::<_, Approval>(
        "SELECT id, thesis_id, stage, status, notes, decided_by, decided_at
         FROM approvals WHERE thesis_id = ?1 ORDER BY rowid ASC",
    )
    .bind(thesis_id)
    .fetch_all(pool)
    .await?;
    Ok(approvals)
}

// --- Feedback ---

/// Checklist state plus full approval history for one thesis. Callers are
/// responsible for the access check (owner or supervising lecturer).
pub async fn feedback(pool: &SqlitePool, thesis_id: &str) -> AppResult<ThesisFeedback> {
    let thesis = require_thesis(pool, thesis_id).await?;
    let checklist = checklist_service::list_feedback(pool, thesis_id).await?;
    let approvals = list_approvals(pool, thesis_id).await?;

    Ok(ThesisFeedback {
        thesis_id: thesis.id,
        title: thesis.title,
        current_status: thesis.current_status,
        checklist,
        approvals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::user::{AdminRegister, StudentRegister, User};
    use crate::services::user_service;

    fn test_storage() -> StorageService {
        let root = std::env::temp_dir().join(format!("thesisrepo-test-{}", Uuid::new_v4()));
        StorageService::new(root)
    }

    fn meta(title: &str) -> SubmitMeta {
        SubmitMeta {
            title: title.to_string(),
            abstract_text: Some("An abstract.".to_string()),
            keywords: Some("alpha, beta".to_string()),
            faculty: Some("Faculty of Engineering".to_string()),
            major: Some("Computer Science".to_string()),
        }
    }

    async fn seed_student(pool: &SqlitePool) -> User {
        user_service::register_student(
            pool,
            StudentRegister {
                email: "student@univ.local".to_string(),
                password: "pw".to_string(),
                student_number: "1001".to_string(),
                name: Some("Student One".to_string()),
                program: None,
                faculty: None,
            },
        )
        .await
        .unwrap()
    }

    async fn seed_admin(pool: &SqlitePool) -> User {
        user_service::register_admin(
            pool,
            AdminRegister {
                email: "admin@univ.local".to_string(),
                password: "pw".to_string(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn submit_goes_to_library_review() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let storage = test_storage();

        let thesis = submit_thesis(&pool, &storage, &student.id, meta("X"), b"%PDF-1.4")
            .await
            .unwrap();

        assert_eq!(thesis.current_status, ThesisStatus::LibraryReview);
        assert!(!thesis.file_path.is_empty());
        assert!(thesis.published_at.is_none());
        assert!(thesis.year_published.is_none());

        let stored = require_thesis(&pool, &thesis.id).await.unwrap();
        assert_eq!(stored.current_status, ThesisStatus::LibraryReview);
        assert_eq!(stored.file_path, thesis.file_path);
    }

    #[tokio::test]
    async fn submit_rejects_blank_title_and_empty_file() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let storage = test_storage();

        let err = submit_thesis(&pool, &storage, &student.id, meta("   "), b"%PDF-1.4")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = submit_thesis(&pool, &storage, &student.id, meta("X"), b"")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Neither attempt left a row behind.
        assert!(list_by_student(&pool, &student.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn approve_then_publish_happy_path() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let admin = seed_admin(&pool).await;
        let storage = test_storage();

        let thesis = submit_thesis(&pool, &storage, &student.id, meta("X"), b"%PDF-1.4")
            .await
            .unwrap();

        let outcome = decide(&pool, &thesis.id, &admin.id, "APPROVE", Some("well done".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome.thesis.current_status, ThesisStatus::Approved);
        assert_eq!(outcome.approval.status, ApprovalStatus::Approved);
        assert_eq!(outcome.approval.stage, Stage::Library);
        assert_eq!(outcome.approval.decided_by, admin.id);

        let ledger = list_approvals(&pool, &thesis.id).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].status, ApprovalStatus::Approved);

        let published = publish(&pool, &thesis.id).await.unwrap();
        assert_eq!(published.current_status, ThesisStatus::Published);
        assert!(published.published_at.is_some());
        // Backfilled from the submission year.
        assert_eq!(
            published.year_published,
            Some(i64::from(thesis.submitted_at.year()))
        );
    }

    #[tokio::test]
    async fn request_changes_then_approve_builds_ledger_in_order() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let admin = seed_admin(&pool).await;
        let storage = test_storage();

        let thesis = submit_thesis(&pool, &storage, &student.id, meta("X"), b"%PDF-1.4")
            .await
            .unwrap();

        let outcome = decide(&pool, &thesis.id, &admin.id, "NOT_APPROVED", None)
            .await
            .unwrap();
        assert_eq!(outcome.thesis.current_status, ThesisStatus::LibraryChanges);
        assert_eq!(outcome.approval.status, ApprovalStatus::ChangesRequested);

        // A thesis in LIBRARY_CHANGES can still be decided.
        let outcome = decide(&pool, &thesis.id, &admin.id, "APPROVE", None).await.unwrap();
        assert_eq!(outcome.thesis.current_status, ThesisStatus::Approved);

        let ledger = list_approvals(&pool, &thesis.id).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].status, ApprovalStatus::ChangesRequested);
        assert_eq!(ledger[1].status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn revisions_required_maps_like_not_approved() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let admin = seed_admin(&pool).await;
        let storage = test_storage();

        let thesis = submit_thesis(&pool, &storage, &student.id, meta("X"), b"%PDF-1.4")
            .await
            .unwrap();

        let outcome = decide(&pool, &thesis.id, &admin.id, "REVISIONS_REQUIRED", None)
            .await
            .unwrap();
        assert_eq!(outcome.thesis.current_status, ThesisStatus::LibraryChanges);
        assert_eq!(outcome.approval.status, ApprovalStatus::ChangesRequested);
    }

    #[tokio::test]
    async fn unknown_token_mutates_nothing() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let admin = seed_admin(&pool).await;
        let storage = test_storage();

        let thesis = submit_thesis(&pool, &storage, &student.id, meta("X"), b"%PDF-1.4")
            .await
            .unwrap();

        let err = decide(&pool, &thesis.id, &admin.id, "MAYBE", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let unchanged = require_thesis(&pool, &thesis.id).await.unwrap();
        assert_eq!(unchanged.current_status, ThesisStatus::LibraryReview);
        assert!(list_approvals(&pool, &thesis.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn decision_outside_library_queue_is_invalid_state() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let admin = seed_admin(&pool).await;
        let storage = test_storage();

        let thesis = submit_thesis(&pool, &storage, &student.id, meta("X"), b"%PDF-1.4")
            .await
            .unwrap();
        decide(&pool, &thesis.id, &admin.id, "APPROVE", None).await.unwrap();

        // Already APPROVED: a second decision is not a legal transition.
        let err = decide(&pool, &thesis.id, &admin.id, "APPROVE", None).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidState { current: ThesisStatus::Approved, .. }
        ));
        assert_eq!(list_approvals(&pool, &thesis.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn publish_requires_approved_exactly() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let storage = test_storage();

        let thesis = submit_thesis(&pool, &storage, &student.id, meta("X"), b"%PDF-1.4")
            .await
            .unwrap();

        let err = publish(&pool, &thesis.id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidState { current: ThesisStatus::LibraryReview, .. }
        ));

        // No side effects on the rejected publish.
        let unchanged = require_thesis(&pool, &thesis.id).await.unwrap();
        assert_eq!(unchanged.current_status, ThesisStatus::LibraryReview);
        assert!(unchanged.published_at.is_none());
        assert!(unchanged.year_published.is_none());
    }

    #[tokio::test]
    async fn publish_is_terminal() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let admin = seed_admin(&pool).await;
        let storage = test_storage();

        let thesis = submit_thesis(&pool, &storage, &student.id, meta("X"), b"%PDF-1.4")
            .await
            .unwrap();
        decide(&pool, &thesis.id, &admin.id, "APPROVE", None).await.unwrap();
        publish(&pool, &thesis.id).await.unwrap();

        let err = publish(&pool, &thesis.id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidState { current: ThesisStatus::Published, .. }
        ));
    }

    #[tokio::test]
    async fn explicit_year_published_is_preserved() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let admin = seed_admin(&pool).await;
        let storage = test_storage();

        let thesis = submit_thesis(&pool, &storage, &student.id, meta("X"), b"%PDF-1.4")
            .await
            .unwrap();
        decide(&pool, &thesis.id, &admin.id, "APPROVE", None).await.unwrap();

        sqlx::query("UPDATE theses SET year_published = 1999 WHERE id = ?1")
            .bind(&thesis.id)
            .execute(&pool)
            .await
            .unwrap();

        let published = publish(&pool, &thesis.id).await.unwrap();
        assert_eq!(published.year_published, Some(1999));
    }

    #[tokio::test]
    async fn feedback_bundles_checklist_and_ledger() {
        let pool = create_test_pool().await;
        let student = seed_student(&pool).await;
        let admin = seed_admin(&pool).await;
        let storage = test_storage();

        let thesis = submit_thesis(&pool, &storage, &student.id, meta("X"), b"%PDF-1.4")
            .await
            .unwrap();

        checklist_service::apply(
            &pool,
            &thesis.id,
            &admin.id,
            &[crate::models::checklist::ChecklistSelection {
                key: "margins".to_string(),
                label: None,
                category: None,
            }],
            true,
        )
        .await
        .unwrap();
        decide(&pool, &thesis.id, &admin.id, "NOT_APPROVED", Some("fix margins".to_string()))
            .await
            .unwrap();

        let fb = feedback(&pool, &thesis.id).await.unwrap();
        assert_eq!(fb.thesis_id, thesis.id);
        assert_eq!(fb.current_status, ThesisStatus::LibraryChanges);
        assert_eq!(fb.checklist.len(), 1);
        assert!(fb.checklist[0].checked);
        assert_eq!(fb.approvals.len(), 1);
        assert_eq!(fb.approvals[0].notes.as_deref(), Some("fix margins"));
    }

    #[tokio::test]
    async fn missing_thesis_is_not_found() {
        let pool = create_test_pool().await;
        let admin = seed_admin(&pool).await;

        let err = decide(&pool, "missing", &admin.id, "APPROVE", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = publish(&pool, "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
