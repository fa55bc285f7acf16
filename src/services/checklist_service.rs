// src/services/checklist_service.rs
use crate::{
    error::{AppError, AppResult},
    models::checklist::{ChecklistFeedbackRow, ChecklistItem, ChecklistSelection},
};
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

/// Keys currently ticked for a thesis.
pub async fn get_checked(pool: &SqlitePool, thesis_id: &str) -> AppResult<Vec<String>> {
    require_thesis(pool, thesis_id).await?;

    let keys: Vec<String> = sqlx::query_scalar(
        "SELECT ci.ckey
         FROM thesis_checklists tc
         JOIN checklist_items ci ON ci.id = tc.item_id
         WHERE tc.thesis_id = ?1 AND tc.checked = 1
         ORDER BY ci.ckey ASC",
    )
    .bind(thesis_id)
    .fetch_all(pool)
    .await?;
    Ok(keys)
}

/// Full checklist state for feedback views (students and lecturers).
pub async fn list_feedback(pool: &SqlitePool, thesis_id: &str) -> AppResult<Vec<ChecklistFeedbackRow>> {
    let rows = sqlx::query_as::<_, ChecklistFeedbackRow>(
        "SELECT ci.ckey AS key, ci.label, tc.checked, tc.checked_at
         FROM thesis_checklists tc
         JOIN checklist_items ci ON ci.id = tc.item_id
         WHERE tc.thesis_id = ?1
         ORDER BY ci.ckey ASC",
    )
    .bind(thesis_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Apply a reviewer's ticks to a thesis.
///
/// Every referenced key is resolved against the shared catalog, creating the
/// item on first use (label defaults to the key, category stays empty unless
/// supplied). With `replace` = true, previously checked items missing from
/// the incoming set are flipped to unchecked; with false they are left alone.
/// Blank keys are skipped without failing the batch. The whole batch commits
/// or none of it does.
pub async fn apply(
    pool: &SqlitePool,
    thesis_id: &str,
    reviewer_id: &str,
    selections: &[ChecklistSelection],
    replace: bool,
) -> AppResult<Vec<String>> {
    let mut tx = pool.begin().await?;

    let thesis_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM theses WHERE id = ?1)")
        .bind(thesis_id)
        .fetch_one(&mut *tx)
        .await?;
    if !thesis_exists {
        return Err(AppError::NotFound("thesis".to_string()));
    }

    let now = Utc::now();

    // 1. Resolve (or lazily create) every referenced catalog item,
    //    de-duplicating and skipping blank keys.
    let mut incoming_keys: Vec<String> = Vec::new();
    let mut incoming_item_ids: Vec<String> = Vec::new();
    for selection in selections {
        let key = selection.key.trim();
        if key.is_empty() {
            continue;
        }
        if incoming_keys.iter().any(|k| k == key) {
            continue;
        }
        let item = find_or_create_item(&mut tx, key, selection).await?;
        incoming_keys.push(item.ckey);
        incoming_item_ids.push(item.id);
    }

    // 2. Full-replace semantics: untick whatever is checked but absent from
    //    the incoming set, with its own audit stamp.
    if replace {
        let existing_checked: Vec<(String, String)> = sqlx::query_as(
            "SELECT tc.item_id, ci.ckey
             FROM thesis_checklists tc
             JOIN checklist_items ci ON ci.id = tc.item_id
             WHERE tc.thesis_id = ?1 AND tc.checked = 1",
        )
        .bind(thesis_id)
        .fetch_all(&mut *tx)
        .await?;

        for (item_id, key) in existing_checked {
            if incoming_keys.iter().any(|k| *k == key) {
                continue;
            }
            sqlx::query(
                "UPDATE thesis_checklists
                 SET checked = 0, checked_by = ?1, checked_at = ?2
                 WHERE thesis_id = ?3 AND item_id = ?4",
            )
            .bind(reviewer_id)
            .bind(now)
            .bind(thesis_id)
            .bind(&item_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    // 3. Ensure every incoming item ends up checked, one row per
    //    (thesis, item) pair.
    for item_id in &incoming_item_ids {
        sqlx::query(
            "INSERT INTO thesis_checklists (id, thesis_id, item_id, checked, checked_by, checked_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5)
             ON CONFLICT(thesis_id, item_id)
             DO UPDATE SET checked = 1, checked_by = ?4, checked_at = ?5",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(thesis_id)
        .bind(item_id)
        .bind(reviewer_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        "Checklist updated for thesis {}: {} item(s), replace={}",
        thesis_id,
        incoming_keys.len(),
        replace
    );
    Ok(incoming_keys)
}

// Atomic find-or-create by key: the INSERT OR IGNORE rides on the UNIQUE
// constraint, so two reviewers referencing the same new key cannot create it
// twice.
async fn find_or_create_item(
    tx: &mut Transaction<'_, Sqlite>,
    key: &str,
    selection: &ChecklistSelection,
) -> AppResult<ChecklistItem> {
    let label = selection
        .label
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(key);

    sqlx::query(
        "INSERT OR IGNORE INTO checklist_items (id, ckey, label, category) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(key)
    .bind(label)
    .bind(&selection.category)
    .execute(&mut **tx)
    .await?;

    let item = sqlx::query_as::<_, ChecklistItem>(
        "SELECT id, ckey, label, category FROM checklist_items WHERE ckey = ?1",
    )
    .bind(key)
    .fetch_one(&mut **tx)
    .await?;
    Ok(item)
}

async fn require_thesis(pool: &SqlitePool, thesis_id: &str) -> AppResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM theses WHERE id = ?1)")
        .bind(thesis_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(AppError::NotFound("thesis".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::thesis::ThesisStatus;
    use crate::models::user::{Role, StudentRegister};
    use crate::services::user_service;

    fn sel(key: &str) -> ChecklistSelection {
        ChecklistSelection { key: key.to_string(), label: None, category: None }
    }

    fn sel_full(key: &str, label: &str, category: &str) -> ChecklistSelection {
        ChecklistSelection {
            key: key.to_string(),
            label: Some(label.to_string()),
            category: Some(category.to_string()),
        }
    }

    async fn seed_thesis(pool: &SqlitePool) -> (String, String) {
        let student = user_service::register_student(
            pool,
            StudentRegister {
                email: "student@univ.local".to_string(),
                password: "pw".to_string(),
                student_number: "1001".to_string(),
                name: None,
                program: None,
                faculty: None,
            },
        )
        .await
        .unwrap();

        let admin = user_service::register_admin(
            pool,
            crate::models::user::AdminRegister {
                email: "admin@univ.local".to_string(),
                password: "pw".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(admin.role, Role::Admin);

        let thesis_id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO theses (id, student_id, title, file_path, submitted_at, current_status)
             VALUES (?1, ?2, 'T', 'file://x', ?3, ?4)",
        )
        .bind(&thesis_id)
        .bind(&student.id)
        .bind(Utc::now())
        .bind(ThesisStatus::LibraryReview)
        .execute(pool)
        .await
        .unwrap();

        (thesis_id, admin.id)
    }

    #[tokio::test]
    async fn replace_true_is_idempotent() {
        let pool = create_test_pool().await;
        let (thesis_id, admin_id) = seed_thesis(&pool).await;

        let selections = vec![sel("title-page"), sel("margins")];
        apply(&pool, &thesis_id, &admin_id, &selections, true).await.unwrap();
        let once = get_checked(&pool, &thesis_id).await.unwrap();

        apply(&pool, &thesis_id, &admin_id, &selections, true).await.unwrap();
        let twice = get_checked(&pool, &thesis_id).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(once, vec!["margins".to_string(), "title-page".to_string()]);
    }

    #[tokio::test]
    async fn replace_true_unticks_missing_keys() {
        let pool = create_test_pool().await;
        let (thesis_id, admin_id) = seed_thesis(&pool).await;

        apply(&pool, &thesis_id, &admin_id, &[sel("a"), sel("b")], true).await.unwrap();
        apply(&pool, &thesis_id, &admin_id, &[sel("b"), sel("c")], true).await.unwrap();

        let checked = get_checked(&pool, &thesis_id).await.unwrap();
        assert_eq!(checked, vec!["b".to_string(), "c".to_string()]);

        // 'a' still has its row, just unchecked, with an audit stamp.
        let rows = list_feedback(&pool, &thesis_id).await.unwrap();
        let a = rows.iter().find(|r| r.key == "a").unwrap();
        assert!(!a.checked);
        assert!(a.checked_at.is_some());
    }

    #[tokio::test]
    async fn replace_false_is_additive() {
        let pool = create_test_pool().await;
        let (thesis_id, admin_id) = seed_thesis(&pool).await;

        apply(&pool, &thesis_id, &admin_id, &[sel("a"), sel("b")], true).await.unwrap();
        apply(&pool, &thesis_id, &admin_id, &[sel("c")], false).await.unwrap();

        // Superset of the previous checked-set plus the incoming keys.
        let checked = get_checked(&pool, &thesis_id).await.unwrap();
        assert_eq!(checked, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn unknown_keys_are_created_lazily() {
        let pool = create_test_pool().await;
        let (thesis_id, admin_id) = seed_thesis(&pool).await;

        apply(
            &pool,
            &thesis_id,
            &admin_id,
            &[sel_full("sig-page", "Signature Page", "Front Matter"), sel("bare-key")],
            true,
        )
        .await
        .unwrap();

        let items = sqlx::query_as::<_, ChecklistItem>(
            "SELECT id, ckey, label, category FROM checklist_items ORDER BY ckey ASC",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(items.len(), 2);
        // Bare key: label defaults to the key, category stays empty.
        assert_eq!(items[0].ckey, "bare-key");
        assert_eq!(items[0].label, "bare-key");
        assert!(items[0].category.is_none());
        assert_eq!(items[1].ckey, "sig-page");
        assert_eq!(items[1].label, "Signature Page");
        assert_eq!(items[1].category.as_deref(), Some("Front Matter"));
    }

    #[tokio::test]
    async fn blank_keys_are_skipped() {
        let pool = create_test_pool().await;
        let (thesis_id, admin_id) = seed_thesis(&pool).await;

        let applied = apply(
            &pool,
            &thesis_id,
            &admin_id,
            &[sel(""), sel("   "), sel("real")],
            true,
        )
        .await
        .unwrap();

        assert_eq!(applied, vec!["real".to_string()]);
        assert_eq!(get_checked(&pool, &thesis_id).await.unwrap(), vec!["real".to_string()]);
    }

    #[tokio::test]
    async fn unknown_thesis_is_not_found() {
        let pool = create_test_pool().await;
        let (_, admin_id) = seed_thesis(&pool).await;

        let err = apply(&pool, "missing", &admin_id, &[sel("a")], true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
