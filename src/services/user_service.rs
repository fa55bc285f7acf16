// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{
        AdminRegister, LecturerAccountRow, LecturerRegister, Role, StudentAccountRow,
        StudentRegister, User,
    },
    services::auth_service,
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// SQLite reports UNIQUE violations under a handful of extended codes.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err
            .code()
            .map_or(false, |c| c == "19" || c == "2067" || c == "1555");
    }
    false
}

pub async fn find_user_by_id(pool: &SqlitePool, user_id: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, role, created_at FROM users WHERE id = ?1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, role, created_at FROM users WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password must not be empty".to_string()));
    }
    Ok(())
}

// Inserts the bare user row inside the caller's transaction. The profile
// row (if any) goes in the same transaction so a half-registered account
// can never be observed.
async fn insert_user(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    email: &str,
    password_hash: &str,
    role: Role,
) -> AppResult<User> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.trim().to_string(),
        password_hash: password_hash.to_string(),
        role,
        created_at: Utc::now(),
    };

    let result = sqlx::query(
        "INSERT INTO users (id, email, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.created_at)
    .execute(&mut **tx)
    .await;

    match result {
        Ok(_) => Ok(user),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("Registration rejected: email '{}' already exists.", user.email);
            Err(AppError::Validation("email already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn register_student(pool: &SqlitePool, payload: StudentRegister) -> AppResult<User> {
    validate_credentials(&payload.email, &payload.password)?;
    if payload.student_number.trim().is_empty() {
        return Err(AppError::Validation("student_number is required".to_string()));
    }

    let password_hash = auth_service::hash_password(&payload.password).await?;

    let mut tx = pool.begin().await?;
    let user = insert_user(&mut tx, &payload.email, &password_hash, Role::Student).await?;

    let profile_result = sqlx::query(
        "INSERT INTO student_profiles (user_id, name, student_number, program, faculty)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&user.id)
    .bind(&payload.name)
    .bind(payload.student_number.trim())
    .bind(&payload.program)
    .bind(&payload.faculty)
    .execute(&mut *tx)
    .await;

    if let Err(e) = profile_result {
        if is_unique_violation(&e) {
            return Err(AppError::Validation("student number already exists".to_string()));
        }
        return Err(e.into());
    }

    tx.commit().await?;
    tracing::info!("✅ Student account created: {}", user.email);
    Ok(user)
}

pub async fn register_lecturer(pool: &SqlitePool, payload: LecturerRegister) -> AppResult<User> {
    validate_credentials(&payload.email, &payload.password)?;
    if payload.nidn.trim().is_empty() {
        return Err(AppError::Validation("nidn is required".to_string()));
    }

    let password_hash = auth_service::hash_password(&payload.password).await?;

    let mut tx = pool.begin().await?;
    let user = insert_user(&mut tx, &payload.email, &password_hash, Role::Lecturer).await?;

    let profile_result = sqlx::query(
        "INSERT INTO lecturer_profiles (user_id, name, nidn, department, faculty, major)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&user.id)
    .bind(&payload.name)
    .bind(payload.nidn.trim())
    .bind(&payload.department)
    .bind(&payload.faculty)
    .bind(&payload.major)
    .execute(&mut *tx)
    .await;

    if let Err(e) = profile_result {
        if is_unique_violation(&e) {
            return Err(AppError::Validation("nidn already exists".to_string()));
        }
        return Err(e.into());
    }

    tx.commit().await?;
    tracing::info!("✅ Lecturer account created: {}", user.email);
    Ok(user)
}

pub async fn register_admin(pool: &SqlitePool, payload: AdminRegister) -> AppResult<User> {
    validate_credentials(&payload.email, &payload.password)?;

    let password_hash = auth_service::hash_password(&payload.password).await?;

    // Admins carry no profile row.
    let mut tx = pool.begin().await?;
    let user = insert_user(&mut tx, &payload.email, &password_hash, Role::Admin).await?;
    tx.commit().await?;

    tracing::info!("✅ Admin account created: {}", user.email);
    Ok(user)
}

/// Student accounts joined with their profile, optionally filtered by exact
/// email or student number (admin verification view).
pub async fn list_students(
    pool: &SqlitePool,
    email: Option<&str>,
    student_number: Option<&str>,
) -> AppResult<Vec<StudentAccountRow>> {
    let base = "SELECT u.id, u.email, p.name, p.student_number, p.program, p.faculty
         FROM users u
         LEFT JOIN student_profiles p ON p.user_id = u.id
         WHERE u.role = 'STUDENT'";

    let rows = match (email, student_number) {
        (Some(email), _) if !email.trim().is_empty() => {
            sqlx::query_as::<_, StudentAccountRow>(&format!("{} AND u.email = ?1", base))
                .bind(email.trim())
                .fetch_all(pool)
                .await?
        }
        (_, Some(number)) if !number.trim().is_empty() => {
            sqlx::query_as::<_, StudentAccountRow>(&format!("{} AND p.student_number = ?1", base))
                .bind(number.trim())
                .fetch_all(pool)
                .await?
        }
        _ => {
            sqlx::query_as::<_, StudentAccountRow>(&format!("{} ORDER BY u.email ASC", base))
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

/// All lecturer accounts with profile data; also serves the student portal's
/// supervisor dropdown.
pub async fn list_lecturers(pool: &SqlitePool) -> AppResult<Vec<LecturerAccountRow>> {
    let rows = sqlx::query_as::<_, LecturerAccountRow>(
        "SELECT u.id, u.email, p.name, p.nidn, p.department, p.faculty, p.major
         FROM users u
         LEFT JOIN lecturer_profiles p ON p.user_id = u.id
         WHERE u.role = 'LECTURER'
         ORDER BY u.email ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn student_payload(email: &str, number: &str) -> StudentRegister {
        StudentRegister {
            email: email.to_string(),
            password: "hunter2!".to_string(),
            student_number: number.to_string(),
            name: Some("Test Student".to_string()),
            program: Some("Computer Science".to_string()),
            faculty: None,
        }
    }

    #[tokio::test]
    async fn register_and_find_student() {
        let pool = create_test_pool().await;

        let user = register_student(&pool, student_payload("s1@univ.local", "1001"))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Student);

        let found = find_user_by_email(&pool, "s1@univ.local").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, Role::Student);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let pool = create_test_pool().await;

        register_student(&pool, student_payload("dup@univ.local", "1001"))
            .await
            .unwrap();
        let err = register_student(&pool, student_payload("dup@univ.local", "1002"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn invalid_registration_input() {
        let pool = create_test_pool().await;

        let err = register_student(&pool, student_payload("not-an-email", "1001"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut payload = student_payload("ok@univ.local", "  ");
        payload.student_number = "  ".to_string();
        let err = register_student(&pool, payload).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn student_listing_filters() {
        let pool = create_test_pool().await;

        register_student(&pool, student_payload("a@univ.local", "1001")).await.unwrap();
        register_student(&pool, student_payload("b@univ.local", "1002")).await.unwrap();

        let all = list_students(&pool, None, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let by_email = list_students(&pool, Some("a@univ.local"), None).await.unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].student_number.as_deref(), Some("1001"));

        let by_number = list_students(&pool, None, Some("1002")).await.unwrap();
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].email, "b@univ.local");
    }
}
