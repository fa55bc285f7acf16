// src/models/user.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role. Fixed at registration; there is no way to change it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Lecturer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Lecturer => "LECTURER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// A user row from the 'users' table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// Display-only profile data, one row per student account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentProfile {
    pub user_id: String,
    pub name: Option<String>,
    pub student_number: String,
    pub program: Option<String>,
    pub faculty: Option<String>,
}

// Display-only profile data, one row per lecturer account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LecturerProfile {
    pub user_id: String,
    pub name: Option<String>,
    pub nidn: String,
    pub department: Option<String>,
    pub faculty: Option<String>,
    pub major: Option<String>,
}

// --- Listing rows (user joined with its profile) ---
// We do not reuse the full User model here: listings never expose the
// password hash, and the profile columns come from a join.

#[derive(Debug, FromRow, Serialize)]
pub struct StudentAccountRow {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub student_number: Option<String>,
    pub program: Option<String>,
    pub faculty: Option<String>,
}

#[derive(Debug, FromRow, Serialize)]
pub struct LecturerAccountRow {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub nidn: Option<String>,
    pub department: Option<String>,
    pub faculty: Option<String>,
    pub major: Option<String>,
}

// --- Registration payloads ---

#[derive(Debug, Deserialize)]
pub struct StudentRegister {
    pub email: String,
    pub password: String,
    pub student_number: String,
    pub name: Option<String>,
    pub program: Option<String>,
    pub faculty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LecturerRegister {
    pub email: String,
    pub password: String,
    pub nidn: String,
    pub name: Option<String>,
    pub department: Option<String>,
    pub faculty: Option<String>,
    pub major: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminRegister {
    pub email: String,
    pub password: String,
}

// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}
