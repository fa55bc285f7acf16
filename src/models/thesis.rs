// src/models/thesis.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Workflow position of a thesis. The only source of truth for what a
/// reviewer is allowed to do with it.
///
/// SUPERVISOR_REVIEW and SUPERVISOR_CHANGES are legacy states kept so that
/// historical rows still load; no new transition produces or accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThesisStatus {
    Draft,
    Submitted,
    SupervisorReview,
    SupervisorChanges,
    LibraryReview,
    LibraryChanges,
    Approved,
    Published,
}

impl ThesisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThesisStatus::Draft => "DRAFT",
            ThesisStatus::Submitted => "SUBMITTED",
            ThesisStatus::SupervisorReview => "SUPERVISOR_REVIEW",
            ThesisStatus::SupervisorChanges => "SUPERVISOR_CHANGES",
            ThesisStatus::LibraryReview => "LIBRARY_REVIEW",
            ThesisStatus::LibraryChanges => "LIBRARY_CHANGES",
            ThesisStatus::Approved => "APPROVED",
            ThesisStatus::Published => "PUBLISHED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Some(ThesisStatus::Draft),
            "SUBMITTED" => Some(ThesisStatus::Submitted),
            "SUPERVISOR_REVIEW" => Some(ThesisStatus::SupervisorReview),
            "SUPERVISOR_CHANGES" => Some(ThesisStatus::SupervisorChanges),
            "LIBRARY_REVIEW" => Some(ThesisStatus::LibraryReview),
            "LIBRARY_CHANGES" => Some(ThesisStatus::LibraryChanges),
            "APPROVED" => Some(ThesisStatus::Approved),
            "PUBLISHED" => Some(ThesisStatus::Published),
            _ => None,
        }
    }

    /// Only a thesis sitting in the library queue can receive a decision.
    pub fn accepts_library_decision(&self) -> bool {
        matches!(self, ThesisStatus::LibraryReview | ThesisStatus::LibraryChanges)
    }

    /// PUBLISHED is terminal; nothing transitions out of it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ThesisStatus::Published)
    }
}

impl std::fmt::Display for ThesisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review phase an approval belongs to. Only LIBRARY is active; SUPERVISOR
/// exists to read historical ledger rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Supervisor,
    Library,
}

/// Outcome recorded on a single ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    ChangesRequested,
    Approved,
    NotApproved,
}

/// The fixed decision-token table. Every accepted spelling maps here once;
/// call sites never match on raw strings.
///
/// | token                | thesis status   | ledger status      |
/// |----------------------|-----------------|--------------------|
/// | APPROVE              | APPROVED        | APPROVED           |
/// | NOT_APPROVED         | LIBRARY_CHANGES | CHANGES_REQUESTED  |
/// | REVISIONS_REQUIRED   | LIBRARY_CHANGES | CHANGES_REQUESTED  |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    NotApproved,
    RevisionsRequired,
}

impl Decision {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "APPROVE" => Some(Decision::Approve),
            "NOT_APPROVED" => Some(Decision::NotApproved),
            "REVISIONS_REQUIRED" => Some(Decision::RevisionsRequired),
            _ => None,
        }
    }

    pub fn next_status(&self) -> ThesisStatus {
        match self {
            Decision::Approve => ThesisStatus::Approved,
            Decision::NotApproved | Decision::RevisionsRequired => ThesisStatus::LibraryChanges,
        }
    }

    pub fn approval_status(&self) -> ApprovalStatus {
        match self {
            Decision::Approve => ApprovalStatus::Approved,
            Decision::NotApproved | Decision::RevisionsRequired => ApprovalStatus::ChangesRequested,
        }
    }
}

// A thesis row. One student owns it; re-submission creates a new row
// instead of mutating an old one.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Thesis {
    pub id: String,
    pub student_id: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub keywords: Option<String>,
    pub faculty: Option<String>,
    pub major: Option<String>,
    pub file_path: String,
    pub submitted_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub year_published: Option<i64>,
    pub current_status: ThesisStatus,
}

// One ledger row. Written once, never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Approval {
    pub id: String,
    pub thesis_id: String,
    pub stage: Stage,
    pub status: ApprovalStatus,
    pub notes: Option<String>,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
}

// Link between a lecturer and a student. At most one row per pair.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SupervisorAssignment {
    pub id: String,
    pub lecturer_id: String,
    pub student_id: String,
    pub role_main: bool,
}

// --- Lightweight query rows ---
// Slim shapes for listings; we do not drag the full models through joins.

#[derive(Debug, FromRow, Serialize)]
pub struct SupervisorRow {
    pub lecturer_id: String,
    pub email: String,
    pub name: Option<String>,
    pub department: Option<String>,
    pub role_main: bool,
}

#[derive(Debug, FromRow, Serialize)]
pub struct SuperviseeRow {
    pub student_id: String,
    pub email: String,
    pub name: Option<String>,
    pub role_main: bool,
    pub submission_count: i64,
}

#[derive(Debug, FromRow, Serialize)]
pub struct SubmissionRow {
    pub thesis_id: String,
    pub student_id: String,
    pub student_email: String,
    pub student_name: Option<String>,
    pub title: String,
    pub current_status: ThesisStatus,
    pub submitted_at: DateTime<Utc>,
}

// --- Request payloads ---

// Metadata part of a multipart submission.
#[derive(Debug, Deserialize)]
pub struct SubmitMeta {
    pub title: String,
    pub abstract_text: Option<String>,
    pub keywords: Option<String>,
    pub faculty: Option<String>,
    pub major: Option<String>,
}

// Body of POST /api/admin/theses/{id}/decision.
#[derive(Debug, Deserialize)]
pub struct DecisionPayload {
    pub status: String,
    pub notes: Option<String>,
}
