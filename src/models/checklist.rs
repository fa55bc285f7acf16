// src/models/checklist.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Catalog entry shared across all theses. The key is the stable identifier;
// label and category are display data and may be edited later.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChecklistItem {
    pub id: String,
    pub ckey: String,
    pub label: String,
    pub category: Option<String>,
}

// Per-(thesis, item) completion state, unique per pair. Updated in place,
// always stamped with who changed it and when.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ThesisChecklist {
    pub id: String,
    pub thesis_id: String,
    pub item_id: String,
    pub checked: bool,
    pub checked_by: Option<String>,
    pub checked_at: Option<DateTime<Utc>>,
}

// Checklist state joined with its catalog entry, as shown to students and
// lecturers in feedback views.
#[derive(Debug, FromRow, Serialize)]
pub struct ChecklistFeedbackRow {
    pub key: String,
    pub label: String,
    pub checked: bool,
    pub checked_at: Option<DateTime<Utc>>,
}

/// One incoming tick. A bare key is enough; label and category only matter
/// the first time an unknown key is seen (lazy catalog creation).
#[derive(Debug, Clone, Deserialize)]
pub struct ChecklistSelection {
    pub key: String,
    pub label: Option<String>,
    pub category: Option<String>,
}

/// Body of POST /api/admin/theses/{id}/checklist. Accepts either a flat list
/// of known keys or full selections; `replace` switches between full-replace
/// and additive semantics.
#[derive(Debug, Deserialize)]
pub struct ChecklistPayload {
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    #[serde(default)]
    pub selections: Option<Vec<ChecklistSelection>>,
    #[serde(default = "default_replace")]
    pub replace: bool,
}

fn default_replace() -> bool {
    true
}

impl ChecklistPayload {
    /// Normalize both accepted shapes into a single selection list.
    pub fn into_selections(self) -> Vec<ChecklistSelection> {
        if let Some(selections) = self.selections {
            if !selections.is_empty() {
                return selections;
            }
        }
        self.keys
            .unwrap_or_default()
            .into_iter()
            .map(|key| ChecklistSelection { key, label: None, category: None })
            .collect()
    }
}
