// src/web/public_handlers.rs
//
// Public repository view. No authentication; only PUBLISHED theses are
// visible here.
use crate::{
    error::{AppError, AppResult},
    models::thesis::{Thesis, ThesisStatus},
    services::{thesis_service, user_service},
    state::AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct SearchFilter {
    pub keyword: Option<String>,
    pub year: Option<i64>,
    pub faculty: Option<String>,
    pub major: Option<String>,
    pub author: Option<String>,
}

fn contains_ci(haystack: &Option<String>, needle: &str) -> bool {
    haystack
        .as_deref()
        .map_or(false, |h| h.to_lowercase().contains(needle))
}

fn summary(thesis: &Thesis, author_email: Option<&str>) -> serde_json::Value {
    json!({
        "id": thesis.id,
        "title": thesis.title,
        "abstract_text": thesis.abstract_text,
        "keywords": thesis.keywords,
        "faculty": thesis.faculty,
        "major": thesis.major,
        "year_published": thesis.year_published,
        "published_at": thesis.published_at,
        "author": author_email,
    })
}

/// GET /api/public/theses/search — filter the published repository by
/// keyword, year, faculty, major and author email.
pub async fn search(
    State(state): State<AppState>,
    Query(filter): Query<SearchFilter>,
) -> AppResult<impl IntoResponse> {
    let published =
        thesis_service::list_by_status(&state.db_pool, Some(ThesisStatus::Published)).await?;

    // The published set is small; filtering in memory keeps the queries
    // simple and mirrors the index-free search the UI expects.
    let mut results = Vec::new();
    for thesis in published {
        if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
            let kw = keyword.to_lowercase();
            let title_hit = thesis.title.to_lowercase().contains(&kw);
            if !title_hit && !contains_ci(&thesis.abstract_text, &kw) && !contains_ci(&thesis.keywords, &kw)
            {
                continue;
            }
        }
        if let Some(year) = filter.year {
            if thesis.year_published != Some(year) {
                continue;
            }
        }
        if let Some(faculty) = filter.faculty.as_deref().filter(|f| !f.trim().is_empty()) {
            if !thesis.faculty.as_deref().map_or(false, |f| f.eq_ignore_ascii_case(faculty)) {
                continue;
            }
        }
        if let Some(major) = filter.major.as_deref().filter(|m| !m.trim().is_empty()) {
            if !thesis.major.as_deref().map_or(false, |m| m.eq_ignore_ascii_case(major)) {
                continue;
            }
        }

        let author_email = user_service::find_user_by_id(&state.db_pool, &thesis.student_id)
            .await?
            .map(|u| u.email);

        if let Some(author) = filter.author.as_deref().filter(|a| !a.trim().is_empty()) {
            let needle = author.to_lowercase();
            if !author_email.as_deref().map_or(false, |e| e.to_lowercase().contains(&needle)) {
                continue;
            }
        }

        results.push(summary(&thesis, author_email.as_deref()));
    }

    Ok(Json(json!({ "total": results.len(), "results": results })))
}

/// GET /api/public/theses/{id} — details of one published thesis. Anything
/// not yet published is off limits here.
pub async fn detail(
    State(state): State<AppState>,
    Path(thesis_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let thesis = thesis_service::require_thesis(&state.db_pool, &thesis_id).await?;

    if thesis.current_status != ThesisStatus::Published {
        return Err(AppError::Forbidden("this thesis is not publicly available".to_string()));
    }

    let author_email = user_service::find_user_by_id(&state.db_pool, &thesis.student_id)
        .await?
        .map(|u| u.email);

    let mut body = summary(&thesis, author_email.as_deref());
    // The locator is public for published theses so the UI can link the PDF.
    body["file_path"] = json!(thesis.file_path);
    Ok(Json(body))
}
