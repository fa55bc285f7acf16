// src/web/mw_role.rs
use crate::{error::AppError, models::user::Role, web::mw_auth::CurrentUser};
use axum::{extract::Request, middleware::Next, response::Response};

// Role gates. All of these run after `require_auth`, so the CurrentUser
// extension is guaranteed to be present.

async fn require_role(
    current: CurrentUser,
    required: Role,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if current.role == required {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            "Role MW: '{}' is {} but {} is required.",
            current.email,
            current.role,
            required
        );
        Err(AppError::Forbidden(format!("{} role required", required)))
    }
}

pub async fn require_student(
    axum::extract::Extension(current): axum::extract::Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(current, Role::Student, request, next).await
}

pub async fn require_lecturer(
    axum::extract::Extension(current): axum::extract::Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(current, Role::Lecturer, request, next).await
}

pub async fn require_admin(
    axum::extract::Extension(current): axum::extract::Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(current, Role::Admin, request, next).await
}
