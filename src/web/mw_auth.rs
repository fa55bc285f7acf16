// src/web/mw_auth.rs
use crate::{
    error::AppError,
    models::user::Role,
    services::user_service,
    state::AppState,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

/// The authenticated caller, as resolved from the session. Handlers trust
/// this value; it is attached once per request and never re-checked.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

// Middleware that resolves the session to a full user row and injects it as
// a request extension. Everything behind it can assume a valid CurrentUser.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = match session.get::<String>("user_id").await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            tracing::debug!("Auth MW: no session user, rejecting.");
            return Err(AppError::Unauthorized);
        }
        Err(e) => {
            tracing::error!("Auth MW: failed to read session: {:?}", e);
            return Err(AppError::Session(format!("failed to read session: {}", e)));
        }
    };

    // A session can outlive its account row; treat that as unauthenticated.
    let Some(user) = user_service::find_user_by_id(&state.db_pool, &user_id).await? else {
        tracing::warn!("Auth MW: session references unknown user '{}'.", user_id);
        return Err(AppError::Unauthorized);
    };

    tracing::debug!("Auth MW: '{}' authenticated as {}.", user.email, user.role);
    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
        role: user.role,
    });

    Ok(next.run(request).await)
}
