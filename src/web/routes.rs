// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        admin_handlers, auth_handlers, lecturer_handlers, mw_auth, mw_role, public_handlers,
        thesis_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Public routes ---
    // Registration, login, and the published repository need no session.
    let public_routes = Router::new()
        .route("/api/auth/register-student", post(auth_handlers::register_student))
        .route("/api/auth/register-lecturer", post(auth_handlers::register_lecturer))
        .route("/api/auth/register-admin", post(auth_handlers::register_admin))
        .route("/api/auth/login", post(auth_handlers::login))
        .route("/api/auth/logout", get(auth_handlers::logout))
        .route("/api/public/theses/search", get(public_handlers::search))
        .route("/api/public/theses/{id}", get(public_handlers::detail));

    // --- Student portal ---
    let student_routes = Router::new()
        .route("/", post(thesis_handlers::submit))
        .route("/mine", get(thesis_handlers::mine))
        .route("/{id}/feedback", get(thesis_handlers::feedback))
        .route("/lecturers", get(thesis_handlers::list_lecturers))
        .route(
            "/supervisors",
            get(thesis_handlers::my_supervisors).post(thesis_handlers::add_supervisor),
        )
        .route_layer(middleware::from_fn(mw_role::require_student));

    // --- Lecturer portal ---
    let lecturer_routes = Router::new()
        .route("/my-supervisees", get(lecturer_handlers::my_supervisees))
        .route("/theses", get(lecturer_handlers::supervisee_theses))
        .route("/theses/{id}/feedback", get(lecturer_handlers::thesis_feedback))
        .route_layer(middleware::from_fn(mw_role::require_lecturer));

    // --- Library reviewer portal ---
    let admin_routes = Router::new()
        .route("/theses", get(admin_handlers::list_theses))
        .route("/submissions", get(admin_handlers::list_submissions))
        .route(
            "/theses/{id}/checklist",
            get(admin_handlers::get_checklist).post(admin_handlers::save_checklist),
        )
        .route("/theses/{id}/decision", post(admin_handlers::decision))
        .route("/theses/{id}/publish", post(admin_handlers::publish))
        .route("/students", get(admin_handlers::list_students))
        .route("/lecturers", get(admin_handlers::list_lecturers))
        .route_layer(middleware::from_fn(mw_role::require_admin));

    // --- Authenticated routes ---
    // require_auth runs before the per-portal role gates above.
    let authenticated_routes = Router::new()
        .route("/api/auth/me", get(auth_handlers::me))
        .nest("/api/theses", student_routes)
        .nest("/api/lecturers", lecturer_routes)
        .nest("/api/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}
