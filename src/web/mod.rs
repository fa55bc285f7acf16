// src/web/mod.rs
pub mod admin_handlers;
pub mod auth_handlers;
pub mod lecturer_handlers;
pub mod mw_auth;
pub mod mw_role;
pub mod public_handlers;
pub mod routes;
pub mod thesis_handlers;
