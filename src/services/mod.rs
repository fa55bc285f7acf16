// src/services/mod.rs
pub mod auth_service;
pub mod checklist_service;
pub mod storage_service;
pub mod supervisor_service;
pub mod thesis_service;
pub mod user_service;
