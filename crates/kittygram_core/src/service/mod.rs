//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, transcoding and repository calls into use-case
//!   level APIs.
//! - Keep the HTTP layer decoupled from storage details.

pub mod achievement_service;
pub mod cat_service;
pub mod user_service;
