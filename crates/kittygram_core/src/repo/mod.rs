//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - Multi-statement writes (cat + link set) commit in one transaction.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod achievement_repo;
pub mod cat_repo;
mod error;
pub mod user_repo;

pub use error::{RepoError, RepoResult};
pub(crate) use error::{ensure_schema, is_constraint_violation, TableSpec};
