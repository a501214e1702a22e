//! Domain model for the cat registry.
//!
//! # Responsibility
//! - Define stored records (`Cat`, `Achievement`, `User`) and their wire shapes.
//! - Keep derived values (age) out of storage.
//!
//! # Invariants
//! - Achievement names are unique; an achievement is shared, never owned by a cat.
//! - A cat owns its link rows and nothing else.

pub mod achievement;
pub mod cat;
pub mod user;
