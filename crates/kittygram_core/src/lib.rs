//! Core domain logic for Kittygram.
//! Owns the cat and achievement rules, storage, and image/color transcoding;
//! transports call into the services exposed here.

pub mod clock;
pub mod context;
pub mod db;
pub mod logging;
pub mod media;
pub mod model;
pub mod repo;
pub mod service;
pub mod transcode;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::RequestContext;
pub use logging::{default_log_level, init_logging, LogTarget};
pub use media::{MediaError, MediaStore};
pub use model::achievement::{Achievement, AchievementId, AchievementPayload};
pub use model::cat::{CatId, CatPayload, CatView, TopColor};
pub use model::user::{User, UserId};
pub use repo::{RepoError, RepoResult};
pub use service::achievement_service::{AchievementService, AchievementServiceError};
pub use service::cat_service::{CatService, CatServiceError, UpdateMode};
pub use service::user_service::{UserService, UserServiceError};
pub use validation::ValidationErrors;

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
