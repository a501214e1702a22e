//! Achievement records and input payloads.

use serde::{Deserialize, Serialize};

pub type AchievementId = i64;

/// Stored achievement, also the wire shape `{id, achievement_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    /// Natural key used for get-or-create deduplication.
    #[serde(rename = "achievement_name")]
    pub name: String,
}

/// Inbound achievement shape, used standalone and nested in cat payloads.
///
/// `id` in the body is read-only and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AchievementPayload {
    #[serde(rename = "achievement_name", default)]
    pub name: Option<String>,
}

impl AchievementPayload {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}
