//! Cat records, write models and the outbound wire shape.
//!
//! # Invariants
//! - `color` is always a canonical color name, never a hex value.
//! - `image` holds a media-root-relative path, never raw bytes.
//! - Age is derived at read time from the caller's current year.

use crate::model::achievement::{Achievement, AchievementPayload};
use crate::model::user::UserId;
use crate::transcode::image::ImageInput;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type CatId = i64;

/// Label of the single entry returned by the most-popular-color query.
pub const TOP_COLOR_LABEL: &str = "Самый популярный цвет";
/// Placeholder value when no cats are stored.
pub const NO_COLOR_DATA: &str = "Нет данных о цветах котов";

/// Stored cat with its linked achievements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cat {
    pub id: CatId,
    pub name: String,
    pub color: String,
    pub birth_year: i32,
    pub image: Option<String>,
    pub owner: UserId,
    /// Ordered by achievement id; callers must not rely on link order.
    pub achievements: Vec<Achievement>,
}

impl Cat {
    /// Age in whole years relative to `current_year`, saturating at the
    /// `i32` bounds.
    pub fn age(&self, current_year: i32) -> i32 {
        current_year.saturating_sub(self.birth_year)
    }

    /// Column values as currently stored, used as the base of an update.
    pub fn fields(&self) -> CatFields {
        CatFields {
            name: self.name.clone(),
            color: self.color.clone(),
            birth_year: self.birth_year,
            image: self.image.clone(),
        }
    }
}

/// Validated column values of one cat row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatFields {
    pub name: String,
    pub color: String,
    pub birth_year: i32,
    pub image: Option<String>,
}

/// Insert model: validated fields plus the owner taken from request context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCat {
    pub fields: CatFields,
    pub owner: UserId,
}

/// Inbound cat body for create, full update and partial update.
///
/// Absent keys stay `None`. For `image`, `Some(None)` is an explicit `null`
/// which clears the stored image. `id`, `owner` and `age` are read-only and
/// ignored when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatPayload {
    #[serde(default)]
    pub name: Option<String>,
    /// Hexadecimal color such as `#ff0000`.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub image: Option<Option<ImageInput>>,
    #[serde(default)]
    pub achievements: Option<Vec<AchievementPayload>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Outbound cat shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatView {
    pub id: CatId,
    pub name: String,
    pub color: String,
    pub birth_year: i32,
    pub achievements: Vec<Achievement>,
    pub owner: UserId,
    pub age: i32,
    /// Base64 data URI of the stored image, `null` when absent.
    pub image: Option<String>,
}

/// Result of the most-popular-color aggregate.
///
/// Serializes as a single-entry object keyed by [`TOP_COLOR_LABEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopColor {
    pub color: Option<String>,
}

impl TopColor {
    pub fn message(&self) -> &str {
        self.color.as_deref().unwrap_or(NO_COLOR_DATA)
    }
}

impl Serialize for TopColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(TOP_COLOR_LABEL, self.message())?;
        map.end()
    }
}
