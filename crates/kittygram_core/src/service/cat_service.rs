//! Cat use-case service.
//!
//! # Responsibility
//! - Validate and transcode inbound cat payloads (color, image, birth year,
//!   nested achievements) into storage values.
//! - Drive create/update reconciliation of the achievement link set.
//! - Shape stored cats into the outbound view with derived `age` and an
//!   embedded image.
//!
//! # Invariants
//! - Validation completes before any storage write; a rejected payload
//!   changes nothing.
//! - Creating a cat requires a caller in the request context; the caller
//!   becomes the owner.
//! - `age` is always `clock.current_year() - birth_year` at read time.

use crate::clock::Clock;
use crate::context::RequestContext;
use crate::media::{MediaError, MediaStore};
use crate::model::achievement::AchievementPayload;
use crate::model::cat::{Cat, CatFields, CatId, CatPayload, CatView, NewCat, TopColor};
use crate::repo::cat_repo::{normalize_cat_limit, CatListQuery, CatRepository};
use crate::repo::RepoError;
use crate::transcode::color::hex_to_name;
use crate::transcode::image::{self, ImageInput, ValidImage};
use crate::validation::{
    require, validate_birth_year, validate_text, ValidationErrors, ACHIEVEMENT_NAME_MAX_CHARS,
    CAT_NAME_MAX_CHARS,
};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for cat use-cases.
#[derive(Debug)]
pub enum CatServiceError {
    /// Payload rejected; nothing was written.
    Validation(ValidationErrors),
    CatNotFound(CatId),
    /// Operation needs a caller and the context has none.
    Unauthenticated,
    Media(MediaError),
    Repo(RepoError),
    /// Write succeeded but read-back did not match.
    InconsistentState(&'static str),
}

impl Display for CatServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "invalid cat payload: {errors}"),
            Self::CatNotFound(id) => write!(f, "cat not found: {id}"),
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::Media(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent cat state: {details}"),
        }
    }
}

impl Error for CatServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Media(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "cat", id } => Self::CatNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<MediaError> for CatServiceError {
    fn from(value: MediaError) -> Self {
        Self::Media(value)
    }
}

impl From<ValidationErrors> for CatServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Whether an update must carry every writable required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// PUT semantics: `name`, `color`, `birth_year` are required.
    Full,
    /// PATCH semantics: any subset, absent fields keep their stored value.
    Partial,
}

/// Payload after validation and transcoding; absent fields stay `None`.
#[derive(Debug, Default)]
struct ValidatedCat {
    name: Option<String>,
    color: Option<String>,
    birth_year: Option<i32>,
    image: Option<Option<ValidImage>>,
    achievements: Option<Vec<String>>,
}

/// Cat service facade over repository implementations.
pub struct CatService<'a, R: CatRepository> {
    repo: R,
    media: &'a MediaStore,
    clock: &'a dyn Clock,
}

impl<'a, R: CatRepository> CatService<'a, R> {
    pub fn new(repo: R, media: &'a MediaStore, clock: &'a dyn Clock) -> Self {
        Self { repo, media, clock }
    }

    /// Creates one cat owned by the context's caller.
    ///
    /// Nested achievements are get-or-created by name and linked in input
    /// order; repeated names yield one link.
    pub fn create_cat(
        &mut self,
        ctx: &RequestContext,
        payload: CatPayload,
    ) -> Result<CatView, CatServiceError> {
        let started_at = Instant::now();
        let owner = ctx.user().ok_or(CatServiceError::Unauthenticated)?;

        let validated = self.validate(payload, UpdateMode::Full)?;
        let (Some(name), Some(color), Some(birth_year)) =
            (validated.name, validated.color, validated.birth_year)
        else {
            return Err(CatServiceError::InconsistentState(
                "required fields missing after validation",
            ));
        };

        let image = match validated.image.flatten() {
            Some(image) => Some(self.media.save(&image.file)?),
            None => None,
        };
        let new_cat = NewCat {
            fields: CatFields {
                name,
                color,
                birth_year,
                image,
            },
            owner,
        };
        let achievements = validated.achievements.unwrap_or_default();

        let cat_id = match self.repo.create_cat(&new_cat, &achievements) {
            Ok(id) => id,
            Err(err) => {
                self.discard_image(new_cat.fields.image.as_deref());
                return Err(err.into());
            }
        };

        info!(
            "event=cat_create module=service status=ok cat_id={cat_id} owner={owner} achievements={} duration_ms={}",
            achievements.len(),
            started_at.elapsed().as_millis()
        );
        self.read_back(cat_id, "created cat not found in read-back")
    }

    /// Applies present fields over the stored cat.
    ///
    /// An `achievements` key replaces the whole link set; its absence leaves
    /// links untouched. `image: null` clears the image.
    pub fn update_cat(
        &mut self,
        id: CatId,
        payload: CatPayload,
        mode: UpdateMode,
    ) -> Result<CatView, CatServiceError> {
        let started_at = Instant::now();
        let current = self
            .repo
            .get_cat(id)?
            .ok_or(CatServiceError::CatNotFound(id))?;
        let validated = self.validate(payload, mode)?;

        let mut fields = current.fields();
        if let Some(name) = validated.name {
            fields.name = name;
        }
        if let Some(color) = validated.color {
            fields.color = color;
        }
        if let Some(birth_year) = validated.birth_year {
            fields.birth_year = birth_year;
        }
        let mut stored_image = None;
        match validated.image {
            Some(Some(image)) => {
                let reference = self.media.save(&image.file)?;
                stored_image = Some(reference.clone());
                fields.image = Some(reference);
            }
            Some(None) => fields.image = None,
            None => {}
        }

        let replace_links = validated.achievements.is_some();
        if let Err(err) = self
            .repo
            .update_cat(id, &fields, validated.achievements.as_deref())
        {
            self.discard_image(stored_image.as_deref());
            return Err(err.into());
        }

        info!(
            "event=cat_update module=service status=ok cat_id={id} mode={mode:?} replace_links={replace_links} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        self.read_back(id, "updated cat not found in read-back")
    }

    pub fn get_cat(&self, id: CatId) -> Result<CatView, CatServiceError> {
        let cat = self
            .repo
            .get_cat(id)?
            .ok_or(CatServiceError::CatNotFound(id))?;
        Ok(self.to_view(cat))
    }

    /// Lists cats by id with a `limit`/`offset` window. The limit defaults to
    /// 10 and is capped at 50.
    pub fn list_cats(
        &self,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<CatView>, CatServiceError> {
        let query = CatListQuery {
            limit: Some(normalize_cat_limit(limit)),
            offset,
        };
        Ok(self
            .repo
            .list_cats(&query)?
            .into_iter()
            .map(|cat| self.to_view(cat))
            .collect())
    }

    /// Deletes the cat and its links. Achievements and the image file stay.
    pub fn delete_cat(&self, id: CatId) -> Result<(), CatServiceError> {
        self.repo.delete_cat(id)?;
        info!("event=cat_delete module=service status=ok cat_id={id}");
        Ok(())
    }

    /// Most frequent color across all cats.
    pub fn top_color(&self) -> Result<TopColor, CatServiceError> {
        let color = self.repo.most_common_color()?;
        Ok(TopColor { color })
    }

    fn validate(
        &self,
        payload: CatPayload,
        mode: UpdateMode,
    ) -> Result<ValidatedCat, ValidationErrors> {
        let required = mode == UpdateMode::Full;
        let mut errors = ValidationErrors::new();
        let mut validated = ValidatedCat::default();

        match validate_text(payload.name.as_deref(), required, CAT_NAME_MAX_CHARS) {
            Ok(name) => validated.name = name,
            Err(message) => errors.add("name", message),
        }

        let color = if required {
            require(&mut errors, "color", payload.color)
        } else {
            payload.color
        };
        if let Some(hex) = color {
            match hex_to_name(&hex) {
                Ok(name) => validated.color = Some(name.to_string()),
                Err(err) => errors.add("color", err.to_string()),
            }
        }

        let birth_year = if required {
            require(&mut errors, "birth_year", payload.birth_year)
        } else {
            payload.birth_year
        };
        if let Some(birth_year) = birth_year {
            match validate_birth_year(birth_year, self.clock.current_year()) {
                Ok(value) => validated.birth_year = Some(value),
                Err(message) => errors.add("birth_year", message),
            }
        }

        validated.image = match payload.image {
            Some(Some(input)) => match image::to_internal_value(input) {
                Ok(image) => Some(Some(image)),
                Err(err) => {
                    errors.add("image", err.to_string());
                    None
                }
            },
            Some(None) => Some(None),
            None => None,
        };

        validated.achievements = payload
            .achievements
            .map(|items| validate_achievement_names(items, &mut errors));

        errors.into_result()?;
        Ok(validated)
    }

    fn read_back(&self, id: CatId, details: &'static str) -> Result<CatView, CatServiceError> {
        let cat = self
            .repo
            .get_cat(id)?
            .ok_or(CatServiceError::InconsistentState(details))?;
        Ok(self.to_view(cat))
    }

    fn to_view(&self, cat: Cat) -> CatView {
        let age = cat.age(self.clock.current_year());
        let image = cat
            .image
            .as_deref()
            .and_then(|reference| match self.media.read(reference) {
                Ok(bytes) => Some(image::to_representation(reference, &bytes)),
                Err(err) => {
                    warn!(
                        "event=cat_image_read module=service status=error cat_id={} error={err}",
                        cat.id
                    );
                    None
                }
            });

        CatView {
            id: cat.id,
            name: cat.name,
            color: cat.color,
            birth_year: cat.birth_year,
            achievements: cat.achievements,
            owner: cat.owner,
            age,
            image,
        }
    }

    fn discard_image(&self, reference: Option<&str>) {
        if let Some(reference) = reference {
            if let Err(err) = self.media.delete(reference) {
                warn!("event=media_discard module=service status=error error={err}");
            }
        }
    }
}

fn validate_achievement_names(
    items: Vec<AchievementPayload>,
    errors: &mut ValidationErrors,
) -> Vec<String> {
    let mut names = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match validate_text(item.name.as_deref(), true, ACHIEVEMENT_NAME_MAX_CHARS) {
            Ok(Some(name)) => names.push(name),
            Ok(None) => {}
            Err(message) => errors.add(format!("achievements[{index}].achievement_name"), message),
        }
    }
    names
}

/// Builds an upload input for callers holding raw file bytes.
pub fn upload_image(name: impl Into<String>, bytes: Vec<u8>) -> ImageInput {
    ImageInput::Upload(image::ImageFile::new(name, bytes))
}
