//! Achievement use-case service.
//!
//! # Invariants
//! - Names are trimmed, non-blank and at most 64 characters.
//! - A name collision surfaces as a validation error on `achievement_name`,
//!   never as a storage error.

use crate::model::achievement::{Achievement, AchievementId, AchievementPayload};
use crate::repo::achievement_repo::AchievementRepository;
use crate::repo::RepoError;
use crate::validation::{validate_text, ValidationErrors, ACHIEVEMENT_NAME_MAX_CHARS};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

const NAME_FIELD: &str = "achievement_name";
pub const MSG_NAME_TAKEN: &str = "achievement with this achievement name already exists.";

#[derive(Debug)]
pub enum AchievementServiceError {
    Validation(ValidationErrors),
    AchievementNotFound(AchievementId),
    Repo(RepoError),
}

impl Display for AchievementServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "invalid achievement payload: {errors}"),
            Self::AchievementNotFound(id) => write!(f, "achievement not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AchievementServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Repo(err) => Some(err),
            Self::AchievementNotFound(_) => None,
        }
    }
}

impl From<RepoError> for AchievementServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "achievement",
                id,
            } => Self::AchievementNotFound(id),
            RepoError::Conflict {
                entity: "achievement",
                ..
            } => Self::Validation(ValidationErrors::single(NAME_FIELD, MSG_NAME_TAKEN)),
            other => Self::Repo(other),
        }
    }
}

pub struct AchievementService<R: AchievementRepository> {
    repo: R,
}

impl<R: AchievementRepository> AchievementService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_achievements(&self) -> Result<Vec<Achievement>, AchievementServiceError> {
        Ok(self.repo.list_achievements()?)
    }

    pub fn get_achievement(
        &self,
        id: AchievementId,
    ) -> Result<Achievement, AchievementServiceError> {
        self.repo
            .get_achievement(id)?
            .ok_or(AchievementServiceError::AchievementNotFound(id))
    }

    /// Creates a new achievement; an existing name is a validation error.
    pub fn create_achievement(
        &self,
        payload: AchievementPayload,
    ) -> Result<Achievement, AchievementServiceError> {
        let name = validate_name(payload.name.as_deref(), true)?
            .ok_or_else(required_name_error)?;
        let created = self.repo.create_achievement(&name)?;
        info!(
            "event=achievement_create module=service status=ok achievement_id={}",
            created.id
        );
        Ok(created)
    }

    /// Renames an achievement. With a partial payload and no name, returns the
    /// stored row unchanged.
    pub fn update_achievement(
        &self,
        id: AchievementId,
        payload: AchievementPayload,
        partial: bool,
    ) -> Result<Achievement, AchievementServiceError> {
        let Some(name) = validate_name(payload.name.as_deref(), !partial)? else {
            return self.get_achievement(id);
        };
        let renamed = self.repo.rename_achievement(id, &name)?;
        info!("event=achievement_update module=service status=ok achievement_id={id}");
        Ok(renamed)
    }

    /// Deletes the achievement and unlinks it from every cat.
    pub fn delete_achievement(&self, id: AchievementId) -> Result<(), AchievementServiceError> {
        self.repo.delete_achievement(id)?;
        info!("event=achievement_delete module=service status=ok achievement_id={id}");
        Ok(())
    }
}

fn validate_name(
    value: Option<&str>,
    required: bool,
) -> Result<Option<String>, AchievementServiceError> {
    validate_text(value, required, ACHIEVEMENT_NAME_MAX_CHARS).map_err(|message| {
        AchievementServiceError::Validation(ValidationErrors::single(NAME_FIELD, message))
    })
}

fn required_name_error() -> AchievementServiceError {
    AchievementServiceError::Validation(ValidationErrors::single(
        NAME_FIELD,
        crate::validation::MSG_REQUIRED,
    ))
}
