//! Owner registration and request-context resolution.
//!
//! Credentials are verified upstream; this service only maps an already
//! authenticated user id onto a stored row.

use crate::context::RequestContext;
use crate::model::user::{User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

const USERNAME_MAX_CHARS: usize = 150;

#[derive(Debug)]
pub enum UserServiceError {
    InvalidUsername(String),
    UsernameTaken(String),
    /// Presented identity does not match a stored user.
    UnknownUser(String),
    Repo(RepoError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUsername(value) => write!(f, "invalid username: `{value}`"),
            Self::UsernameTaken(value) => write!(f, "username already taken: `{value}`"),
            Self::UnknownUser(value) => write!(f, "unknown user: `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Conflict {
                entity: "user",
                value,
            } => Self::UsernameTaken(value),
            other => Self::Repo(other),
        }
    }
}

pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a user row for an identity managed upstream.
    pub fn register(&self, username: &str) -> Result<User, UserServiceError> {
        let trimmed = username.trim();
        let valid = !trimmed.is_empty()
            && trimmed.chars().count() <= USERNAME_MAX_CHARS
            && trimmed
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
        if !valid {
            return Err(UserServiceError::InvalidUsername(username.to_string()));
        }
        Ok(self.repo.create_user(trimmed)?)
    }

    /// Builds the request context from a raw user id, as forwarded by the
    /// upstream authenticator.
    ///
    /// `None` yields an anonymous context.
    pub fn resolve_context(
        &self,
        raw_user_id: Option<&str>,
    ) -> Result<RequestContext, UserServiceError> {
        let Some(raw) = raw_user_id.map(str::trim) else {
            return Ok(RequestContext::anonymous());
        };
        let id = raw
            .parse::<UserId>()
            .map_err(|_| UserServiceError::UnknownUser(raw.to_string()))?;
        match self.repo.get_user(id)? {
            Some(user) => Ok(RequestContext::for_user(user.id)),
            None => Err(UserServiceError::UnknownUser(raw.to_string())),
        }
    }
}
