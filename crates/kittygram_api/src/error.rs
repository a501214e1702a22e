//! HTTP error mapping.
//!
//! Bodies follow two shapes: `{"<field>": ["<message>"]}` for validation
//! failures and `{"detail": "<message>"}` for everything else.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kittygram_core::{
    AchievementServiceError, CatServiceError, RepoError, UserServiceError, ValidationErrors,
};
use log::error;
use serde_json::json;

pub const DETAIL_NOT_FOUND: &str = "Not found.";
pub const DETAIL_UNAUTHENTICATED: &str = "Authentication credentials were not provided.";
pub const DETAIL_SERVER_ERROR: &str = "A server error occurred.";

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),
    /// Request could not be decoded (bad JSON, wrong content type, bad query).
    Rejected { status: StatusCode, detail: String },
    NotFound,
    Unauthenticated,
    /// Cause is logged, never sent to the client.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(errors) => json!(errors),
            Self::Rejected { detail, .. } => json!({ "detail": detail }),
            Self::NotFound => json!({ "detail": DETAIL_NOT_FOUND }),
            Self::Unauthenticated => json!({ "detail": DETAIL_UNAUTHENTICATED }),
            Self::Internal(cause) => {
                error!("event=http_error module=api status=500 error={cause}");
                json!({ "detail": DETAIL_SERVER_ERROR })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        let status = match value.status() {
            StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
            other => other,
        };
        Self::Rejected {
            status,
            detail: value.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::Rejected {
            status: StatusCode::BAD_REQUEST,
            detail: value.body_text(),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { .. } => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CatServiceError> for ApiError {
    fn from(value: CatServiceError) -> Self {
        match value {
            CatServiceError::Validation(errors) => Self::Validation(errors),
            CatServiceError::CatNotFound(_) => Self::NotFound,
            CatServiceError::Unauthenticated => Self::Unauthenticated,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AchievementServiceError> for ApiError {
    fn from(value: AchievementServiceError) -> Self {
        match value {
            AchievementServiceError::Validation(errors) => Self::Validation(errors),
            AchievementServiceError::AchievementNotFound(_) => Self::NotFound,
            AchievementServiceError::Repo(err) => err.into(),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(value: UserServiceError) -> Self {
        match value {
            UserServiceError::UnknownUser(_) => Self::Unauthenticated,
            other => Self::Internal(other.to_string()),
        }
    }
}
