//! `/api/achievements/` handlers.

use super::cats::path_id;
use crate::error::ApiError;
use crate::state::{Access, AppState};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use kittygram_core::{Achievement, AchievementId, AchievementPayload};

pub async fn list_achievements(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Achievement>>, ApiError> {
    state.with_achievement_service(headers, Access::Read, move |service| {
        Ok(Json(service.list_achievements()?))
    })
    .await
}

pub async fn create_achievement(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AchievementPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Achievement>), ApiError> {
    state.with_achievement_service(headers, Access::Write, move |service| {
        let Json(payload) = body?;
        let created = service.create_achievement(payload)?;
        Ok((StatusCode::CREATED, Json(created)))
    })
    .await
}

pub async fn get_achievement(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<AchievementId>, PathRejection>,
) -> Result<Json<Achievement>, ApiError> {
    let id = path_id(id)?;
    state.with_achievement_service(headers, Access::Read, move |service| {
        Ok(Json(service.get_achievement(id)?))
    })
    .await
}

pub async fn replace_achievement(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<AchievementId>, PathRejection>,
    body: Result<Json<AchievementPayload>, JsonRejection>,
) -> Result<Json<Achievement>, ApiError> {
    update(state, headers, id, body, false).await
}

pub async fn patch_achievement(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<AchievementId>, PathRejection>,
    body: Result<Json<AchievementPayload>, JsonRejection>,
) -> Result<Json<Achievement>, ApiError> {
    update(state, headers, id, body, true).await
}

pub async fn delete_achievement(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<AchievementId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(id)?;
    state.with_achievement_service(headers, Access::Write, move |service| {
        service.delete_achievement(id)?;
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

async fn update(
    state: AppState,
    headers: HeaderMap,
    id: Result<Path<AchievementId>, PathRejection>,
    body: Result<Json<AchievementPayload>, JsonRejection>,
    partial: bool,
) -> Result<Json<Achievement>, ApiError> {
    let id = path_id(id)?;
    state.with_achievement_service(headers, Access::Write, move |service| {
        let Json(payload) = body?;
        Ok(Json(service.update_achievement(id, payload, partial)?))
    })
    .await
}
