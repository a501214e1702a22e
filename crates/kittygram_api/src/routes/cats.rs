//! `/api/cats/` handlers.

use crate::error::ApiError;
use crate::state::{Access, AppState};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use kittygram_core::{CatId, CatPayload, CatView, TopColor, UpdateMode};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    limit: Option<u32>,
    offset: Option<u32>,
}

pub async fn list_cats(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<CatView>>, ApiError> {
    let Query(params) = params?;
    state.with_cat_service(headers, Access::Read, move |service, _| {
        Ok(Json(service.list_cats(params.limit, params.offset.unwrap_or(0))?))
    })
    .await
}

pub async fn create_cat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CatPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CatView>), ApiError> {
    state.with_cat_service(headers, Access::Write, move |service, ctx| {
        let Json(payload) = body?;
        let cat = service.create_cat(ctx, payload)?;
        Ok((StatusCode::CREATED, Json(cat)))
    })
    .await
}

pub async fn get_cat(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<CatId>, PathRejection>,
) -> Result<Json<CatView>, ApiError> {
    let id = path_id(id)?;
    state.with_cat_service(headers, Access::Read, move |service, _| {
        Ok(Json(service.get_cat(id)?))
    })
    .await
}

pub async fn replace_cat(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<CatId>, PathRejection>,
    body: Result<Json<CatPayload>, JsonRejection>,
) -> Result<Json<CatView>, ApiError> {
    update(state, headers, id, body, UpdateMode::Full).await
}

pub async fn patch_cat(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<CatId>, PathRejection>,
    body: Result<Json<CatPayload>, JsonRejection>,
) -> Result<Json<CatView>, ApiError> {
    update(state, headers, id, body, UpdateMode::Partial).await
}

pub async fn delete_cat(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<CatId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(id)?;
    state.with_cat_service(headers, Access::Write, move |service, _| {
        service.delete_cat(id)?;
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

pub async fn top_color(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TopColor>, ApiError> {
    state.with_cat_service(headers, Access::Read, move |service, _| {
        Ok(Json(service.top_color()?))
    })
    .await
}

async fn update(
    state: AppState,
    headers: HeaderMap,
    id: Result<Path<CatId>, PathRejection>,
    body: Result<Json<CatPayload>, JsonRejection>,
    mode: UpdateMode,
) -> Result<Json<CatView>, ApiError> {
    let id = path_id(id)?;
    state.with_cat_service(headers, Access::Write, move |service, _| {
        let Json(payload) = body?;
        Ok(Json(service.update_cat(id, payload, mode)?))
    })
    .await
}

/// Non-numeric ids match no resource.
pub(crate) fn path_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    id.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}
