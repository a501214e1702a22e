//! Route table and request logging.

mod achievements;
mod cats;

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use serde_json::{json, Value};
use std::time::Instant;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/cats/", get(cats::list_cats).post(cats::create_cat))
        .route("/api/cats/top-colors-cats/", get(cats::top_color))
        .route(
            "/api/cats/:id/",
            get(cats::get_cat)
                .put(cats::replace_cat)
                .patch(cats::patch_cat)
                .delete(cats::delete_cat),
        )
        .route(
            "/api/achievements/",
            get(achievements::list_achievements).post(achievements::create_achievement),
        )
        .route(
            "/api/achievements/:id/",
            get(achievements::get_achievement)
                .put(achievements::replace_achievement)
                .patch(achievements::patch_achievement)
                .delete(achievements::delete_achievement),
        )
        .fallback(not_found)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": kittygram_core::core_version(),
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();
    let response = next.run(request).await;
    info!(
        "event=http_request module=api method={method} path={path} status={} duration_ms={}",
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}
