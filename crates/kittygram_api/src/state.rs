//! Shared application state and per-request service construction.

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::ServeError;
use axum::http::{HeaderMap, HeaderName};
use kittygram_core::db::open_db;
use kittygram_core::repo::achievement_repo::SqliteAchievementRepository;
use kittygram_core::repo::cat_repo::SqliteCatRepository;
use kittygram_core::repo::user_repo::SqliteUserRepository;
use kittygram_core::{
    AchievementService, CatService, Clock, MediaStore, RequestContext, SystemClock, UserService,
};
use log::warn;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Whether a handler needs an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

#[derive(Clone)]
pub struct AppState {
    shared: Arc<Shared>,
}

struct Shared {
    conn: Mutex<Connection>,
    media: MediaStore,
    clock: Arc<dyn Clock>,
    user_header: HeaderName,
}

impl AppState {
    pub fn new(
        conn: Connection,
        media: MediaStore,
        clock: Arc<dyn Clock>,
        user_header: HeaderName,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                conn: Mutex::new(conn),
                media,
                clock,
                user_header,
            }),
        }
    }

    /// Opens the configured database and media root with the system clock.
    pub fn open(config: &ServerConfig) -> Result<Self, ServeError> {
        let user_header = HeaderName::from_bytes(config.user_header.trim().as_bytes())
            .map_err(|_| ServeError::InvalidUserHeader(config.user_header.clone()))?;
        std::fs::create_dir_all(&config.media_root)?;
        let conn = open_db(&config.db_path)?;
        Ok(Self::new(
            conn,
            MediaStore::new(&config.media_root),
            Arc::new(SystemClock),
            user_header,
        ))
    }

    /// Runs `f` against a per-request cat service on the blocking pool.
    pub(crate) async fn with_cat_service<T, F>(
        &self,
        headers: HeaderMap,
        access: Access,
        f: F,
    ) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(
                &mut CatService<'_, SqliteCatRepository<'_>>,
                &RequestContext,
            ) -> Result<T, ApiError>
            + Send
            + 'static,
    {
        let state = self.clone();
        run_blocking(move || {
            state.with_connection(&headers, access, |conn, ctx| {
                let repo = SqliteCatRepository::try_new(conn)?;
                let mut service =
                    CatService::new(repo, &state.shared.media, state.shared.clock.as_ref());
                f(&mut service, ctx)
            })
        })
        .await
    }

    /// Runs `f` against a per-request achievement service on the blocking pool.
    pub(crate) async fn with_achievement_service<T, F>(
        &self,
        headers: HeaderMap,
        access: Access,
        f: F,
    ) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&AchievementService<SqliteAchievementRepository<'_>>) -> Result<T, ApiError>
            + Send
            + 'static,
    {
        let state = self.clone();
        run_blocking(move || {
            state.with_connection(&headers, access, |conn, _| {
                let repo = SqliteAchievementRepository::try_new(conn)?;
                f(&AchievementService::new(repo))
            })
        })
        .await
    }

    fn with_connection<T>(
        &self,
        headers: &HeaderMap,
        access: Access,
        f: impl FnOnce(&mut Connection, &RequestContext) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut conn = self.shared.conn.lock().unwrap_or_else(|poisoned| {
            // An open transaction was rolled back when its guard unwound.
            warn!("event=db_lock module=api status=recovered reason=poisoned");
            self.shared.conn.clear_poison();
            poisoned.into_inner()
        });
        let ctx = match access {
            Access::Read => RequestContext::anonymous(),
            Access::Write => {
                let ctx = self.resolve_context(&conn, headers)?;
                if ctx.user().is_none() {
                    return Err(ApiError::Unauthenticated);
                }
                ctx
            }
        };
        f(&mut conn, &ctx)
    }

    fn resolve_context(
        &self,
        conn: &Connection,
        headers: &HeaderMap,
    ) -> Result<RequestContext, ApiError> {
        let raw = match headers.get(&self.shared.user_header) {
            Some(value) => Some(value.to_str().map_err(|_| ApiError::Unauthenticated)?),
            None => None,
        };
        let users = UserService::new(SqliteUserRepository::try_new(conn)?);
        Ok(users.resolve_context(raw)?)
    }
}

/// Moves synchronous storage and file work off the async workers.
async fn run_blocking<T: Send + 'static>(
    job: impl FnOnce() -> Result<T, ApiError> + Send + 'static,
) -> Result<T, ApiError> {
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result,
        Err(err) => Err(ApiError::Internal(format!("request task failed: {err}"))),
    }
}
