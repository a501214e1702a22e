//! HTTP surface for Kittygram.
//!
//! # Responsibility
//! - Map REST routes onto `kittygram_core` services.
//! - Render service errors as JSON bodies with matching status codes.
//!
//! # Invariants
//! - The shared SQLite connection is never held across an `.await`.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;

use kittygram_core::db::DbError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::net::TcpListener;

/// Failure to bring the server up or keep it running.
#[derive(Debug)]
pub enum ServeError {
    Db(DbError),
    InvalidUserHeader(String),
    Io(std::io::Error),
}

impl Display for ServeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "database setup failed: {err}"),
            Self::InvalidUserHeader(value) => write!(f, "invalid user header name `{value}`"),
            Self::Io(err) => write!(f, "server io failed: {err}"),
        }
    }
}

impl Error for ServeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::InvalidUserHeader(_) => None,
        }
    }
}

impl From<DbError> for ServeError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<std::io::Error> for ServeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Opens storage, binds `config.bind` and serves until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServeError> {
    let state = AppState::open(&config)?;
    let listener = TcpListener::bind(config.bind).await?;
    info!(
        "event=server_start module=api status=ok bind={} db_path={} media_root={}",
        listener.local_addr()?,
        config.db_path.display(),
        config.media_root.display()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=api status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=shutdown_signal module=api status=error error={err}");
    }
}
