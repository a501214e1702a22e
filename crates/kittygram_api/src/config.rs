//! Server settings.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_DB_PATH: &str = "kittygram.sqlite3";
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_USER_HEADER: &str = "x-user-id";

/// Resolved settings for one server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    /// Root under which `cats/images/` is created.
    pub media_root: PathBuf,
    /// Header carrying the authenticated user id.
    pub user_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            media_root: PathBuf::from(DEFAULT_MEDIA_ROOT),
            user_header: DEFAULT_USER_HEADER.to_string(),
        }
    }
}
