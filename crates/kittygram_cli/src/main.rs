//! `kittygram` command-line entry point.
//!
//! # Responsibility
//! - Parse flags and environment into server settings.
//! - Start logging before any storage or network work.
//! - Offer small admin commands that share the server's database path.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kittygram_api::config::{DEFAULT_BIND, DEFAULT_DB_PATH, DEFAULT_MEDIA_ROOT, DEFAULT_USER_HEADER};
use kittygram_api::ServerConfig;
use kittygram_core::db::migrations::latest_version;
use kittygram_core::db::open_db;
use kittygram_core::repo::user_repo::SqliteUserRepository;
use kittygram_core::{default_log_level, init_logging, UserService};
use log::info;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "kittygram", version, about = "Cat registry HTTP service")]
struct Cli {
    #[command(flatten)]
    logging: LoggingArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct LoggingArgs {
    /// trace|debug|info|warn|error
    #[arg(long, env = "KITTYGRAM_LOG_LEVEL", global = true)]
    log_level: Option<String>,
    /// Rotating log files go here; stderr when unset.
    #[arg(long, env = "KITTYGRAM_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DbArgs {
    #[arg(long, env = "KITTYGRAM_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "KITTYGRAM_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
        #[command(flatten)]
        db: DbArgs,
        #[arg(long, env = "KITTYGRAM_MEDIA_ROOT", default_value = DEFAULT_MEDIA_ROOT)]
        media_root: PathBuf,
        /// Header carrying the authenticated user id.
        #[arg(long, env = "KITTYGRAM_USER_HEADER", default_value = DEFAULT_USER_HEADER)]
        user_header: String,
    },
    /// Register an owner and print its id.
    CreateUser {
        username: String,
        #[command(flatten)]
        db: DbArgs,
    },
    /// Apply pending schema migrations and exit.
    Migrate {
        #[command(flatten)]
        db: DbArgs,
    },
    /// Print core linkage and version.
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    start_logging(&cli.logging)?;

    match cli.command {
        Command::Serve {
            bind,
            db,
            media_root,
            user_header,
        } => {
            let config = ServerConfig {
                bind,
                db_path: db.db_path,
                media_root,
                user_header,
            };
            kittygram_api::serve(config).await?;
        }
        Command::CreateUser { username, db } => {
            let conn = open_db(&db.db_path)
                .with_context(|| format!("failed to open `{}`", db.db_path.display()))?;
            let users = UserService::new(SqliteUserRepository::try_new(&conn)?);
            let user = users.register(&username)?;
            info!("event=user_create module=cli status=ok user_id={}", user.id);
            println!("{}", user.id);
        }
        Command::Migrate { db } => {
            open_db(&db.db_path)
                .with_context(|| format!("failed to migrate `{}`", db.db_path.display()))?;
            println!("schema version {}", latest_version());
        }
        Command::Version => {
            println!("kittygram_core ping={}", kittygram_core::ping());
            println!("kittygram_core version={}", kittygram_core::core_version());
        }
    }
    Ok(())
}

fn start_logging(args: &LoggingArgs) -> Result<()> {
    let level = args.log_level.as_deref().unwrap_or(default_log_level());
    let log_dir = args.log_dir.as_deref().map(absolute).transpose()?;
    init_logging(level, log_dir.as_deref()).map_err(anyhow::Error::msg)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    Ok(cwd.join(path))
}
