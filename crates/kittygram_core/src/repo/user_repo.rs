//! Owner rows referenced by cats.

use crate::model::user::{User, UserId};
use crate::repo::{ensure_schema, is_constraint_violation, RepoError, RepoResult, TableSpec};
use rusqlite::{Connection, Row};

pub trait UserRepository {
    fn create_user(&self, username: &str) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[TableSpec {
                table: "users",
                columns: &["id", "username"],
            }],
        )?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, username: &str) -> RepoResult<User> {
        match self
            .conn
            .execute("INSERT INTO users (username) VALUES (?1);", [username])
        {
            Ok(_) => Ok(User {
                id: self.conn.last_insert_rowid(),
                username: username.to_string(),
            }),
            Err(err) if is_constraint_violation(&err) => Err(RepoError::Conflict {
                entity: "user",
                value: username.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username FROM users WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
    })
}
