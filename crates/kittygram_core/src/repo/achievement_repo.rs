//! Achievement repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `name` is the natural key; `get_or_create_achievement` never inserts a
//!   second row for a name that already exists.
//! - Deleting an achievement removes its link rows through FK cascade.

use crate::model::achievement::{Achievement, AchievementId};
use crate::repo::{ensure_schema, is_constraint_violation, RepoError, RepoResult, TableSpec};
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "achievement";

/// Repository interface for achievement CRUD.
pub trait AchievementRepository {
    /// Inserts a new achievement; fails with `Conflict` when the name exists.
    fn create_achievement(&self, name: &str) -> RepoResult<Achievement>;
    /// Returns the achievement with `name`, inserting it first if absent.
    fn get_or_create_achievement(&self, name: &str) -> RepoResult<Achievement>;
    fn get_achievement(&self, id: AchievementId) -> RepoResult<Option<Achievement>>;
    /// All achievements ordered by id.
    fn list_achievements(&self) -> RepoResult<Vec<Achievement>>;
    fn rename_achievement(&self, id: AchievementId, name: &str) -> RepoResult<Achievement>;
    fn delete_achievement(&self, id: AchievementId) -> RepoResult<()>;
}

/// SQLite-backed achievement repository.
pub struct SqliteAchievementRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAchievementRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[TableSpec {
                table: "achievements",
                columns: &["id", "name"],
            }],
        )?;
        Ok(Self { conn })
    }
}

impl AchievementRepository for SqliteAchievementRepository<'_> {
    fn create_achievement(&self, name: &str) -> RepoResult<Achievement> {
        match self
            .conn
            .execute("INSERT INTO achievements (name) VALUES (?1);", [name])
        {
            Ok(_) => Ok(Achievement {
                id: self.conn.last_insert_rowid(),
                name: name.to_string(),
            }),
            Err(err) if is_constraint_violation(&err) => Err(RepoError::Conflict {
                entity: ENTITY,
                value: name.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn get_or_create_achievement(&self, name: &str) -> RepoResult<Achievement> {
        upsert_achievement(self.conn, name)
    }

    fn get_achievement(&self, id: AchievementId) -> RepoResult<Option<Achievement>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM achievements WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_achievement_row(row)?));
        }
        Ok(None)
    }

    fn list_achievements(&self) -> RepoResult<Vec<Achievement>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM achievements ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut achievements = Vec::new();
        while let Some(row) = rows.next()? {
            achievements.push(parse_achievement_row(row)?);
        }
        Ok(achievements)
    }

    fn rename_achievement(&self, id: AchievementId, name: &str) -> RepoResult<Achievement> {
        let changed = match self.conn.execute(
            "UPDATE achievements SET name = ?2 WHERE id = ?1;",
            params![id, name],
        ) {
            Ok(changed) => changed,
            Err(err) if is_constraint_violation(&err) => {
                return Err(RepoError::Conflict {
                    entity: ENTITY,
                    value: name.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }

        Ok(Achievement {
            id,
            name: name.to_string(),
        })
    }

    fn delete_achievement(&self, id: AchievementId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM achievements WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }
}

/// Upsert-by-natural-key. Accepts a plain connection or an open transaction.
pub(crate) fn upsert_achievement(conn: &Connection, name: &str) -> RepoResult<Achievement> {
    conn.execute("INSERT OR IGNORE INTO achievements (name) VALUES (?1);", [name])?;
    let achievement = conn.query_row(
        "SELECT id, name FROM achievements WHERE name = ?1;",
        [name],
        |row| {
            Ok(Achievement {
                id: row.get("id")?,
                name: row.get("name")?,
            })
        },
    )?;
    Ok(achievement)
}

/// Achievements linked to `cat_id`, ordered by achievement id.
pub(crate) fn load_cat_achievements(
    conn: &Connection,
    cat_id: i64,
) -> RepoResult<Vec<Achievement>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name
         FROM cat_achievements ca
         INNER JOIN achievements a ON a.id = ca.achievement_id
         WHERE ca.cat_id = ?1
         ORDER BY a.id ASC;",
    )?;
    let mut rows = stmt.query([cat_id])?;
    let mut achievements = Vec::new();
    while let Some(row) = rows.next()? {
        achievements.push(parse_achievement_row(row)?);
    }
    Ok(achievements)
}

fn parse_achievement_row(row: &Row<'_>) -> RepoResult<Achievement> {
    let name: String = row.get("name")?;
    if name.trim().is_empty() {
        return Err(RepoError::InvalidData(
            "blank value in achievements.name".to_string(),
        ));
    }
    Ok(Achievement {
        id: row.get("id")?,
        name,
    })
}
