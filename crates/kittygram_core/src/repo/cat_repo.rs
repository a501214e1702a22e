//! Cat repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist cat rows together with their achievement link set.
//! - Reconcile a desired achievement name list into shared achievement rows
//!   and per-cat links.
//! - Answer the most-popular-color aggregate.
//!
//! # Invariants
//! - `create_cat` and `update_cat` run in one `IMMEDIATE` transaction each.
//! - At most one link row exists per `(cat, achievement)` pair.
//! - Replacing a link set never deletes achievement rows.
//! - Color ties in the aggregate resolve to the lexicographically smallest
//!   name.

use crate::model::cat::{Cat, CatFields, CatId, NewCat};
use crate::repo::achievement_repo::{load_cat_achievements, upsert_achievement};
use crate::repo::{ensure_schema, RepoError, RepoResult, TableSpec};
use log::debug;
use rusqlite::{params, Connection, Row, TransactionBehavior};

const ENTITY: &str = "cat";
const CATS_DEFAULT_LIMIT: u32 = 10;
const CATS_LIMIT_MAX: u32 = 50;

const CAT_SELECT_SQL: &str = "SELECT
    id,
    name,
    color,
    birth_year,
    image,
    owner_id
FROM cats";

/// Window options for listing cats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatListQuery {
    /// Defaults to 10 and clamps to 50.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for cat persistence and link reconciliation.
pub trait CatRepository {
    /// Inserts the cat and links every named achievement, creating missing
    /// ones. Returns the new id.
    fn create_cat(&mut self, cat: &NewCat, achievements: &[String]) -> RepoResult<CatId>;
    /// Overwrites stored fields. With `Some(names)` the link set is replaced by
    /// exactly `names`; with `None` links are left as they are.
    fn update_cat(
        &mut self,
        id: CatId,
        fields: &CatFields,
        achievements: Option<&[String]>,
    ) -> RepoResult<()>;
    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>>;
    /// Cats ordered by id.
    fn list_cats(&self, query: &CatListQuery) -> RepoResult<Vec<Cat>>;
    fn delete_cat(&self, id: CatId) -> RepoResult<()>;
    /// The color with the highest occurrence count, `None` when no cats exist.
    fn most_common_color(&self) -> RepoResult<Option<String>>;
}

/// SQLite-backed cat repository.
pub struct SqliteCatRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCatRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[
                TableSpec {
                    table: "cats",
                    columns: &["id", "name", "color", "birth_year", "image", "owner_id"],
                },
                TableSpec {
                    table: "achievements",
                    columns: &["id", "name"],
                },
                TableSpec {
                    table: "cat_achievements",
                    columns: &["cat_id", "achievement_id"],
                },
            ],
        )?;
        Ok(Self { conn })
    }
}

impl CatRepository for SqliteCatRepository<'_> {
    fn create_cat(&mut self, cat: &NewCat, achievements: &[String]) -> RepoResult<CatId> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO cats (name, color, birth_year, image, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                cat.fields.name.as_str(),
                cat.fields.color.as_str(),
                cat.fields.birth_year,
                cat.fields.image.as_deref(),
                cat.owner,
            ],
        )?;
        let cat_id = tx.last_insert_rowid();
        link_achievements(&tx, cat_id, achievements)?;

        tx.commit()?;
        Ok(cat_id)
    }

    fn update_cat(
        &mut self,
        id: CatId,
        fields: &CatFields,
        achievements: Option<&[String]>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE cats
             SET
                name = ?2,
                color = ?3,
                birth_year = ?4,
                image = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id,
                fields.name.as_str(),
                fields.color.as_str(),
                fields.birth_year,
                fields.image.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }

        if let Some(names) = achievements {
            let removed = tx.execute("DELETE FROM cat_achievements WHERE cat_id = ?1;", [id])?;
            debug!("event=cat_links_replace module=repo cat_id={id} removed={removed}");
            link_achievements(&tx, id, names)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CAT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_cat_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_cats(&self, query: &CatListQuery) -> RepoResult<Vec<Cat>> {
        let limit = normalize_cat_limit(query.limit);
        let mut stmt = self.conn.prepare(&format!(
            "{CAT_SELECT_SQL} ORDER BY id ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(limit), i64::from(query.offset)])?;
        let mut cats = Vec::new();
        while let Some(row) = rows.next()? {
            cats.push(parse_cat_row(self.conn, row)?);
        }
        Ok(cats)
    }

    fn delete_cat(&self, id: CatId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM cats WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn most_common_color(&self) -> RepoResult<Option<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT color, COUNT(*) AS top
             FROM cats
             GROUP BY color
             ORDER BY top DESC, color ASC
             LIMIT 1;",
        )?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(row.get("color")?));
        }
        Ok(None)
    }
}

/// Normalizes list limit according to the cat list contract.
pub fn normalize_cat_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => CATS_DEFAULT_LIMIT,
        Some(value) if value > CATS_LIMIT_MAX => CATS_LIMIT_MAX,
        Some(value) => value,
    }
}

fn link_achievements(conn: &Connection, cat_id: CatId, names: &[String]) -> RepoResult<()> {
    for name in names {
        let achievement = upsert_achievement(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO cat_achievements (cat_id, achievement_id)
             VALUES (?1, ?2);",
            params![cat_id, achievement.id],
        )?;
    }
    Ok(())
}

fn parse_cat_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Cat> {
    let id: CatId = row.get("id")?;
    let color: String = row.get("color")?;
    if color.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty color for cat {id} in cats.color"
        )));
    }

    Ok(Cat {
        id,
        name: row.get("name")?,
        color,
        birth_year: row.get("birth_year")?,
        image: row.get("image")?,
        owner: row.get("owner_id")?,
        achievements: load_cat_achievements(conn, id)?,
    })
}
