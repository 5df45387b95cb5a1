//! Wish repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `wishes` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Title and description are stored exactly as given; blank-field checks
//!   belong to the form layer.
//! - Updates and reads reject non-positive ids instead of masking them.
//! - List order is insertion order (`id ASC`).

use crate::db::schema::verify_schema;
use crate::model::wish::{Wish, WishDraft, WishId, WishValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const WISH_SELECT_SQL: &str = "SELECT id, title, description FROM wishes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for wish persistence, query and schema bootstrap operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(WishValidationError),
    Sqlite(rusqlite::Error),
    NotFound(WishId),
    InvalidData(String),
    /// Database was stamped by a build with a different wish schema.
    UnsupportedSchemaVersion {
        db_version: u32,
        supported: u32,
    },
    /// Connection was not opened through `db::open_db*`.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "wish not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted wish data: {message}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                supported,
            } => write!(
                f,
                "database schema version {db_version} is not supported (expected {supported})"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WishValidationError> for RepoError {
    fn from(value: WishValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Repository interface for wish CRUD operations.
pub trait WishRepository {
    /// Inserts a new wish and returns the store-assigned id.
    fn create_wish(&self, draft: &WishDraft) -> RepoResult<WishId>;
    fn get_wish(&self, id: WishId) -> RepoResult<Option<Wish>>;
    /// Lists all wishes in insertion order.
    fn list_wishes(&self) -> RepoResult<Vec<Wish>>;
    /// Replaces title/description of an existing wish, keeping its id.
    fn update_wish(&self, wish: &Wish) -> RepoResult<()>;
    fn delete_wish(&self, id: WishId) -> RepoResult<()>;
    fn count_wishes(&self) -> RepoResult<u64>;
}

/// SQLite-backed wish repository over a bootstrapped connection.
pub struct SqliteWishRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWishRepository<'conn> {
    /// Wraps a connection after checking it was opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version does not match.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on a drifted schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        verify_schema(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection whose schema was already checked by `try_new`.
    pub(crate) fn from_verified(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl WishRepository for SqliteWishRepository<'_> {
    fn create_wish(&self, draft: &WishDraft) -> RepoResult<WishId> {
        self.conn.execute(
            "INSERT INTO wishes (title, description) VALUES (?1, ?2);",
            params![draft.title.as_str(), draft.description.as_str()],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_wish(&self, id: WishId) -> RepoResult<Option<Wish>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{WISH_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_wish_row(row)?));
        }

        Ok(None)
    }

    fn list_wishes(&self) -> RepoResult<Vec<Wish>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{WISH_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut wishes = Vec::new();

        while let Some(row) = rows.next()? {
            wishes.push(parse_wish_row(row)?);
        }

        Ok(wishes)
    }

    fn update_wish(&self, wish: &Wish) -> RepoResult<()> {
        wish.validate()?;

        let changed = self.conn.execute(
            "UPDATE wishes
             SET
                title = ?1,
                description = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![wish.title.as_str(), wish.description.as_str(), wish.id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(wish.id));
        }

        Ok(())
    }

    fn delete_wish(&self, id: WishId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM wishes WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn count_wishes(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM wishes;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative wish count `{count}`")))
    }
}

fn parse_wish_row(row: &Row<'_>) -> RepoResult<Wish> {
    let id: WishId = row.get("id")?;
    let title: String = row.get("title")?;
    let description: String = row.get("description")?;

    Wish::with_id(id, title, description)
        .map_err(|err| RepoError::InvalidData(format!("row id={id} in wishes: {err}")))
}
