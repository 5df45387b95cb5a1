//! Wish table schema: creation, version stamp and shape checks.
//!
//! # Invariants
//! - `PRAGMA user_version` is `0` on a fresh file and `SCHEMA_VERSION` once
//!   the table exists; any other value is rejected.
//! - A stamped database must carry the `wishes` table with every column in
//!   `WISH_COLUMNS`.

use crate::repo::wish_repo::{RepoError, RepoResult};
use log::info;
use rusqlite::{Connection, OptionalExtension};

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const WISHES_TABLE: &str = "wishes";
const WISH_COLUMNS: [&str; 5] = ["id", "title", "description", "created_at", "updated_at"];
const CREATE_WISHES_SQL: &str = include_str!("wishes_v1.sql");

/// Creates the wish table on a fresh database, then verifies its shape.
///
/// # Errors
/// - `UnsupportedSchemaVersion` for a version other than `0` or
///   `SCHEMA_VERSION`.
/// - `MissingRequiredTable` / `MissingRequiredColumn` on a drifted schema.
pub fn ensure_schema(conn: &mut Connection) -> RepoResult<()> {
    match schema_version(conn)? {
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(CREATE_WISHES_SQL)?;
            tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
            tx.commit()?;
            info!("event=db_schema module=db status=created version={SCHEMA_VERSION}");
        }
        SCHEMA_VERSION => {}
        other => {
            return Err(RepoError::UnsupportedSchemaVersion {
                db_version: other,
                supported: SCHEMA_VERSION,
            });
        }
    }

    verify_schema(conn)
}

/// Checks a connection already carries the current wish schema.
///
/// Unlike `ensure_schema` this never writes.
pub fn verify_schema(conn: &Connection) -> RepoResult<()> {
    let actual_version = schema_version(conn)?;
    if actual_version != SCHEMA_VERSION {
        return Err(RepoError::UninitializedConnection {
            expected_version: SCHEMA_VERSION,
            actual_version,
        });
    }

    if !table_exists(conn, WISHES_TABLE)? {
        return Err(RepoError::MissingRequiredTable(WISHES_TABLE));
    }

    for column in WISH_COLUMNS {
        if !table_has_column(conn, WISHES_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: WISHES_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn schema_version(conn: &Connection) -> RepoResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
