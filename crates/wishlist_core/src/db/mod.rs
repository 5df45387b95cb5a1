//! SQLite bootstrap for the wish table.
//!
//! # Responsibility
//! - Open file or in-memory connections with the pragmas core relies on.
//! - Create the `wishes` table on first open and verify it on every open.
//!
//! # Invariants
//! - No wish data is read or written before `schema::ensure_schema` succeeds.
//! - Failures are reported as `RepoError`, the same error callers already
//!   handle for CRUD.

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};
