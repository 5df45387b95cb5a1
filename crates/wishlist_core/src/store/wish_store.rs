//! Wish store: the sole mutation authority over persisted wishes.
//!
//! # Responsibility
//! - Expose add/get/list/update/delete over a bootstrapped connection.
//! - Push `WishSnapshot`s to subscribers after every successful mutation.
//!
//! # Invariants
//! - Writes are serialized by the connection mutex.
//! - The snapshot is read after the write is committed and before the
//!   connection lock is released, so it reflects exactly that write. A failed
//!   snapshot read never undoes the write; it only skips publishing.
//! - `revision` strictly increases per successful mutation; failed mutations
//!   publish nothing.
//! - Listeners run after the connection lock is released. Snapshots from
//!   concurrent writers may arrive out of order; compare `revision`.

use crate::db::{open_db, open_db_in_memory};
use crate::model::wish::{Wish, WishDraft, WishId};
use crate::notify::{ListenerSet, Subscription};
use crate::repo::wish_repo::{RepoError, RepoResult, SqliteWishRepository, WishRepository};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error.
#[derive(Debug)]
pub enum StoreError {
    /// Persistence or validation failure reported by the repository.
    Repo(RepoError),
    /// A previous writer panicked while holding the connection.
    Poisoned,
}

impl StoreError {
    /// Returns the missing id when this error is a not-found condition.
    pub fn not_found_id(&self) -> Option<WishId> {
        match self {
            Self::Repo(RepoError::NotFound(id)) => Some(*id),
            _ => None,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Poisoned => write!(f, "wish store connection is poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Poisoned => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Full ordered list of wishes at one store revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishSnapshot {
    /// `0` before any mutation through this store instance.
    pub revision: u64,
    /// Wishes in insertion order.
    pub wishes: Vec<Wish>,
}

/// Thread-safe store over one SQLite connection.
pub struct WishStore {
    conn: Mutex<Connection>,
    revision: AtomicU64,
    listeners: ListenerSet<WishSnapshot>,
}

impl WishStore {
    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Creates a store over a fresh in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps an already bootstrapped connection.
    ///
    /// # Errors
    /// Rejects connections that were not opened through `db::open_db*`.
    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        let _ = SqliteWishRepository::try_new(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            revision: AtomicU64::new(0),
            listeners: ListenerSet::new(),
        })
    }

    /// Convenience for sharing one store between controller and callers.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Adds a wish and returns the id the store assigned to it.
    pub fn add(&self, draft: &WishDraft) -> StoreResult<WishId> {
        self.mutate("wish_add", |repo| repo.create_wish(draft))
    }

    /// Returns one wish, or `None` when the id does not exist.
    pub fn get(&self, id: WishId) -> StoreResult<Option<Wish>> {
        let conn = self.lock_conn()?;
        let repo = SqliteWishRepository::from_verified(&conn);
        Ok(repo.get_wish(id)?)
    }

    /// Returns all wishes in insertion order.
    pub fn list(&self) -> StoreResult<Vec<Wish>> {
        let conn = self.lock_conn()?;
        let repo = SqliteWishRepository::from_verified(&conn);
        Ok(repo.list_wishes()?)
    }

    pub fn count(&self) -> StoreResult<u64> {
        let conn = self.lock_conn()?;
        let repo = SqliteWishRepository::from_verified(&conn);
        Ok(repo.count_wishes()?)
    }

    /// Replaces title/description of an existing wish.
    ///
    /// # Errors
    /// `RepoError::NotFound` when `wish.id` does not exist.
    pub fn update(&self, wish: &Wish) -> StoreResult<()> {
        self.mutate("wish_update", |repo| repo.update_wish(wish).map(|()| wish.id))?;
        Ok(())
    }

    /// Deletes a wish by id.
    ///
    /// # Errors
    /// `RepoError::NotFound` when `id` does not exist.
    pub fn delete(&self, id: WishId) -> StoreResult<()> {
        self.mutate("wish_delete", |repo| repo.delete_wish(id).map(|()| id))?;
        Ok(())
    }

    /// Reads the current list together with the current revision.
    pub fn snapshot(&self) -> StoreResult<WishSnapshot> {
        let conn = self.lock_conn()?;
        let repo = SqliteWishRepository::from_verified(&conn);
        let wishes = repo.list_wishes()?;
        Ok(WishSnapshot {
            revision: self.revision.load(Ordering::SeqCst),
            wishes,
        })
    }

    /// Registers a snapshot listener.
    ///
    /// The listener receives the current snapshot before this call returns,
    /// then one snapshot per successful mutation until the returned handle is
    /// dropped or unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> StoreResult<Subscription>
    where
        F: Fn(&WishSnapshot) + Send + Sync + 'static,
    {
        let listener = Arc::new(listener);
        // Register first so no mutation can slip between the read and the
        // registration; a racing newer snapshot wins by revision.
        let subscription = self.listeners.add(listener.clone());
        let snapshot = self.snapshot()?;
        (*listener)(&snapshot);
        debug!(
            "event=store_subscribe module=store status=ok revision={} listeners={}",
            snapshot.revision,
            self.listeners.len()
        );
        Ok(subscription)
    }

    /// Number of attached snapshot listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn mutate(
        &self,
        event: &'static str,
        op: impl FnOnce(&SqliteWishRepository<'_>) -> RepoResult<WishId>,
    ) -> StoreResult<WishId> {
        let started_at = Instant::now();
        match self.write_then_read(op) {
            Ok((wish_id, revision, Ok(wishes))) => {
                info!(
                    "event={event} module=store status=ok wish_id={wish_id} revision={revision} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                self.listeners.emit(&WishSnapshot { revision, wishes });
                Ok(wish_id)
            }
            Ok((wish_id, revision, Err(err))) => {
                warn!(
                    "event={event} module=store status=ok wish_id={wish_id} revision={revision} duration_ms={} publish=skipped error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    repo_error_code(&err)
                );
                Ok(wish_id)
            }
            Err(err) => {
                error!(
                    "event={event} module=store status=error duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    error_code(&err)
                );
                Err(err)
            }
        }
    }

    /// Runs one write, then re-reads the list under the same lock.
    ///
    /// Returns the written id, the new revision and the list read result.
    fn write_then_read(
        &self,
        op: impl FnOnce(&SqliteWishRepository<'_>) -> RepoResult<WishId>,
    ) -> StoreResult<(WishId, u64, RepoResult<Vec<Wish>>)> {
        let conn = self.lock_conn()?;
        let repo = SqliteWishRepository::from_verified(&conn);
        let wish_id = op(&repo)?;
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        Ok((wish_id, revision, repo.list_wishes()))
    }

    fn lock_conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn error_code(err: &StoreError) -> &'static str {
    match err {
        StoreError::Poisoned => "store_poisoned",
        StoreError::Repo(err) => repo_error_code(err),
    }
}

fn repo_error_code(err: &RepoError) -> &'static str {
    match err {
        RepoError::Validation(_) => "validation_failed",
        RepoError::NotFound(_) => "not_found",
        RepoError::InvalidData(_) => "invalid_data",
        _ => "db_error",
    }
}
