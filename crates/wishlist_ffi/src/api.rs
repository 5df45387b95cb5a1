//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose wish CRUD as sync, use-case-level functions to Dart via FRB.
//! - Turn core errors into envelopes the UI can show as a toast.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - All calls share one process-wide store opened lazily on first use.

use log::warn;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use wishlist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    FormRoute, Wish, WishForm, WishId, WishStore,
};

const DB_FILE_NAME: &str = "wishlist.sqlite3";
const DB_PATH_ENV: &str = "WISHLIST_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE: OnceLock<Arc<WishStore>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Wish shape exchanged with Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishItem {
    pub id: i64,
    pub title: String,
    pub description: String,
}

impl From<Wish> for WishItem {
    fn from(value: Wish) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
        }
    }
}

/// Result envelope for mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Affected wish id on success.
    pub wish_id: Option<i64>,
    /// Toast-ready message.
    pub message: String,
}

impl WishActionResponse {
    fn success(message: impl Into<String>, wish_id: WishId) -> Self {
        Self {
            ok: true,
            wish_id: Some(wish_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            wish_id: None,
            message: message.into(),
        }
    }
}

/// Result envelope for single-wish reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishGetResponse {
    pub ok: bool,
    /// `None` when the id does not exist or the read failed.
    pub item: Option<WishItem>,
    pub message: String,
}

/// Result envelope for list reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishListResponse {
    pub ok: bool,
    /// Wishes in insertion order.
    pub items: Vec<WishItem>,
    pub message: String,
}

/// Creates a wish from the add form.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank title or description fails without touching storage.
#[flutter_rust_bridge::frb(sync)]
pub fn wish_add(title: String, description: String) -> WishActionResponse {
    submit_form(FormRoute::create(), title, description, "wish_add")
}

/// Replaces title and description of an existing wish.
#[flutter_rust_bridge::frb(sync)]
pub fn wish_update(id: i64, title: String, description: String) -> WishActionResponse {
    if id <= 0 {
        return WishActionResponse::failure(format!("wish_update failed: invalid id {id}"));
    }
    submit_form(FormRoute::edit(id), title, description, "wish_update")
}

/// Deletes a wish by id.
#[flutter_rust_bridge::frb(sync)]
pub fn wish_delete(id: i64) -> WishActionResponse {
    let result = with_store(|store| store.delete(id).map_err(|err| err.to_string()));
    match result {
        Ok(()) => WishActionResponse::success("Wish deleted.", id),
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error call=wish_delete error={err}");
            WishActionResponse::failure(format!("wish_delete failed: {err}"))
        }
    }
}

/// Loads one wish, e.g. to pre-populate the edit form.
#[flutter_rust_bridge::frb(sync)]
pub fn wish_get(id: i64) -> WishGetResponse {
    match with_store(|store| store.get(id).map_err(|err| err.to_string())) {
        Ok(Some(wish)) => WishGetResponse {
            ok: true,
            item: Some(wish.into()),
            message: String::new(),
        },
        Ok(None) => WishGetResponse {
            ok: false,
            item: None,
            message: format!("wish not found: {id}"),
        },
        Err(err) => WishGetResponse {
            ok: false,
            item: None,
            message: format!("wish_get failed: {err}"),
        },
    }
}

/// Lists all wishes in insertion order.
#[flutter_rust_bridge::frb(sync)]
pub fn wish_list() -> WishListResponse {
    match with_store(|store| store.list().map_err(|err| err.to_string())) {
        Ok(wishes) => {
            let items = wishes.into_iter().map(WishItem::from).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No wishes yet.".to_string()
            } else {
                format!("{} wish(es).", items.len())
            };
            WishListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => WishListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("wish_list failed: {err}"),
        },
    }
}

fn submit_form(
    route: FormRoute,
    title: String,
    description: String,
    call: &'static str,
) -> WishActionResponse {
    let result = with_store(|store| {
        let mut form = WishForm::open(store, route).map_err(|err| err.to_string())?;
        form.set_title(title);
        form.set_description(description);
        form.submit(store).map_err(|err| err.to_string())
    });

    match result {
        Ok(outcome) => WishActionResponse::success(outcome.message, outcome.wish_id),
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error call={call} error={err}");
            WishActionResponse::failure(format!("{call} failed: {err}"))
        }
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn shared_store() -> Result<Arc<WishStore>, String> {
    if let Some(store) = STORE.get() {
        return Ok(Arc::clone(store));
    }

    let store = WishStore::open(resolve_db_path())
        .map_err(|err| format!("wish DB open failed: {err}"))?
        .into_shared();
    // A racing caller may have won; use whichever store got installed.
    Ok(Arc::clone(STORE.get_or_init(|| store)))
}

fn with_store<T>(f: impl FnOnce(&WishStore) -> Result<T, String>) -> Result<T, String> {
    let store = shared_store()?;
    f(&store)
}
