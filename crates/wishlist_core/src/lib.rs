//! Core domain logic for the wishlist app.
//! This crate is the single source of truth for wish invariants and for the
//! list/persistence sync contract consumed by the UI.

pub mod controller;
pub mod db;
pub mod logging;
pub mod model;
mod notify;
pub mod repo;
pub mod store;

pub use controller::form::{
    FormError, FormMode, FormOutcome, FormRoute, WishForm, MISSING_FIELDS_MESSAGE,
};
pub use controller::list_controller::{
    ListChange, ListEvent, Notice, RowIntent, SwipeDirection, WishListController,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::wish::{Wish, WishDraft, WishId, WishValidationError, NEW_WISH_ID};
pub use notify::Subscription;
pub use repo::wish_repo::{RepoError, RepoResult, SqliteWishRepository, WishRepository};
pub use store::wish_store::{StoreError, StoreResult, WishSnapshot, WishStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
