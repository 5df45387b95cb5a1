//! Domain model for wishlist entries.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep field validation next to the types it protects.
//!
//! # Invariants
//! - Every persisted wish is identified by a positive `WishId`.
//! - Deletion is a hard delete; ids are never reused.

pub mod wish;
