//! Live wish store.
//!
//! # Responsibility
//! - Own the SQLite connection and serialize every write through it.
//! - Publish a fresh list snapshot to subscribers after each mutation.

pub mod wish_store;
