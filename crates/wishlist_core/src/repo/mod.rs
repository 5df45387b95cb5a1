//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for wishes.
//! - Isolate SQLite query details from store/controller orchestration.
//!
//! # Invariants
//! - Repository writes enforce `validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod wish_repo;
