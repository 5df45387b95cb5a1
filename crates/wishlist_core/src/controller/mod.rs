//! UI-facing controllers over the wish store.
//!
//! # Responsibility
//! - Keep the displayed list in sync with store snapshots.
//! - Turn row gestures and form input into store mutations or navigation.
//!
//! # Invariants
//! - Controllers never write SQL; every mutation goes through `WishStore`.
//! - Failed mutations leave the displayed list untouched.

pub mod form;
pub mod list_controller;
