//! Wish domain model.
//!
//! # Responsibility
//! - Define the persisted `Wish` record and its id-less `WishDraft` input.
//!
//! # Invariants
//! - `id` is assigned by the store, positive, and immutable afterwards.
//! - Text fields carry whatever the caller entered; the model does not
//!   judge content.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned identifier of a wish.
///
/// `0` is reserved for "not created yet" and is never assigned.
pub type WishId = i64;

/// Id value meaning "no wish yet" (create mode).
pub const NEW_WISH_ID: WishId = 0;

/// Validation errors for wish identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishValidationError {
    NonPositiveId(WishId),
}

impl Display for WishValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveId(id) => write!(f, "wish id must be positive, got {id}"),
        }
    }
}

impl Error for WishValidationError {}

/// Wish input before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishDraft {
    pub title: String,
    pub description: String,
}

impl WishDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Attaches a store-assigned id.
    pub fn into_wish(self, id: WishId) -> Wish {
        Wish {
            id,
            title: self.title,
            description: self.description,
        }
    }
}

/// Canonical persisted wishlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWish")]
pub struct Wish {
    /// Store-assigned identifier, immutable once set.
    pub id: WishId,
    pub title: String,
    pub description: String,
}

impl Wish {
    /// Builds a wish with an existing id.
    pub fn with_id(
        id: WishId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, WishValidationError> {
        let wish = Self {
            id,
            title: title.into(),
            description: description.into(),
        };
        wish.validate()?;
        Ok(wish)
    }

    /// Checks the id is one the store could have assigned.
    pub fn validate(&self) -> Result<(), WishValidationError> {
        if self.id <= 0 {
            return Err(WishValidationError::NonPositiveId(self.id));
        }
        Ok(())
    }

    /// Returns the id-less view of this wish.
    pub fn to_draft(&self) -> WishDraft {
        WishDraft::new(self.title.clone(), self.description.clone())
    }
}

#[derive(Deserialize)]
struct RawWish {
    id: WishId,
    title: String,
    description: String,
}

impl TryFrom<RawWish> for Wish {
    type Error = WishValidationError;

    fn try_from(value: RawWish) -> Result<Self, Self::Error> {
        Wish::with_id(value.id, value.title, value.description)
    }
}
