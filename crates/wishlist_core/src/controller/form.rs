//! Add/edit form model.
//!
//! # Responsibility
//! - Resolve the form route id into create or edit mode.
//! - Pre-populate fields in edit mode and submit through the store.
//!
//! # Invariants
//! - Id `0` means create mode; any other id means edit mode.
//! - Submit with a blank field never touches the store.

use crate::model::wish::{Wish, WishDraft, WishId, NEW_WISH_ID};
use crate::store::wish_store::{StoreError, WishStore};
use std::error::Error;
use std::fmt::{Display, Formatter};

const FORM_ROUTE_BASE: &str = "add_screen";

/// Message shown when a field is left blank.
pub const MISSING_FIELDS_MESSAGE: &str = "Enter fields to create a wish";

/// Navigation target of the add/edit screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormRoute {
    /// `0` for create mode.
    pub wish_id: WishId,
}

impl FormRoute {
    pub fn create() -> Self {
        Self {
            wish_id: NEW_WISH_ID,
        }
    }

    pub fn edit(wish_id: WishId) -> Self {
        Self { wish_id }
    }

    pub fn mode(&self) -> FormMode {
        FormMode::from_id(self.wish_id)
    }

    /// Route string understood by the navigation host (`add_screen/{id}`).
    pub fn path(&self) -> String {
        format!("{FORM_ROUTE_BASE}/{}", self.wish_id)
    }

    /// Parses `add_screen/{id}`; a missing id segment means create mode.
    pub fn parse(path: &str) -> Option<Self> {
        let rest = path.trim().strip_prefix(FORM_ROUTE_BASE)?;
        match rest.strip_prefix('/') {
            None if rest.is_empty() => Some(Self::create()),
            None => None,
            Some("") => Some(Self::create()),
            Some(id) => id.parse::<WishId>().ok().map(Self::edit),
        }
    }
}

/// Whether the form creates a new wish or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(WishId),
}

impl FormMode {
    pub fn from_id(id: WishId) -> Self {
        if id == NEW_WISH_ID {
            Self::Create
        } else {
            Self::Edit(id)
        }
    }
}

#[derive(Debug)]
pub enum FormError {
    /// Title or description is blank.
    MissingFields,
    /// Edit target no longer exists.
    NotFound(WishId),
    Store(StoreError),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields => f.write_str(MISSING_FIELDS_MESSAGE),
            Self::NotFound(id) => write!(f, "wish not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FormError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for FormError {
    fn from(value: StoreError) -> Self {
        match value.not_found_id() {
            Some(id) => Self::NotFound(id),
            None => Self::Store(value),
        }
    }
}

/// Result of a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOutcome {
    pub wish_id: WishId,
    pub message: &'static str,
}

/// Editable field state of the add/edit screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishForm {
    mode: FormMode,
    pub title: String,
    pub description: String,
}

impl WishForm {
    /// Opens the form for `route`, loading current values in edit mode.
    pub fn open(store: &WishStore, route: FormRoute) -> Result<Self, FormError> {
        match route.mode() {
            FormMode::Create => Ok(Self::blank()),
            FormMode::Edit(id) => {
                let wish = store.get(id)?.ok_or(FormError::NotFound(id))?;
                Ok(Self::from_wish(&wish))
            }
        }
    }

    /// Empty form in create mode.
    pub fn blank() -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            description: String::new(),
        }
    }

    /// Form in edit mode pre-populated from `wish`.
    pub fn from_wish(wish: &Wish) -> Self {
        Self {
            mode: FormMode::Edit(wish.id),
            title: wish.title.clone(),
            description: wish.description.clone(),
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Whether both fields hold non-blank text.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }

    /// Validates and persists the form, adding or updating by mode.
    ///
    /// Field values are trimmed before they are stored.
    pub fn submit(&self, store: &WishStore) -> Result<FormOutcome, FormError> {
        if !self.is_complete() {
            return Err(FormError::MissingFields);
        }

        let draft = WishDraft::new(self.title.trim(), self.description.trim());
        match self.mode {
            FormMode::Create => {
                let wish_id = store.add(&draft)?;
                Ok(FormOutcome {
                    wish_id,
                    message: "Wish created.",
                })
            }
            FormMode::Edit(wish_id) => {
                store.update(&draft.into_wish(wish_id))?;
                Ok(FormOutcome {
                    wish_id,
                    message: "Wish updated.",
                })
            }
        }
    }
}
