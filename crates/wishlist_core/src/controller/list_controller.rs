//! Wish list controller.
//!
//! # Responsibility
//! - Mirror store snapshots into a displayed row list keyed by wish id.
//! - Map row gestures onto delete/edit intents.
//! - Report mutation failures as transient notices.
//!
//! # Invariants
//! - Snapshots whose revision is not newer than the applied one are ignored.
//! - Row order always equals store insertion order.
//! - A failed delete leaves the displayed rows unchanged.
//! - A completed swipe dispatches exactly one intent and never removes a row
//!   itself; rows disappear only through the next snapshot.
//! - Each subscriber's first `Refreshed` lists every row, and later ones are
//!   diffs against the rows that subscriber last received. `Refreshed` events
//!   not newer than the last one it received are dropped.

use crate::controller::form::FormRoute;
use crate::model::wish::{Wish, WishId};
use crate::notify::{ListenerSet, Subscription};
use crate::store::wish_store::{StoreResult, WishSnapshot, WishStore};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Horizontal swipe direction on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Leading edge towards trailing edge. Opens the edit form.
    StartToEnd,
    /// Trailing edge towards leading edge. Deletes the row.
    EndToStart,
}

/// Intent a row action resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowIntent {
    Edit,
    Delete,
}

impl SwipeDirection {
    pub fn intent(self) -> RowIntent {
        match self {
            Self::StartToEnd => RowIntent::Edit,
            Self::EndToStart => RowIntent::Delete,
        }
    }
}

/// Transient error message shown to the user (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Row-level difference between two applied snapshots, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListChange {
    /// Store revision the rows reflect.
    pub revision: u64,
    /// Revision the diff is relative to; `None` when every row is new.
    pub base_revision: Option<u64>,
    /// Full row list in display order.
    pub rows: Vec<Wish>,
    /// Ids that appeared.
    pub inserted: Vec<WishId>,
    /// Ids that kept identity but changed content.
    pub updated: Vec<WishId>,
    /// Ids that disappeared.
    pub removed: Vec<WishId>,
}

impl ListChange {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    fn into_full(self) -> Self {
        Self {
            revision: self.revision,
            base_revision: None,
            inserted: self.rows.iter().map(|wish| wish.id).collect(),
            rows: self.rows,
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// Event delivered to controller subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// Displayed rows changed (or were delivered for the first time).
    Refreshed(ListChange),
    /// Open the add/edit form.
    Navigate(FormRoute),
    Notice(Notice),
}

#[derive(Debug, Default)]
struct ListState {
    revision: Option<u64>,
    rows: Vec<Wish>,
}

impl ListState {
    /// Applies a snapshot, returning the diff when it is newer than the
    /// current rows.
    fn apply(&mut self, snapshot: &WishSnapshot) -> Option<ListChange> {
        if self
            .revision
            .is_some_and(|applied| snapshot.revision <= applied)
        {
            return None;
        }

        let previous: HashMap<WishId, &Wish> =
            self.rows.iter().map(|wish| (wish.id, wish)).collect();
        let mut inserted = Vec::new();
        let mut updated = Vec::new();
        for wish in &snapshot.wishes {
            match previous.get(&wish.id) {
                None => inserted.push(wish.id),
                Some(old) if *old != wish => updated.push(wish.id),
                Some(_) => {}
            }
        }

        let current: HashSet<WishId> = snapshot.wishes.iter().map(|wish| wish.id).collect();
        let removed = self
            .rows
            .iter()
            .map(|wish| wish.id)
            .filter(|id| !current.contains(id))
            .collect();

        let base_revision = self.revision.replace(snapshot.revision);
        self.rows = snapshot.wishes.clone();

        Some(ListChange {
            revision: snapshot.revision,
            base_revision,
            rows: self.rows.clone(),
            inserted,
            updated,
            removed,
        })
    }

    fn full_change(&self) -> ListChange {
        ListChange {
            revision: self.revision.unwrap_or_default(),
            rows: self.rows.clone(),
            ..ListChange::default()
        }
        .into_full()
    }
}

/// Per-subscriber filter over `Refreshed` events.
#[derive(Debug, Default)]
struct RevisionGate {
    delivered: Option<u64>,
}

impl RevisionGate {
    /// Returns the event to hand to the subscriber, if any.
    ///
    /// A diff whose base is not the last delivered revision is widened to a
    /// full change so the subscriber never applies it to rows it never saw.
    fn admit(&mut self, event: &ListEvent) -> Option<ListEvent> {
        let ListEvent::Refreshed(change) = event else {
            return Some(event.clone());
        };
        if self
            .delivered
            .is_some_and(|delivered| change.revision <= delivered)
        {
            return None;
        }

        let continues = change.base_revision.is_some() && change.base_revision == self.delivered;
        self.delivered = Some(change.revision);
        if continues {
            Some(event.clone())
        } else {
            Some(ListEvent::Refreshed(change.clone().into_full()))
        }
    }
}

fn lock_gate(gate: &Mutex<RevisionGate>) -> MutexGuard<'_, RevisionGate> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mediates between a `WishStore` and a display surface.
pub struct WishListController {
    store: Arc<WishStore>,
    state: Arc<Mutex<ListState>>,
    listeners: ListenerSet<ListEvent>,
    _store_subscription: Subscription,
}

impl WishListController {
    /// Subscribes to `store` and loads the current list.
    pub fn attach(store: Arc<WishStore>) -> StoreResult<Self> {
        let state = Arc::new(Mutex::new(ListState::default()));
        let listeners = ListenerSet::new();

        let store_subscription = {
            let state = Arc::clone(&state);
            let listeners = listeners.clone();
            store.subscribe(move |snapshot: &WishSnapshot| {
                let change = lock_state(&state).apply(snapshot);
                match change {
                    Some(change) => {
                        debug!(
                            "event=list_refresh module=controller status=ok revision={} rows={} inserted={} updated={} removed={}",
                            change.revision,
                            change.rows.len(),
                            change.inserted.len(),
                            change.updated.len(),
                            change.removed.len()
                        );
                        listeners.emit(&ListEvent::Refreshed(change));
                    }
                    None => debug!(
                        "event=list_refresh module=controller status=skipped revision={}",
                        snapshot.revision
                    ),
                }
            })?
        };

        Ok(Self {
            store,
            state,
            listeners,
            _store_subscription: store_subscription,
        })
    }

    /// Registers an event callback.
    ///
    /// The callback first receives `Refreshed` with the current rows, then
    /// every subsequent event until the handle is dropped. A refresh racing
    /// with registration may arrive first; it is then delivered as the full
    /// list and the older initial rows are dropped.
    ///
    /// Mutations issued concurrently from several threads may run callbacks
    /// concurrently; `ListChange::revision` orders them.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ListEvent) + Send + Sync + 'static,
    {
        let gate = Mutex::new(RevisionGate::default());
        let deliver: Arc<dyn Fn(&ListEvent) + Send + Sync> = Arc::new(move |event: &ListEvent| {
            let admitted = lock_gate(&gate).admit(event);
            if let Some(event) = admitted {
                callback(&event);
            }
        });
        let subscription = self.listeners.add(Arc::clone(&deliver));
        let initial = lock_state(&self.state).full_change();
        (*deliver)(&ListEvent::Refreshed(initial));
        subscription
    }

    /// Current displayed rows in store order.
    pub fn rows(&self) -> Vec<Wish> {
        lock_state(&self.state).rows.clone()
    }

    /// Revision of the last applied snapshot.
    pub fn revision(&self) -> Option<u64> {
        lock_state(&self.state).revision
    }

    /// Deletes a row's wish.
    ///
    /// On failure an error notice is emitted and the rows stay as they are.
    pub fn request_delete(&self, id: WishId) -> bool {
        match self.store.delete(id) {
            Ok(()) => {
                info!("event=row_delete module=controller status=ok wish_id={id}");
                true
            }
            Err(err) => {
                warn!("event=row_delete module=controller status=error wish_id={id} error={err}");
                self.listeners.emit(&ListEvent::Notice(Notice::new(format!(
                    "Could not delete wish: {err}"
                ))));
                false
            }
        }
    }

    /// Opens the edit form for a row.
    pub fn request_edit(&self, id: WishId) -> FormRoute {
        self.navigate(FormRoute::edit(id))
    }

    /// Opens the form in create mode.
    pub fn request_add(&self) -> FormRoute {
        self.navigate(FormRoute::create())
    }

    /// Resolves a completed swipe on row `id` and returns the dispatched
    /// intent. The row itself returns to rest; a delete shows up through the
    /// next snapshot.
    pub fn on_swipe(&self, id: WishId, direction: SwipeDirection) -> RowIntent {
        let intent = direction.intent();
        match intent {
            RowIntent::Delete => {
                self.request_delete(id);
            }
            RowIntent::Edit => {
                self.request_edit(id);
            }
        }
        intent
    }

    fn navigate(&self, route: FormRoute) -> FormRoute {
        debug!(
            "event=navigate module=controller status=ok route={}",
            route.path()
        );
        self.listeners.emit(&ListEvent::Navigate(route));
        route
    }
}

fn lock_state(state: &Mutex<ListState>) -> MutexGuard<'_, ListState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
