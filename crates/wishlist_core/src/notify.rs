//! In-process listener registry shared by the store and the list controller.
//!
//! # Invariants
//! - Listeners are invoked without any registry lock held, so a listener may
//!   subscribe, unsubscribe or trigger further emissions.
//! - Once a `Subscription` is dropped or unsubscribed, no new callback starts
//!   for it, including from an `emit` that was already iterating on another
//!   thread. A callback that had already begun may still run to completion.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    active: AtomicBool,
    listener: Listener<T>,
}

impl<T> Entry<T> {
    fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

struct Registry<T> {
    next_id: u64,
    entries: BTreeMap<u64, Arc<Entry<T>>>,
}

/// Set of callbacks receiving values of type `T`.
pub(crate) struct ListenerSet<T> {
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for ListenerSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> ListenerSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 1,
                entries: BTreeMap::new(),
            })),
        }
    }

    /// Registers a listener and returns the handle that detaches it.
    pub(crate) fn add(&self, listener: Listener<T>) -> Subscription {
        let entry = Arc::new(Entry {
            active: AtomicBool::new(true),
            listener,
        });
        let id = {
            let mut registry = lock(&self.inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.insert(id, Arc::clone(&entry));
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                entry.deactivate();
                if let Some(inner) = weak.upgrade() {
                    lock(&inner).entries.remove(&id);
                }
            })),
        }
    }

    /// Calls every registered listener with `value`.
    ///
    /// Entries are re-checked right before each call, so a listener detached
    /// while this loop runs is skipped.
    pub(crate) fn emit(&self, value: &T) {
        let entries: Vec<Arc<Entry<T>>> = lock(&self.inner).entries.values().cloned().collect();
        for entry in entries {
            if entry.active.load(Ordering::SeqCst) {
                (*entry.listener)(value);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }
}

fn lock<T>(inner: &Mutex<Registry<T>>) -> MutexGuard<'_, Registry<T>> {
    // A panicking listener runs outside the lock, so the map itself stays consistent.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle returned by `subscribe`; detaches the listener on drop.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Detaches the listener now.
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ListenerSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn emit_reaches_all_listeners_until_unsubscribed() {
        let set: ListenerSet<u32> = ListenerSet::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let first = {
            let hits = Arc::clone(&hits);
            set.add(Arc::new(move |value: &u32| {
                hits.fetch_add(*value as usize, Ordering::SeqCst);
            }))
        };
        let second = {
            let hits = Arc::clone(&hits);
            set.add(Arc::new(move |value: &u32| {
                hits.fetch_add(*value as usize, Ordering::SeqCst);
            }))
        };
        assert_eq!(set.len(), 2);

        set.emit(&1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        first.unsubscribe();
        set.emit(&10);
        assert_eq!(hits.load(Ordering::SeqCst), 12);

        drop(second);
        set.emit(&100);
        assert_eq!(hits.load(Ordering::SeqCst), 12);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn subscription_outliving_set_drops_cleanly() {
        let set: ListenerSet<u32> = ListenerSet::new();
        let subscription = set.add(Arc::new(|_: &u32| {}));
        drop(set);
        subscription.unsubscribe();
    }

    #[test]
    fn listener_detached_during_emit_is_not_called() {
        let set: ListenerSet<u32> = ListenerSet::new();
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let second_hits = Arc::new(AtomicUsize::new(0));

        let _first = {
            let entered = Arc::clone(&entered);
            let release = Arc::clone(&release);
            set.add(Arc::new(move |_: &u32| {
                entered.wait();
                release.wait();
            }))
        };
        let second = {
            let hits = Arc::clone(&second_hits);
            set.add(Arc::new(move |_: &u32| {
                hits.fetch_add(1, Ordering::SeqCst);
            }))
        };

        let emitter = {
            let set = set.clone();
            thread::spawn(move || set.emit(&1))
        };

        // The emitter has already collected both entries and is parked inside the first listener.
        entered.wait();
        drop(second);
        release.wait();
        emitter.join().unwrap();

        assert_eq!(second_hits.load(Ordering::SeqCst), 0);
        assert_eq!(set.len(), 1);
    }
}
