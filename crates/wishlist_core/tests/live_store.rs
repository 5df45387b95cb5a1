use std::sync::{Arc, Mutex};
use std::thread;
use wishlist_core::{RepoError, StoreError, Wish, WishDraft, WishSnapshot, WishStore};

fn recorder(store: &WishStore) -> (Arc<Mutex<Vec<WishSnapshot>>>, wishlist_core::Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = store
        .subscribe(move |snapshot: &WishSnapshot| sink.lock().unwrap().push(snapshot.clone()))
        .unwrap();
    (seen, subscription)
}

#[test]
fn add_get_delete_example_flow() {
    let store = WishStore::open_in_memory().unwrap();

    let id = store.add(&WishDraft::new("Book", "Read it")).unwrap();
    assert_eq!(id, 1);
    assert!(store.list().unwrap().iter().any(|wish| wish.id == 1));

    store.delete(1).unwrap();
    assert!(store.list().unwrap().iter().all(|wish| wish.id != 1));
    assert!(store.get(1).unwrap().is_none());
}

#[test]
fn get_by_id_of_added_wish_roundtrips() {
    let store = WishStore::open_in_memory().unwrap();
    let drafts = [
        WishDraft::new("Kayak", "Two-seater"),
        WishDraft::new("Espresso machine", "Dual boiler"),
        WishDraft::new("  padded  ", " kept as entered "),
    ];

    for draft in drafts {
        let id = store.add(&draft).unwrap();
        let loaded = store.get(id).unwrap().unwrap();
        assert_eq!(loaded.to_draft(), draft);
    }
}

#[test]
fn blank_and_whitespace_drafts_roundtrip() {
    let store = WishStore::open_in_memory().unwrap();
    let drafts = [
        WishDraft::new("", ""),
        WishDraft::new("   ", "\t"),
        WishDraft::new("title only", ""),
        WishDraft::new("", "\n description only \n"),
    ];

    for draft in drafts {
        let id = store.add(&draft).unwrap();
        assert_eq!(store.get(id).unwrap(), Some(draft.clone().into_wish(id)));
    }
    assert_eq!(store.count().unwrap(), 4);
    assert_eq!(store.list().unwrap().len(), 4);
}

#[test]
fn subscribe_delivers_current_snapshot_then_one_per_mutation() {
    let store = WishStore::open_in_memory().unwrap();
    store.add(&WishDraft::new("existing", "already there")).unwrap();

    let (seen, _subscription) = recorder(&store);
    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].revision, 1);
        assert_eq!(seen[0].wishes.len(), 1);
    }

    let id = store.add(&WishDraft::new("Book", "Read it")).unwrap();
    store
        .update(&Wish::with_id(id, "Book", "Read it twice").unwrap())
        .unwrap();
    store.delete(id).unwrap();

    let seen = seen.lock().unwrap();
    let lengths: Vec<_> = seen.iter().map(|snapshot| snapshot.wishes.len()).collect();
    assert_eq!(lengths, vec![1, 2, 2, 1]);
    let revisions: Vec<_> = seen.iter().map(|snapshot| snapshot.revision).collect();
    assert_eq!(revisions, vec![1, 2, 3, 4]);
    assert_eq!(seen[2].wishes[1].description, "Read it twice");
}

#[test]
fn failed_mutations_publish_nothing() {
    let store = WishStore::open_in_memory().unwrap();
    let (seen, _subscription) = recorder(&store);

    let err = store.delete(5).unwrap_err();
    assert_eq!(err.not_found_id(), Some(5));
    let err = store
        .update(&Wish::with_id(5, "ghost", "missing").unwrap())
        .unwrap_err();
    assert!(matches!(err, StoreError::Repo(_)));
    let err = store
        .update(&WishDraft::new("no", "id").into_wish(0))
        .unwrap_err();
    assert!(matches!(err, StoreError::Repo(RepoError::Validation(_))));

    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn unsubscribed_listener_receives_nothing_more() {
    let store = WishStore::open_in_memory().unwrap();
    let (seen, subscription) = recorder(&store);
    assert_eq!(store.listener_count(), 1);

    store.add(&WishDraft::new("one", "1")).unwrap();
    subscription.unsubscribe();
    assert_eq!(store.listener_count(), 0);
    store.add(&WishDraft::new("two", "2")).unwrap();

    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn listener_may_call_back_into_store() {
    let store = Arc::new(WishStore::open_in_memory().unwrap());
    let counts = Arc::new(Mutex::new(Vec::new()));

    let _subscription = {
        let weak = Arc::downgrade(&store);
        let counts = Arc::clone(&counts);
        store
            .subscribe(move |_: &WishSnapshot| {
                if let Some(store) = weak.upgrade() {
                    counts.lock().unwrap().push(store.count().unwrap());
                }
            })
            .unwrap()
    };

    store.add(&WishDraft::new("reentrant", "read inside listener")).unwrap();
    assert_eq!(*counts.lock().unwrap(), vec![0, 1]);
}

#[test]
fn concurrent_writers_are_serialized() {
    let store = Arc::new(WishStore::open_in_memory().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for item in 0..10 {
                    store
                        .add(&WishDraft::new(format!("w{worker}-{item}"), "bulk"))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.revision, 40);
    assert_eq!(snapshot.wishes.len(), 40);
    let ids: Vec<_> = snapshot.wishes.iter().map(|wish| wish.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(ids, sorted);
}

#[test]
fn file_backed_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wishes.sqlite3");

    let id = {
        let store = WishStore::open(&path).unwrap();
        store.add(&WishDraft::new("Tent", "Four season")).unwrap()
    };

    let reopened = WishStore::open(&path).unwrap();
    let wish = reopened.get(id).unwrap().unwrap();
    assert_eq!(wish.title, "Tent");
}
