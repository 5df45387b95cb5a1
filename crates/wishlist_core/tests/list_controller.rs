use std::sync::{Arc, Mutex};
use wishlist_core::{
    FormError, FormMode, FormRoute, ListEvent, RowIntent, Subscription, SwipeDirection, Wish, WishDraft, WishForm, WishListController, WishStore,
};

struct Harness {
    store: Arc<WishStore>,
    controller: WishListController,
    events: Arc<Mutex<Vec<ListEvent>>>,
    _subscription: Subscription,
}

fn harness_with(titles: &[&str]) -> Harness {
    let store = WishStore::open_in_memory().unwrap().into_shared();
    for title in titles {
        store.add(&WishDraft::new(*title, "seeded")).unwrap();
    }
    let controller = WishListController::attach(Arc::clone(&store)).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let subscription =
        controller.subscribe(move |event: &ListEvent| sink.lock().unwrap().push(event.clone()));
    Harness {
        store,
        controller,
        events,
        _subscription: subscription,
    }
}

fn titles(rows: &[Wish]) -> Vec<&str> {
    rows.iter().map(|wish| wish.title.as_str()).collect()
}

#[test]
fn subscribe_delivers_current_rows_first() {
    let harness = harness_with(&["a", "b"]);

    let events = harness.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ListEvent::Refreshed(change) => {
            assert_eq!(titles(&change.rows), vec!["a", "b"]);
            assert_eq!(change.inserted.len(), 2);
            assert_eq!(change.base_revision, None);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn store_mutations_refresh_rows_keyed_by_id() {
    let harness = harness_with(&["a", "b"]);
    let b_id = harness.controller.rows()[1].id;

    let c_id = harness.store.add(&WishDraft::new("c", "new")).unwrap();
    harness
        .store
        .update(&Wish::with_id(b_id, "b2", "edited").unwrap())
        .unwrap();

    assert_eq!(titles(&harness.controller.rows()), vec!["a", "b2", "c"]);
    assert_eq!(harness.controller.revision(), Some(4));

    let events = harness.events.lock().unwrap();
    let changes: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ListEvent::Refreshed(change) => Some(change.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(changes.len(), 3);
    assert_eq!(changes[1].inserted, vec![c_id]);
    assert_eq!(changes[1].base_revision, Some(changes[0].revision));
    assert_eq!(changes[2].updated, vec![b_id]);
    assert!(changes[2].inserted.is_empty() && changes[2].removed.is_empty());
}

#[test]
fn swipe_end_to_start_deletes_row() {
    let harness = harness_with(&["keep", "remove"]);
    let remove_id = harness.controller.rows()[1].id;

    let intent = harness
        .controller
        .on_swipe(remove_id, SwipeDirection::EndToStart);

    assert_eq!(intent, RowIntent::Delete);
    assert_eq!(titles(&harness.controller.rows()), vec!["keep"]);
    assert!(harness.store.get(remove_id).unwrap().is_none());

    let events = harness.events.lock().unwrap();
    match events.last() {
        Some(ListEvent::Refreshed(change)) => assert_eq!(change.removed, vec![remove_id]),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn swipe_start_to_end_navigates_to_edit_form() {
    let harness = harness_with(&["edit me"]);
    let id = harness.controller.rows()[0].id;

    let intent = harness.controller.on_swipe(id, SwipeDirection::StartToEnd);

    assert_eq!(intent, RowIntent::Edit);
    assert_eq!(harness.controller.rows().len(), 1);
    let events = harness.events.lock().unwrap();
    assert_eq!(events.last(), Some(&ListEvent::Navigate(FormRoute::edit(id))));
}

#[test]
fn failed_delete_emits_error_notice_and_keeps_rows() {
    let harness = harness_with(&["only"]);
    let before = harness.controller.rows();

    assert!(!harness.controller.request_delete(404));

    assert_eq!(harness.controller.rows(), before);
    let events = harness.events.lock().unwrap();
    match events.last() {
        Some(ListEvent::Notice(notice)) => {
            assert!(notice.message.contains("404"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn request_add_opens_create_form() {
    let harness = harness_with(&[]);

    let route = harness.controller.request_add();

    assert_eq!(route.mode(), FormMode::Create);
    assert_eq!(route.path(), "add_screen/0");
}

#[test]
fn form_create_and_edit_flow_updates_rows() {
    let harness = harness_with(&[]);

    let mut form = WishForm::open(&harness.store, harness.controller.request_add()).unwrap();
    form.set_title("  Book ");
    form.set_description("Read it");
    let created = form.submit(&harness.store).unwrap();
    assert_eq!(created.message, "Wish created.");
    assert_eq!(titles(&harness.controller.rows()), vec!["Book"]);

    let route = harness.controller.request_edit(created.wish_id);
    let mut form = WishForm::open(&harness.store, route).unwrap();
    assert_eq!(form.mode(), FormMode::Edit(created.wish_id));
    assert_eq!(form.title, "Book");
    form.set_description("Read it again");
    let updated = form.submit(&harness.store).unwrap();
    assert_eq!(updated.wish_id, created.wish_id);
    assert_eq!(updated.message, "Wish updated.");

    let rows = harness.controller.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description, "Read it again");
}

#[test]
fn form_with_blank_field_leaves_store_untouched() {
    let harness = harness_with(&[]);
    let revision = harness.controller.revision();

    let mut form = WishForm::blank();
    form.set_title("Title only");
    let err = form.submit(&harness.store).unwrap_err();

    assert!(matches!(err, FormError::MissingFields));
    assert_eq!(err.to_string(), "Enter fields to create a wish");
    assert_eq!(harness.store.count().unwrap(), 0);
    assert_eq!(harness.controller.revision(), revision);
}

#[test]
fn form_for_missing_wish_reports_not_found() {
    let harness = harness_with(&[]);

    let err = WishForm::open(&harness.store, FormRoute::edit(12)).unwrap_err();
    assert!(matches!(err, FormError::NotFound(12)));
}

#[test]
fn dropped_controller_detaches_from_store() {
    let store = WishStore::open_in_memory().unwrap().into_shared();
    let controller = WishListController::attach(Arc::clone(&store)).unwrap();
    assert_eq!(store.listener_count(), 1);

    drop(controller);
    assert_eq!(store.listener_count(), 0);
    store.add(&WishDraft::new("after", "detach")).unwrap();
}
