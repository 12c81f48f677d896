use std::sync::{Arc, Mutex};

use super::*;
use crate::services::bus::EventKind;
use crate::state::{AppState, test_helpers};

fn record_events(state: &AppState) -> Arc<Mutex<Vec<BoardEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for kind in [EventKind::CardMoved, EventKind::CardChanged, EventKind::CardDeleted] {
        let log = log.clone();
        state.bus.subscribe(kind, move |event| {
            log.lock().expect("event log lock").push(*event);
        });
    }
    log
}

fn card_form(title: &str, content: &str, column_id: Option<u64>) -> CardForm {
    CardForm { title: title.into(), content: content.into(), column_id }
}

fn update_form(title: &str, content: &str) -> UpdateForm {
    UpdateForm { title: title.into(), content: content.into() }
}

// =============================================================================
// CREATE
// =============================================================================

#[tokio::test]
async fn create_card_stores_publishes_and_renders() {
    let state = test_helpers::test_app_state();
    let events = record_events(&state);

    let Html(html) = create_card(State(state.clone()), Form(card_form("Ship it", "soon", Some(1))))
        .await
        .expect("create should succeed");

    let card = state.store.get_card(1).expect("card stored");
    assert_eq!(card.title, "Ship it");
    assert_eq!(card.column_id, 1);
    assert!(html.contains(r#"id="card-1""#));
    assert!(html.contains(r#"hx-patch="/cards/1""#));
    assert_eq!(*events.lock().expect("lock"), vec![BoardEvent::CardChanged { card_id: 1 }]);
}

#[tokio::test]
async fn create_card_trims_and_requires_title() {
    let state = test_helpers::test_app_state();

    let (status, _) = create_card(State(state.clone()), Form(card_form("   ", "", Some(1))))
        .await
        .expect_err("blank title should fail");
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(state.store.card_count(), 0);
}

#[tokio::test]
async fn create_card_rejects_overlong_fields() {
    let state = test_helpers::test_app_state();

    let (status, reason) = create_card(State(state.clone()), Form(card_form(&"x".repeat(101), "", Some(1))))
        .await
        .expect_err("overlong title should fail");
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reason.contains("title"));

    let (status, reason) = create_card(State(state.clone()), Form(card_form("ok", &"y".repeat(1001), Some(1))))
        .await
        .expect_err("overlong content should fail");
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reason.contains("content"));
}

#[tokio::test]
async fn create_card_requires_known_column() {
    let state = test_helpers::test_app_state();

    let (status, _) = create_card(State(state.clone()), Form(card_form("t", "", None)))
        .await
        .expect_err("missing column should fail");
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = create_card(State(state), Form(card_form("t", "", Some(99))))
        .await
        .expect_err("unknown column should fail");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// UPDATE / DELETE
// =============================================================================

#[tokio::test]
async fn update_card_publishes_changed_event() {
    let state = test_helpers::test_app_state();
    let card = state.store.add_card("old", "", 1).expect("add");
    let events = record_events(&state);

    let Html(html) = update_card(State(state.clone()), Path(card.id), Form(update_form("new", "body")))
        .await
        .expect("update should succeed");

    assert!(html.contains("new"));
    assert_eq!(state.store.get_card(card.id).expect("card").title, "new");
    assert_eq!(*events.lock().expect("lock"), vec![BoardEvent::CardChanged { card_id: card.id }]);
}

#[tokio::test]
async fn update_card_cannot_change_the_column() {
    let state = test_helpers::test_app_state();
    let card = state.store.add_card("fixed", "", 2).expect("add");

    update_card(State(state.clone()), Path(card.id), Form(update_form("still fixed", "")))
        .await
        .expect("update should succeed");

    assert_eq!(state.store.get_card(card.id).expect("card").column_id, 2);
}

#[tokio::test]
async fn update_unknown_card_is_404() {
    let state = test_helpers::test_app_state();
    let (status, _) = update_card(State(state), Path(5), Form(update_form("t", "")))
        .await
        .expect_err("unknown card should fail");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_card_publishes_deleted_event() {
    let state = test_helpers::test_app_state();
    let card = state.store.add_card("doomed", "", 2).expect("add");
    let events = record_events(&state);

    let status = delete_card(State(state.clone()), Path(card.id))
        .await
        .expect("delete should succeed");

    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.store.card_count(), 0);
    assert_eq!(*events.lock().expect("lock"), vec![BoardEvent::CardDeleted { column_id: 2 }]);
}

#[tokio::test]
async fn delete_unknown_card_is_404_and_publishes_nothing() {
    let state = test_helpers::test_app_state();
    let events = record_events(&state);

    let (status, _) = delete_card(State(state), Path(42)).await.expect_err("unknown card");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(events.lock().expect("lock").is_empty());
}

// =============================================================================
// MOVE / PROMOTE / DEMOTE
// =============================================================================

#[tokio::test]
async fn move_card_publishes_moved_event_and_renders_destination() {
    let state = test_helpers::test_app_state();
    let card = state.store.add_card("card", "", 1).expect("add");
    let events = record_events(&state);

    let Html(html) = move_card(State(state.clone()), Path(card.id), Form(MoveForm { column_id: 2, position: Some(0) }))
        .await
        .expect("move should succeed");

    assert!(html.contains(r#"id="column-2""#));
    assert_eq!(
        *events.lock().expect("lock"),
        vec![BoardEvent::CardMoved { card_id: card.id, from_column_id: 1, to_column_id: 2 }]
    );
}

#[tokio::test]
async fn move_to_unknown_column_is_404() {
    let state = test_helpers::test_app_state();
    let card = state.store.add_card("card", "", 1).expect("add");

    let (status, _) = move_card(State(state), Path(card.id), Form(MoveForm { column_id: 99, position: None }))
        .await
        .expect_err("unknown column");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn promote_from_last_column_is_conflict() {
    let state = test_helpers::test_app_state();
    let card = state.store.add_card("done", "", 3).expect("add");
    let events = record_events(&state);

    let (status, _) = promote_card(State(state), Path(card.id))
        .await
        .expect_err("promote past last column");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(events.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn promote_then_demote_round_trips_the_column() {
    let state = test_helpers::test_app_state();
    let card = state.store.add_card("card", "", 2).expect("add");

    promote_card(State(state.clone()), Path(card.id)).await.expect("promote");
    assert_eq!(state.store.get_card(card.id).expect("card").column_id, 3);

    demote_card(State(state.clone()), Path(card.id)).await.expect("demote");
    assert_eq!(state.store.get_card(card.id).expect("card").column_id, 2);
}
