use super::*;

fn live(owner: Uuid, id: &str) -> LiveStroke {
    LiveStroke { owner, stroke: test_helpers::dummy_stroke(id, &[(0.0, 0.0)]) }
}

#[test]
fn room_state_new_is_empty() {
    let room = RoomState::new();
    assert!(room.clients.is_empty());
    assert!(room.live.strokes.is_empty());
    assert!(room.live.cursors.is_empty());
    assert!(!room.closed);
}

#[test]
fn remove_client_drops_only_that_clients_live_state() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut state = LiveState::default();
    state.strokes.insert("a2".into(), live(a, "a2"));
    state.strokes.insert("a1".into(), live(a, "a1"));
    state.strokes.insert("b1".into(), live(b, "b1"));
    state.cursors.insert(a, None);
    state.cursors.insert(b, None);

    let dropped = state.remove_client(a);

    assert_eq!(dropped, vec!["a1".to_owned(), "a2".to_owned()]);
    assert_eq!(state.strokes.len(), 1);
    assert!(state.strokes.contains_key("b1"));
    assert!(!state.cursors.contains_key(&a));
    assert!(state.cursors.contains_key(&b));
}

#[test]
fn clear_empties_both_maps() {
    let a = Uuid::new_v4();
    let mut state = LiveState::default();
    state.strokes.insert("a1".into(), live(a, "a1"));
    state.cursors.insert(a, None);
    state.clear();
    assert!(state.strokes.is_empty());
    assert!(state.cursors.is_empty());
}

#[test]
fn client_channel_capacity_is_at_least_one() {
    let state = test_helpers::test_app_state().with_client_channel_capacity(0);
    assert_eq!(state.client_channel_capacity, 1);
}

#[tokio::test]
async fn flaky_store_fails_then_recovers() {
    let store = test_helpers::FlakyStore::failing(1);
    assert!(store.find_or_create_room("r1").await.is_err());
    assert!(store.find_or_create_room("r1").await.is_ok());
    assert_eq!(store.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}
