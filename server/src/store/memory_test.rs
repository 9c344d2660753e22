use super::*;
use frames::model::{Brush, Point, Rgb, Tool};

fn stroke(id: &str, owner: &str) -> Stroke {
    Stroke {
        id: id.into(),
        owner: owner.into(),
        points: vec![Point::new(1.0, 1.0)],
        tool: Tool::Brush,
        brush: Brush::Pen,
        color: Rgb::BLACK,
        size: 2.0,
        opacity: 1.0,
        stability: 0,
    }
}

fn ids(room: &Room) -> Vec<&str> {
    room.strokes.iter().map(|s| s.id.as_str()).collect()
}

#[tokio::test]
async fn find_or_create_returns_empty_room() {
    let store = MemoryRoomStore::new();
    let room = store.find_or_create_room("r1").await.expect("room");
    assert_eq!(room.room_id, "r1");
    assert!(room.strokes.is_empty());
}

#[tokio::test]
async fn append_keeps_commit_order() {
    let store = MemoryRoomStore::new();
    for id in ["a", "b", "c"] {
        let outcome = store.append_stroke("r1", &stroke(id, "u1")).await.expect("append");
        assert!(matches!(outcome, AppendOutcome::Appended(_)));
    }
    let room = store.find_or_create_room("r1").await.expect("room");
    assert_eq!(ids(&room), ["a", "b", "c"]);
}

#[tokio::test]
async fn append_with_known_id_returns_stored_copy() {
    let store = MemoryRoomStore::new();
    store.append_stroke("r1", &stroke("a", "u1")).await.expect("append");

    let outcome = store.append_stroke("r1", &stroke("a", "u2")).await.expect("append");
    let AppendOutcome::Duplicate(existing) = outcome else {
        panic!("expected duplicate, got {outcome:?}");
    };
    assert_eq!(existing.owner, "u1");

    let room = store.find_or_create_room("r1").await.expect("room");
    assert_eq!(room.strokes.len(), 1);
}

#[tokio::test]
async fn remove_latest_by_owner_skips_other_owners() {
    let store = MemoryRoomStore::new();
    store.append_stroke("r1", &stroke("a1", "a")).await.expect("append");
    store.append_stroke("r1", &stroke("b1", "b")).await.expect("append");
    store.append_stroke("r1", &stroke("a2", "a")).await.expect("append");
    store.append_stroke("r1", &stroke("b2", "b")).await.expect("append");

    let removed = store.remove_latest_stroke_by_owner("r1", "a").await.expect("remove");
    assert_eq!(removed.map(|s| s.id), Some("a2".to_owned()));

    let room = store.find_or_create_room("r1").await.expect("room");
    assert_eq!(ids(&room), ["a1", "b1", "b2"]);
}

#[tokio::test]
async fn remove_latest_by_owner_without_strokes_is_none() {
    let store = MemoryRoomStore::new();
    store.append_stroke("r1", &stroke("b1", "b")).await.expect("append");
    assert!(store.remove_latest_stroke_by_owner("r1", "a").await.expect("remove").is_none());
    assert!(store.remove_latest_stroke_by_owner("missing", "a").await.expect("remove").is_none());
}

#[tokio::test]
async fn reset_empties_only_that_room() {
    let store = MemoryRoomStore::new();
    store.append_stroke("r1", &stroke("a", "u")).await.expect("append");
    store.append_stroke("r2", &stroke("b", "u")).await.expect("append");

    store.reset_strokes("r1").await.expect("reset");

    assert!(store.find_or_create_room("r1").await.expect("room").strokes.is_empty());
    assert_eq!(store.find_or_create_room("r2").await.expect("room").strokes.len(), 1);
}
