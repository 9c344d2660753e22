use super::*;
use serde_json::json;

fn sample_frame() -> Frame {
    let data = json!({
        "x": 1.25,
        "ok": true,
        "tags": ["a", "b"],
        "nested": {"k": "v"},
        "nil": null
    });
    Frame {
        id: "id-1".to_owned(),
        parent_id: Some("parent-1".to_owned()),
        ts: 42,
        room_id: Some("r1".to_owned()),
        from: Some("client-1".to_owned()),
        syscall: "stroke:draw".to_owned(),
        status: Status::Done,
        data: data.as_object().cloned().unwrap_or_default(),
    }
}

#[test]
fn status_numeric_mapping_matches_wire_enum() {
    assert_eq!(Status::Request.as_i32(), 0);
    assert_eq!(Status::Done.as_i32(), 1);
    assert_eq!(Status::Error.as_i32(), 2);
    assert_eq!(Status::Cancel.as_i32(), 3);
    assert_eq!(Status::Item.as_i32(), 4);
}

#[test]
fn status_round_trips_from_wire_values() {
    assert_eq!(Status::from_i32(0).expect("status"), Status::Request);
    assert_eq!(Status::from_i32(1).expect("status"), Status::Done);
    assert_eq!(Status::from_i32(2).expect("status"), Status::Error);
    assert_eq!(Status::from_i32(3).expect("status"), Status::Cancel);
    assert_eq!(Status::from_i32(4).expect("status"), Status::Item);
}

#[test]
fn status_from_wire_rejects_out_of_range_value() {
    let err = Status::from_i32(99).expect_err("status should be invalid");
    assert!(matches!(err, CodecError::InvalidStatus(99)));
}

#[test]
fn terminal_statuses() {
    assert!(Status::Done.is_terminal());
    assert!(Status::Error.is_terminal());
    assert!(Status::Cancel.is_terminal());
    assert!(!Status::Request.is_terminal());
    assert!(!Status::Item.is_terminal());
}

#[test]
fn encode_decode_preserves_frame() {
    let frame = sample_frame();
    let bytes = encode_frame(&frame);
    let decoded = decode_frame(&bytes).expect("decode should succeed");
    assert_eq!(decoded, frame);
}

#[test]
fn decode_frame_rejects_malformed_bytes() {
    let err = decode_frame(&[0xff, 0x00, 0x01]).expect_err("bytes should fail");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn decode_frame_rejects_invalid_wire_status() {
    let wire = WireFrame {
        id: "id-1".to_owned(),
        parent_id: None,
        ts: 1,
        room_id: None,
        from: None,
        syscall: "room:join".to_owned(),
        status: 77,
        data: None,
    };
    let mut bytes = Vec::new();
    wire.encode(&mut bytes).expect("encode");
    let err = decode_frame(&bytes).expect_err("status should be invalid");
    assert!(matches!(err, CodecError::InvalidStatus(77)));
}

#[test]
fn missing_wire_data_decodes_as_empty_object() {
    let wire = WireFrame {
        id: "id-1".to_owned(),
        parent_id: None,
        ts: 1,
        room_id: Some("r1".to_owned()),
        from: None,
        syscall: "room:clear".to_owned(),
        status: 0,
        data: None,
    };
    let mut bytes = Vec::new();
    wire.encode(&mut bytes).expect("encode");
    let frame = decode_frame(&bytes).expect("decode");
    assert!(frame.data.is_empty());
    assert_eq!(frame.room_id.as_deref(), Some("r1"));
}

#[test]
fn integral_numbers_decode_as_integers() {
    let frame = Frame::request("stroke:draw", Data::new()).with_data("stability", 7);
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode");
    let stability: u8 = decoded.field("stability").expect("u8 field");
    assert_eq!(stability, 7);
}

#[test]
fn request_sets_fields() {
    let frame = Frame::request("room:join", Data::new());
    assert_eq!(frame.syscall, "room:join");
    assert_eq!(frame.status, Status::Request);
    assert!(frame.parent_id.is_none());
    assert!(frame.room_id.is_none());
    assert!(frame.ts > 0);
}

#[test]
fn reply_inherits_context() {
    let req = Frame::request("stroke:draw", Data::new()).with_room_id("r1");
    let done = req.done_with(Data::new());

    assert_eq!(done.parent_id.as_deref(), Some(req.id.as_str()));
    assert_eq!(done.room_id.as_deref(), Some("r1"));
    assert_eq!(done.syscall, "stroke:draw");
    assert_eq!(done.status, Status::Done);
}

#[test]
fn for_peers_drops_parent_and_renews_id() {
    let req = Frame::request("stroke:draw", Data::new()).with_room_id("r1");
    let done = req.done_with(Data::new());
    let peer = done.for_peers();

    assert!(peer.parent_id.is_none());
    assert_ne!(peer.id, done.id);
    assert_eq!(peer.status, Status::Done);
    assert_eq!(peer.room_id.as_deref(), Some("r1"));
}

#[test]
fn prefix_and_op_extraction() {
    let frame = Frame::request("stroke:undo", Data::new());
    assert_eq!(frame.prefix(), "stroke");
    assert_eq!(frame.op(), "undo");

    let frame = Frame::request("noseparator", Data::new());
    assert_eq!(frame.prefix(), "noseparator");
    assert_eq!(frame.op(), "");
}

#[test]
fn error_from_typed() {
    #[derive(Debug, thiserror::Error)]
    #[error("Nothing to undo")]
    struct NothingToUndo;

    impl ErrorCode for NothingToUndo {
        fn error_code(&self) -> &'static str {
            "E_NOTHING_TO_UNDO"
        }
    }

    let req = Frame::request("stroke:undo", Data::new());
    let err = req.error_from(&NothingToUndo);

    assert_eq!(err.status, Status::Error);
    assert_eq!(err.str_field(FRAME_CODE), Some("E_NOTHING_TO_UNDO"));
    assert_eq!(err.error_message(), Some("Nothing to undo"));
    assert!(!err.is_retryable());
}

#[test]
fn field_reports_missing_and_invalid_values() {
    let frame = Frame::request("stroke:draw", Data::new())
        .with_data("n", "not a number")
        .with_data("nil", Value::Null);

    assert!(matches!(frame.field::<f64>("absent"), Err(FieldError::Missing("absent"))));
    assert!(matches!(frame.field::<f64>("nil"), Err(FieldError::Missing("nil"))));
    assert!(matches!(frame.field::<f64>("n"), Err(FieldError::Invalid { key: "n", .. })));
}
