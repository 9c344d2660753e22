use super::*;

#[test]
fn ws_url_maps_http_schemes_to_websocket_schemes() {
    assert_eq!(ws_url("http://127.0.0.1:3000").unwrap(), "ws://127.0.0.1:3000/api/ws");
    assert_eq!(ws_url("https://ink.example.com/").unwrap(), "wss://ink.example.com/api/ws");
}

#[test]
fn ws_url_rejects_unknown_scheme() {
    assert!(matches!(ws_url("ftp://host"), Err(CliError::InvalidBaseUrl(_))));
}

#[test]
fn parse_points_reads_space_separated_pairs() {
    let points = parse_points(" 1,2  3.5,-4 ").unwrap();
    assert_eq!(points, vec![Point::new(1.0, 2.0), Point::new(3.5, -4.0)]);
}

#[test]
fn parse_points_rejects_malformed_pairs() {
    for raw in ["1", "1,x", "NaN,2", "1;2"] {
        assert!(matches!(parse_points(raw), Err(CliError::InvalidPoint(_))), "{raw}");
    }
}

#[test]
fn parse_points_empty_input_is_empty() {
    assert!(parse_points("").unwrap().is_empty());
}

#[test]
fn draw_args_parse_style_flags() {
    let cli = Cli::try_parse_from([
        "shared-ink",
        "draw",
        "--room",
        "lobby",
        "--points",
        "0,0 10,10",
        "--brush",
        "airbrush",
        "--color",
        "#f00",
        "--stability",
        "10",
    ])
    .unwrap();
    let Command::Draw(args) = cli.command else {
        panic!("expected draw");
    };
    assert_eq!(args.brush, BrushArg::Airbrush);
    assert_eq!(args.tool, ToolArg::Brush);
    assert_eq!(args.color, Rgb::new(0xff, 0, 0));
    assert_eq!(args.stability, 10);
}

#[test]
fn draw_args_reject_out_of_range_stability() {
    let parsed = Cli::try_parse_from(["shared-ink", "draw", "--room", "r", "--points", "0,0", "--stability", "11"]);
    assert!(parsed.is_err());
}

#[test]
fn room_frame_carries_room_id() {
    let frame = room_frame(ROOM_JOIN, "lobby", Data::new());
    assert_eq!(frame.room_id.as_deref(), Some("lobby"));
    assert_eq!(frame.status, Status::Request);
}
