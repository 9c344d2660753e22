use frames::model::{Rgb, Tool};

use super::*;
use crate::curve::full_path;
use crate::raster::RasterSurface;
use crate::render::pen_for;

const W: u32 = 60;
const H: u32 = 40;

fn surface() -> RasterSurface {
    RasterSurface::new(W, H).expect("surface")
}

fn overlay() -> Overlay<RasterSurface> {
    Overlay::new(surface(), surface(), surface(), surface())
}

fn stroke(id: &str, points: &[(f64, f64)]) -> Stroke {
    Stroke {
        id: id.into(),
        owner: "peer".into(),
        points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        tool: Tool::Brush,
        brush: Brush::Pen,
        color: Rgb::new(0xff, 0, 0),
        size: 6.0,
        opacity: 1.0,
        stability: 5,
    }
}

fn horizontal(id: &str, y: f64) -> Stroke {
    stroke(id, &[(5.0, y), (20.0, y), (35.0, y), (50.0, y)])
}

#[test]
fn remote_strokes_paint_onto_ink_in_start_order() {
    let mut o = overlay();
    o.remote_start(horizontal("a", 10.0)).expect("a");
    o.remote_start(horizontal("b", 30.0)).expect("b");

    assert_eq!(o.remote_ids().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(o.ink().alpha_at(30, 10), 255);
    assert_eq!(o.ink().alpha_at(30, 30), 255);
    assert_eq!(o.mask().painted_pixels(), 0);
}

#[test]
fn remote_points_extend_the_live_copy() {
    let mut o = overlay();
    o.remote_start(stroke("a", &[(5.0, 10.0)])).expect("start");
    assert_eq!(o.ink().alpha_at(40, 10), 0);

    o.remote_point("a", Point::new(50.0, 10.0)).expect("point");
    o.remote_point("ghost", Point::new(1.0, 1.0)).expect("unknown id");

    assert_eq!(o.remote("a").map(|s| s.points.len()), Some(2));
    assert_eq!(o.ink().alpha_at(40, 10), 255);
}

#[test]
fn remote_erasers_paint_the_mask_in_white() {
    let mut o = overlay();
    o.remote_start(Stroke { tool: Tool::Eraser, ..horizontal("e", 20.0) })
        .expect("start");

    assert_eq!(o.ink().painted_pixels(), 0);
    assert_eq!(o.mask().color_at(30, 20), Some(Rgb::WHITE));
}

#[test]
fn highlighters_paint_the_tint_layer() {
    let mut o = overlay();
    o.remote_start(Stroke { brush: Brush::Highlighter, ..horizontal("h", 20.0) })
        .expect("start");
    o.add_pending(horizontal("p", 10.0)).expect("pending");

    assert!(o.tint().alpha_at(30, 20) > 0);
    assert_eq!(o.ink().alpha_at(30, 20), 0);
    assert_eq!(o.ink().alpha_at(30, 10), 255);
    assert_eq!(o.tint().alpha_at(30, 10), 0);

    o.remove("h").expect("remove");
    assert_eq!(o.tint().painted_pixels(), 0);
}

#[test]
fn abandon_and_remove_repaint_without_the_stroke() {
    let mut o = overlay();
    o.remote_start(horizontal("a", 10.0)).expect("a");
    o.remote_start(horizontal("b", 30.0)).expect("b");

    o.remote_abandon(&["a".to_string()]).expect("abandon");
    assert_eq!(o.ink().alpha_at(30, 10), 0);
    assert_eq!(o.ink().alpha_at(30, 30), 255);

    o.remove("b").expect("remove");
    assert_eq!(o.ink().painted_pixels(), 0);
}

#[test]
fn local_stroke_extends_only_settled_segments() {
    let mut o = overlay();
    o.begin_local(stroke("me", &[(5.0, 20.0)])).expect("begin");
    assert!(o.local_layer().alpha_at(5, 20) > 0);

    // Two points: the only segment is not settled yet.
    o.extend_local(Point::new(30.0, 20.0)).expect("p1");
    assert_eq!(o.local_layer().alpha_at(18, 20), 0);

    // Third point settles segment 0.
    o.extend_local(Point::new(55.0, 20.0)).expect("p2");
    assert_eq!(o.local_layer().alpha_at(18, 20), 255);
    assert_eq!(o.local_layer().alpha_at(45, 20), 0);
    assert_eq!(o.ink().painted_pixels(), 0);
}

#[test]
fn local_highlighter_matches_a_fresh_redraw() {
    let hl = Stroke { brush: Brush::Highlighter, size: 8.0, stability: 0, ..stroke("me", &[(5.0, 30.0)]) };
    let mut o = overlay();
    o.begin_local(hl.clone()).expect("begin");
    for (x, y) in [(20.0, 8.0), (35.0, 30.0), (50.0, 8.0), (50.0, 8.0)] {
        o.extend_local(Point::new(x, y)).expect("extend");
    }
    let live = o.local_layer().pixmap().clone();

    o.redraw().expect("redraw");
    assert_eq!(o.local_layer().pixmap().data(), live.data());

    // The settled prefix as one mitred path, with no first-point square left over.
    let points = &o.local().expect("local").points;
    let mut expected = surface();
    expected
        .stroke_path(&full_path(points, 0.0)[..3], &pen_for(&hl, Layer::Local))
        .expect("path");
    assert_eq!(o.local_layer().pixmap().data(), expected.pixmap().data());
    assert_eq!(o.local_layer().alpha_at(2, 33), 0);
}

#[test]
fn local_airbrush_matches_a_fresh_redraw() {
    let air = Stroke { brush: Brush::Airbrush, size: 10.0, ..stroke("me", &[(5.0, 20.0)]) };
    let mut o = overlay();
    o.begin_local(air).expect("begin");
    for x in [15.0, 32.0, 47.0] {
        o.extend_local(Point::new(x, 20.0)).expect("extend");
    }
    let live = o.local_layer().pixmap().clone();

    o.redraw().expect("redraw");
    assert_eq!(o.local_layer().pixmap().data(), live.data());
}

#[test]
fn airbrush_local_stroke_stamps_each_new_pair() {
    let mut o = overlay();
    let air = Stroke { brush: Brush::Airbrush, size: 10.0, ..stroke("me", &[(5.0, 20.0)]) };
    o.begin_local(air).expect("begin");
    let first = o.local_layer().painted_pixels();

    o.extend_local(Point::new(25.0, 20.0)).expect("extend");
    assert!(o.local_layer().painted_pixels() > first);
    assert!(o.local_layer().alpha_at(15, 20) > 0);
}

#[test]
fn ending_the_local_stroke_moves_it_to_pending() {
    let mut o = overlay();
    o.begin_local(stroke("me", &[(5.0, 20.0)])).expect("begin");
    o.extend_local(Point::new(30.0, 20.0)).expect("p1");

    assert_eq!(o.end_local().expect("end"), Some("me".to_string()));
    assert!(o.local().is_none());
    assert_eq!(o.local_layer().painted_pixels(), 0);
    assert_eq!(o.pending_ids().collect::<Vec<_>>(), ["me"]);
    assert_eq!(o.ink().alpha_at(18, 20), 255);

    o.remove("me").expect("ack");
    assert_eq!(o.ink().painted_pixels(), 0);
}

#[test]
fn pending_strokes_paint_above_remote_ones() {
    let mut o = overlay();
    o.add_pending(Stroke { color: Rgb::new(0, 0, 0xff), ..horizontal("mine", 20.0) })
        .expect("pending");
    o.remote_start(horizontal("theirs", 20.0)).expect("remote");

    assert_eq!(o.ink().color_at(30, 20), Some(Rgb::new(0, 0, 0xff)));
}

#[test]
fn present_erases_committed_ink_under_a_live_eraser() {
    let mut committed = surface();
    let mut renderer = StrokeRenderer::new();
    renderer
        .draw(&mut committed, &horizontal("old", 20.0), Layer::Committed)
        .expect("committed");

    let mut o = overlay();
    o.remote_start(Stroke {
        tool: Tool::Eraser,
        size: 12.0,
        ..stroke("e", &[(30.0, 0.0), (30.0, 40.0)])
    })
    .expect("eraser");

    let mut target = surface();
    o.present(&committed, &mut target).expect("present");
    assert_eq!(target.alpha_at(30, 20), 0);
    assert_eq!(target.alpha_at(10, 20), 255);
    // The committed raster itself is untouched until the eraser commits.
    assert_eq!(committed.alpha_at(30, 20), 255);
}

#[test]
fn present_composites_local_brush_at_stroke_opacity() {
    let committed = surface();
    let mut o = overlay();
    o.begin_local(Stroke { opacity: 0.5, size: 10.0, ..stroke("me", &[(30.0, 20.0)]) })
        .expect("begin");

    let mut target = surface();
    o.present(&committed, &mut target).expect("present");
    let a = target.alpha_at(30, 20);
    assert!((120..=135).contains(&a), "local alpha {a}");
}

#[test]
fn present_cuts_committed_ink_under_a_local_eraser() {
    let mut committed = surface();
    StrokeRenderer::new()
        .draw(&mut committed, &horizontal("old", 20.0), Layer::Committed)
        .expect("committed");

    let mut o = overlay();
    o.begin_local(Stroke { tool: Tool::Eraser, size: 10.0, ..stroke("me", &[(30.0, 20.0)]) })
        .expect("begin");

    let mut target = surface();
    o.present(&committed, &mut target).expect("present");
    assert_eq!(target.alpha_at(30, 20), 0);
    assert_eq!(target.alpha_at(10, 20), 255);
}

#[test]
fn reset_blanks_everything() {
    let mut o = overlay();
    o.remote_start(horizontal("a", 10.0)).expect("a");
    o.begin_local(stroke("me", &[(5.0, 30.0)])).expect("local");
    o.reset().expect("reset");

    assert_eq!(o.remote_ids().count(), 0);
    assert!(o.local().is_none());
    assert_eq!(o.ink().painted_pixels() + o.local_layer().painted_pixels(), 0);
}
