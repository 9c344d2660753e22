use super::*;

fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
    raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

fn zigzag(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let x = i as f64 * 7.5;
            let y = if i % 2 == 0 { 0.0 } else { 11.25 + i as f64 };
            Point::new(x, y)
        })
        .collect()
}

// =============================================================
// tension
// =============================================================

#[test]
fn tension_scales_stability_to_point_nine() {
    assert_eq!(tension(0), 0.0);
    assert!((tension(5) - 0.45).abs() < 1e-12);
    assert!((tension(10) - 0.9).abs() < 1e-12);
}

#[test]
fn tension_clamps_out_of_range_stability() {
    assert_eq!(tension(200), tension(10));
}

// =============================================================
// segment
// =============================================================

#[test]
fn segment_needs_two_points() {
    assert!(segment(&pts(&[(1.0, 1.0)]), 0, 0.5).is_none());
    assert!(segment(&pts(&[(1.0, 1.0), (2.0, 2.0)]), 1, 0.5).is_none());
}

#[test]
fn zero_tension_puts_control_points_on_endpoints() {
    let points = pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 10.0)]);
    let seg = segment(&points, 0, 0.0).expect("segment");
    assert_eq!(seg.cp1, seg.from);
    assert_eq!(seg.cp2, seg.to);
}

#[test]
fn boundary_neighbours_are_duplicated() {
    let points = pts(&[(0.0, 0.0), (6.0, 0.0)]);
    let seg = segment(&points, 0, 0.6).expect("segment");
    // p0 = p1 and p3 = p2, so both tangents are (p2 - p1) * t / 6.
    assert!((seg.cp1.x - 0.6).abs() < 1e-12);
    assert!((seg.cp2.x - 5.4).abs() < 1e-12);
    assert_eq!(seg.cp1.y, 0.0);
}

#[test]
fn interior_segment_uses_both_neighbours() {
    let points = pts(&[(0.0, 0.0), (6.0, 0.0), (12.0, 6.0), (18.0, 6.0)]);
    let seg = segment(&points, 1, 0.9).expect("segment");
    assert!((seg.cp1.x - (6.0 + 12.0 * 0.9 / 6.0)).abs() < 1e-12);
    assert!((seg.cp1.y - (6.0 * 0.9 / 6.0)).abs() < 1e-12);
    assert!((seg.cp2.x - (12.0 - 12.0 * 0.9 / 6.0)).abs() < 1e-12);
    assert!((seg.cp2.y - (6.0 - 6.0 * 0.9 / 6.0)).abs() < 1e-12);
}

#[test]
fn full_path_has_one_segment_per_pair() {
    assert!(full_path(&[], 0.5).is_empty());
    assert!(full_path(&pts(&[(1.0, 1.0)]), 0.5).is_empty());
    assert_eq!(full_path(&zigzag(6), 0.5).len(), 5);
}

// =============================================================
// incremental
// =============================================================

#[test]
fn incremental_emissions_equal_full_path_for_every_length() {
    for len in 2..12 {
        for stability in [0, 3, 5, 10] {
            let points = zigzag(len);
            let mut path = IncrementalPath::new(stability);
            let mut emitted = Vec::new();
            for n in 1..=len {
                emitted.extend(path.settled(&points[..n]));
            }
            emitted.extend(path.finish(&points));
            assert_eq!(emitted, full_path(&points, tension(stability)), "len {len} stability {stability}");
        }
    }
}

#[test]
fn settled_segments_never_change_as_points_arrive() {
    let points = zigzag(9);
    let t = tension(7);
    let mut path = IncrementalPath::new(7);
    for n in 1..=points.len() {
        let before = path.emitted();
        for (offset, seg) in path.settled(&points[..n]).into_iter().enumerate() {
            let i = before + offset;
            assert_eq!(Some(seg), segment(&points, i, t), "segment {i} at len {n}");
        }
    }
}

#[test]
fn segment_settles_once_its_successor_point_exists() {
    let points = zigzag(5);
    let mut path = IncrementalPath::new(5);
    assert!(path.settled(&points[..2]).is_empty());
    assert_eq!(path.settled(&points[..3]).len(), 1);
    assert_eq!(path.settled(&points[..3]).len(), 0);
    assert_eq!(path.settled(&points[..5]).len(), 2);
    assert_eq!(path.finish(&points).len(), 1);
    assert!(path.finish(&points).is_empty());
}

#[test]
fn finish_on_two_points_emits_single_segment() {
    let points = pts(&[(0.0, 0.0), (4.0, 4.0)]);
    let mut path = IncrementalPath::new(5);
    assert!(path.settled(&points).is_empty());
    assert_eq!(path.finish(&points), full_path(&points, tension(5)));
}

// =============================================================
// airbrush
// =============================================================

#[test]
fn short_pair_gets_one_stamp_at_the_far_end() {
    let stamps = stamps_between(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
    assert_eq!(stamps, vec![Point::new(1.0, 0.0)]);
}

#[test]
fn coincident_pair_still_stamps_once() {
    let p = Point::new(3.0, 3.0);
    assert_eq!(stamps_between(p, p), vec![p]);
}

#[test]
fn stamps_are_spaced_along_the_pair() {
    let stamps = stamps_between(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    assert_eq!(stamps.len(), 5);
    let xs: Vec<f64> = stamps.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![2.0, 4.0, 6.0, 8.0, 10.0]);
}

#[test]
fn fractional_steps_stop_short_of_the_far_end() {
    // dist 5 → steps 2.5 → stamps at 1/2.5 and 2/2.5 of the way.
    let stamps = stamps_between(Point::new(0.0, 0.0), Point::new(5.0, 0.0));
    assert_eq!(stamps.len(), 2);
    assert!((stamps[0].x - 2.0).abs() < 1e-12);
    assert!((stamps[1].x - 4.0).abs() < 1e-12);
}

#[test]
fn long_jump_is_capped_and_still_reaches_the_far_end() {
    let far = Point::new(2e6, 0.0);
    let stamps = stamps_between(Point::new(-2e6, 0.0), far);
    assert_eq!(stamps.len(), MAX_STAMPS_PER_PAIR as usize);
    assert_eq!(*stamps.last().expect("stamp"), far);
}

#[test]
fn airbrush_stamps_first_point_then_each_pair() {
    let points = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 1.0)]);
    let stamps = airbrush_stamps(&points);
    assert_eq!(stamps[0], points[0]);
    assert_eq!(stamps.len(), 1 + 2 + 1);
    assert_eq!(*stamps.last().expect("stamp"), points[2]);
    assert!(airbrush_stamps(&[]).is_empty());
}

#[test]
fn incremental_stamps_match_full_stamps() {
    let points = zigzag(7);
    let mut live = vec![points[0]];
    for pair in points.windows(2) {
        live.extend(stamps_between(pair[0], pair[1]));
    }
    assert_eq!(live, airbrush_stamps(&points));
}
