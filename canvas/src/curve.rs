//! Catmull-Rom to cubic Bézier conversion and airbrush stamp placement.
//!
//! Pure math, no surfaces. [`segment`] is the only place control points are
//! computed; the full-path and incremental renderers both go through it, so a
//! segment emitted while the pointer is still down is bit-identical to the
//! same segment of the finished stroke.

use frames::model::{MAX_STABILITY, Point};

use crate::consts::{AIRBRUSH_SPACING, MAX_STAMPS_PER_PAIR, MAX_TENSION};

#[cfg(test)]
#[path = "curve_test.rs"]
mod curve_test;

/// One cubic segment from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bezier {
    pub from: Point,
    pub cp1: Point,
    pub cp2: Point,
    pub to: Point,
}

/// Curve tension for a stability setting: `clamp(stability / 10, 0, 1) * 0.9`.
#[must_use]
pub fn tension(stability: u8) -> f64 {
    (f64::from(stability) / f64::from(MAX_STABILITY)).clamp(0.0, 1.0) * MAX_TENSION
}

/// Segment `i`, from `points[i]` to `points[i + 1]`.
///
/// Missing neighbours are duplicated from the segment's own endpoints.
/// Returns `None` when `points[i + 1]` does not exist.
#[must_use]
pub fn segment(points: &[Point], i: usize, tension: f64) -> Option<Bezier> {
    let p1 = *points.get(i)?;
    let p2 = *points.get(i + 1)?;
    let p0 = i.checked_sub(1).and_then(|j| points.get(j)).copied().unwrap_or(p1);
    let p3 = points.get(i + 2).copied().unwrap_or(p2);

    Some(Bezier {
        from: p1,
        cp1: Point::new(p1.x + (p2.x - p0.x) * tension / 6.0, p1.y + (p2.y - p0.y) * tension / 6.0),
        cp2: Point::new(p2.x - (p3.x - p1.x) * tension / 6.0, p2.y - (p3.y - p1.y) * tension / 6.0),
        to: p2,
    })
}

/// Every segment of a finished stroke. Empty for fewer than two points.
#[must_use]
pub fn full_path(points: &[Point], tension: f64) -> Vec<Bezier> {
    let mut path = IncrementalPath::with_tension(tension);
    let mut segments = path.settled(points);
    segments.extend(path.finish(points));
    segments
}

// =============================================================================
// INCREMENTAL
// =============================================================================

/// Tracks which segments of a growing stroke have already been emitted.
///
/// Segment `i` settles once `points[i + 2]` exists: from then on none of its
/// four control inputs can change.
#[derive(Debug, Clone, PartialEq)]
pub struct IncrementalPath {
    tension: f64,
    emitted: usize,
}

impl IncrementalPath {
    #[must_use]
    pub fn new(stability: u8) -> Self {
        Self::with_tension(tension(stability))
    }

    #[must_use]
    pub fn with_tension(tension: f64) -> Self {
        Self { tension, emitted: 0 }
    }

    /// Number of segments emitted so far.
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Emit every segment that settled since the last call.
    pub fn settled(&mut self, points: &[Point]) -> Vec<Bezier> {
        let settled = points.len().saturating_sub(2);
        self.emit_until(points, settled)
    }

    /// Emit the tail, treating `points` as complete.
    pub fn finish(&mut self, points: &[Point]) -> Vec<Bezier> {
        let total = points.len().saturating_sub(1);
        self.emit_until(points, total)
    }

    fn emit_until(&mut self, points: &[Point], end: usize) -> Vec<Bezier> {
        let out: Vec<Bezier> = (self.emitted..end)
            .filter_map(|i| segment(points, i, self.tension))
            .collect();
        self.emitted = self.emitted.max(end);
        out
    }
}

// =============================================================================
// AIRBRUSH
// =============================================================================

/// Stamp centres for the pair `a → b`: `steps = max(1, dist / 2)` and one
/// stamp at `j / steps` for each whole `j` in `1..=steps`. `a` itself is not
/// stamped. Long jumps are spaced out to at most `MAX_STAMPS_PER_PAIR`.
#[must_use]
pub fn stamps_between(a: Point, b: Point) -> Vec<Point> {
    let steps = (a.distance(b) / AIRBRUSH_SPACING).clamp(1.0, MAX_STAMPS_PER_PAIR);
    if !steps.is_finite() {
        return Vec::new();
    }
    let mut stamps = Vec::new();
    let mut j = 1.0;
    while j <= steps {
        stamps.push(a.lerp(b, j / steps));
        j += 1.0;
    }
    stamps
}

/// Every stamp of a finished airbrush stroke: the first point once, then
/// [`stamps_between`] for each consecutive pair.
#[must_use]
pub fn airbrush_stamps(points: &[Point]) -> Vec<Point> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let mut stamps = vec![first];
    for pair in points.windows(2) {
        stamps.extend(stamps_between(pair[0], pair[1]));
    }
    stamps
}
