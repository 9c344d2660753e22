//! Pointer input smoothing.
//!
//! Each raw sample pulls the stable point part of the way toward it. Low
//! stability follows the pointer closely; high stability trails behind it and
//! irons out hand jitter.

use frames::model::Point;

use crate::consts::STABILIZER_DIVISOR;

#[cfg(test)]
#[path = "stabilizer_test.rs"]
mod stabilizer_test;

#[derive(Debug, Clone, PartialEq)]
pub struct Stabilizer {
    follow: f64,
    stable: Point,
}

impl Stabilizer {
    /// Start smoothing at `start`, the raw pointer-down position.
    #[must_use]
    pub fn new(stability: u8, start: Point) -> Self {
        Self { follow: follow_factor(stability), stable: start }
    }

    /// Feed one raw sample and return the new stable point.
    pub fn push(&mut self, raw: Point) -> Point {
        self.stable = self.stable.lerp(raw, self.follow);
        self.stable
    }

    #[must_use]
    pub fn stable(&self) -> Point {
        self.stable
    }
}

/// `1 - stability / 10.5`: exactly 1.0 (raw input) at stability 0, about 0.048 at 10.
#[must_use]
pub fn follow_factor(stability: u8) -> f64 {
    1.0 - f64::from(stability) / STABILIZER_DIVISOR
}
