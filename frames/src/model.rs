//! Stroke, cursor, and room data carried in frame payloads.
//!
//! Shared by the server (authoritative log) and the canvas client (renderer
//! and session protocol) so both sides agree on one serialized shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

/// Longest stroke id accepted from a client.
pub const MAX_STROKE_ID_LEN: usize = 128;

/// Largest stabilizer setting.
pub const MAX_STABILITY: u8 = 10;

/// Brush diameter range, in canvas pixels.
pub const MIN_STROKE_SIZE: f64 = 1.0;
pub const MAX_STROKE_SIZE: f64 = 200.0;

/// Largest coordinate magnitude a stroke point may have.
pub const MAX_COORDINATE: f64 = 1_000_000.0;

// =============================================================================
// POINT
// =============================================================================

/// A point in device-independent canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation from `self` toward `other` by `t`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self { x: self.x + (other.x - self.x) * t, y: self.y + (other.y - self.y) * t }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Both coordinates within `MAX_COORDINATE` of the origin.
    #[must_use]
    pub fn in_bounds(self) -> bool {
        self.x.abs() <= MAX_COORDINATE && self.y.abs() <= MAX_COORDINATE
    }
}

// =============================================================================
// STYLE
// =============================================================================

/// Whether a stroke adds ink or removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
}

/// Shape family used to render a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brush {
    #[default]
    Pen,
    Highlighter,
    Airbrush,
}

/// Opaque sRGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
    pub const WHITE: Self = Self { r: 0xff, g: 0xff, b: 0xff };

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}: expected #rgb or #rrggbb")]
pub struct ParseRgbError(pub String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRgbError(s.to_owned());
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| err());
        match hex.len() {
            6 => Ok(Self { r: channel(&hex[0..2])?, g: channel(&hex[2..4])?, b: channel(&hex[4..6])? }),
            3 => {
                let short = |i: usize| channel(&hex[i..=i]).map(|v| v * 0x11);
                Ok(Self { r: short(0)?, g: short(1)?, b: short(2)? })
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseRgbError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// =============================================================================
// STROKE
// =============================================================================

/// One freehand mark. Points only grow while live and are frozen on commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Client-generated, unique within a room.
    pub id: String,
    /// Connection id of the author. Stamped by the server on commit.
    #[serde(default)]
    pub owner: String,
    pub points: Vec<Point>,
    #[serde(default)]
    pub tool: Tool,
    #[serde(default)]
    pub brush: Brush,
    pub color: Rgb,
    pub size: f64,
    pub opacity: f64,
    #[serde(default)]
    pub stability: u8,
}

/// Reason a stroke payload was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrokeError {
    #[error("stroke id required")]
    MissingId,
    #[error("stroke id longer than {MAX_STROKE_ID_LEN} bytes")]
    IdTooLong,
    #[error("stroke has no points")]
    NoPoints,
    #[error("stroke point {0} is not finite")]
    NonFinitePoint(usize),
    #[error("stroke point {0} lies beyond {MAX_COORDINATE}")]
    PointOutOfRange(usize),
    #[error("stroke size must be in [{MIN_STROKE_SIZE}, {MAX_STROKE_SIZE}], got {0}")]
    Size(f64),
    #[error("stroke opacity must be in (0, 1], got {0}")]
    Opacity(f64),
    #[error("stroke stability must be at most {MAX_STABILITY}, got {0}")]
    Stability(u8),
}

impl Stroke {
    /// Check the ranges every persisted stroke must satisfy.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), StrokeError> {
        if self.id.is_empty() {
            return Err(StrokeError::MissingId);
        }
        if self.id.len() > MAX_STROKE_ID_LEN {
            return Err(StrokeError::IdTooLong);
        }
        if self.points.is_empty() {
            return Err(StrokeError::NoPoints);
        }
        if let Some(i) = self.points.iter().position(|p| !p.is_finite()) {
            return Err(StrokeError::NonFinitePoint(i));
        }
        if let Some(i) = self.points.iter().position(|p| !p.in_bounds()) {
            return Err(StrokeError::PointOutOfRange(i));
        }
        if !(self.size.is_finite() && (MIN_STROKE_SIZE..=MAX_STROKE_SIZE).contains(&self.size)) {
            return Err(StrokeError::Size(self.size));
        }
        if !(self.opacity.is_finite() && self.opacity > 0.0 && self.opacity <= 1.0) {
            return Err(StrokeError::Opacity(self.opacity));
        }
        if self.stability > MAX_STABILITY {
            return Err(StrokeError::Stability(self.stability));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_eraser(&self) -> bool {
        self.tool == Tool::Eraser
    }

    /// Color actually painted: erasers always paint white.
    #[must_use]
    pub fn ink(&self) -> Rgb {
        match self.tool {
            Tool::Brush => self.color,
            Tool::Eraser => Rgb::WHITE,
        }
    }
}

// =============================================================================
// CURSOR + ROOM
// =============================================================================

/// A peer's pointer position and display identity. `None` on the wire hides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
    pub color: Rgb,
    pub name: String,
    #[serde(default)]
    pub tool: Tool,
}

/// Durable room snapshot: the ordered committed log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub strokes: Vec<Stroke>,
}

