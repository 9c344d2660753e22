//! Shared numeric constants for the canvas crate.

// ── Brush settings ──────────────────────────────────────────────

/// Default brush diameter in canvas pixels.
pub const DEFAULT_SIZE: f64 = 12.0;

/// Brush diameter range offered to the user. Matches what the server accepts.
pub const MIN_SIZE: f64 = frames::model::MIN_STROKE_SIZE;
pub const MAX_SIZE: f64 = frames::model::MAX_STROKE_SIZE;

/// Opacity range offered to the user. Zero would commit an invisible stroke.
pub const MIN_OPACITY: f64 = 0.05;
pub const MAX_OPACITY: f64 = 1.0;

/// Default stabilizer setting (0 = raw input, 10 = heaviest smoothing).
pub const DEFAULT_STABILITY: u8 = 5;

// ── Curve ───────────────────────────────────────────────────────

/// Catmull-Rom tension at full stability.
pub const MAX_TENSION: f64 = 0.9;

/// Stabilizer divisor; keeps the follow factor above zero at stability 10.
pub const STABILIZER_DIVISOR: f64 = 10.5;

// ── Brushes ─────────────────────────────────────────────────────

/// Highlighter alpha multiplier.
pub const HIGHLIGHTER_ALPHA: f64 = 0.5;

/// Per-stamp alpha multiplier for the airbrush.
pub const AIRBRUSH_ALPHA: f64 = 0.1;

/// Distance between airbrush stamps in canvas pixels.
pub const AIRBRUSH_SPACING: f64 = 2.0;

/// Upper bound on stamps between two consecutive airbrush points.
pub const MAX_STAMPS_PER_PAIR: f64 = 4096.0;

/// Largest airbrush tip, in canvas pixels, a surface will allocate.
pub const MAX_SPRITE_SIZE: f64 = 1024.0;

// ── Commit protocol ─────────────────────────────────────────────

/// How long a commit may wait for its ack before it is resent.
pub const COMMIT_TIMEOUT_MS: i64 = 5_000;

/// Total sends per commit, the first included.
pub const COMMIT_MAX_ATTEMPTS: u32 = 3;
