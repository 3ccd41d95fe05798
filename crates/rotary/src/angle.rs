//! Angle helpers for the dial. All angles are in degrees.
//!
//! The whole step range is laid out over one full turn: the dial is rotated by
//! `-(i / (n - 1)) * 360` when step `i` of `n` sits under the indicator, so a
//! positive rotation (dragging right) moves towards lower steps.

use crate::range::{StepIndex, ValueRange};

pub const FULL_TURN: f64 = 360.0;

/// Wraps an angle into `[0, 360)`.
pub fn normalize(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(FULL_TURN);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= FULL_TURN { 0.0 } else { wrapped }
}

/// Wraps an angle into `[-180, 180)`.
pub fn normalize_signed(angle: f64) -> f64 {
    normalize(angle + FULL_TURN / 2.0) - FULL_TURN / 2.0
}

/// Angular distance between neighbouring ticks, `None` for a static range.
pub fn degrees_per_step(range: &ValueRange) -> Option<f64> {
    (!range.is_static()).then(|| FULL_TURN / *range.last_index() as f64)
}

/// Dial rotation at which `index` sits under the indicator.
pub fn angle_for_index(range: &ValueRange, index: StepIndex) -> f64 {
    degrees_per_step(range)
        .map(|per_step| -(*index.min(range.last_index()) as f64) * per_step)
        .unwrap_or(0.0)
}

/// Fraction of the range selected by a dial rotation, in `[0, 1]`.
///
/// Inside one turn this is `1 - normalize(angle) / 360`. The accumulated angle
/// is used instead of the wrapped one so that rotation `0` stays at the first
/// step and rotations past either end saturate rather than wrap around.
pub fn progress_for_angle(angle: f64) -> f64 {
    if angle.is_nan() {
        return 0.0;
    }
    (-angle / FULL_TURN).clamp(0.0, 1.0)
}

/// Nearest step for a dial rotation, clamped into the range.
pub fn index_for_angle(range: &ValueRange, angle: f64) -> StepIndex {
    if range.is_static() {
        return StepIndex::new(0);
    }
    let raw = (progress_for_angle(angle) * *range.last_index() as f64).round();
    range.clamp_index(raw)
}

/// Where tick `index` currently sits relative to the indicator, in `[-180, 180)`.
/// Positive is clockwise.
pub fn tick_offset(range: &ValueRange, rotation: f64, index: StepIndex) -> f64 {
    normalize_signed(rotation - angle_for_index(range, index))
}
