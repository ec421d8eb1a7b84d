//! Utilities for numerics.

use std::f32::consts::{PI, TAU};

/// Normalizes an angle in radians to the range `[-π, π)`.
pub fn normalize_radians(angle: f32) -> f32 {
    angle - TAU * ((angle + PI) / TAU).floor()
}
