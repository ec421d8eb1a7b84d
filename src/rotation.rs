//! 2D rotations around pivot points.
//!
//! Hands are rotated upright before landmark prediction. The transforms built here map points
//! between the source image and that rotated frame, and back.

use std::f32::consts::FRAC_PI_2;

use nalgebra::{Isometry2, Point2, UnitComplex, Vector3};

use crate::num::normalize_radians;

/// A rotation around a pivot point.
///
/// This is a rigid 2D transform (a rotation followed by a translation), so it is always
/// invertible.
pub type RotationMatrix = Isometry2<f32>;

/// Builds a [`RotationMatrix`] that rotates points by `radians` around `pivot`.
///
/// Positive angles rotate from the positive X axis towards the positive Y axis.
pub fn rotation_matrix(radians: f32, pivot: impl Into<Point2<f32>>) -> RotationMatrix {
    Isometry2::rotation_wrt_point(UnitComplex::new(radians), pivot.into())
}

/// Computes the inverse of `matrix`.
pub fn invert_transform(matrix: &RotationMatrix) -> RotationMatrix {
    matrix.inverse()
}

/// Applies `matrix` to `point`.
pub fn rotate_point(point: impl Into<Point2<f32>>, matrix: &RotationMatrix) -> Point2<f32> {
    matrix.transform_point(&point.into())
}

/// Computes the dot product of a homogeneous matrix row and a homogeneous point.
pub fn dot(row: &Vector3<f32>, point: &Vector3<f32>) -> f32 {
    row.dot(point)
}

/// Returns the `row`th row of `matrix` in homogeneous form.
///
/// Only rows 0 and 1 are meaningful; row 2 is always `(0, 0, 1)`.
pub fn matrix_row(matrix: &RotationMatrix, row: usize) -> Vector3<f32> {
    matrix.to_homogeneous().row(row).transpose()
}

/// Computes the angle that rotates the vector from `a` to `b` into an upright position (pointing
/// towards negative Y, in image coordinates).
///
/// The result is normalized to `[-π, π)`.
pub fn compute_rotation(a: impl Into<Point2<f32>>, b: impl Into<Point2<f32>>) -> f32 {
    let (a, b) = (a.into(), b.into());
    let radians = FRAC_PI_2 - f32::atan2(-(b.y - a.y), b.x - a.x);
    normalize_radians(radians)
}
