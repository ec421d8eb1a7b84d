//! Mapping of landmark network outputs back into the source image.

use nalgebra::Point2;

use crate::{
    landmark::Landmarks,
    rect::Rect,
    resolution::Resolution,
    rotation::{dot, invert_transform, matrix_row, rotate_point, rotation_matrix, RotationMatrix},
};

/// Projects landmarks from the landmark network's input space into the source image.
///
/// # Parameters
///
/// - `raw`: landmarks in the coordinate system of the network input, which has the resolution
///   `input_res`.
/// - `crop`: the rectangle that was cut out of the rotated image and resized to `input_res`.
/// - `angle`: the hand's rotation that was undone before inference.
/// - `rotation`: the transform from source image into the rotated image, as passed to
///   [`crop_rotated`][crate::crop::crop_rotated].
///
/// The depth coordinate is passed through unchanged.
pub fn project_landmarks(
    raw: &Landmarks,
    crop: &Rect,
    angle: f32,
    rotation: &RotationMatrix,
    input_res: Resolution,
) -> Landmarks {
    let (w, h) = (input_res.width() as f32, input_res.height() as f32);
    let scale_x = crop.width() / w;
    let scale_y = crop.height() / h;

    let undo_rotation = rotation_matrix(angle, Point2::origin());
    // The crop center is in rotated-image coordinates.
    let inverse = invert_transform(rotation);
    let crop_center = crop.center().to_homogeneous();
    let center = Point2::new(
        dot(&matrix_row(&inverse, 0), &crop_center),
        dot(&matrix_row(&inverse, 1), &crop_center),
    );

    let mut landmarks = raw.clone();
    landmarks.map_positions(|[x, y, z]| {
        let scaled = Point2::new(scale_x * (x - w * 0.5), scale_y * (y - h * 0.5));
        let p = rotate_point(scaled, &undo_rotation);
        [p.x + center.x, p.y + center.y, z]
    });
    landmarks
}
