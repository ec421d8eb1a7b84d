//! Extraction of rotated image regions.
//!
//! The landmark network expects an upright hand, so the region around a tracked hand is cut out
//! of a rotated frame and resized to the network's input resolution. Instead of rotating the whole
//! frame, every output pixel is mapped back into the source frame and sampled there.

use image::{Rgb, RgbImage};
use nalgebra::Point2;

use crate::{
    rect::Rect,
    resolution::Resolution,
    rotation::{invert_transform, rotate_point, RotationMatrix},
};

/// Cuts `rect` out of `image` rotated by `rotation`, and resizes it to `resolution`.
///
/// `rect` is given in the coordinate system of the rotated image: a point `p` of `image` ends up
/// at `rotate_point(p, rotation)`. Pixels that fall outside of `image` are black.
pub fn crop_rotated(
    image: &RgbImage,
    rect: &Rect,
    rotation: &RotationMatrix,
    resolution: Resolution,
) -> RgbImage {
    let inverse = invert_transform(rotation);
    let (out_w, out_h) = (resolution.width(), resolution.height());
    let step_x = rect.width() / out_w as f32;
    let step_y = rect.height() / out_h as f32;

    RgbImage::from_fn(out_w, out_h, |u, v| {
        let rotated = Point2::new(
            rect.x() + (u as f32 + 0.5) * step_x,
            rect.y() + (v as f32 + 0.5) * step_y,
        );
        let src = rotate_point(rotated, &inverse);
        sample_bilinear(image, src.x - 0.5, src.y - 0.5)
    })
}

/// Samples `image` at pixel coordinates `(x, y)`, where integer coordinates are pixel centers.
fn sample_bilinear(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut acc = [0.0f32; 3];
    for (dx, dy, weight) in [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ] {
        if weight == 0.0 {
            continue;
        }
        if let Some(px) = pixel(image, x0 + dx, y0 + dy) {
            for (acc, channel) in acc.iter_mut().zip(px.0) {
                *acc += f32::from(channel) * weight;
            }
        }
    }

    Rgb(acc.map(|c| c.round().clamp(0.0, 255.0) as u8))
}

fn pixel(image: &RgbImage, x: i64, y: i64) -> Option<Rgb<u8>> {
    let x = u32::try_from(x).ok()?;
    let y = u32::try_from(y).ok()?;
    if x < image.width() && y < image.height() {
        Some(*image.get_pixel(x, y))
    } else {
        None
    }
}
