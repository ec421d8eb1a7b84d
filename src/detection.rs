//! Palm detection interface and the regions of interest it produces.

use image::RgbImage;
use nalgebra::Point2;

use crate::{
    config::TrackerConfig,
    landmark::{PALM_BASE, PALM_MIDDLE_FINGER_BASE},
    rect::Rect,
    rotation::compute_rotation,
};

/// A region of interest believed to contain a hand.
///
/// A [`Roi`] consists of a [`Rect`] enclosing the hand (or just the palm, when produced by a
/// palm detector), and a possibly empty list of palm landmarks. When present, the palm landmarks
/// are ordered like [`PALM_LANDMARKS`] and determine the hand's rotation.
///
/// [`PALM_LANDMARKS`]: crate::landmark::PALM_LANDMARKS
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    rect: Rect,
    palm_landmarks: Vec<Point2<f32>>,
}

impl Roi {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            palm_landmarks: Vec::new(),
        }
    }

    pub fn with_palm_landmarks<I, T>(rect: Rect, palm_landmarks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Point2<f32>>,
    {
        Self {
            rect,
            palm_landmarks: palm_landmarks.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    #[inline]
    pub fn palm_landmarks(&self) -> &[Point2<f32>] {
        &self.palm_landmarks
    }

    /// Returns the clockwise rotation (in image coordinates) of the hand in this region.
    ///
    /// A rotation of 0 means that the fingers point upwards. If the palm landmarks required to
    /// compute the rotation are missing or not finite, this returns 0.
    pub fn rotation_radians(&self) -> f32 {
        let radians = match (
            self.palm_landmarks.get(PALM_BASE),
            self.palm_landmarks.get(PALM_MIDDLE_FINGER_BASE),
        ) {
            (Some(base), Some(middle)) => compute_rotation(*base, *middle),
            _ => 0.0,
        };
        if radians.is_finite() {
            radians
        } else {
            0.0
        }
    }
}

/// Trait implemented by palm detection networks.
///
/// Implementations wrap an inference engine and return one [`Roi`] per detected hand, in the
/// coordinate system of `image`. Returning an empty list is not an error: it means no hand is in
/// view. Errors are passed through to the caller of [`HandTracker::track`].
///
/// [`HandTracker::track`]: crate::tracking::HandTracker::track
pub trait Detector {
    fn detect(&mut self, image: &RgbImage, config: &TrackerConfig) -> anyhow::Result<Vec<Roi>>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self, image: &RgbImage, config: &TrackerConfig) -> anyhow::Result<Vec<Roi>> {
        (**self).detect(image, config)
    }
}
