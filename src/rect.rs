//! Axis-aligned rectangles.
//!
//! [`Rect`] is used for regions of interest, crop boxes, and the bounding boxes reported for each
//! tracked hand.

use std::fmt;

use nalgebra::{Point2, Vector2};

/// An axis-aligned rectangle spanning from a start (top left) to an end (bottom right) point.
///
/// Rectangles are allowed to have zero height and/or width. Negative dimensions are not allowed:
/// the start point is always less than or equal to the end point, componentwise.
#[derive(Clone, Copy, PartialEq)]
pub struct Rect {
    start: Point2<f32>,
    end: Point2<f32>,
}

impl Rect {
    /// Creates a rectangle from its top left and bottom right corners.
    ///
    /// # Panics
    ///
    /// This method will panic if `start` lies to the right of or below `end`.
    pub fn from_corners(start: impl Into<Point2<f32>>, end: impl Into<Point2<f32>>) -> Self {
        let (start, end) = (start.into(), end.into());
        Self::span_inner(start.x, start.y, end.x, end.y)
    }

    /// Creates a rectangle extending downwards and right from a point.
    #[inline]
    pub fn from_top_left(top_left_x: f32, top_left_y: f32, width: f32, height: f32) -> Self {
        Self::span_inner(
            top_left_x,
            top_left_y,
            top_left_x + width,
            top_left_y + height,
        )
    }

    /// Creates a rectangle extending outwards from a center point.
    #[inline]
    pub fn from_center(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        Self::from_top_left(
            x_center - width * 0.5,
            y_center - height * 0.5,
            width,
            height,
        )
    }

    /// Computes the (axis-aligned) bounding rectangle that encompasses `points`.
    ///
    /// Returns [`None`] if `points` is an empty iterator.
    pub fn bounding<I: IntoIterator<Item = T>, T: Into<Point2<f32>>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();

        let first: Point2<f32> = iter.next()?.into();
        let (mut min, mut max) = (first, first);

        for pt in iter {
            let pt = pt.into();
            min = min.inf(&pt);
            max = max.sup(&pt);
        }

        Some(Self::span_inner(min.x, min.y, max.x, max.y))
    }

    fn span_inner(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        assert!(x_min <= x_max, "x_min={}, x_max={}", x_min, x_max);
        assert!(y_min <= y_max, "y_min={}, y_max={}", y_min, y_max);
        Self {
            start: Point2::new(x_min, y_min),
            end: Point2::new(x_max, y_max),
        }
    }

    /// Returns the top left corner.
    #[inline]
    pub fn start(&self) -> Point2<f32> {
        self.start
    }

    /// Returns the bottom right corner.
    #[inline]
    pub fn end(&self) -> Point2<f32> {
        self.end
    }

    /// Returns the X coordinate of the left side of the rectangle.
    #[inline]
    pub fn x(&self) -> f32 {
        self.start.x
    }

    /// Returns the Y coordinate of the top side of the rectangle.
    #[inline]
    pub fn y(&self) -> f32 {
        self.start.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.end.x - self.start.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.end.y - self.start.y
    }

    #[inline]
    pub fn size(&self) -> Vector2<f32> {
        self.end - self.start
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        nalgebra::center(&self.start, &self.end)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Scales the width and height of this [`Rect`] by `factor`.
    ///
    /// The center position of the [`Rect`] remains the same.
    #[must_use]
    pub fn enlarge(&self, factor: f32) -> Self {
        let center = self.center();
        let size = self.size() * factor;
        Self::from_center(center.x, center.y, size.x, size.y)
    }

    /// Moves this rectangle by `shift`, given relative to its width and height.
    ///
    /// A shift of `(0.0, -0.5)` moves the rectangle up by half its height.
    #[must_use]
    pub fn shift(&self, shift: Vector2<f32>) -> Self {
        let offset = self.size().component_mul(&shift);
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// Grows the shorter side of this rectangle so that it becomes a square.
    ///
    /// The center position of the [`Rect`] remains the same.
    #[must_use]
    pub fn squarify(&self) -> Self {
        let center = self.center();
        let side = self.width().max(self.height());
        Self::from_center(center.x, center.y, side, side)
    }

    /// Computes the intersection of `self` and `other`.
    ///
    /// Returns [`None`] when the intersection is empty (ie. the rectangles do not overlap).
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let min = self.start.sup(&other.start);
        let max = self.end.inf(&other.end);
        if min.x > max.x || min.y > max.y {
            return None;
        }

        Some(Self::span_inner(min.x, min.y, max.x, max.y))
    }

    fn intersection_area(&self, other: &Self) -> f32 {
        self.intersection(other).map_or(0.0, |rect| rect.area())
    }

    fn union_area(&self, other: &Self) -> f32 {
        self.area() + other.area() - self.intersection_area(other)
    }

    /// Computes the Intersection over Union (IOU) of `self` and `other`.
    ///
    /// Returns `0.0` if either rectangle has an area of zero.
    pub fn iou(&self, other: &Self) -> f32 {
        if self.area() <= 0.0 || other.area() <= 0.0 {
            return 0.0;
        }

        self.intersection_area(other) / self.union_area(other)
    }

    pub fn contains_point(&self, point: impl Into<Point2<f32>>) -> bool {
        let p = point.into();
        self.start.x <= p.x && self.start.y <= p.y && p.x <= self.end.x && p.y <= self.end.y
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect @ ({},{})-({},{})/{}x{}",
            self.start.x,
            self.start.y,
            self.end.x,
            self.end.y,
            self.width(),
            self.height(),
        )
    }
}
