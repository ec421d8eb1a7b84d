//! Frame and network input sizes.

use std::fmt;

use image::RgbImage;

/// Size of a frame or of a network input, in pixels.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Creates a `size x size` resolution, the input shape of most landmark networks.
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Returns the size of `image`.
    pub fn of(image: &RgbImage) -> Self {
        Self::new(image.width(), image.height())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reduces `width:height` to an [`AspectRatio`], or returns `None` if `self` is empty.
    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        AspectRatio::new(self.width, self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resolution({self})")
    }
}

/// A width-to-height ratio in lowest terms.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct AspectRatio {
    // Both nonzero, coprime.
    width: u32,
    height: u32,
}

impl AspectRatio {
    /// 1:1, expected of landmark network inputs.
    pub const SQUARE: Self = Self {
        width: 1,
        height: 1,
    };

    /// Returns `None` if `width` or `height` is 0.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        let divisor = gcd(width, height);
        Some(Self {
            width: width / divisor,
            height: height / divisor,
        })
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl fmt::Debug for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AspectRatio({self})")
    }
}

/// Euclid's algorithm.
const fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
