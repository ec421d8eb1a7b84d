//! Hand landmarks and the landmark prediction network interface.

use std::ops::Index;

use itertools::Itertools;
use nalgebra::Point2;

use crate::resolution::Resolution;

type Position = [f32; 3];

/// Number of landmarks estimated per hand.
pub const NUM_LANDMARKS: usize = 21;

/// A fixed-length list of landmark positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmarks {
    positions: Box<[Position]>,
}

impl Landmarks {
    /// Creates a new [`Landmarks`] collection containing `len` preallocated landmarks.
    ///
    /// All landmarks will start with all coordinates at `0.0`.
    pub fn new(len: usize) -> Self {
        Self {
            positions: vec![[0.0, 0.0, 0.0]; len].into_boxed_slice(),
        }
    }

    /// Collects landmarks from a flat list of `x, y, z` triples.
    ///
    /// Returns [`None`] if the length of `flat` is not a multiple of 3.
    pub fn from_flat(flat: &[f32]) -> Option<Self> {
        if flat.len() % 3 != 0 {
            return None;
        }

        Some(Self {
            positions: flat
                .iter()
                .copied()
                .tuples::<(_, _, _)>()
                .map(|(x, y, z)| [x, y, z])
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Landmark> + Clone + '_ {
        self.positions.iter().map(|&pos| Landmark::new(pos))
    }

    pub fn get(&self, index: usize) -> Landmark {
        Landmark::new(self.positions[index])
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Position] {
        &mut self.positions
    }

    pub fn map_positions(&mut self, mut f: impl FnMut(Position) -> Position) {
        for pos in self.positions_mut() {
            *pos = f(*pos);
        }
    }
}

impl Index<LandmarkIdx> for Landmarks {
    type Output = Position;

    fn index(&self, index: LandmarkIdx) -> &Position {
        &self.positions[index as usize]
    }
}

/// A landmark in 3D space.
///
/// X and Y are image coordinates, Z is the depth estimated by the network.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct Landmark {
    pos: Position,
}

impl Landmark {
    pub fn new(position: Position) -> Self {
        Self { pos: position }
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.pos
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos[0]
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos[1]
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.pos[2]
    }

    /// Returns the X and Y coordinates as a 2D point, dropping the depth.
    #[inline]
    pub fn xy(&self) -> Point2<f32> {
        Point2::new(self.pos[0], self.pos[1])
    }
}

/// Names for the hand pose landmarks.
///
/// # Terminology
///
/// - **CMC**: [Carpometacarpal joint], the lowest joint of the thumb, located near the wrist.
/// - **MCP**: [Metacarpophalangeal joint], the lower joint forming the knuckles near the palm of
///   the hand.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
///
/// [Carpometacarpal joint]: https://en.wikipedia.org/wiki/Carpometacarpal_joint
/// [Metacarpophalangeal joint]: https://en.wikipedia.org/wiki/Metacarpophalangeal_joint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// The landmarks that surround the palm, in the order used for [`Roi::palm_landmarks`].
///
/// Index [`PALM_BASE`] is the wrist, index [`PALM_MIDDLE_FINGER_BASE`] the base of the middle
/// finger. The line between them determines the hand's rotation.
///
/// [`Roi::palm_landmarks`]: crate::detection::Roi::palm_landmarks
pub const PALM_LANDMARKS: &[LandmarkIdx] = {
    use LandmarkIdx::*;
    &[
        Wrist,
        IndexFingerMcp,
        MiddleFingerMcp,
        RingFingerMcp,
        PinkyMcp,
        ThumbCmc,
        ThumbMcp,
    ]
};

/// Index of the wrist in [`PALM_LANDMARKS`].
pub const PALM_BASE: usize = 0;

/// Index of the middle finger's MCP in [`PALM_LANDMARKS`].
pub const PALM_MIDDLE_FINGER_BASE: usize = 2;

/// A part of the hand, made up of a chain of landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
    PalmBase,
}

impl Finger {
    pub const ALL: [Finger; 6] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
        Finger::PalmBase,
    ];

    /// Returns the landmarks that make up this finger, from the palm outwards.
    pub fn landmarks(self) -> &'static [LandmarkIdx] {
        use LandmarkIdx::*;
        match self {
            Finger::Thumb => &[ThumbCmc, ThumbMcp, ThumbIp, ThumbTip],
            Finger::Index => &[IndexFingerMcp, IndexFingerPip, IndexFingerDip, IndexFingerTip],
            Finger::Middle => &[
                MiddleFingerMcp,
                MiddleFingerPip,
                MiddleFingerDip,
                MiddleFingerTip,
            ],
            Finger::Ring => &[RingFingerMcp, RingFingerPip, RingFingerDip, RingFingerTip],
            Finger::Pinky => &[PinkyMcp, PinkyPip, PinkyDip, PinkyTip],
            Finger::PalmBase => &[Wrist],
        }
    }
}

/// Raw output of a [`Predictor`].
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Confidence that a hand is visible in the input, by convention between 0.0 and 1.0.
    pub confidence: f32,
    /// Flat list of `x, y, z` triples, in the coordinate system of the network's input.
    pub keypoints: Vec<f32>,
}

/// Trait implemented by hand landmark networks.
///
/// Implementations wrap an inference engine. Errors returned from [`Predictor::predict`] are
/// passed through to the caller of [`HandTracker::track`].
///
/// [`HandTracker::track`]: crate::tracking::HandTracker::track
pub trait Predictor {
    /// Returns the resolution of the images passed to [`Predictor::predict`].
    fn input_resolution(&self) -> Resolution;

    /// Estimates hand landmarks on `input`, a cropped image of a single upright hand.
    fn predict(&mut self, input: &image::RgbImage) -> anyhow::Result<Prediction>;
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn input_resolution(&self) -> Resolution {
        (**self).input_resolution()
    }

    fn predict(&mut self, input: &image::RgbImage) -> anyhow::Result<Prediction> {
        (**self).predict(input)
    }
}
