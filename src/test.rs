//! Scripted networks for testing the tracker without an inference engine.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::bail;
use image::RgbImage;

use crate::{
    config::TrackerConfig,
    detection::{Detector, Roi},
    landmark::{Prediction, Predictor},
    resolution::Resolution,
};

/// Input size of [`FakePredictor`].
pub const INPUT_SIZE: u32 = 256;

/// An upright right hand in a 256x256 network input, centered horizontally.
///
/// The bounding box is `(58, 62)-(198, 222)`. Wrist and middle finger MCP share an X coordinate.
#[rustfmt::skip]
const UPRIGHT_HAND: [[f32; 3]; 21] = [
    [128.0, 222.0, 0.0],
    [100.0, 205.0, -2.0], [80.0, 185.0, -4.0], [66.0, 165.0, -5.0], [58.0, 148.0, -6.0],
    [104.0, 140.0, -1.0], [100.0, 112.0, -2.0], [98.0, 94.0, -3.0], [96.0, 78.0, -4.0],
    [128.0, 136.0, 0.0], [128.0, 104.0, -1.0], [128.0, 84.0, -2.0], [128.0, 62.0, -3.0],
    [150.0, 140.0, 0.0], [154.0, 112.0, -1.0], [156.0, 94.0, -2.0], [158.0, 80.0, -3.0],
    [170.0, 150.0, 1.0], [180.0, 130.0, 0.0], [190.0, 114.0, -1.0], [198.0, 100.0, -2.0],
];

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap()
}

/// A palm detector returning a fixed list of regions.
///
/// Clones share their state, so a test can keep one to inspect and script the detector that is
/// moved into the tracker.
#[derive(Clone)]
pub struct FakeDetector {
    state: Arc<Mutex<DetectorState>>,
}

struct DetectorState {
    rois: Vec<Roi>,
    failing: bool,
    calls: usize,
}

impl FakeDetector {
    pub fn new(rois: Vec<Roi>) -> Self {
        Self {
            state: Arc::new(Mutex::new(DetectorState {
                rois,
                failing: false,
                calls: 0,
            })),
        }
    }

    pub fn calls(&self) -> usize {
        lock(&self.state).calls
    }

    pub fn set_rois(&self, rois: Vec<Roi>) {
        lock(&self.state).rois = rois;
    }

    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }
}

impl Detector for FakeDetector {
    fn detect(&mut self, _image: &RgbImage, _config: &TrackerConfig) -> anyhow::Result<Vec<Roi>> {
        let mut state = lock(&self.state);
        state.calls += 1;
        if state.failing {
            bail!("detector offline");
        }
        Ok(state.rois.clone())
    }
}

/// A landmark network that reports the same hand for every input.
#[derive(Clone)]
pub struct FakePredictor {
    state: Arc<Mutex<PredictorState>>,
}

struct PredictorState {
    confidence: f32,
    keypoints: Vec<f32>,
    failing: bool,
    calls: usize,
    last_input_resolution: Option<Resolution>,
}

impl FakePredictor {
    /// Reports [`UPRIGHT_HAND`] with the given confidence.
    pub fn upright(confidence: f32) -> Self {
        Self::upright_scaled(confidence, 1.0)
    }

    /// Reports [`UPRIGHT_HAND`], scaled around the input center by `scale`.
    pub fn upright_scaled(confidence: f32, scale: f32) -> Self {
        let center = INPUT_SIZE as f32 * 0.5;
        let keypoints = UPRIGHT_HAND
            .iter()
            .flat_map(|[x, y, z]| {
                [
                    center + (x - center) * scale,
                    center + (y - center) * scale,
                    *z,
                ]
            })
            .collect();

        Self {
            state: Arc::new(Mutex::new(PredictorState {
                confidence,
                keypoints,
                failing: false,
                calls: 0,
                last_input_resolution: None,
            })),
        }
    }

    pub fn calls(&self) -> usize {
        lock(&self.state).calls
    }

    pub fn last_input_resolution(&self) -> Option<Resolution> {
        lock(&self.state).last_input_resolution
    }

    pub fn keypoints(&self) -> Vec<f32> {
        lock(&self.state).keypoints.clone()
    }

    pub fn set_confidence(&self, confidence: f32) {
        lock(&self.state).confidence = confidence;
    }

    pub fn set_keypoints(&self, keypoints: Vec<f32>) {
        lock(&self.state).keypoints = keypoints;
    }

    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }
}

impl Predictor for FakePredictor {
    fn input_resolution(&self) -> Resolution {
        Resolution::square(INPUT_SIZE)
    }

    fn predict(&mut self, input: &RgbImage) -> anyhow::Result<Prediction> {
        let mut state = lock(&self.state);
        state.calls += 1;
        state.last_input_resolution = Some(Resolution::of(input));
        if state.failing {
            bail!("inference failed");
        }
        Ok(Prediction {
            confidence: state.confidence,
            keypoints: state.keypoints.clone(),
        })
    }
}
