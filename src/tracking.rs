//! Hand tracking across video frames.
//!
//! [`HandTracker`] combines a palm [`Detector`] and a landmark [`Predictor`]: the expensive palm
//! detector only runs every few frames, and in between, the region of interest of each hand is
//! derived from the landmarks estimated in the previous frame.

use anyhow::{ensure, Context};
use image::RgbImage;
use nalgebra::{Point2, Vector2};

use crate::{
    config::TrackerConfig,
    crop::crop_rotated,
    detection::{Detector, Roi},
    landmark::{
        Finger, Landmark, LandmarkIdx, Landmarks, Predictor, NUM_LANDMARKS, PALM_LANDMARKS,
    },
    rect::Rect,
    resolution::AspectRatio,
    rotation::{compute_rotation, rotate_point, rotation_matrix, RotationMatrix},
    timer::{FpsCounter, Timer},
    transform::project_landmarks,
};

/// Palm box shift, relative to its size. Moves the box towards the fingers.
const PALM_BOX_SHIFT: Vector2<f32> = Vector2::new(0.0, -0.4);
/// Palm box -> hand box grow factor.
const PALM_BOX_ENLARGE: f32 = 3.0;

const HAND_BOX_SHIFT: Vector2<f32> = Vector2::new(0.0, -0.1);
const HAND_BOX_ENLARGE: f32 = 1.65;

/// Tracks hands across subsequent frames of a video.
///
/// Every tracked hand occupies a *slot*. Slots are created from the palm detector's output, and
/// keep their index until the next detection pass replaces them.
///
/// Detection works as follows:
/// - if no hands are tracked, or some hands were lost in the last frame, [`HandTracker::track`]
///   will run the palm detector
/// - otherwise, the palm detector runs after [`TrackerConfig::skip_frames`] frames have reused the
///   tracked regions
///
/// If the palm detector finds no hands, all slots are dropped.
pub struct HandTracker {
    detector: Box<dyn Detector + Send>,
    predictor: Box<dyn Predictor + Send>,
    config: TrackerConfig,
    slots: Vec<Slot>,
    runs_without_fresh_detection: u32,
    detected_count: usize,
    t_detect: Timer,
    t_crop: Timer,
    t_predict: Timer,
    t_project: Timer,
    fps: FpsCounter,
}

struct Slot {
    roi: Roi,
    /// Whether `roi` comes straight from the palm detector.
    fresh: bool,
}

impl HandTracker {
    /// If the region computed from a hand's landmarks overlaps with the hand's current region by
    /// more than this, the current region is kept to avoid jitter.
    pub const STABLE_IOU_THRESH: f32 = 0.8;

    /// Creates a hand tracker using the default [`TrackerConfig`].
    ///
    /// # Panics
    ///
    /// This method panics if the predictor's input resolution is empty.
    pub fn new<D, P>(detector: D, predictor: P) -> Self
    where
        D: Detector + Send + 'static,
        P: Predictor + Send + 'static,
    {
        Self::with_config(detector, predictor, TrackerConfig::default())
    }

    /// Creates a hand tracker with the given configuration.
    ///
    /// # Panics
    ///
    /// This method panics if the predictor's input resolution is empty.
    pub fn with_config<D, P>(detector: D, predictor: P, config: TrackerConfig) -> Self
    where
        D: Detector + Send + 'static,
        P: Predictor + Send + 'static,
    {
        let input_res = predictor.input_resolution();
        match input_res.aspect_ratio() {
            Some(AspectRatio::SQUARE) => {}
            Some(ratio) => log::warn!(
                "landmark network input {input_res} is not square ({ratio}), hands will be \
                 distorted"
            ),
            None => panic!("landmark network has empty input resolution {input_res}"),
        }

        Self {
            detector: Box::new(detector),
            predictor: Box::new(predictor),
            config,
            slots: Vec::new(),
            runs_without_fresh_detection: 0,
            detected_count: 0,
            t_detect: Timer::new("detect"),
            t_crop: Timer::new("crop"),
            t_predict: Timer::new("predict"),
            t_project: Timer::new("project"),
            fps: FpsCounter::new("hand tracker"),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Replaces the tracker configuration.
    ///
    /// Tracked hands are kept. If the new configuration allows fewer hands than are currently
    /// tracked, the next frame will run the palm detector.
    pub fn set_config(&mut self, config: TrackerConfig) {
        self.config = config;
    }

    /// Returns the regions of interest of all tracked hands, in slot order.
    pub fn regions(&self) -> impl Iterator<Item = &Roi> + '_ {
        self.slots.iter().map(|slot| &slot.roi)
    }

    /// Returns the number of hands reported by the last call to [`HandTracker::track`].
    pub fn detected_count(&self) -> usize {
        self.detected_count
    }

    /// Returns the number of frames processed since the palm detector last ran.
    pub fn runs_without_fresh_detection(&self) -> u32 {
        self.runs_without_fresh_detection
    }

    /// Returns profiling timers for this tracker.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_detect, &self.t_crop, &self.t_predict, &self.t_project].into_iter()
    }

    /// Stops tracking all hands.
    ///
    /// The next call to [`HandTracker::track`] will run the palm detector.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.runs_without_fresh_detection = 0;
        self.detected_count = 0;
    }

    fn needs_detection(&self) -> bool {
        self.slots.is_empty()
            || self.slots.len() != self.detected_count
            || self.slots.len() > self.config.max_hands()
            || self.runs_without_fresh_detection >= self.config.skip_frames()
    }

    /// Processes the next frame of a video, returning all hands that were found in it.
    ///
    /// The returned hands are ordered by slot. Hands whose landmark confidence is below
    /// [`TrackerConfig::min_confidence`] are not returned, but remain tracked.
    ///
    /// `track` always has to be called on frames of the same video, otherwise tracked regions
    /// won't match between frames. Use [`HandTracker::reset`] when switching to a different video.
    ///
    /// # Errors
    ///
    /// Errors returned by the [`Detector`] or [`Predictor`] are passed through. An error is also
    /// returned if the [`Predictor`] does not output exactly 21 finite landmarks.
    ///
    /// When an error is returned, slots processed before the failing one keep their updated
    /// regions, and the next call runs the palm detector.
    pub fn track(&mut self, image: &RgbImage) -> anyhow::Result<Vec<Hand>> {
        if self.needs_detection() {
            let mut rois = self
                .t_detect
                .time(|| self.detector.detect(image, &self.config))
                .context("palm detection failed")?;
            self.runs_without_fresh_detection = 0;

            if rois.len() > self.config.max_hands() {
                log::trace!(
                    "ignoring {} of {} detections",
                    rois.len() - self.config.max_hands(),
                    rois.len()
                );
                rois.truncate(self.config.max_hands());
            }

            if rois.is_empty() {
                log::trace!("no hands detected, dropping {} slots", self.slots.len());
                self.slots.clear();
                self.detected_count = 0;
                return Ok(Vec::new());
            }

            // When tracking multiple hands that were all found in the previous frame, the tracked
            // regions are more accurate than the detections, so keep them.
            let keep = self.config.max_hands() > 1
                && rois.len() == self.slots.len()
                && self.detected_count == self.slots.len();
            if keep {
                log::trace!("keeping {} tracked regions", self.slots.len());
            } else {
                log::trace!(
                    "replacing {} tracked regions with {} detections",
                    self.slots.len(),
                    rois.len()
                );
                self.slots = rois
                    .into_iter()
                    .map(|roi| Slot { roi, fresh: true })
                    .collect();
            }
        } else {
            self.runs_without_fresh_detection += 1;
        }

        let hands = match self.track_slots(image) {
            Ok(hands) => hands,
            Err(e) => {
                // Slots before the failing one may already be updated. Forget how many hands were
                // found, so that the next frame runs the palm detector.
                self.detected_count = 0;
                return Err(e);
            }
        };

        self.detected_count = hands.len();
        self.fps
            .tick_with([&self.t_detect, &self.t_crop, &self.t_predict, &self.t_project]);
        Ok(hands)
    }

    fn track_slots(&mut self, image: &RgbImage) -> anyhow::Result<Vec<Hand>> {
        let input_res = self.predictor.input_resolution();
        let mut hands = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let angle = slot.roi.rotation_radians();
            let rotation = rotation_matrix(-angle, slot.roi.rect().center());
            let palm = if slot.fresh {
                palm_box(slot.roi.palm_landmarks(), &rotation)
            } else {
                None
            };
            let crop = palm.unwrap_or(*slot.roi.rect());

            let prediction = {
                let input = self
                    .t_crop
                    .time(|| crop_rotated(image, &crop, &rotation, input_res));
                self.t_predict
                    .time(|| self.predictor.predict(&input))
                    .with_context(|| format!("landmark prediction failed for slot {index}"))?
            };

            // NaN confidences are treated like low ones.
            if !(prediction.confidence >= self.config.min_confidence()) {
                log::trace!(
                    "slot {index}: confidence {} below {}, skipping",
                    prediction.confidence,
                    self.config.min_confidence(),
                );
                continue;
            }

            let raw = Landmarks::from_flat(&prediction.keypoints).with_context(|| {
                format!(
                    "landmark network returned {} coordinates, which is not a multiple of 3",
                    prediction.keypoints.len()
                )
            })?;
            ensure!(
                raw.len() == NUM_LANDMARKS,
                "landmark network returned {} landmarks, expected {}",
                raw.len(),
                NUM_LANDMARKS
            );

            let landmarks = self
                .t_project
                .time(|| project_landmarks(&raw, &crop, angle, &rotation, input_res));
            ensure!(
                landmarks.positions().iter().flatten().all(|c| c.is_finite()),
                "landmark network returned non-finite coordinates for slot {index}"
            );
            let next = hand_roi(&landmarks).with_context(|| {
                format!("landmarks of slot {index} are too far out to track")
            })?;
            let bounding_rect = *next.rect();

            let iou = bounding_rect.iou(slot.roi.rect());
            if iou > HandTracker::STABLE_IOU_THRESH {
                log::trace!("slot {index}: IoU {iou}, keeping region");
            } else {
                log::trace!("slot {index}: IoU {iou}, moving region to {bounding_rect:?}");
                slot.roi = next;
            }
            slot.fresh = false;

            hands.push(Hand {
                landmarks,
                confidence: prediction.confidence,
                bounding_rect,
            });
        }

        Ok(hands)
    }
}

/// Returns whether a square box `factor` times the larger side of `bounds` has finite corners and
/// a finite area.
fn can_grow(bounds: &Rect, factor: f32) -> bool {
    let side = bounds.width().max(bounds.height()) * factor;
    let center = bounds.center();
    (side * side).is_finite()
        && (center.x.abs() + side).is_finite()
        && (center.y.abs() + side).is_finite()
}

/// Computes the region to crop for a freshly detected palm.
///
/// The palm landmarks are rotated upright, and their bounding box is grown to cover the fingers.
/// Returns `None` if there are no palm landmarks, or if they are too far apart to grow a box
/// around them.
fn palm_box(palm_landmarks: &[Point2<f32>], rotation: &RotationMatrix) -> Option<Rect> {
    if !palm_landmarks.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
        log::warn!("ignoring non-finite palm landmarks {palm_landmarks:?}");
        return None;
    }
    let rotated = palm_landmarks.iter().map(|p| rotate_point(*p, rotation));
    let bounds = Rect::bounding(rotated)?;
    if !can_grow(&bounds, PALM_BOX_ENLARGE * 2.0) {
        log::warn!("palm landmarks out of range: {bounds:?}");
        return None;
    }
    let rect = bounds
        .shift(PALM_BOX_SHIFT)
        .squarify()
        .enlarge(PALM_BOX_ENLARGE);
    Some(rect)
}

/// Computes the region of interest for the next frame from a hand's landmarks.
///
/// Returns `None` if the landmarks are empty or the box around them would overflow.
fn hand_roi(landmarks: &Landmarks) -> Option<Roi> {
    let bounds = Rect::bounding(landmarks.iter().map(|lm| lm.xy()))?;
    if !can_grow(&bounds, HAND_BOX_ENLARGE * 2.0) {
        return None;
    }
    let rect = bounds
        .shift(HAND_BOX_SHIFT)
        .squarify()
        .enlarge(HAND_BOX_ENLARGE);

    Some(Roi::with_palm_landmarks(
        rect,
        PALM_LANDMARKS.iter().map(|&idx| landmarks.get(idx as usize).xy()),
    ))
}

/// A hand found by [`HandTracker::track`].
#[derive(Debug, Clone)]
pub struct Hand {
    landmarks: Landmarks,
    confidence: f32,
    bounding_rect: Rect,
}

impl Hand {
    /// Returns the hand's landmarks in the coordinate system of the tracked frame.
    ///
    /// Landmarks can be indexed with [`LandmarkIdx`].
    pub fn landmarks(&self) -> &Landmarks {
        &self.landmarks
    }

    pub fn landmark(&self, index: LandmarkIdx) -> Landmark {
        self.landmarks.get(index as usize)
    }

    /// Returns the landmarks making up `finger`, from the palm outwards.
    pub fn finger(&self, finger: Finger) -> impl Iterator<Item = Landmark> + '_ {
        finger.landmarks().iter().map(|&idx| self.landmark(idx))
    }

    /// Returns the confidence reported by the landmark network.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Returns the bounding box around the hand that was derived from its landmarks.
    ///
    /// This is a padded, square box: it contains all landmarks.
    pub fn bounding_rect(&self) -> Rect {
        self.bounding_rect
    }

    pub fn top_left(&self) -> Point2<f32> {
        self.bounding_rect.start()
    }

    pub fn bottom_right(&self) -> Point2<f32> {
        self.bounding_rect.end()
    }

    /// Computes the center position of the hand's palm by averaging the palm landmarks.
    pub fn palm_center(&self) -> Point2<f32> {
        let sum = PALM_LANDMARKS
            .iter()
            .map(|&idx| self.landmark(idx).xy().coords)
            .sum::<Vector2<f32>>();
        Point2::from(sum / PALM_LANDMARKS.len() as f32)
    }

    /// Computes the clockwise rotation of the hand compared to an upright position.
    ///
    /// A rotation of 0° means that fingers are pointed upwards.
    pub fn rotation_radians(&self) -> f32 {
        compute_rotation(
            self.landmark(LandmarkIdx::Wrist).xy(),
            self.landmark(LandmarkIdx::MiddleFingerMcp).xy(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use approx::assert_abs_diff_eq;

    use crate::{
        resolution::Resolution,
        test::{FakeDetector, FakePredictor, INPUT_SIZE},
    };

    use super::*;

    fn frame() -> RgbImage {
        RgbImage::new(640, 480)
    }

    fn config(skip_frames: u32, max_hands: usize, min_confidence: f32) -> TrackerConfig {
        let mut config = TrackerConfig::default();
        config.set_skip_frames(skip_frames);
        config.set_max_hands(max_hands);
        config.set_min_confidence(min_confidence);
        config
    }

    fn small_box() -> Roi {
        Roi::new(Rect::from_corners([10.0, 10.0], [50.0, 50.0]))
    }

    fn new_tracker(
        detector: &FakeDetector,
        predictor: &FakePredictor,
        config: TrackerConfig,
    ) -> HandTracker {
        HandTracker::with_config(detector.clone(), predictor.clone(), config)
    }

    #[test]
    fn test_end_to_end() {
        crate::init_logger!();

        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(5, 1, 0.5));

        let hands = tracker.track(&frame()).unwrap();
        assert_eq!(detector.calls(), 1);
        assert_eq!(predictor.calls(), 1);
        assert_eq!(
            predictor.last_input_resolution(),
            Some(Resolution::square(INPUT_SIZE))
        );
        assert_eq!(hands.len(), 1);

        let hand = &hands[0];
        assert_eq!(hand.confidence(), 0.9);
        assert_eq!(hand.landmarks().len(), NUM_LANDMARKS);
        let (tl, br) = (hand.top_left(), hand.bottom_right());
        for lm in hand.landmarks().iter() {
            assert!(tl.x < lm.x() && lm.x() < br.x, "{lm:?} outside {tl}-{br}");
            assert!(tl.y < lm.y() && lm.y() < br.y, "{lm:?} outside {tl}-{br}");
        }

        // The synthetic hand is centered in the network input, so it ends up in the detection.
        let detection = small_box();
        for lm in hand.landmarks().iter() {
            assert!(detection.rect().contains_point(lm.xy()));
        }

        assert_abs_diff_eq!(hand.rotation_radians(), 0.0, epsilon = 1e-5);
        assert_eq!(hand.finger(Finger::Thumb).count(), 4);
        assert!(detection.rect().contains_point(hand.palm_center()));
        assert_eq!(tracker.detected_count(), 1);
    }

    #[test]
    fn test_depth_passthrough() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(5, 1, 0.5));

        let hands = tracker.track(&frame()).unwrap();
        let raw = Landmarks::from_flat(&predictor.keypoints()).unwrap();
        for (projected, raw) in hands[0].landmarks().iter().zip(raw.iter()) {
            assert_eq!(projected.z(), raw.z());
        }
    }

    #[test]
    fn test_skip_frames() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(5, 1, 0.5));

        let mut detected_on = Vec::new();
        for frame_no in 1..=7 {
            let before = detector.calls();
            let hands = tracker.track(&frame()).unwrap();
            assert_eq!(hands.len(), 1);
            if detector.calls() > before {
                detected_on.push(frame_no);
            }
        }
        assert_eq!(detected_on, [1, 7]);
        assert_eq!(predictor.calls(), 7);
        assert_eq!(tracker.runs_without_fresh_detection(), 0);
    }

    #[test]
    fn test_skip_zero_detects_every_frame() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(0, 1, 0.5));

        for _ in 0..3 {
            tracker.track(&frame()).unwrap();
        }
        assert_eq!(detector.calls(), 3);
    }

    #[test]
    fn test_redetect_when_nothing_found() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.3);
        let mut tracker = new_tracker(&detector, &predictor, config(100, 1, 0.5));

        // Low confidence: the slot persists, but nothing is reported.
        assert!(tracker.track(&frame()).unwrap().is_empty());
        assert_eq!(tracker.detected_count(), 0);
        assert_eq!(tracker.regions().count(), 1);
        assert_eq!(tracker.regions().next(), Some(&small_box()));

        // `detected_count == 0` always triggers detection.
        for calls in 2..5 {
            tracker.track(&frame()).unwrap();
            assert_eq!(detector.calls(), calls);
        }

        predictor.set_confidence(0.9);
        assert_eq!(tracker.track(&frame()).unwrap().len(), 1);
        assert_eq!(detector.calls(), 5);
        tracker.track(&frame()).unwrap();
        assert_eq!(detector.calls(), 5);
    }

    #[test]
    fn test_no_detections_clears_state() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(0, 1, 0.5));

        assert_eq!(tracker.track(&frame()).unwrap().len(), 1);

        detector.set_rois(Vec::new());
        assert!(tracker.track(&frame()).unwrap().is_empty());
        assert_eq!(tracker.regions().count(), 0);
        assert_eq!(tracker.detected_count(), 0);
        // The landmark network isn't invoked without regions.
        assert_eq!(predictor.calls(), 1);
    }

    #[test]
    fn test_max_hands() {
        let second = Roi::new(Rect::from_corners([300.0, 200.0], [360.0, 260.0]));
        let detector = FakeDetector::new(vec![small_box(), second.clone()]);
        let predictor = FakePredictor::upright(0.9);

        let mut tracker = new_tracker(&detector, &predictor, config(5, 1, 0.5));
        assert_eq!(tracker.track(&frame()).unwrap().len(), 1);
        assert_eq!(tracker.regions().count(), 1);
        assert_eq!(predictor.calls(), 1);

        let mut tracker = new_tracker(&detector, &predictor, config(5, 2, 0.5));
        let hands = tracker.track(&frame()).unwrap();
        assert_eq!(hands.len(), 2);
        assert_eq!(tracker.regions().count(), 2);
        // Slot order follows detection order.
        assert!(small_box().rect().contains_point(hands[0].palm_center()));
        assert!(second.rect().contains_point(hands[1].palm_center()));
    }

    #[test]
    fn test_stable_region() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(100, 1, 0.5));

        tracker.track(&frame()).unwrap();
        let stored = tracker.regions().cloned().collect::<Vec<_>>();
        for _ in 0..5 {
            let hands = tracker.track(&frame()).unwrap();
            let iou = hands[0].bounding_rect().iou(stored[0].rect());
            assert!(iou > HandTracker::STABLE_IOU_THRESH, "{iou}");

            let now = tracker.regions().cloned().collect::<Vec<_>>();
            assert_eq!(now, stored);
            let (a, b) = (now[0].rect(), stored[0].rect());
            assert_eq!(a.start().x.to_bits(), b.start().x.to_bits());
            assert_eq!(a.end().y.to_bits(), b.end().y.to_bits());
        }
        assert_eq!(detector.calls(), 1);
    }

    #[test]
    fn test_region_follows_hand() {
        // The hand only covers a small part of the detected box, so the region shrinks to it.
        let big = Roi::new(Rect::from_corners([100.0, 100.0], [300.0, 300.0]));
        let detector = FakeDetector::new(vec![big.clone()]);
        let predictor = FakePredictor::upright_scaled(0.9, 0.3);
        let mut tracker = new_tracker(&detector, &predictor, config(100, 1, 0.5));

        let hands = tracker.track(&frame()).unwrap();
        let region = tracker.regions().next().unwrap().clone();
        assert_ne!(region, big);
        assert_eq!(*region.rect(), hands[0].bounding_rect());
        assert_eq!(region.palm_landmarks().len(), PALM_LANDMARKS.len());
        assert_eq!(
            region.palm_landmarks()[0],
            hands[0].landmark(LandmarkIdx::Wrist).xy()
        );
        assert!(region.rect().area() < big.rect().area() * 0.5);
    }

    #[test]
    fn test_rotated_palm() {
        // Palm detection reports a hand whose fingers point to the right.
        let palm = Roi::with_palm_landmarks(
            Rect::from_center(200.0, 200.0, 60.0, 60.0),
            [
                [170.0, 200.0],
                [210.0, 185.0],
                [215.0, 200.0],
                [210.0, 212.0],
                [205.0, 222.0],
                [180.0, 180.0],
                [190.0, 175.0],
            ],
        );
        assert_abs_diff_eq!(palm.rotation_radians(), FRAC_PI_2, epsilon = 1e-5);

        let detector = FakeDetector::new(vec![palm]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(100, 1, 0.5));

        // The network sees an upright hand, which is rotated back into the frame.
        let hands = tracker.track(&frame()).unwrap();
        assert_abs_diff_eq!(hands[0].rotation_radians(), FRAC_PI_2, epsilon = 1e-3);
        let wrist = hands[0].landmark(LandmarkIdx::Wrist);
        let middle_tip = hands[0].landmark(LandmarkIdx::MiddleFingerTip);
        assert!(middle_tip.x() > wrist.x());

        // The next frame derives the rotation from the tracked landmarks.
        let hands = tracker.track(&frame()).unwrap();
        assert_abs_diff_eq!(hands[0].rotation_radians(), FRAC_PI_2, epsilon = 1e-3);
        assert_eq!(detector.calls(), 1);
    }

    #[test]
    fn test_multi_hand_keeps_tracked_regions() {
        let a = Roi::new(Rect::from_corners([10.0, 10.0], [50.0, 50.0]));
        let b = Roi::new(Rect::from_corners([300.0, 200.0], [360.0, 260.0]));
        let detector = FakeDetector::new(vec![a.clone(), b.clone()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(1, 2, 0.5));

        tracker.track(&frame()).unwrap();
        tracker.track(&frame()).unwrap();
        assert_eq!(detector.calls(), 1);
        assert_eq!(tracker.regions().cloned().collect::<Vec<_>>(), [a.clone(), b.clone()]);

        // Redetection finds the same number of hands: the tracked regions are kept.
        let moved = Roi::new(Rect::from_corners([500.0, 10.0], [540.0, 50.0]));
        detector.set_rois(vec![moved.clone(), moved]);
        assert_eq!(tracker.track(&frame()).unwrap().len(), 2);
        assert_eq!(detector.calls(), 2);
        assert_eq!(tracker.regions().cloned().collect::<Vec<_>>(), [a, b]);

        // A different number of hands replaces them.
        detector.set_rois(vec![small_box()]);
        tracker.track(&frame()).unwrap();
        assert_eq!(detector.calls(), 2);
        tracker.track(&frame()).unwrap();
        assert_eq!(detector.calls(), 3);
        assert_eq!(tracker.regions().count(), 1);
    }

    #[test]
    fn test_errors_propagate() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(5, 1, 0.5));

        detector.set_failing(true);
        let err = tracker.track(&frame()).unwrap_err();
        assert!(err.to_string().contains("palm detection"), "{err}");
        assert_eq!(predictor.calls(), 0);

        detector.set_failing(false);
        predictor.set_failing(true);
        let err = tracker.track(&frame()).unwrap_err();
        assert!(err.to_string().contains("landmark prediction"), "{err}");

        predictor.set_failing(false);
        predictor.set_keypoints(vec![1.0; 10]);
        assert!(tracker.track(&frame()).is_err());
        predictor.set_keypoints(vec![1.0; 12]);
        assert!(tracker.track(&frame()).is_err());
    }

    #[test]
    fn test_nan_confidence_is_dropped() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(f32::NAN);
        let mut tracker = new_tracker(&detector, &predictor, config(5, 1, 0.5));

        assert!(tracker.track(&frame()).unwrap().is_empty());
        assert_eq!(tracker.detected_count(), 0);
        assert_eq!(tracker.regions().cloned().collect::<Vec<_>>(), [small_box()]);
    }

    #[test]
    fn test_out_of_range_keypoints() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(5, 1, 0.5));

        let huge = predictor.keypoints().iter().map(|c| c * 1e30).collect();
        predictor.set_keypoints(huge);
        let err = tracker.track(&frame()).unwrap_err();
        assert!(err.to_string().contains("slot 0"), "{err}");
        assert_eq!(tracker.regions().cloned().collect::<Vec<_>>(), [small_box()]);

        predictor.set_keypoints(vec![f32::NAN; NUM_LANDMARKS * 3]);
        assert!(tracker.track(&frame()).is_err());
        predictor.set_keypoints(vec![f32::INFINITY; NUM_LANDMARKS * 3]);
        assert!(tracker.track(&frame()).is_err());

        // Non-finite palm landmarks fall back to cropping the detected region.
        let palm = Roi::with_palm_landmarks(*small_box().rect(), [[f32::NAN, 0.0]; 7]);
        detector.set_rois(vec![palm]);
        predictor.set_keypoints(FakePredictor::upright(0.9).keypoints());
        assert_eq!(tracker.track(&frame()).unwrap().len(), 1);
    }

    #[test]
    fn test_lowering_max_hands() {
        let second = Roi::new(Rect::from_corners([300.0, 200.0], [360.0, 260.0]));
        let detector = FakeDetector::new(vec![small_box(), second]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(100, 2, 0.5));

        assert_eq!(tracker.track(&frame()).unwrap().len(), 2);
        assert_eq!(detector.calls(), 1);

        tracker.set_config(config(100, 1, 0.5));
        assert_eq!(tracker.config().max_hands(), 1);
        assert_eq!(tracker.track(&frame()).unwrap().len(), 1);
        assert_eq!(detector.calls(), 2);
        assert_eq!(tracker.regions().cloned().collect::<Vec<_>>(), [small_box()]);

        tracker.track(&frame()).unwrap();
        assert_eq!(detector.calls(), 2);
    }

    #[test]
    fn test_failed_frame_forces_detection() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(100, 1, 0.5));

        tracker.track(&frame()).unwrap();
        tracker.track(&frame()).unwrap();
        assert_eq!(detector.calls(), 1);
        assert_eq!(tracker.detected_count(), 1);

        predictor.set_failing(true);
        assert!(tracker.track(&frame()).is_err());
        assert_eq!(tracker.detected_count(), 0);
        assert_eq!(detector.calls(), 1);

        predictor.set_failing(false);
        assert_eq!(tracker.track(&frame()).unwrap().len(), 1);
        assert_eq!(detector.calls(), 2);
    }

    #[test]
    fn test_reset() {
        let detector = FakeDetector::new(vec![small_box()]);
        let predictor = FakePredictor::upright(0.9);
        let mut tracker = new_tracker(&detector, &predictor, config(100, 1, 0.5));

        tracker.track(&frame()).unwrap();
        tracker.track(&frame()).unwrap();
        assert_eq!(detector.calls(), 1);

        tracker.reset();
        assert_eq!(tracker.regions().count(), 0);
        tracker.track(&frame()).unwrap();
        assert_eq!(detector.calls(), 2);
        assert_eq!(tracker.timers().count(), 4);
    }
}
