//! Hand tracker configuration.

use std::{env, str::FromStr};

use anyhow::{bail, Context};

/// Configuration of a [`HandTracker`].
///
/// The palm detector also receives this configuration, so that it can limit the number of
/// detections it returns.
///
/// [`HandTracker`]: crate::tracking::HandTracker
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    skip_frames: u32,
    max_hands: usize,
    min_confidence: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            skip_frames: Self::DEFAULT_SKIP_FRAMES,
            max_hands: Self::DEFAULT_MAX_HANDS,
            min_confidence: Self::DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl TrackerConfig {
    pub const DEFAULT_SKIP_FRAMES: u32 = 18;

    pub const DEFAULT_MAX_HANDS: usize = 1;

    pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.8;

    /// Creates a configuration with default values, overridden by environment variables.
    ///
    /// The following variables are recognized:
    ///
    /// * `HANDPOSE_SKIP_FRAMES`: see [`TrackerConfig::set_skip_frames`].
    /// * `HANDPOSE_MAX_HANDS`: see [`TrackerConfig::set_max_hands`].
    /// * `HANDPOSE_MIN_CONFIDENCE`: see [`TrackerConfig::set_min_confidence`].
    ///
    /// Returns an error if a variable is set to a value that can't be parsed or is out of range.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(skip_frames) = parse_var(&var, "HANDPOSE_SKIP_FRAMES")? {
            config.skip_frames = skip_frames;
        }
        if let Some(max_hands) = parse_var::<usize>(&var, "HANDPOSE_MAX_HANDS")? {
            if max_hands == 0 {
                bail!("HANDPOSE_MAX_HANDS must be at least 1");
            }
            config.max_hands = max_hands;
        }
        if let Some(min_confidence) = parse_var::<f32>(&var, "HANDPOSE_MIN_CONFIDENCE")? {
            if !(0.0..=1.0).contains(&min_confidence) {
                bail!("HANDPOSE_MIN_CONFIDENCE must be between 0.0 and 1.0, got {min_confidence}");
            }
            config.min_confidence = min_confidence;
        }

        log::debug!("tracker config: {:?}", config);
        Ok(config)
    }

    /// Returns the number of frames that may reuse tracked regions before the palm detector is
    /// run again.
    #[inline]
    pub fn skip_frames(&self) -> u32 {
        self.skip_frames
    }

    /// Sets the number of frames that may reuse tracked regions before the palm detector is run
    /// again.
    ///
    /// A value of 0 runs the detector on every frame.
    ///
    /// By default, [`TrackerConfig::DEFAULT_SKIP_FRAMES`] is used.
    pub fn set_skip_frames(&mut self, skip_frames: u32) {
        self.skip_frames = skip_frames;
    }

    /// Returns the maximum number of hands to track.
    #[inline]
    pub fn max_hands(&self) -> usize {
        self.max_hands
    }

    /// Sets the maximum number of hands to track.
    ///
    /// Detections exceeding this number are ignored.
    ///
    /// By default, [`TrackerConfig::DEFAULT_MAX_HANDS`] is used.
    ///
    /// # Panics
    ///
    /// This method panics when `max_hands` is 0.
    pub fn set_max_hands(&mut self, max_hands: usize) {
        assert!(max_hands >= 1, "need to track at least 1 hand");
        self.max_hands = max_hands;
    }

    /// Returns the minimum landmark confidence for a hand to be reported.
    #[inline]
    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Sets the minimum confidence the landmark network has to report for a hand to be reported.
    ///
    /// By default, [`TrackerConfig::DEFAULT_MIN_CONFIDENCE`] is used.
    ///
    /// # Panics
    ///
    /// This method panics when `min_confidence` is outside of `0.0..=1.0` or NaN.
    pub fn set_min_confidence(&mut self, min_confidence: f32) {
        assert!(
            (0.0..=1.0).contains(&min_confidence),
            "invalid confidence threshold {min_confidence}"
        );
        self.min_confidence = min_confidence;
    }
}

fn parse_var<T>(var: impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Some(value) => {
            let value = value
                .trim()
                .parse()
                .with_context(|| format!("invalid value '{value}' for {name}"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}
