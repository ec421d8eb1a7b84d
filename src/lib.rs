//! Hand tracking on top of palm detection and hand landmark networks.
//!
//! This crate does not run any neural networks itself. Instead, the caller implements
//! [`Detector`][detection::Detector] for a palm detection network and
//! [`Predictor`][landmark::Predictor] for a hand landmark network, and hands both to a
//! [`HandTracker`][tracking::HandTracker]. The tracker decides when palm detection has to run,
//! cuts rotated hand images out of each frame, and maps the landmarks back into the frame.
//!
//! # Coordinates
//!
//! All 2D coordinates are in image pixels: X points to the right, Y points *down*. Rotation angles
//! are in radians; a hand rotation of 0 means that the fingers point up.
//!
//! # Environment Variables
//!
//! [`TrackerConfig::from_env`][config::TrackerConfig::from_env] reads overrides of the tracker
//! configuration from the environment:
//!
//! * `HANDPOSE_SKIP_FRAMES`: number of frames between palm detection runs.
//! * `HANDPOSE_MAX_HANDS`: maximum number of tracked hands.
//! * `HANDPOSE_MIN_CONFIDENCE`: minimum landmark confidence of reported hands.

use log::LevelFilter;

pub mod config;
pub mod crop;
pub mod detection;
pub mod landmark;
pub mod num;
pub mod rect;
pub mod resolution;
pub mod rotation;
pub mod timer;
pub mod tracking;
pub mod transform;

#[cfg(test)]
mod test;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .is_test(cfg!(test))
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and this crate log at *debug* level, which can be overridden with the
/// `RUST_LOG` environment variable.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
