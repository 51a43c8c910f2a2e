//! Avatar capture: face-anchored auto-crop, keyboard crop editing, and photo
//! validation.
//!
//! A webcam frame (or a user-supplied file) is run through a pluggable
//! [`FaceDetector`]; when a face is found a [`SaliencyCropper`] suggests a
//! crop biased toward it, and [`CropReconciler`] turns both into the crop
//! rectangle shown to the user. [`CropAdjuster`] lets the user nudge and zoom
//! that rectangle from the keyboard, and [`CaptureSession`] ties it together
//! with validation and the final cropped image.
//!
//! # Example
//!
//! ```no_run
//! use avatarcrop::{
//!     Analyzer, AvatarConfig, CaptureSession, FaceDetector, FaceRegion, Preset, ReadinessTracker,
//! };
//!
//! struct MyDetector;
//! impl FaceDetector for MyDetector {
//!     fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceRegion> {
//!         vec![FaceRegion::new(120.0, 80.0, 90.0, 90.0)]
//!     }
//! }
//!
//! let config = AvatarConfig::default().preset(Preset::Portrait);
//! let readiness = ReadinessTracker::ready();
//! let analyzer = Analyzer::new(&config, Box::new(MyDetector), readiness.subscribe()).unwrap();
//! let mut session = CaptureSession::new(analyzer);
//!
//! let frame = std::fs::read("frame.png").unwrap();
//! let result = session.handle_file(&frame).unwrap();
//! println!("crop: {:?}, faces: {}", result.rectangle, result.face_count);
//!
//! session.enable_manual_edit();
//! session.apply_key("ArrowLeft");
//! let avatar_data_url = session.cropped_image().unwrap();
//! # let _ = avatar_data_url;
//! ```
#![warn(missing_docs)]

/// Keyboard-driven crop editing.
pub mod adjust;
/// Base64 data-URL helpers.
pub mod data_url;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
/// Crop rectangles, suggestions and cropper options.
pub mod geometry;
mod imaging;
/// Transient user notices.
pub mod notice;
/// Detector load state.
pub mod readiness;
/// Reconciliation of faces and crop suggestions.
pub mod reconcile;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;
/// Content-aware cropper trait and the built-in heuristic cropper.
pub mod saliency;
/// Capture session orchestration.
pub mod session;
/// Photo validation endpoint client.
pub mod validation;
/// Webcam commands and preview state.
pub mod webcam;

use serde::{Deserialize, Serialize};

pub use adjust::{Command, CropAdjuster};
/// Error type returned by avatarcrop operations.
pub use error::AvatarError;
pub use face_detector::{FaceDetector, FaceRegion};
pub use geometry::{BoostRegion, CropOptions, CropSuggestion, Rectangle};
pub use notice::{Notice, Notifier, TracingNotifier};
pub use readiness::{Classifier, Readiness, ReadinessGate, ReadinessTracker};
pub use reconcile::{CropReconciler, EyeCheck, Reconciliation};
#[cfg(feature = "rustface")]
/// Detector that loads a SeetaFace model.
pub use rustface_backend::RustfaceDetector;
pub use saliency::{HeuristicCropper, SaliencyCropper};
pub use session::{Analysis, Analyzer, Capture, CaptureOutcome, CaptureSession};
#[cfg(feature = "http")]
pub use validation::HttpValidator;
pub use validation::{ValidationVerdict, Validator};

/// Pre-configured crop settings for common avatar formats.
///
/// Apply a preset with [`AvatarConfig::preset`], then override individual
/// settings as needed. A preset replaces the crop geometry and the
/// adjustment step; other settings are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// 35×45 passport-style portrait, 10px nudges.
    Passport,

    /// 30×40 compact ID portrait, 5px nudges.
    Compact,

    /// 400×600 profile portrait at full scale, 10px nudges.
    Portrait,
}

/// Settings for detection, reconciliation and manual adjustment.
///
/// Deserializes from camelCase JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvatarConfig {
    /// Width of the target crop; also the default rectangle's width.
    pub target_width: f64,
    /// Height of the target crop; also the default rectangle's height.
    pub target_height: f64,
    /// Smallest crop scale the saliency cropper may pick.
    pub min_scale: f64,
    /// Weight of the boost region built for each detected face.
    pub boost_weight: f64,
    /// Divisor `k` in `y1 = (suggestion.y + face.y) / k`.
    pub vertical_divisor: f64,
    /// Subtracted from the suggestion's x to correct a systematic bias.
    pub horizontal_offset: f64,
    /// Count eyes in the primary face and report an advisory [`EyeCheck`].
    pub detect_eyes: bool,
    /// Pixels moved by each nudge command.
    pub step: f64,
    /// Arrow-up moves the crop down and arrow-down moves it up.
    pub invert_vertical_keys: bool,
    /// Keep adjusted crops inside the source image.
    pub clamp_to_image: bool,
    /// Address of the validation endpoint, used by `HttpValidator::from_config`.
    pub validation_url: String,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            target_width: 35.0,
            target_height: 45.0,
            min_scale: 0.8,
            boost_weight: 1.0,
            vertical_divisor: 2.0,
            horizontal_offset: 0.0,
            detect_eyes: false,
            step: 10.0,
            invert_vertical_keys: false,
            clamp_to_image: false,
            validation_url: validation::DEFAULT_VALIDATION_URL.to_string(),
        }
    }
}

impl AvatarConfig {
    /// Parse a configuration from JSON, then validate it.
    pub fn from_json(json: &str) -> Result<Self, AvatarError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AvatarError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply a preset configuration.
    pub fn preset(mut self, preset: Preset) -> Self {
        match preset {
            Preset::Passport => {
                self.target_width = 35.0;
                self.target_height = 45.0;
                self.min_scale = 0.8;
                self.step = 10.0;
            }
            Preset::Compact => {
                self.target_width = 30.0;
                self.target_height = 40.0;
                self.min_scale = 0.8;
                self.step = 5.0;
            }
            Preset::Portrait => {
                self.target_width = 400.0;
                self.target_height = 600.0;
                self.min_scale = 1.0;
                self.step = 10.0;
            }
        }
        self
    }

    /// Set the target crop size (default: 35×45).
    pub fn target_size(mut self, width: f64, height: f64) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    /// Set the minimum crop scale (default: 0.8).
    pub fn min_scale(mut self, scale: f64) -> Self {
        self.min_scale = scale;
        self
    }

    /// Set the per-face boost weight (default: 1.0).
    pub fn boost_weight(mut self, weight: f64) -> Self {
        self.boost_weight = weight;
        self
    }

    /// Set the vertical-bias divisor (default: 2).
    pub fn vertical_divisor(mut self, divisor: f64) -> Self {
        self.vertical_divisor = divisor;
        self
    }

    /// Set the horizontal correction in pixels (default: 0).
    pub fn horizontal_offset(mut self, offset: f64) -> Self {
        self.horizontal_offset = offset;
        self
    }

    /// Enable or disable eye detection (default: false).
    pub fn detect_eyes(mut self, enable: bool) -> Self {
        self.detect_eyes = enable;
        self
    }

    /// Set the nudge step in pixels (default: 10).
    pub fn step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Swap the vertical arrow keys (default: false).
    pub fn invert_vertical_keys(mut self, invert: bool) -> Self {
        self.invert_vertical_keys = invert;
        self
    }

    /// Clamp adjusted crops to the source image (default: false).
    pub fn clamp_to_image(mut self, clamp: bool) -> Self {
        self.clamp_to_image = clamp;
        self
    }

    /// Set the validation endpoint address.
    pub fn validation_url(mut self, url: impl Into<String>) -> Self {
        self.validation_url = url.into();
        self
    }

    /// Check that every numeric setting is usable.
    pub fn validate(&self) -> Result<(), AvatarError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.target_width) || !positive(self.target_height) {
            return Err(AvatarError::InvalidTargetSize {
                width: self.target_width,
                height: self.target_height,
            });
        }
        if !positive(self.vertical_divisor) {
            return Err(AvatarError::InvalidDivisor(self.vertical_divisor));
        }
        if !positive(self.step) {
            return Err(AvatarError::InvalidStep(self.step));
        }
        if !positive(self.boost_weight) {
            return Err(AvatarError::InvalidBoostWeight(self.boost_weight));
        }
        if !positive(self.min_scale) {
            return Err(AvatarError::Config(format!(
                "min scale must be > 0, got {}",
                self.min_scale
            )));
        }
        if !self.horizontal_offset.is_finite() {
            return Err(AvatarError::Config("horizontal offset must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AvatarConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vertical_divisor, 2.0);
        assert_eq!(config.horizontal_offset, 0.0);
        assert_eq!(config.step, 10.0);
        assert!(!config.detect_eyes);
    }

    #[test]
    fn preset_compact() {
        let config = AvatarConfig::default().preset(Preset::Compact);
        assert_eq!((config.target_width, config.target_height), (30.0, 40.0));
        assert_eq!(config.step, 5.0);
    }

    #[test]
    fn preset_portrait() {
        let config = AvatarConfig::default().preset(Preset::Portrait);
        assert_eq!((config.target_width, config.target_height), (400.0, 600.0));
        assert_eq!(config.min_scale, 1.0);
    }

    #[test]
    fn preset_can_be_overridden() {
        let config = AvatarConfig::default()
            .vertical_divisor(3.0)
            .preset(Preset::Compact)
            .step(7.0);
        // Preset keeps reconciliation tuning, later setters win
        assert_eq!(config.vertical_divisor, 3.0);
        assert_eq!(config.step, 7.0);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(matches!(
            AvatarConfig::default().vertical_divisor(0.0).validate(),
            Err(AvatarError::InvalidDivisor(_))
        ));
        assert!(matches!(
            AvatarConfig::default().step(-1.0).validate(),
            Err(AvatarError::InvalidStep(_))
        ));
        assert!(matches!(
            AvatarConfig::default().target_size(0.0, 45.0).validate(),
            Err(AvatarError::InvalidTargetSize { .. })
        ));
        assert!(matches!(
            AvatarConfig::default().boost_weight(0.0).validate(),
            Err(AvatarError::InvalidBoostWeight(_))
        ));
    }

    #[test]
    fn from_json_fills_defaults() {
        let config =
            AvatarConfig::from_json(r#"{"verticalDivisor": 3, "horizontalOffset": 50}"#).unwrap();
        assert_eq!(config.vertical_divisor, 3.0);
        assert_eq!(config.horizontal_offset, 50.0);
        assert_eq!(config.target_width, 35.0);
    }

    #[test]
    fn from_json_rejects_invalid() {
        assert!(AvatarConfig::from_json(r#"{"step": 0}"#).is_err());
        assert!(AvatarConfig::from_json("not json").is_err());
    }
}
