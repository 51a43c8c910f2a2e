use std::fmt;

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::face_detector::FaceRegion;
use crate::geometry::{CropOptions, CropSuggestion, Rectangle};
use crate::notice::Notice;
use crate::saliency::SaliencyCropper;
use crate::AvatarConfig;

/// Eyes needed in the primary face for the photo to pass.
const MIN_EYES: usize = 2;

/// Advisory result of eye detection on the primary face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EyeCheck {
    /// At least two eyes were found.
    Pass,
    /// Fewer than two eyes were found.
    NoEyes,
}

impl fmt::Display for EyeCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EyeCheck::Pass => f.write_str("Pass"),
            EyeCheck::NoEyes => f.write_str("No eyes in the photo"),
        }
    }
}

/// Outcome of reconciling one analysed capture.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Crop to display; the default rectangle when nothing usable was found.
    pub rectangle: Rectangle,
    /// Number of faces the detector reported.
    pub face_count: usize,
    /// Eye advisory, present only when eye detection is enabled and ran.
    pub eye_check: Option<EyeCheck>,
    /// Notice the caller should surface, if any.
    pub notice: Option<Notice>,
}

/// Combines detector output and the cropper's top crop into one rectangle.
///
/// Only the first detected face anchors the vertical position, even though
/// every face is passed to the cropper as a boost region.
#[derive(Debug, Clone)]
pub struct CropReconciler {
    target_width: f64,
    target_height: f64,
    min_scale: f64,
    boost_weight: f64,
    vertical_divisor: f64,
    horizontal_offset: f64,
    detect_eyes: bool,
}

impl CropReconciler {
    /// Reconciler using the crop geometry of `config`.
    pub fn new(config: &AvatarConfig) -> Self {
        Self {
            target_width: config.target_width,
            target_height: config.target_height,
            min_scale: config.min_scale,
            boost_weight: config.boost_weight,
            vertical_divisor: config.vertical_divisor,
            horizontal_offset: config.horizontal_offset,
            detect_eyes: config.detect_eyes,
        }
    }

    /// Rectangle used when no face or no usable suggestion is available.
    pub fn default_rectangle(&self) -> Rectangle {
        Rectangle::from_size(self.target_width, self.target_height)
    }

    /// Cropper options with one boost region per face.
    pub fn crop_options(&self, faces: &[FaceRegion]) -> CropOptions {
        CropOptions {
            target_width: self.target_width,
            target_height: self.target_height,
            min_scale: self.min_scale,
            boost: faces.iter().map(|f| f.boost(self.boost_weight)).collect(),
        }
    }

    /// Position `suggestion` relative to the anchor `face`.
    ///
    /// Returns `None` if either input is malformed.
    pub fn place(&self, suggestion: &CropSuggestion, face: &FaceRegion) -> Option<Rectangle> {
        if !suggestion.is_usable() || !face.is_finite() {
            return None;
        }
        let x1 = suggestion.x - self.horizontal_offset;
        let y1 = (suggestion.y + face.y) / self.vertical_divisor;
        let rect = Rectangle::new(x1, y1, x1 + suggestion.width, y1 + suggestion.height);
        rect.is_well_formed().then_some(rect)
    }

    /// Run the cropper on `image` (only when a face was found) and reconcile.
    pub fn reconcile(
        &self,
        image: &DynamicImage,
        faces: &[FaceRegion],
        cropper: &dyn SaliencyCropper,
    ) -> Reconciliation {
        if faces.is_empty() {
            return self.reconcile_suggestion(faces, None);
        }
        let options = self.crop_options(faces);
        match cropper.crop(image, &options) {
            Ok(suggestion) => self.reconcile_suggestion(faces, Some(&suggestion)),
            Err(e) => {
                warn!("saliency cropper failed: {e}");
                self.reconcile_suggestion(faces, None)
            }
        }
    }

    /// Reconcile an already computed top crop with the detected faces.
    ///
    /// `suggestion` is ignored when `faces` is empty.
    pub fn reconcile_suggestion(
        &self,
        faces: &[FaceRegion],
        suggestion: Option<&CropSuggestion>,
    ) -> Reconciliation {
        let Some(primary) = faces.first() else {
            return Reconciliation {
                rectangle: self.default_rectangle(),
                face_count: 0,
                eye_check: None,
                notice: Some(Notice::NoFace),
            };
        };

        let eye_check = self.eye_check(primary);
        let placed = suggestion.and_then(|s| self.place(s, primary));
        match placed {
            Some(rectangle) => {
                debug!(?rectangle, faces = faces.len(), "reconciled crop");
                Reconciliation {
                    rectangle,
                    face_count: faces.len(),
                    eye_check,
                    notice: None,
                }
            }
            None => {
                warn!(?suggestion, face = ?primary, "unusable crop suggestion");
                Reconciliation {
                    rectangle: self.default_rectangle(),
                    face_count: faces.len(),
                    eye_check,
                    notice: Some(Notice::CouldNotCrop),
                }
            }
        }
    }

    fn eye_check(&self, primary: &FaceRegion) -> Option<EyeCheck> {
        if !self.detect_eyes {
            return None;
        }
        match primary.eye_count {
            Some(n) if n >= MIN_EYES => Some(EyeCheck::Pass),
            Some(_) => Some(EyeCheck::NoEyes),
            None => {
                debug!("eye detection enabled but the detector reported no eye count");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AvatarError;

    fn reconciler() -> CropReconciler {
        CropReconciler::new(&AvatarConfig::default())
    }

    fn suggestion() -> CropSuggestion {
        CropSuggestion {
            x: 10.0,
            y: 20.0,
            width: 300.0,
            height: 400.0,
        }
    }

    struct FixedCropper(Result<CropSuggestion, ()>);

    impl SaliencyCropper for FixedCropper {
        fn crop(&self, _: &DynamicImage, options: &CropOptions) -> Result<CropSuggestion, AvatarError> {
            assert!(!options.boost.is_empty(), "cropper must only run with faces");
            self.0.map_err(|_| AvatarError::CropFailed("boom".into()))
        }
    }

    #[test]
    fn documented_example() {
        let face = FaceRegion::new(15.0, 40.0, 50.0, 50.0);
        let out = reconciler().reconcile_suggestion(&[face], Some(&suggestion()));
        assert_eq!(out.rectangle, Rectangle::new(10.0, 30.0, 310.0, 430.0));
        assert_eq!(out.face_count, 1);
        assert_eq!(out.notice, None);
    }

    #[test]
    fn no_face_uses_default_rectangle() {
        let out = reconciler().reconcile_suggestion(&[], Some(&suggestion()));
        assert_eq!(out.rectangle, Rectangle::from_size(35.0, 45.0));
        assert_eq!(out.face_count, 0);
        assert_eq!(out.notice, Some(Notice::NoFace));
    }

    #[test]
    fn no_face_skips_cropper() {
        let image = DynamicImage::new_rgb8(10, 10);
        // FixedCropper asserts on empty boosts, so reaching it would panic
        let out = reconciler().reconcile(&image, &[], &FixedCropper(Ok(suggestion())));
        assert_eq!(out.face_count, 0);
    }

    #[test]
    fn divisor_and_offset_are_configurable() {
        let config = AvatarConfig::default()
            .vertical_divisor(3.0)
            .horizontal_offset(50.0);
        let face = FaceRegion::new(0.0, 40.0, 50.0, 50.0);
        let out = CropReconciler::new(&config).reconcile_suggestion(&[face], Some(&suggestion()));
        assert_eq!(out.rectangle, Rectangle::new(-40.0, 20.0, 260.0, 420.0));
    }

    #[test]
    fn anchors_to_first_face_only() {
        let faces = [
            FaceRegion::new(0.0, 100.0, 10.0, 10.0),
            FaceRegion::new(0.0, 900.0, 80.0, 80.0),
        ];
        let out = reconciler().reconcile_suggestion(&faces, Some(&suggestion()));
        assert_eq!(out.rectangle.y1, (20.0 + 100.0) / 2.0);
        assert_eq!(out.face_count, 2);
    }

    #[test]
    fn every_face_becomes_a_boost_region() {
        let config = AvatarConfig::default().boost_weight(5.0);
        let faces = [
            FaceRegion::new(1.0, 2.0, 3.0, 4.0),
            FaceRegion::new(5.0, 6.0, 7.0, 8.0),
        ];
        let options = CropReconciler::new(&config).crop_options(&faces);
        assert_eq!(options.boost.len(), 2);
        assert!(options.boost.iter().all(|b| b.weight == 5.0));
        assert_eq!(options.boost[1].x, 5.0);
    }

    #[test]
    fn zero_area_suggestion_falls_back() {
        let face = FaceRegion::new(15.0, 40.0, 50.0, 50.0);
        let flat = CropSuggestion {
            width: 0.0,
            ..suggestion()
        };
        let out = reconciler().reconcile_suggestion(&[face], Some(&flat));
        assert_eq!(out.rectangle, reconciler().default_rectangle());
        assert_eq!(out.notice, Some(Notice::CouldNotCrop));
        assert_eq!(out.face_count, 1);
    }

    #[test]
    fn cropper_error_falls_back() {
        let image = DynamicImage::new_rgb8(10, 10);
        let face = FaceRegion::new(15.0, 40.0, 50.0, 50.0);
        let out = reconciler().reconcile(&image, &[face], &FixedCropper(Err(())));
        assert_eq!(out.notice, Some(Notice::CouldNotCrop));
        assert_eq!(out.rectangle, reconciler().default_rectangle());
    }

    #[test]
    fn non_finite_face_falls_back() {
        let face = FaceRegion::new(0.0, f64::INFINITY, 50.0, 50.0);
        let out = reconciler().reconcile_suggestion(&[face], Some(&suggestion()));
        assert_eq!(out.notice, Some(Notice::CouldNotCrop));
    }

    #[test]
    fn eye_check_only_when_enabled() {
        let mut face = FaceRegion::new(15.0, 40.0, 50.0, 50.0);
        face.eye_count = Some(2);
        let off = reconciler().reconcile_suggestion(&[face], Some(&suggestion()));
        assert_eq!(off.eye_check, None);

        let on = CropReconciler::new(&AvatarConfig::default().detect_eyes(true));
        let pass = on.reconcile_suggestion(&[face], Some(&suggestion()));
        assert_eq!(pass.eye_check, Some(EyeCheck::Pass));
        assert_eq!(pass.rectangle, off.rectangle);

        face.eye_count = Some(1);
        let fail = on.reconcile_suggestion(&[face], Some(&suggestion()));
        assert_eq!(fail.eye_check, Some(EyeCheck::NoEyes));
        assert_eq!(fail.eye_check.unwrap().to_string(), "No eyes in the photo");
    }
}
