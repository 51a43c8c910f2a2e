use std::path::Path;

use tracing::debug;

use crate::error::AvatarError;
use crate::face_detector::{FaceDetector, FaceRegion};

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model is read once on construction; each call to
/// [`FaceDetector::detect`] builds a fresh detector from a clone of it, since
/// `rustface` detectors are not `Sync`. SeetaFace has no eye model, so
/// [`FaceDetector::count_eyes`] always reports `None`.
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
    score_thresh: f64,
}

impl RustfaceDetector {
    /// Load a SeetaFace frontal model from raw bytes.
    pub fn from_bytes(model_data: &[u8]) -> Result<Self, AvatarError> {
        let model = rustface::read_model(std::io::Cursor::new(model_data))
            .map_err(|e| AvatarError::ClassifierLoad(e.to_string()))?;
        Ok(Self {
            model,
            min_face_size: 20,
            score_thresh: 2.0,
        })
    }

    /// Load a SeetaFace frontal model from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AvatarError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| AvatarError::ClassifierLoad(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&data)
    }

    /// Smallest face edge in pixels the detector will report (default: 20).
    pub fn min_face_size(mut self, size: u32) -> Self {
        self.min_face_size = size;
        self
    }

    /// Detection score threshold (default: 2.0).
    pub fn score_thresh(mut self, thresh: f64) -> Self {
        self.score_thresh = thresh;
        self
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRegion> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(self.score_thresh);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));
        debug!(count = faces.len(), width, height, "rustface detection");

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceRegion::new(
                    bbox.x() as f64,
                    bbox.y() as f64,
                    bbox.width() as f64,
                    bbox.height() as f64,
                )
            })
            .collect()
    }
}
