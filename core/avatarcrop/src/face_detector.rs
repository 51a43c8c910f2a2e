use serde::{Deserialize, Serialize};

use crate::geometry::BoostRegion;

/// Bounding box of a detected face within an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRegion {
    /// X coordinate of the top-left corner (pixels).
    pub x: f64,
    /// Y coordinate of the top-left corner (pixels).
    pub y: f64,
    /// Width of the bounding box (pixels).
    pub width: f64,
    /// Height of the bounding box (pixels).
    pub height: f64,
    /// Number of eyes found inside the box, when eye detection ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_count: Option<usize>,
}

impl FaceRegion {
    /// Face box without eye information.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            eye_count: None,
        }
    }

    /// Boost hint covering this face with the given weight.
    pub fn boost(&self, weight: f64) -> BoostRegion {
        BoostRegion {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            weight,
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Pluggable face detection backend.
///
/// Implement this trait to wire in a cascade classifier, an ONNX model or any
/// other engine, then hand it to [`crate::CaptureSession`].
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRegion>;

    /// Count eyes inside `face`. `None` means the backend has no eye model.
    fn count_eyes(&self, _gray: &[u8], _width: u32, _height: u32, _face: &FaceRegion) -> Option<usize> {
        None
    }
}
