use serde::{Deserialize, Serialize};

/// Crop selection in source-image pixel coordinates.
///
/// `x1`/`y1` is the top-left corner, `x2`/`y2` the bottom-right one.
/// Coordinates may lie outside the image; nothing clamps them unless the
/// caller asks for it with [`Rectangle::clamped`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Left edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Bottom edge.
    pub y2: f64,
}

impl Rectangle {
    /// Create a rectangle from its corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle anchored at the origin with the given size.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Width of the selection (`x2 - x1`).
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Height of the selection (`y2 - y1`).
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Width times height.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Shift both corners by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Scale the bottom-right corner by `factor`, keeping the top-left fixed.
    ///
    /// Both coordinates are multiplied, not the extents, so a rectangle that
    /// does not start at the origin also moves its far edges proportionally to
    /// their distance from the origin.
    pub fn scaled_far_corner(&self, factor: f64) -> Self {
        Self::new(self.x1, self.y1, self.x2 * factor, self.y2 * factor)
    }

    /// Whether all four coordinates are finite and the corners are ordered.
    pub fn is_well_formed(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
            && self.x2 >= self.x1
            && self.y2 >= self.y1
    }

    /// Restrict the selection to `[0, width] x [0, height]`.
    ///
    /// A selection lying fully outside the bounds collapses to a zero-area
    /// rectangle on the nearest edge.
    pub fn clamped(&self, width: f64, height: f64) -> Self {
        if [self.x1, self.y1, self.x2, self.y2].iter().any(|v| v.is_nan()) {
            return *self;
        }
        let x1 = self.x1.clamp(0.0, width);
        let y1 = self.y1.clamp(0.0, height);
        let x2 = self.x2.clamp(x1, width.max(x1));
        let y2 = self.y2.clamp(y1, height.max(y1));
        Self::new(x1, y1, x2, y2)
    }

    /// Move the selection so it lies inside `[0, width] x [0, height]`,
    /// keeping its size. Parts larger than the bounds are then clamped.
    pub fn shifted_within(&self, width: f64, height: f64) -> Self {
        let shift = |lo: f64, hi: f64, max: f64| {
            if lo < 0.0 {
                -lo
            } else if hi > max {
                (max - hi).max(-lo)
            } else {
                0.0
            }
        };
        let dx = shift(self.x1, self.x2, width);
        let dy = shift(self.y1, self.y2, height);
        self.translated(dx, dy).clamped(width, height)
    }

    /// Integer pixel region `(x, y, width, height)` inside a `width` × `height`
    /// image, or `None` if the selection does not cover any whole pixel.
    pub fn pixel_region(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if !self.is_well_formed() {
            return None;
        }
        let c = self.clamped(width as f64, height as f64);
        let x = c.x1.floor() as u32;
        let y = c.y1.floor() as u32;
        let w = (c.x2.round() as u32).saturating_sub(x);
        let h = (c.y2.round() as u32).saturating_sub(y);
        if w == 0 || h == 0 {
            return None;
        }
        Some((x, y, w, h))
    }
}

/// The saliency cropper's best-scoring crop ("top crop").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropSuggestion {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Crop width.
    pub width: f64,
    /// Crop height.
    pub height: f64,
}

impl CropSuggestion {
    /// A suggestion is usable when every field is finite and it covers a
    /// non-zero area.
    pub fn is_usable(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Weighted hint that biases the saliency cropper toward a sub-area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostRegion {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Region width.
    pub width: f64,
    /// Region height.
    pub height: f64,
    /// Relative pull of this region.
    pub weight: f64,
}

/// Parameters handed to a [`crate::SaliencyCropper`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropOptions {
    /// Target crop width; together with `target_height` fixes the aspect ratio.
    pub target_width: f64,
    /// Target crop height.
    pub target_height: f64,
    /// Smallest crop size relative to the largest one that fits the image.
    pub min_scale: f64,
    /// Regions the cropper should favour, one per detected face.
    #[serde(default)]
    pub boost: Vec<BoostRegion>,
}
