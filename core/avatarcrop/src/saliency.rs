use image::DynamicImage;

use crate::error::AvatarError;
use crate::geometry::{CropOptions, CropSuggestion};

/// Pluggable content-aware cropper.
///
/// Given an image and [`CropOptions`], returns the single best crop. Boost
/// regions in the options should pull the crop toward them.
pub trait SaliencyCropper: Send + Sync {
    /// Best crop of `image` for `options`.
    fn crop(&self, image: &DynamicImage, options: &CropOptions) -> Result<CropSuggestion, AvatarError>;
}

/// Vertical bias toward the top of the image when no boost is given.
/// 0.0 = top, 0.5 = center, 1.0 = bottom.
const VERTICAL_BIAS: f64 = 0.2;

/// Built-in cropper that needs no saliency model.
///
/// Takes the largest crop with the target aspect ratio that fits the image,
/// centred on the weighted centroid of the boost regions. Without boosts it
/// centres horizontally and sits 20% down the vertical slack, where faces
/// usually are in portrait shots.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCropper;

impl HeuristicCropper {
    /// Largest `(width, height)` with the aspect of `options` fitting the source.
    fn crop_size(source_width: f64, source_height: f64, options: &CropOptions) -> (f64, f64) {
        let aspect = options.target_width / options.target_height;
        if source_width / source_height > aspect {
            // Source is wider than the target aspect, constrain by height
            ((source_height * aspect).round(), source_height)
        } else {
            (source_width, (source_width / aspect).round())
        }
    }

    fn boost_centroid(options: &CropOptions) -> Option<(f64, f64)> {
        let total: f64 = options.boost.iter().map(|b| b.weight).sum();
        if options.boost.is_empty() || total <= 0.0 {
            return None;
        }
        let cx = options
            .boost
            .iter()
            .map(|b| (b.x + b.width / 2.0) * b.weight)
            .sum::<f64>()
            / total;
        let cy = options
            .boost
            .iter()
            .map(|b| (b.y + b.height / 2.0) * b.weight)
            .sum::<f64>()
            / total;
        Some((cx, cy))
    }
}

impl SaliencyCropper for HeuristicCropper {
    fn crop(&self, image: &DynamicImage, options: &CropOptions) -> Result<CropSuggestion, AvatarError> {
        let (source_width, source_height) = (image.width() as f64, image.height() as f64);
        if source_width == 0.0 || source_height == 0.0 {
            return Err(AvatarError::ZeroDimensions);
        }
        if options.target_width <= 0.0 || options.target_height <= 0.0 {
            return Err(AvatarError::InvalidTargetSize {
                width: options.target_width,
                height: options.target_height,
            });
        }

        let (width, height) = Self::crop_size(source_width, source_height, options);
        let max_x = (source_width - width).max(0.0);
        let max_y = (source_height - height).max(0.0);

        let (x, y) = match Self::boost_centroid(options) {
            Some((cx, cy)) => (
                (cx - width / 2.0).round().clamp(0.0, max_x),
                (cy - height / 2.0).round().clamp(0.0, max_y),
            ),
            None => ((max_x / 2.0).floor(), (max_y * VERTICAL_BIAS).round()),
        };

        Ok(CropSuggestion {
            x,
            y,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoostRegion;
    use image::RgbImage;

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }

    fn options(boost: Vec<BoostRegion>) -> CropOptions {
        CropOptions {
            target_width: 3.0,
            target_height: 4.0,
            min_scale: 1.0,
            boost,
        }
    }

    #[test]
    fn wide_source_constrains_by_height() {
        let crop = HeuristicCropper.crop(&blank(800, 300), &options(vec![])).unwrap();
        assert_eq!(crop.width, 225.0);
        assert_eq!(crop.height, 300.0);
        assert_eq!(crop.x, 287.0);
        assert_eq!(crop.y, 0.0);
    }

    #[test]
    fn tall_source_biases_toward_top() {
        let crop = HeuristicCropper.crop(&blank(300, 800), &options(vec![])).unwrap();
        assert_eq!(crop.width, 300.0);
        assert_eq!(crop.height, 400.0);
        assert_eq!(crop.x, 0.0);
        // Vertical slack = 400, bias 20% → y = 80
        assert_eq!(crop.y, 80.0);
    }

    #[test]
    fn boost_pulls_crop_toward_face() {
        let face = BoostRegion {
            x: 700.0,
            y: 100.0,
            width: 60.0,
            height: 60.0,
            weight: 1.0,
        };
        let crop = HeuristicCropper.crop(&blank(800, 300), &options(vec![face])).unwrap();
        // Centroid x = 730, crop width 225 → clamped to the right edge
        assert_eq!(crop.x, 575.0);
    }

    #[test]
    fn heavier_boost_wins() {
        let left = BoostRegion {
            x: 100.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            weight: 1.0,
        };
        let right = BoostRegion {
            x: 400.0,
            weight: 5.0,
            ..left
        };
        let crop = HeuristicCropper
            .crop(&blank(1000, 300), &options(vec![left, right]))
            .unwrap();
        // Centroid x = (100 + 2000) / 6 = 350
        assert_eq!(crop.x, (350.0_f64 - 112.5).round());
    }

    #[test]
    fn zero_target_is_rejected() {
        let mut opts = options(vec![]);
        opts.target_height = 0.0;
        assert!(HeuristicCropper.crop(&blank(10, 10), &opts).is_err());
    }
}
