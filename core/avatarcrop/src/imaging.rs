use image::codecs::png::PngEncoder;
use image::{DynamicImage, GrayImage, ImageEncoder};

use crate::error::AvatarError;
use crate::geometry::Rectangle;

/// Decode input bytes (JPEG, PNG, or WebP) into a `DynamicImage`.
pub(crate) fn decode_image(input: &[u8]) -> Result<DynamicImage, AvatarError> {
    let image =
        image::load_from_memory(input).map_err(|e| AvatarError::DecodeError(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(AvatarError::ZeroDimensions);
    }
    Ok(image)
}

/// Grayscale copy of `image` for the face detector.
pub(crate) fn to_gray(image: &DynamicImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Cut the pixels under `rect` out of `image`.
///
/// The rectangle is intersected with the image bounds first; a selection that
/// covers no pixel is an error.
pub(crate) fn crop_to_rectangle(
    image: &DynamicImage,
    rect: &Rectangle,
) -> Result<DynamicImage, AvatarError> {
    let (x, y, width, height) = rect
        .pixel_region(image.width(), image.height())
        .ok_or(AvatarError::ZeroDimensions)?;
    Ok(image.crop_imm(x, y, width, height))
}

/// Encode an image as PNG, keeping the alpha channel if present.
pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, AvatarError> {
    let mut buffer = Vec::new();
    let rgba = image.to_rgba8();
    PngEncoder::new(&mut buffer)
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| AvatarError::EncodeError(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn make_test_rgb(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        img
    }

    #[test]
    fn png_round_trip_keeps_size() {
        let img = DynamicImage::ImageRgb8(make_test_rgb(48, 64));
        let data = encode_png(&img).unwrap();
        assert_eq!(&data[1..4], b"PNG");
        let back = decode_image(&data).unwrap();
        assert_eq!((back.width(), back.height()), (48, 64));
    }

    #[test]
    fn crop_respects_bounds() {
        let img = DynamicImage::ImageRgb8(make_test_rgb(100, 80));
        let cropped = crop_to_rectangle(&img, &Rectangle::new(-10.0, 20.0, 60.0, 200.0)).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (60, 60));
    }

    #[test]
    fn crop_outside_image_fails() {
        let img = DynamicImage::ImageRgb8(make_test_rgb(10, 10));
        let result = crop_to_rectangle(&img, &Rectangle::new(20.0, 20.0, 30.0, 30.0));
        assert!(matches!(result, Err(AvatarError::ZeroDimensions)));
    }

    #[test]
    fn invalid_input_returns_error() {
        assert!(decode_image(b"not an image").is_err());
    }

    #[test]
    fn gray_matches_dimensions() {
        let img = DynamicImage::ImageRgb8(make_test_rgb(7, 5));
        let gray = to_gray(&img);
        assert_eq!(gray.as_raw().len(), 35);
    }
}
