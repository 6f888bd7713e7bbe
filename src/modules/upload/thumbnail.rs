//! Thumbnail derivation
//!
//! Produces a fixed-width JPEG derivative of a raster image. The input
//! format is guessed from the bytes, so a mislabeled MIME type does not
//! matter here.

use image::imageops::FilterType;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

/// Fixed thumbnail width in pixels; height follows the aspect ratio
pub const THUMBNAIL_WIDTH: u32 = 200;

/// Derive thumbnail bytes from original image bytes.
pub fn derive(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;

    let (width, height) = (img.width(), img.height());
    let thumb_height = ((height as u64 * THUMBNAIL_WIDTH as u64) / width.max(1) as u64).max(1);
    let resized = img.resize_exact(THUMBNAIL_WIDTH, thumb_height as u32, FilterType::Triangle);

    // JPEG output cannot carry an alpha channel
    let rgb = resized.to_rgb8();

    let mut buffer = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage, RgbaImage};

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn decode(data: &[u8]) -> DynamicImage {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[test]
    fn test_derive_fixes_width_and_keeps_aspect_ratio() {
        let original = DynamicImage::ImageRgb8(RgbImage::new(800, 600));
        let thumb = decode(&derive(&png_bytes(original)).unwrap());
        assert_eq!(thumb.width(), THUMBNAIL_WIDTH);
        assert_eq!(thumb.height(), 150);
    }

    #[test]
    fn test_derive_outputs_jpeg() {
        let original = DynamicImage::ImageRgb8(RgbImage::new(400, 400));
        let thumb = derive(&png_bytes(original)).unwrap();
        let format = ImageReader::new(Cursor::new(&thumb))
            .with_guessed_format()
            .unwrap()
            .format();
        assert_eq!(format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_derive_flattens_alpha() {
        let original = DynamicImage::ImageRgba8(RgbaImage::new(300, 100));
        let thumb = decode(&derive(&png_bytes(original)).unwrap());
        assert_eq!(thumb.width(), THUMBNAIL_WIDTH);
        assert_eq!(thumb.height(), 66);
    }

    #[test]
    fn test_derive_rejects_non_image_bytes() {
        assert!(derive(b"definitely not an image").is_err());
    }

    #[test]
    fn test_derive_handles_very_wide_images() {
        // Height must never round down to zero
        let original = DynamicImage::ImageRgb8(RgbImage::new(4000, 2));
        let thumb = decode(&derive(&png_bytes(original)).unwrap());
        assert_eq!(thumb.width(), THUMBNAIL_WIDTH);
        assert!(thumb.height() >= 1);
    }
}
