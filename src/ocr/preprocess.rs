//! Image preprocessing applied before OCR.

use image::{DynamicImage, imageops};

/// Boosts contrast to make plate glyphs stand out from the background.
///
/// `boost` is a percentage as understood by `imageops::contrast`; the
/// default comes from [`crate::config::EvalConfig`].
pub fn enhance_contrast(image: &DynamicImage, boost: f32) -> DynamicImage {
    let rgba = image.to_rgba8();
    let adjusted = imageops::contrast(&rgba, boost);
    DynamicImage::ImageRgba8(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn test_enhance_contrast_preserves_dimensions() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(12, 7);
        let out = enhance_contrast(&DynamicImage::ImageRgba8(img), 12.0);
        assert_eq!((out.width(), out.height()), (12, 7));
    }

    #[test]
    fn test_enhance_contrast_spreads_values() {
        let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(2, 1);
        img.put_pixel(0, 0, Rgba([50, 50, 50, 255]));
        img.put_pixel(1, 0, Rgba([200, 200, 200, 255]));

        let out = enhance_contrast(&DynamicImage::ImageRgba8(img), 12.0).to_rgba8();

        // Dark pixels get darker, bright pixels brighter.
        assert!(out.get_pixel(0, 0)[0] < 50);
        assert!(out.get_pixel(1, 0)[0] > 200);
        // Alpha is untouched.
        assert_eq!(out.get_pixel(0, 0)[3], 255);
    }
}
