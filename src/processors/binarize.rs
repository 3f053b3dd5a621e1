//! Page preprocessing for symbol detection.
//!
//! Blueprint symbols are drawn as dark (shaded) shapes on a light background.
//! Detection works on an inverted binary mask: ink pixels become foreground,
//! then a morphological close heals the small gaps left by scan noise.

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Converts an RGB page image to grayscale.
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Builds an inverted binary mask: pixels at or below `cutoff` become
/// foreground (255), everything else background (0).
pub fn threshold_inverted(gray: &GrayImage, cutoff: u8) -> GrayImage {
    let mut mask = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel[0] <= cutoff { 255 } else { 0 };
        mask.put_pixel(x, y, Luma([value]));
    }
    mask
}

/// Morphological close with a Chebyshev radius of 1, closing single-pixel
/// gaps in the mask before contour extraction.
pub fn close_mask(mask: &GrayImage) -> GrayImage {
    morphology::close(mask, Norm::LInf, 1)
}

/// Full preprocessing chain for one page: grayscale, inverted threshold,
/// close.
pub fn symbol_mask(image: &RgbImage, cutoff: u8) -> GrayImage {
    let gray = to_grayscale(image);
    let mask = threshold_inverted(&gray, cutoff);
    close_mask(&mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn white_page(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    #[test]
    fn threshold_marks_dark_pixels_as_foreground() {
        let mut page = white_page(4, 4);
        page.put_pixel(1, 1, Rgb([0, 0, 0]));
        page.put_pixel(2, 2, Rgb([200, 200, 200]));

        let mask = threshold_inverted(&to_grayscale(&page), 60);
        assert_eq!(mask.get_pixel(1, 1)[0], 255);
        assert_eq!(mask.get_pixel(2, 2)[0], 0);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn close_heals_single_pixel_gap() {
        let mut mask = GrayImage::new(9, 5);
        // Horizontal bar with a one-pixel hole in the middle.
        for x in 1..8 {
            for y in 1..4 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask.put_pixel(4, 2, Luma([0]));

        let closed = close_mask(&mask);
        assert_eq!(closed.get_pixel(4, 2)[0], 255);
    }

    #[test]
    fn symbol_mask_of_blank_page_is_empty() {
        let mask = symbol_mask(&white_page(8, 8), 60);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }
}
