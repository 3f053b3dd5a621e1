//! Drawing fixture boxes onto page images for visual inspection.

use crate::pipeline::assemble::FixtureRecord;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as PixelRect;

const BOX_COLOR: Rgb<u8> = Rgb([0, 200, 0]);

/// Draws hollow rectangles around the fixtures detected on one page.
///
/// Records belonging to other pages are skipped, as are degenerate boxes.
pub fn annotate_page(image: &mut RgbImage, page_index: usize, fixtures: &[FixtureRecord]) {
    for fixture in fixtures.iter().filter(|f| f.page_index == page_index) {
        let w = fixture.bounding_box.w as u32;
        let h = fixture.bounding_box.h as u32;
        if w < 1 || h < 1 {
            continue;
        }
        let rect = PixelRect::at(
            fixture.bounding_box.x as i32,
            fixture.bounding_box.y as i32,
        )
        .of_size(w, h);
        draw_hollow_rect_mut(image, rect, BOX_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::geometry::Rect;

    fn record(page: usize, x: f32, y: f32, w: f32, h: f32) -> FixtureRecord {
        FixtureRecord {
            page_index: page,
            bounding_box: Rect::new(x, y, w, h),
            label_text: None,
            confidence: 0.9,
            clamped: false,
        }
    }

    #[test]
    fn draws_box_outline() {
        let mut image = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        annotate_page(&mut image, 0, &[record(0, 10.0, 10.0, 30.0, 20.0)]);

        assert_eq!(*image.get_pixel(10, 10), BOX_COLOR);
        assert_eq!(*image.get_pixel(39, 29), BOX_COLOR);
        // Interior stays untouched.
        assert_eq!(*image.get_pixel(20, 20), Rgb([255, 255, 255]));
    }

    #[test]
    fn skips_other_pages_and_degenerate_boxes() {
        let mut image = RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]));
        annotate_page(
            &mut image,
            0,
            &[record(1, 5.0, 5.0, 10.0, 10.0), record(0, 5.0, 5.0, 0.4, 0.4)],
        );
        assert!(image.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }
}
