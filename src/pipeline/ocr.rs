//! OCR over candidate regions of interest.
//!
//! The OCR engine itself is an external collaborator modeled as a pure
//! function `region image -> text readings` behind the [`RegionReader`]
//! trait. This module owns region computation (margin expansion, clamping to
//! page bounds), confidence thresholding, and translation of reading boxes
//! back into page coordinates.

use crate::core::errors::OcrError;
use crate::pipeline::detect::Candidate;
use crate::pipeline::rasterize::Page;
use crate::processors::geometry::Rect;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One recognized text fragment in region-local coordinates, as returned by
/// the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFragment {
    /// Recognized text.
    pub text: String,
    /// Bounding box within the region image.
    pub bounds: Rect,
    /// Engine confidence in [0, 1].
    pub confidence: f32,
}

/// A recognized text reading in page coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrReading {
    /// Recognized text.
    pub text: Arc<str>,
    /// Source bounding box in page pixel coordinates.
    pub bounds: Rect,
    /// Engine confidence in [0, 1].
    pub confidence: f32,
}

/// Black-box text recognition over a small image region.
///
/// Implementations must be shareable across the page worker pool.
pub trait RegionReader: Send + Sync {
    /// Recognizes text in `region`, returning fragments in region-local
    /// coordinates.
    fn read_region(&self, region: &RgbImage) -> Result<Vec<TextFragment>, OcrError>;
}

/// A reader that recognizes nothing. Useful when no OCR engine is wired in:
/// the pipeline still detects and groups fixtures, just without labels.
pub struct NullReader;

impl RegionReader for NullReader {
    fn read_region(&self, _region: &RgbImage) -> Result<Vec<TextFragment>, OcrError> {
        Ok(Vec::new())
    }
}

/// Runs the region reader around detection candidates.
pub struct RegionOcr<'a> {
    reader: &'a dyn RegionReader,
    margin: u32,
    confidence_floor: f32,
}

impl<'a> RegionOcr<'a> {
    /// Creates a region OCR stage.
    ///
    /// `margin` is the pixel expansion applied to candidate boxes;
    /// `confidence_floor` discards low-confidence readings.
    pub fn new(reader: &'a dyn RegionReader, margin: u32, confidence_floor: f32) -> Self {
        Self {
            reader,
            margin,
            confidence_floor,
        }
    }

    /// Computes the search region for a candidate: its box expanded by the
    /// margin and clamped to the page.
    pub fn search_region(&self, page: &Page, candidate: &Candidate) -> Rect {
        candidate
            .bounds
            .expand(self.margin as f32)
            .clamp_to(page.width() as f32, page.height() as f32)
    }

    /// Reads text near one candidate.
    ///
    /// Readings below the confidence floor are discarded, not returned.
    /// Reading boxes are translated into page coordinates.
    pub fn read_near(
        &self,
        page: &Page,
        candidate: &Candidate,
    ) -> Result<Vec<OcrReading>, OcrError> {
        let roi = self.search_region(page, candidate);
        if roi.is_empty() {
            return Ok(Vec::new());
        }

        let region = image::imageops::crop_imm(
            &page.image,
            roi.x as u32,
            roi.y as u32,
            roi.w as u32,
            roi.h as u32,
        )
        .to_image();

        let fragments = self.reader.read_region(&region)?;

        Ok(fragments
            .into_iter()
            .filter(|fragment| fragment.confidence >= self.confidence_floor)
            .map(|fragment| OcrReading {
                text: Arc::from(fragment.text),
                bounds: Rect::new(
                    roi.x + fragment.bounds.x,
                    roi.y + fragment.bounds.y,
                    fragment.bounds.w,
                    fragment.bounds.h,
                ),
                confidence: fragment.confidence,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    struct FixedReader {
        fragments: Vec<TextFragment>,
    }

    impl RegionReader for FixedReader {
        fn read_region(&self, _region: &RgbImage) -> Result<Vec<TextFragment>, OcrError> {
            Ok(self.fragments.clone())
        }
    }

    struct FailingReader;

    impl RegionReader for FailingReader {
        fn read_region(&self, _region: &RgbImage) -> Result<Vec<TextFragment>, OcrError> {
            Err(OcrError::engine("unsupported image format"))
        }
    }

    fn test_page() -> Page {
        Page::new(0, RgbImage::from_pixel(200, 100, Rgb([255, 255, 255])))
    }

    fn candidate(x: f32, y: f32, w: f32, h: f32) -> Candidate {
        Candidate {
            bounds: Rect::new(x, y, w, h),
            confidence: 0.9,
            template_id: "em-troffer".to_string(),
        }
    }

    #[test]
    fn search_region_is_expanded_and_clamped() {
        let page = test_page();
        let reader = NullReader;
        let ocr = RegionOcr::new(&reader, 50, 0.5);

        let region = ocr.search_region(&page, &candidate(180.0, 80.0, 15.0, 15.0));
        assert_eq!(region.x, 130.0);
        assert_eq!(region.y, 30.0);
        // Clamped to the 200x100 page.
        assert_eq!(region.right(), 200.0);
        assert_eq!(region.bottom(), 100.0);
    }

    #[test]
    fn low_confidence_readings_are_discarded() {
        let reader = FixedReader {
            fragments: vec![
                TextFragment {
                    text: "EM-1".to_string(),
                    bounds: Rect::new(5.0, 5.0, 30.0, 10.0),
                    confidence: 0.9,
                },
                TextFragment {
                    text: "noise".to_string(),
                    bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
                    confidence: 0.2,
                },
            ],
        };
        let page = test_page();
        let ocr = RegionOcr::new(&reader, 10, 0.5);

        let readings = ocr.read_near(&page, &candidate(50.0, 40.0, 20.0, 10.0)).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].text.as_ref(), "EM-1");
    }

    #[test]
    fn reading_boxes_are_translated_to_page_coordinates() {
        let reader = FixedReader {
            fragments: vec![TextFragment {
                text: "A1E".to_string(),
                bounds: Rect::new(5.0, 6.0, 20.0, 8.0),
                confidence: 0.8,
            }],
        };
        let page = test_page();
        let ocr = RegionOcr::new(&reader, 10, 0.5);

        // ROI starts at (40, 30) after margin expansion.
        let readings = ocr.read_near(&page, &candidate(50.0, 40.0, 20.0, 10.0)).unwrap();
        assert_eq!(readings[0].bounds, Rect::new(45.0, 36.0, 20.0, 8.0));
    }

    #[test]
    fn engine_failure_surfaces_as_ocr_error() {
        let page = test_page();
        let ocr = RegionOcr::new(&FailingReader, 10, 0.5);
        let err = ocr.read_near(&page, &candidate(50.0, 40.0, 20.0, 10.0)).unwrap_err();
        assert!(matches!(err, OcrError::Engine { .. }));
    }
}
