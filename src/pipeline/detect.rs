//! Symbol detection by contour extraction and glyph template matching.
//!
//! Emergency-lighting fixtures appear on the target drawing convention as
//! shaded rectangular glyphs. The detector binarizes the page, extracts
//! outer contours, summarizes each contour as a [`ShapeDescriptor`], and
//! scores it against every template in the [`TemplateSet`]. Every
//! template whose similarity clears the match threshold yields one
//! [`Candidate`]; resolving overlapping hits for the same physical symbol is
//! deliberately left to the grouping stage.

use crate::core::errors::DetectionError;
use crate::pipeline::rasterize::Page;
use crate::processors::binarize::symbol_mask;
use crate::processors::geometry::Rect;
use imageproc::contours::{find_contours, Contour};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single raw detection before deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Bounding box in page pixel coordinates, clamped to page bounds.
    pub bounds: Rect,
    /// Template similarity in [0, 1].
    pub confidence: f32,
    /// Identifier of the matched glyph template.
    pub template_id: String,
}

/// Shape summary of one extracted contour.
#[derive(Debug, Clone, Copy)]
pub struct ShapeDescriptor {
    /// Bounding-box width in pixels.
    pub width: f32,
    /// Bounding-box height in pixels.
    pub height: f32,
    /// Contour area by the shoelace formula.
    pub area: f32,
    /// Contour area divided by bounding-box area.
    pub extent: f32,
}

impl ShapeDescriptor {
    /// Width over height of the bounding box.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height <= 0.0 {
            return 0.0;
        }
        self.width / self.height
    }
}

/// Reference descriptor for one known fixture glyph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphTemplate {
    /// Stable identifier recorded on matched candidates.
    pub id: String,
    /// Human-readable fixture description.
    pub description: String,
    /// Nominal width-over-height of the glyph.
    pub aspect_ratio: f32,
    /// Nominal fill ratio (contour area over box area).
    pub extent: f32,
    /// Smallest plausible glyph area in square pixels.
    pub min_area: f32,
    /// Largest plausible glyph area in square pixels.
    pub max_area: f32,
}

impl GlyphTemplate {
    /// Similarity between this template and an extracted shape, in [0, 1].
    ///
    /// Shapes outside the template's area window score 0. Otherwise aspect
    /// ratio and extent each contribute a normalized closeness term, with
    /// aspect ratio weighted more heavily since it separates the fixture
    /// glyph classes.
    pub fn similarity(&self, shape: &ShapeDescriptor) -> f32 {
        if shape.area < self.min_area || shape.area > self.max_area {
            return 0.0;
        }

        let aspect_term =
            ((shape.aspect_ratio() - self.aspect_ratio).abs() / self.aspect_ratio).min(1.0);
        let extent_term = (shape.extent - self.extent).abs().min(1.0);

        (0.6 * (1.0 - aspect_term) + 0.4 * (1.0 - extent_term)).clamp(0.0, 1.0)
    }
}

/// A read-only set of glyph templates shared across all page tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSet {
    templates: Vec<GlyphTemplate>,
}

static BUILTIN_TEMPLATES: Lazy<TemplateSet> = Lazy::new(|| {
    TemplateSet::new(vec![
        GlyphTemplate {
            id: "em-troffer".to_string(),
            description: "2x4 LED emergency troffer".to_string(),
            aspect_ratio: 2.0,
            extent: 0.85,
            min_area: 500.0,
            max_area: 5000.0,
        },
        GlyphTemplate {
            id: "em-strip".to_string(),
            description: "Linear emergency strip fixture".to_string(),
            aspect_ratio: 3.4,
            extent: 0.8,
            min_area: 500.0,
            max_area: 5000.0,
        },
        GlyphTemplate {
            id: "em-wallpack".to_string(),
            description: "Wall-mounted emergency unit".to_string(),
            aspect_ratio: 1.6,
            extent: 0.85,
            min_area: 300.0,
            max_area: 3000.0,
        },
    ])
});

impl TemplateSet {
    /// Creates a template set from explicit templates.
    pub fn new(templates: Vec<GlyphTemplate>) -> Self {
        Self { templates }
    }

    /// The process-wide built-in template set, initialized once and never
    /// mutated afterwards.
    pub fn builtin() -> &'static TemplateSet {
        &BUILTIN_TEMPLATES
    }

    /// Iterates over the templates.
    pub fn iter(&self) -> impl Iterator<Item = &GlyphTemplate> {
        self.templates.iter()
    }

    /// Number of templates in the set.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true when the set holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// All templates whose similarity to `shape` reaches `threshold`,
    /// with their scores.
    pub fn matches<'a>(
        &'a self,
        shape: &'a ShapeDescriptor,
        threshold: f32,
    ) -> impl Iterator<Item = (&'a GlyphTemplate, f32)> + 'a {
        self.templates.iter().filter_map(move |template| {
            let score = template.similarity(shape);
            (score >= threshold).then_some((template, score))
        })
    }
}

/// Scans rasterized pages for fixture glyphs.
///
/// Read-only over the page; produces a finite (possibly empty) candidate
/// sequence.
pub struct SymbolDetector<'a> {
    templates: &'a TemplateSet,
    binarize_threshold: u8,
    match_threshold: f32,
    max_candidates: usize,
}

impl<'a> SymbolDetector<'a> {
    /// Upper bound on candidates per page; pages denser than this are noise.
    pub const MAX_CANDIDATES: usize = 1000;

    /// Minimum contour bounding-box side in pixels.
    const MIN_SIDE: f32 = 3.0;

    /// Creates a detector over the given template set.
    pub fn new(templates: &'a TemplateSet, binarize_threshold: u8, match_threshold: f32) -> Self {
        Self {
            templates,
            binarize_threshold,
            match_threshold,
            max_candidates: Self::MAX_CANDIDATES,
        }
    }

    /// Overrides the per-page candidate cap.
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Detects fixture-glyph candidates on one page.
    pub fn detect(&self, page: &Page) -> Result<Vec<Candidate>, DetectionError> {
        let width = page.width();
        let height = page.height();
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidDimensions {
                page: page.index,
                width,
                height,
            });
        }

        let mask = symbol_mask(&page.image, self.binarize_threshold);
        let contours: Vec<Contour<u32>> = find_contours(&mask);

        let mut candidates = Vec::new();
        for contour in contours.iter().filter(|c| c.parent.is_none()) {
            if candidates.len() >= self.max_candidates {
                break;
            }

            let Some(shape) = describe_contour(contour) else {
                continue;
            };
            if shape.width < Self::MIN_SIDE || shape.height < Self::MIN_SIDE {
                continue;
            }

            let bounds = contour_bounds(contour)
                .clamp_to(width as f32, height as f32);

            for (template, score) in self.templates.matches(&shape, self.match_threshold) {
                candidates.push(Candidate {
                    bounds,
                    confidence: score,
                    template_id: template.id.clone(),
                });
            }
        }

        debug!(
            page = page.index,
            contours = contours.len(),
            candidates = candidates.len(),
            "symbol detection finished"
        );

        Ok(candidates)
    }
}

/// Axis-aligned bounding box of a contour, inclusive of its border pixels.
fn contour_bounds(contour: &Contour<u32>) -> Rect {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    for point in &contour.points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    Rect::new(
        min_x as f32,
        min_y as f32,
        (max_x - min_x + 1) as f32,
        (max_y - min_y + 1) as f32,
    )
}

/// Builds a shape descriptor for a contour, or `None` for degenerate
/// contours.
fn describe_contour(contour: &Contour<u32>) -> Option<ShapeDescriptor> {
    if contour.points.len() < 3 {
        return None;
    }

    let bounds = contour_bounds(contour);
    let area = shoelace_area(contour);
    if area <= 0.0 || bounds.area() <= 0.0 {
        return None;
    }

    Some(ShapeDescriptor {
        width: bounds.w,
        height: bounds.h,
        area,
        extent: (area / bounds.area()).min(1.0),
    })
}

/// Polygon area of the contour's boundary points by the shoelace formula.
fn shoelace_area(contour: &Contour<u32>) -> f32 {
    let points = &contour.points;
    let n = points.len();
    let mut area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x as f64 * points[j].y as f64;
        area -= points[j].x as f64 * points[i].y as f64;
    }
    (area.abs() / 2.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect as PixelRect;

    fn page_with_fixture(x: i32, y: i32, w: u32, h: u32) -> Page {
        let mut image = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
        draw_filled_rect_mut(
            &mut image,
            PixelRect::at(x, y).of_size(w, h),
            Rgb([0, 0, 0]),
        );
        Page::new(0, image)
    }

    #[test]
    fn detects_shaded_rectangle() {
        let page = page_with_fixture(50, 60, 80, 40);
        let detector = SymbolDetector::new(TemplateSet::builtin(), 60, 0.6);
        let candidates = detector.detect(&page).unwrap();

        assert!(!candidates.is_empty());
        let best = candidates
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .unwrap();
        assert_eq!(best.template_id, "em-troffer");
        assert!(best.confidence > 0.85, "confidence: {}", best.confidence);
        // Bounding box should cover the drawn rectangle.
        assert!((best.bounds.x - 50.0).abs() <= 2.0);
        assert!((best.bounds.y - 60.0).abs() <= 2.0);
        assert!((best.bounds.w - 80.0).abs() <= 3.0);
        assert!((best.bounds.h - 40.0).abs() <= 3.0);
    }

    #[test]
    fn blank_page_yields_no_candidates() {
        let page = Page::new(0, RgbImage::from_pixel(200, 200, Rgb([255, 255, 255])));
        let detector = SymbolDetector::new(TemplateSet::builtin(), 60, 0.6);
        assert!(detector.detect(&page).unwrap().is_empty());
    }

    #[test]
    fn tiny_speck_is_filtered_out() {
        let page = page_with_fixture(10, 10, 4, 4);
        let detector = SymbolDetector::new(TemplateSet::builtin(), 60, 0.6);
        // Area 16 is far below every template's minimum.
        assert!(detector.detect(&page).unwrap().is_empty());
    }

    #[test]
    fn zero_dimension_page_is_a_detection_error() {
        let page = Page::new(2, RgbImage::new(0, 0));
        let detector = SymbolDetector::new(TemplateSet::builtin(), 60, 0.6);
        let err = detector.detect(&page).unwrap_err();
        assert!(matches!(
            err,
            DetectionError::InvalidDimensions { page: 2, .. }
        ));
    }

    #[test]
    fn overlapping_templates_yield_multiple_candidates() {
        // Aspect ratio between the troffer and strip nominals so both clear
        // a permissive threshold.
        let page = page_with_fixture(50, 60, 81, 30);
        let detector = SymbolDetector::new(TemplateSet::builtin(), 60, 0.5);
        let candidates = detector.detect(&page).unwrap();
        assert!(
            candidates.len() >= 2,
            "expected multiple template hits, got {}",
            candidates.len()
        );
    }

    #[test]
    fn similarity_is_zero_outside_area_window() {
        let template = &TemplateSet::builtin().templates[0];
        let shape = ShapeDescriptor {
            width: 300.0,
            height: 150.0,
            area: 45_000.0,
            extent: 1.0,
        };
        assert_eq!(template.similarity(&shape), 0.0);
    }

    #[test]
    fn exact_shape_scores_near_one() {
        let template = &TemplateSet::builtin().templates[0];
        let shape = ShapeDescriptor {
            width: 80.0,
            height: 40.0,
            area: 0.85 * 80.0 * 40.0,
            extent: 0.85,
        };
        assert!((template.similarity(&shape) - 1.0).abs() < 1e-5);
    }
}
