//! PDF page rasterization.
//!
//! The PDF decoder is an external collaborator behind the [`PageRenderer`]
//! trait: `PDF bytes -> page images`. The default implementation binds to a
//! PDFium library at runtime; tests substitute a stub renderer.

use crate::core::errors::DocumentError;
use crate::processors::geometry::Rect;
use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// One rasterized page of a document.
#[derive(Debug, Clone)]
pub struct Page {
    /// Zero-based page index.
    pub index: usize,
    /// Raster image of the page.
    pub image: RgbImage,
}

impl Page {
    /// Creates a page from an index and image.
    pub fn new(index: usize, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Page width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Page height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Full-page bounds as a rectangle at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width() as f32, self.height() as f32)
    }
}

/// An ordered sequence of rasterized pages, identified by source name.
/// Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source file name or caller-provided identifier.
    pub source: Arc<str>,
    /// Pages in document order.
    pub pages: Vec<Page>,
}

impl Document {
    /// Creates a document from a source name and page images.
    pub fn new(source: impl Into<Arc<str>>, images: Vec<RgbImage>) -> Self {
        let pages = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| Page::new(index, image))
            .collect();
        Self {
            source: source.into(),
            pages,
        }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Renders PDF pages to raster images at a target resolution.
///
/// Rendering is deterministic: the same input bytes and DPI produce the same
/// pixel data. A document with zero pages is valid and yields an empty list.
pub trait PageRenderer {
    /// Renders every page of the PDF in `bytes` at the given DPI.
    fn render_bytes(&self, bytes: &[u8], dpi: f32) -> Result<Vec<RgbImage>, DocumentError>;

    /// Renders every page of the PDF at `path` at the given DPI.
    fn render_file(&self, path: &Path, dpi: f32) -> Result<Vec<RgbImage>, DocumentError> {
        let bytes = std::fs::read(path).map_err(|e| DocumentError::Load(e.to_string()))?;
        self.render_bytes(&bytes, dpi)
    }
}

/// PDFium-backed page renderer.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    /// Rendered pages are scaled down so neither dimension exceeds this.
    max_dimension: u32,
}

impl PdfiumRasterizer {
    /// Default cap on the longer rendered dimension.
    pub const DEFAULT_MAX_DIMENSION: u32 = 4000;

    /// Binds to a PDFium library, trying common install locations before the
    /// system library.
    pub fn new() -> Result<Self, DocumentError> {
        let pdfium = Pdfium::new(
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                        "/usr/lib",
                    ))
                })
                .or_else(|_| {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                        "/usr/local/lib",
                    ))
                })
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| {
                    DocumentError::Backend(format!("could not find PDFium library: {e}"))
                })?,
        );

        Ok(Self {
            pdfium,
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
        })
    }

    /// Overrides the maximum rendered dimension.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    fn render_document_at(
        &self,
        document: &PdfDocument,
        dpi: f32,
    ) -> Result<Vec<RgbImage>, DocumentError> {
        let page_count = document.pages().len();
        let mut images = Vec::with_capacity(page_count as usize);

        for (index, page) in document.pages().iter().enumerate() {
            let image = self
                .render_page(&page, dpi)
                .map_err(|e| DocumentError::Render {
                    page: index,
                    message: e.to_string(),
                })?;
            images.push(image);
        }

        Ok(images)
    }

    fn render_page(&self, page: &PdfPage, dpi: f32) -> Result<RgbImage, PdfiumError> {
        let width_points = page.width().value;
        let height_points = page.height().value;

        // 72 points per inch.
        let scale = dpi / 72.0;
        let mut width_px = (width_points * scale) as u32;
        let mut height_px = (height_points * scale) as u32;

        if width_px > self.max_dimension || height_px > self.max_dimension {
            let ratio = if width_px > height_px {
                self.max_dimension as f32 / width_px as f32
            } else {
                self.max_dimension as f32 / height_px as f32
            };
            width_px = (width_px as f32 * ratio) as u32;
            height_px = (height_px as f32 * ratio) as u32;
        }

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page.render_with_config(&render_config)?;
        Ok(bitmap.as_image().to_rgb8())
    }
}

impl PageRenderer for PdfiumRasterizer {
    fn render_bytes(&self, bytes: &[u8], dpi: f32) -> Result<Vec<RgbImage>, DocumentError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| DocumentError::Load(e.to_string()))?;
        self.render_document_at(&document, dpi)
    }

    fn render_file(&self, path: &Path, dpi: f32) -> Result<Vec<RgbImage>, DocumentError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| DocumentError::Load(e.to_string()))?;
        self.render_document_at(&document, dpi)
    }
}

/// Returns true when `bytes` carry the PDF magic header.
pub fn is_pdf_bytes(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == b"%PDF"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_magic_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.7 ..."));
        assert!(!is_pdf_bytes(b"PNG"));
        assert!(!is_pdf_bytes(b""));
    }

    #[test]
    fn document_assigns_sequential_page_indices() {
        let images = vec![RgbImage::new(2, 2), RgbImage::new(3, 3)];
        let document = Document::new("plan.pdf", images);
        assert_eq!(document.page_count(), 2);
        assert_eq!(document.pages[0].index, 0);
        assert_eq!(document.pages[1].index, 1);
        assert_eq!(document.pages[1].width(), 3);
    }

    #[test]
    fn page_bounds_cover_the_image() {
        let page = Page::new(0, RgbImage::new(40, 30));
        assert_eq!(page.bounds(), Rect::new(0.0, 0.0, 40.0, 30.0));
    }
}
