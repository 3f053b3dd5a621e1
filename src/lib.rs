//! Emergency-lighting fixture extraction from scanned blueprint PDFs.
//!
//! This crate implements a bounded, sequential-per-page image-processing
//! pipeline over construction-blueprint documents:
//!
//! 1. Rasterize each PDF page to an RGB image at a fixed DPI.
//! 2. Detect candidate fixture symbols by contour extraction and glyph
//!    template matching.
//! 3. OCR small regions around each candidate for labels and circuit tags.
//! 4. Collapse duplicate/overlapping candidates into fixture groups and
//!    attach nearby readings.
//! 5. Assemble per-page fixture records, the lighting-schedule rulebook, and
//!    a per-symbol summary into a [`DocumentReport`].
//!
//! The PDF decoder and the OCR engine are external collaborators behind
//! narrow seams ([`PageRenderer`] and [`RegionReader`]) so the core logic is
//! testable with stubbed implementations.
//!
//! # Example
//!
//! ```rust,no_run
//! use emlight::{NullReader, PdfiumRasterizer, Pipeline, PipelineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rasterizer = PdfiumRasterizer::new()?;
//! let pipeline = Pipeline::new(
//!     Box::new(rasterizer),
//!     Box::new(NullReader),
//!     PipelineConfig::default(),
//! );
//! let report = pipeline.process_file("floorplan.pdf".as_ref())?;
//! for fixture in &report.fixtures {
//!     println!("page {}: {:?}", fixture.page_index, fixture.label_text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod pipeline;
pub mod processors;
pub mod utils;

pub use crate::core::config::{ParallelPolicy, PipelineConfig};
pub use crate::core::errors::{
    DetectionError, DocumentError, OcrError, PipelineError,
};
pub use crate::pipeline::assemble::{DocumentReport, FixtureRecord, PageFailure};
pub use crate::pipeline::detect::{Candidate, GlyphTemplate, ShapeDescriptor, SymbolDetector, TemplateSet};
pub use crate::pipeline::group::{FixtureGroup, GroupingEngine};
pub use crate::pipeline::ocr::{NullReader, OcrReading, RegionOcr, RegionReader, TextFragment};
pub use crate::pipeline::rasterize::{Document, Page, PageRenderer, PdfiumRasterizer};
pub use crate::pipeline::schedule::{GeneralNote, ScheduleRow};
pub use crate::pipeline::summary::FixtureTally;
pub use crate::pipeline::Pipeline;
pub use crate::processors::geometry::{Point, Rect};
