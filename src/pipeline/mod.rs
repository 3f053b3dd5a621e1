//! The fixture-extraction pipeline.
//!
//! Stages run in a fixed order per page: rasterize, detect, OCR, group.
//! Pages are independent and run on the rayon pool when the document is
//! large enough; per-page failures are isolated into the report while
//! document-level failures (unreadable PDF, timeout) abort the run.

pub mod assemble;
pub mod detect;
pub mod group;
pub mod ocr;
pub mod rasterize;
pub mod schedule;
pub mod summary;

use crate::core::config::PipelineConfig;
use crate::core::errors::{DocumentError, PipelineError};
use assemble::{DocumentReport, FixtureRecord, PageFailure, ResultAssembler};
use detect::{SymbolDetector, TemplateSet};
use group::GroupingEngine;
use itertools::Itertools;
use ocr::{OcrReading, RegionOcr, RegionReader};
use rasterize::{Document, Page, PageRenderer};
use rayon::prelude::*;
use schedule::{GeneralNote, ScheduleRow};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Wall-clock budget for one document run.
struct Budget {
    start: Instant,
    limit: Option<Duration>,
}

impl Budget {
    fn new(limit_ms: Option<u64>) -> Self {
        Self {
            start: Instant::now(),
            limit: limit_ms.map(Duration::from_millis),
        }
    }

    /// Fails once the elapsed time reaches the limit. Partial results are
    /// discarded by the caller, never returned.
    fn check(&self) -> Result<(), PipelineError> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let elapsed = self.start.elapsed();
        if elapsed >= limit {
            return Err(PipelineError::Timeout {
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: limit.as_millis() as u64,
            });
        }
        Ok(())
    }
}

/// What one page contributes to the report.
struct PageOutcome {
    fixtures: Vec<FixtureRecord>,
    schedule: Vec<ScheduleRow>,
    notes: Vec<GeneralNote>,
}

/// End-to-end extraction pipeline over one document at a time.
pub struct Pipeline {
    renderer: Box<dyn PageRenderer>,
    reader: Box<dyn RegionReader>,
    config: PipelineConfig,
    templates: TemplateSet,
}

impl Pipeline {
    /// Creates a pipeline with the built-in glyph templates.
    pub fn new(
        renderer: Box<dyn PageRenderer>,
        reader: Box<dyn RegionReader>,
        config: PipelineConfig,
    ) -> Self {
        Self::with_templates(renderer, reader, config, TemplateSet::builtin().clone())
    }

    /// Creates a pipeline with an explicit template set.
    pub fn with_templates(
        renderer: Box<dyn PageRenderer>,
        reader: Box<dyn RegionReader>,
        config: PipelineConfig,
        templates: TemplateSet,
    ) -> Self {
        Self {
            renderer,
            reader,
            config,
            templates,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The page renderer backing this pipeline.
    pub fn renderer(&self) -> &dyn PageRenderer {
        self.renderer.as_ref()
    }

    /// Runs the pipeline over in-memory PDF bytes.
    pub fn process_bytes(&self, bytes: &[u8], source: &str) -> Result<DocumentReport, PipelineError> {
        if !rasterize::is_pdf_bytes(bytes) {
            return Err(DocumentError::Load("missing %PDF header".to_string()).into());
        }
        let budget = Budget::new(self.config.per_document_timeout_ms);
        let images = self.renderer.render_bytes(bytes, self.config.dpi)?;
        self.run(Document::new(source, images), &budget)
    }

    /// Runs the pipeline over a PDF file on disk.
    pub fn process_file(&self, path: &Path) -> Result<DocumentReport, PipelineError> {
        let budget = Budget::new(self.config.per_document_timeout_ms);
        let images = self.renderer.render_file(path, self.config.dpi)?;
        let source = path.to_string_lossy().into_owned();
        self.run(Document::new(source, images), &budget)
    }

    /// Runs the pipeline over an already-rasterized document.
    pub fn process_document(&self, document: Document) -> Result<DocumentReport, PipelineError> {
        let budget = Budget::new(self.config.per_document_timeout_ms);
        self.run(document, &budget)
    }

    fn run(&self, document: Document, budget: &Budget) -> Result<DocumentReport, PipelineError> {
        budget.check()?;

        let page_count = document.page_count();
        info!(source = %document.source, pages = page_count, "processing document");

        let assembler = ResultAssembler::new(document.source.clone(), page_count);

        // A zero-page document is valid: empty report, no error.
        let reader = self.reader.as_ref();
        let config = &self.config;
        let templates = &self.templates;

        let outcomes: Vec<(usize, Result<PageOutcome, String>)> =
            if page_count > config.parallel.page_threshold {
                document
                    .pages
                    .par_iter()
                    .map(|page| {
                        (
                            page.index,
                            process_page(page, templates, reader, config, &assembler),
                        )
                    })
                    .collect()
            } else {
                document
                    .pages
                    .iter()
                    .map(|page| {
                        (
                            page.index,
                            process_page(page, templates, reader, config, &assembler),
                        )
                    })
                    .collect()
            };

        budget.check()?;

        let mut fixtures = Vec::new();
        let mut errors = Vec::new();
        let mut schedule = Vec::new();
        let mut notes = Vec::new();
        for (page_index, outcome) in outcomes {
            match outcome {
                Ok(page) => {
                    fixtures.extend(page.fixtures);
                    schedule.extend(page.schedule);
                    notes.extend(page.notes);
                }
                Err(message) => {
                    warn!(page = page_index, %message, "page failed");
                    errors.push(PageFailure {
                        page_index,
                        message,
                    });
                }
            }
        }

        let report = assembler.assemble(fixtures, errors, schedule, notes);
        info!(
            source = %report.source,
            fixtures = report.fixtures.len(),
            failed_pages = report.errors.len(),
            "document processed"
        );
        Ok(report)
    }
}

/// Runs detection, OCR, and grouping over one page.
///
/// Detection failure fails the page; OCR failure on a candidate only loses
/// that candidate's readings.
fn process_page(
    page: &Page,
    templates: &TemplateSet,
    reader: &dyn RegionReader,
    config: &PipelineConfig,
    assembler: &ResultAssembler,
) -> Result<PageOutcome, String> {
    let detector = SymbolDetector::new(templates, config.binarize_threshold, config.match_threshold);
    let candidates = detector.detect(page).map_err(|e| e.to_string())?;

    let region_ocr = RegionOcr::new(reader, config.ocr_margin, config.ocr_confidence_floor);
    let mut readings: Vec<OcrReading> = Vec::new();
    for candidate in &candidates {
        match region_ocr.read_near(page, candidate) {
            Ok(found) => readings.extend(found),
            Err(error) => {
                warn!(page = page.index, %error, "region OCR failed, candidate left unlabeled");
            }
        }
    }
    // Overlapping search regions re-read the same text; keep one copy.
    let readings: Vec<OcrReading> = readings
        .into_iter()
        .unique_by(|reading| {
            (
                reading.text.to_string(),
                reading.bounds.x.to_bits(),
                reading.bounds.y.to_bits(),
            )
        })
        .collect();

    let engine = GroupingEngine::new(config.iou_threshold, config.distance_threshold);
    let groups = engine.group(page.index, candidates, readings);
    let fixtures = assembler.records_for_page(&groups, page.width(), page.height());

    let (schedule, notes) = if config.extract_schedule {
        match schedule::scan_page(page, reader, config.ocr_confidence_floor) {
            Ok(found) => found,
            Err(error) => {
                warn!(page = page.index, %error, "schedule scan failed");
                (Vec::new(), Vec::new())
            }
        }
    } else {
        (Vec::new(), Vec::new())
    };

    debug!(
        page = page.index,
        fixtures = fixtures.len(),
        schedule_rows = schedule.len(),
        notes = notes.len(),
        "page processed"
    );

    Ok(PageOutcome {
        fixtures,
        schedule,
        notes,
    })
}
