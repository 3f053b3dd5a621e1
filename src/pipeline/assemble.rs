//! Assembly of per-page grouping output into the final document report.
//!
//! The assembler is the only stage that sees the whole document at once. It
//! clamps group boxes to their page, flattens groups into flat fixture
//! records, imposes the canonical record ordering, and builds the
//! per-symbol summary.

use crate::pipeline::group::FixtureGroup;
use crate::pipeline::schedule::{GeneralNote, ScheduleRow};
use crate::pipeline::summary::{self, FixtureTally};
use crate::processors::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// One detected emergency-lighting fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureRecord {
    /// Zero-based page index.
    pub page_index: usize,
    /// Fixture bounding box in page pixel coordinates.
    pub bounding_box: Rect,
    /// Fixture symbol read near the fixture, when one was found.
    pub label_text: Option<Arc<str>>,
    /// Detection confidence in [0, 1].
    pub confidence: f32,
    /// True when the box had to be clamped to the page during assembly.
    pub clamped: bool,
}

/// A page the pipeline gave up on, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFailure {
    /// Zero-based page index.
    pub page_index: usize,
    /// Human-readable failure description.
    pub message: String,
}

/// The complete extraction result for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Source path or identifier of the document.
    pub source: Arc<str>,
    /// Number of pages the document rendered to.
    pub page_count: usize,
    /// Detected fixtures, ordered by page then top-left position.
    pub fixtures: Vec<FixtureRecord>,
    /// Pages that failed, in page order.
    pub errors: Vec<PageFailure>,
    /// Lighting-schedule rows recognized in the document.
    pub schedule: Vec<ScheduleRow>,
    /// Emergency-power general notes recognized in the document.
    pub notes: Vec<GeneralNote>,
    /// Fixture tallies keyed by normalized symbol.
    pub summary: BTreeMap<String, FixtureTally>,
}

impl fmt::Display for DocumentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} fixture(s) across {} page(s)",
            self.source,
            self.fixtures.len(),
            self.page_count
        )?;
        for (symbol, tally) in &self.summary {
            writeln!(f, "  {:>4}x {} - {}", tally.count, symbol, tally.description)?;
        }
        if !self.errors.is_empty() {
            writeln!(f, "  {} page(s) failed:", self.errors.len())?;
            for failure in &self.errors {
                writeln!(f, "    page {}: {}", failure.page_index, failure.message)?;
            }
        }
        Ok(())
    }
}

/// Builds the document report from per-page grouping output.
pub struct ResultAssembler {
    source: Arc<str>,
    page_count: usize,
}

impl ResultAssembler {
    /// Creates an assembler for one document.
    pub fn new(source: Arc<str>, page_count: usize) -> Self {
        Self { source, page_count }
    }

    /// Flattens one page's groups into records, clamping boxes that leak
    /// past the page edge.
    pub fn records_for_page(
        &self,
        groups: &[FixtureGroup],
        page_width: u32,
        page_height: u32,
    ) -> Vec<FixtureRecord> {
        groups
            .iter()
            .map(|group| {
                let clamped_box = group
                    .bounds
                    .clamp_to(page_width as f32, page_height as f32);
                let clamped = clamped_box != group.bounds;
                if clamped {
                    warn!(
                        page = group.page_index,
                        x = group.bounds.x,
                        y = group.bounds.y,
                        "fixture box clamped to page bounds"
                    );
                }
                FixtureRecord {
                    page_index: group.page_index,
                    bounding_box: clamped_box,
                    label_text: group.label(),
                    confidence: group.confidence(),
                    clamped,
                }
            })
            .collect()
    }

    /// Assembles the final report: canonical record ordering, page-ordered
    /// failures, and the per-symbol summary.
    pub fn assemble(
        &self,
        mut fixtures: Vec<FixtureRecord>,
        mut errors: Vec<PageFailure>,
        schedule: Vec<ScheduleRow>,
        notes: Vec<GeneralNote>,
    ) -> DocumentReport {
        fixtures.sort_by(|a, b| {
            a.page_index
                .cmp(&b.page_index)
                .then(a.bounding_box.y.total_cmp(&b.bounding_box.y))
                .then(a.bounding_box.x.total_cmp(&b.bounding_box.x))
        });
        errors.sort_by_key(|failure| failure.page_index);

        let summary = summary::summarize(&fixtures, &schedule);

        DocumentReport {
            source: Arc::clone(&self.source),
            page_count: self.page_count,
            fixtures,
            errors,
            schedule,
            notes,
            summary,
        }
    }
}
