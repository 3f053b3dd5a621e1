//! Configuration for the fixture-extraction pipeline.

use serde::{Deserialize, Serialize};

/// Tunable thresholds and limits for one pipeline instance.
///
/// Defaults match the drawing convention the pipeline targets: 200 DPI
/// rasterization and shaded-rectangle fixture glyphs of roughly 500 to 5000
/// square pixels at that resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Rasterization resolution in dots per inch.
    #[serde(default = "PipelineConfig::default_dpi")]
    pub dpi: f32,

    /// Grayscale cutoff for the inverted binarization step. Pixels at or
    /// below this value are treated as ink.
    #[serde(default = "PipelineConfig::default_binarize_threshold")]
    pub binarize_threshold: u8,

    /// Minimum template similarity for a contour to become a candidate.
    #[serde(default = "PipelineConfig::default_match_threshold")]
    pub match_threshold: f32,

    /// OCR readings below this confidence are discarded, not returned.
    #[serde(default = "PipelineConfig::default_ocr_confidence_floor")]
    pub ocr_confidence_floor: f32,

    /// A candidate joins an existing group when its box overlaps the group's
    /// merged box by more than this IoU.
    #[serde(default = "PipelineConfig::default_iou_threshold")]
    pub iou_threshold: f32,

    /// Center-to-center distance (pixels) below which a candidate joins a
    /// group, and within which a reading may attach to a group.
    #[serde(default = "PipelineConfig::default_distance_threshold")]
    pub distance_threshold: f32,

    /// Margin (pixels) by which a candidate's box is expanded to form the
    /// OCR search region, clamped to page bounds.
    #[serde(default = "PipelineConfig::default_ocr_margin")]
    pub ocr_margin: u32,

    /// Wall-clock budget for one document. `None` means unbounded. When the
    /// budget is exceeded the whole document fails with a timeout rather than
    /// partial-returning.
    #[serde(default)]
    pub per_document_timeout_ms: Option<u64>,

    /// Whether to scan each page for the lighting-schedule table and general
    /// notes ("rulebook") used to resolve fixture descriptions.
    #[serde(default = "PipelineConfig::default_extract_schedule")]
    pub extract_schedule: bool,

    /// Parallelism policy for the per-page worker pool.
    #[serde(default)]
    pub parallel: ParallelPolicy,
}

impl PipelineConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rasterization DPI.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Sets the template-match threshold.
    pub fn with_match_threshold(mut self, threshold: f32) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Sets the OCR confidence floor.
    pub fn with_ocr_confidence_floor(mut self, floor: f32) -> Self {
        self.ocr_confidence_floor = floor;
        self
    }

    /// Sets the grouping IoU threshold.
    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Sets the grouping/attachment distance threshold in pixels.
    pub fn with_distance_threshold(mut self, threshold: f32) -> Self {
        self.distance_threshold = threshold;
        self
    }

    /// Sets the OCR region expansion margin in pixels.
    pub fn with_ocr_margin(mut self, margin: u32) -> Self {
        self.ocr_margin = margin;
        self
    }

    /// Sets the per-document wall-clock budget.
    pub fn with_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.per_document_timeout_ms = timeout_ms;
        self
    }

    /// Enables or disables rulebook extraction.
    pub fn with_schedule_extraction(mut self, enabled: bool) -> Self {
        self.extract_schedule = enabled;
        self
    }

    fn default_dpi() -> f32 {
        200.0
    }

    fn default_binarize_threshold() -> u8 {
        60
    }

    fn default_match_threshold() -> f32 {
        0.6
    }

    fn default_ocr_confidence_floor() -> f32 {
        0.5
    }

    fn default_iou_threshold() -> f32 {
        0.3
    }

    fn default_distance_threshold() -> f32 {
        40.0
    }

    fn default_ocr_margin() -> u32 {
        50
    }

    fn default_extract_schedule() -> bool {
        true
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: Self::default_dpi(),
            binarize_threshold: Self::default_binarize_threshold(),
            match_threshold: Self::default_match_threshold(),
            ocr_confidence_floor: Self::default_ocr_confidence_floor(),
            iou_threshold: Self::default_iou_threshold(),
            distance_threshold: Self::default_distance_threshold(),
            ocr_margin: Self::default_ocr_margin(),
            per_document_timeout_ms: None,
            extract_schedule: Self::default_extract_schedule(),
            parallel: ParallelPolicy::default(),
        }
    }
}

/// Parallel processing policy for page-level work.
///
/// Pages within one document are independent, so they are fanned out across
/// a worker pool. Small documents skip the pool entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of worker threads. `None` uses rayon's default pool
    /// size (typically the number of CPU cores).
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Documents with at most this many pages are processed sequentially.
    #[serde(default = "ParallelPolicy::default_page_threshold")]
    pub page_threshold: usize,
}

impl ParallelPolicy {
    /// Creates a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum worker thread count.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Sets the sequential-fallback page threshold.
    pub fn with_page_threshold(mut self, threshold: usize) -> Self {
        self.page_threshold = threshold;
        self
    }

    /// Installs the global rayon thread pool with the configured size.
    ///
    /// Call once at application startup, before any document is processed.
    /// Returns `Ok(false)` when `max_threads` is `None` (nothing to do) and
    /// an error if the global pool was already initialized.
    pub fn install_global_thread_pool(&self) -> Result<bool, rayon::ThreadPoolBuildError> {
        if let Some(num_threads) = self.max_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn default_page_threshold() -> usize {
        2
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            page_threshold: Self::default_page_threshold(),
        }
    }
}
