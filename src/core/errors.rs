//! Error types for the fixture-extraction pipeline.
//!
//! The taxonomy mirrors the pipeline's failure-isolation policy: document
//! level errors abort the whole request, page-level errors are captured as
//! per-page markers so the remaining pages continue, and region-level OCR
//! errors are non-fatal to the candidate that triggered them.

use thiserror::Error;

/// Errors raised while loading or rasterizing a PDF document.
///
/// These are fatal for the whole request: a corrupt or unreadable document
/// cannot produce a consistent report.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The PDF rendering backend could not be initialized.
    #[error("failed to initialize PDF backend: {0}")]
    Backend(String),

    /// The document bytes could not be parsed as a PDF.
    #[error("failed to load PDF document: {0}")]
    Load(String),

    /// A page existed but could not be rendered to an image.
    #[error("failed to render page {page}: {message}")]
    Render {
        /// Zero-based index of the page that failed.
        page: usize,
        /// Backend-provided failure description.
        message: String,
    },
}

/// Errors raised by the symbol detector on malformed page images.
///
/// Fatal for the affected page only; other pages of the same document
/// continue processing.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The page image has a zero dimension and cannot be scanned.
    #[error("page {page} image has invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Zero-based index of the malformed page.
        page: usize,
        /// Reported image width in pixels.
        width: u32,
        /// Reported image height in pixels.
        height: u32,
    },
}

/// Errors raised by the external OCR engine on a single region.
///
/// Non-fatal: the candidate that requested the reading proceeds with zero
/// attached text.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The region reader itself failed (for example on an unsupported image
    /// format).
    #[error("region reader failed: {message}")]
    Engine {
        /// Engine-provided failure description.
        message: String,
    },
}

impl OcrError {
    /// Wraps an arbitrary engine error into [`OcrError::Engine`].
    pub fn engine(source: impl std::fmt::Display) -> Self {
        Self::Engine {
            message: source.to_string(),
        }
    }
}

/// Top-level pipeline error surfaced to callers of
/// [`Pipeline::process_bytes`](crate::Pipeline::process_bytes).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The document could not be loaded or rasterized.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The per-document wall-clock budget was exceeded. Partial results are
    /// discarded so the output semantics stay consistent.
    #[error("document processing exceeded budget: {elapsed_ms}ms elapsed, {budget_ms}ms allowed")]
    Timeout {
        /// Wall-clock time spent before the budget check fired.
        elapsed_ms: u64,
        /// The configured budget.
        budget_ms: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_error_render_message_includes_page() {
        let err = DocumentError::Render {
            page: 3,
            message: "bad xref".to_string(),
        };
        assert!(err.to_string().contains("page 3"));
    }

    #[test]
    fn pipeline_error_wraps_document_error() {
        let err: PipelineError = DocumentError::Load("not a pdf".to_string()).into();
        assert!(matches!(err, PipelineError::Document(_)));
    }
}
