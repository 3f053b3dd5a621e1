//! End-to-end pipeline tests with stubbed PDF rendering and OCR.

use emlight::{
    Document, DocumentError, NullReader, OcrError, PageRenderer, Pipeline, PipelineConfig,
    PipelineError, Rect, RegionReader, TextFragment,
};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;

/// A renderer that returns canned page images for any input.
struct StubRenderer {
    pages: Vec<RgbImage>,
}

impl PageRenderer for StubRenderer {
    fn render_bytes(&self, _bytes: &[u8], _dpi: f32) -> Result<Vec<RgbImage>, DocumentError> {
        Ok(self.pages.clone())
    }
}

/// A reader that returns the same fragments for every region.
struct ScriptedReader {
    fragments: Vec<TextFragment>,
}

impl RegionReader for ScriptedReader {
    fn read_region(&self, _region: &RgbImage) -> Result<Vec<TextFragment>, OcrError> {
        Ok(self.fragments.clone())
    }
}

/// A reader whose engine fails on every region.
struct FailingReader;

impl RegionReader for FailingReader {
    fn read_region(&self, _region: &RgbImage) -> Result<Vec<TextFragment>, OcrError> {
        Err(OcrError::engine("decoder crashed"))
    }
}

/// A 400x300 white page with one shaded fixture glyph at (x, y).
fn page_with_fixture(x: i32, y: i32) -> RgbImage {
    let mut image = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
    draw_filled_rect_mut(&mut image, PixelRect::at(x, y).of_size(80, 40), Rgb([0, 0, 0]));
    image
}

#[test]
fn detects_and_labels_one_fixture() {
    let renderer = StubRenderer {
        pages: vec![page_with_fixture(100, 100)],
    };
    // A label fragment near the glyph: local (60, 60) within the expanded
    // search region maps to page (110, 110), inside the fixture box.
    let reader = ScriptedReader {
        fragments: vec![TextFragment {
            text: "EM-1".to_string(),
            bounds: Rect::new(60.0, 60.0, 30.0, 10.0),
            confidence: 0.9,
        }],
    };

    let pipeline = Pipeline::new(
        Box::new(renderer),
        Box::new(reader),
        PipelineConfig::default(),
    );
    let report = pipeline.process_bytes(b"%PDF-stub", "plan.pdf").unwrap();

    assert_eq!(report.page_count, 1);
    // Multiple templates may hit the same glyph; grouping collapses them.
    assert_eq!(report.fixtures.len(), 1);
    let fixture = &report.fixtures[0];
    assert_eq!(fixture.label_text.as_deref(), Some("EM-1"));
    assert!(fixture.confidence > 0.8);
    assert!(report.errors.is_empty());

    assert_eq!(report.summary["EM-1"].count, 1);
    assert_eq!(report.summary["EM-1"].description, "Generic Emergency Light");
}

#[test]
fn ocr_engine_failure_leaves_fixture_unlabeled() {
    let document = Document::new("plan.pdf", vec![page_with_fixture(100, 100)]);
    let pipeline = Pipeline::new(
        Box::new(StubRenderer { pages: Vec::new() }),
        Box::new(FailingReader),
        PipelineConfig::default(),
    );

    let report = pipeline.process_document(document).unwrap();

    // Engine failure loses the readings, never the fixture or the page.
    assert_eq!(report.fixtures.len(), 1);
    assert!(report.fixtures[0].label_text.is_none());
    assert!(report.errors.is_empty());
    assert!(report.schedule.is_empty());
    assert_eq!(report.summary["UNKNOWN"].count, 1);
}

#[test]
fn non_pdf_bytes_are_rejected_before_rendering() {
    let pipeline = Pipeline::new(
        Box::new(StubRenderer {
            pages: vec![page_with_fixture(100, 100)],
        }),
        Box::new(NullReader),
        PipelineConfig::default(),
    );

    let err = pipeline.process_bytes(b"PNG not a pdf", "image.png").unwrap_err();
    assert!(matches!(err, PipelineError::Document(DocumentError::Load(_))));
}

#[test]
fn bad_page_is_isolated_from_good_pages() {
    let document = Document::new(
        "mixed.pdf",
        vec![page_with_fixture(100, 100), RgbImage::new(0, 0)],
    );
    let pipeline = Pipeline::new(
        Box::new(StubRenderer { pages: Vec::new() }),
        Box::new(NullReader),
        PipelineConfig::default(),
    );

    let report = pipeline.process_document(document).unwrap();

    assert_eq!(report.page_count, 2);
    assert_eq!(report.fixtures.len(), 1);
    assert_eq!(report.fixtures[0].page_index, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].page_index, 1);
}

#[test]
fn empty_document_yields_empty_report() {
    let pipeline = Pipeline::new(
        Box::new(StubRenderer { pages: Vec::new() }),
        Box::new(NullReader),
        PipelineConfig::default(),
    );

    let report = pipeline.process_bytes(b"%PDF-stub", "empty.pdf").unwrap();

    assert_eq!(report.page_count, 0);
    assert!(report.fixtures.is_empty());
    assert!(report.errors.is_empty());
    assert!(report.summary.is_empty());
}

#[test]
fn repeated_runs_produce_identical_reports() {
    let make_document = || {
        Document::new(
            "plan.pdf",
            vec![page_with_fixture(100, 100), page_with_fixture(200, 150)],
        )
    };
    let pipeline = Pipeline::new(
        Box::new(StubRenderer { pages: Vec::new() }),
        Box::new(NullReader),
        PipelineConfig::default(),
    );

    let first = pipeline.process_document(make_document()).unwrap();
    let second = pipeline.process_document(make_document()).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn parallel_pass_keeps_canonical_ordering() {
    // Three pages exceed the default sequential threshold of two.
    let document = Document::new(
        "big.pdf",
        vec![
            page_with_fixture(250, 200),
            page_with_fixture(100, 100),
            page_with_fixture(50, 50),
        ],
    );
    let pipeline = Pipeline::new(
        Box::new(StubRenderer { pages: Vec::new() }),
        Box::new(NullReader),
        PipelineConfig::default(),
    );

    let report = pipeline.process_document(document).unwrap();

    assert_eq!(report.fixtures.len(), 3);
    let pages: Vec<usize> = report.fixtures.iter().map(|f| f.page_index).collect();
    assert_eq!(pages, vec![0, 1, 2]);
}

#[test]
fn exhausted_budget_fails_the_whole_document() {
    let document = Document::new("slow.pdf", vec![page_with_fixture(100, 100)]);
    let pipeline = Pipeline::new(
        Box::new(StubRenderer { pages: Vec::new() }),
        Box::new(NullReader),
        PipelineConfig::default().with_timeout_ms(Some(0)),
    );

    let err = pipeline.process_document(document).unwrap_err();
    assert!(matches!(err, PipelineError::Timeout { budget_ms: 0, .. }));
}

#[test]
fn unlabeled_fixtures_are_tallied_as_unknown() {
    let document = Document::new("plan.pdf", vec![page_with_fixture(100, 100)]);
    let pipeline = Pipeline::new(
        Box::new(StubRenderer { pages: Vec::new() }),
        Box::new(NullReader),
        PipelineConfig::default(),
    );

    let report = pipeline.process_document(document).unwrap();
    assert_eq!(report.fixtures.len(), 1);
    assert!(report.fixtures[0].label_text.is_none());
    assert_eq!(report.summary["UNKNOWN"].count, 1);
}
