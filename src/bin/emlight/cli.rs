//! Implementation of the `detect` subcommand.

use crate::{DetectArgs, OutputFormat};
use emlight::pipeline::Pipeline;
use emlight::utils::visualization::annotate_page;
use emlight::{NullReader, PageRenderer, ParallelPolicy, PdfiumRasterizer, PipelineConfig};
use std::error::Error;
use std::time::Instant;
use tracing::{info, warn};

pub fn run_detect(args: DetectArgs) -> Result<(), Box<dyn Error>> {
    let config = PipelineConfig::new()
        .with_dpi(args.dpi)
        .with_timeout_ms(args.timeout_ms)
        .with_schedule_extraction(!args.no_schedule);

    let policy = ParallelPolicy::new().with_max_threads(args.max_threads);
    policy.install_global_thread_pool()?;

    let rasterizer = PdfiumRasterizer::new()?;

    // No OCR engine is wired into the CLI yet; fixtures come back unlabeled.
    let pipeline = Pipeline::new(Box::new(rasterizer), Box::new(NullReader), config);

    let started = Instant::now();
    let report = pipeline.process_file(&args.file)?;
    info!(
        pages = report.page_count,
        fixtures = report.fixtures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "extraction finished"
    );

    match args.output {
        OutputFormat::Pretty => print!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            for fixture in &report.fixtures {
                println!(
                    "page={} box=[{:.0},{:.0},{:.0},{:.0}] label={} confidence={:.2}",
                    fixture.page_index,
                    fixture.bounding_box.x,
                    fixture.bounding_box.y,
                    fixture.bounding_box.w,
                    fixture.bounding_box.h,
                    fixture.label_text.as_deref().unwrap_or("-"),
                    fixture.confidence,
                );
            }
        }
    }

    if let Some(path) = args.annotate {
        let dpi = pipeline.config().dpi;
        let images = pipeline.renderer().render_file(&args.file, dpi)?;
        match images.into_iter().next() {
            Some(mut first_page) => {
                annotate_page(&mut first_page, 0, &report.fixtures);
                first_page.save(&path)?;
                info!(path = %path.display(), "annotated page written");
            }
            None => warn!("document has no pages, nothing to annotate"),
        }
    }

    Ok(())
}
