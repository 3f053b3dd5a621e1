//! Lighting-schedule and general-notes extraction (the "rulebook").
//!
//! Blueprint sheets on the target convention place the lighting-schedule
//! table in the bottom-right quadrant and general notes near the top-left
//! corner. Both regions are OCRed wholesale and parsed line by line; the
//! resulting rows resolve fixture descriptions during summarization.

use crate::core::errors::OcrError;
use crate::pipeline::ocr::RegionReader;
use crate::pipeline::rasterize::Page;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One parsed row of the lighting-schedule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// Fixture symbol, as printed in the schedule.
    pub symbol: String,
    /// Fixture description (first few columns of the row).
    pub description: String,
    /// Zero-based page the row was found on.
    pub page_index: usize,
}

/// One general note mentioning emergency-power wording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralNote {
    /// Note text as recognized.
    pub text: String,
    /// Zero-based page the note was found on.
    pub page_index: usize,
}

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Keywords that mark a line as an emergency-lighting note.
const NOTE_KEYWORDS: &[&str] = &["emergency", "unswitched", "power", "note"];

/// Scans one page for schedule rows and general notes.
///
/// Readings below `confidence_floor` are ignored. Pages too small to carry
/// either region yield empty results.
pub fn scan_page(
    page: &Page,
    reader: &dyn RegionReader,
    confidence_floor: f32,
) -> Result<(Vec<ScheduleRow>, Vec<GeneralNote>), OcrError> {
    let mut rows = Vec::new();
    let mut notes = Vec::new();

    for line in region_lines(page, reader, confidence_floor, schedule_region(page))? {
        if let Some(row) = parse_schedule_row(&line, page.index) {
            rows.push(row);
        }
    }

    for line in region_lines(page, reader, confidence_floor, notes_region(page))? {
        if let Some(note) = parse_note(&line, page.index) {
            notes.push(note);
        }
    }

    Ok((rows, notes))
}

/// Bottom-right quadrant, inset from the sheet border: the likely location
/// of the lighting schedule.
fn schedule_region(page: &Page) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = (page.width(), page.height());
    let x1 = w / 2;
    let y1 = (h as f32 * 0.6) as u32;
    let x2 = w.saturating_sub(50);
    let y2 = h.saturating_sub(100);
    (x2 > x1 && y2 > y1).then(|| (x1, y1, x2 - x1, y2 - y1))
}

/// Top-left corner block where general notes are printed.
fn notes_region(page: &Page) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = (page.width(), page.height());
    let x1 = 50.min(w);
    let y1 = 50.min(h);
    let x2 = 600.min(w);
    let y2 = 400.min(h);
    (x2 > x1 && y2 > y1).then_some((x1, y1, x2 - x1, y2 - y1))
}

/// OCRs one region and returns its recognized lines, confidence-filtered
/// and ordered top to bottom.
fn region_lines(
    page: &Page,
    reader: &dyn RegionReader,
    confidence_floor: f32,
    region: Option<(u32, u32, u32, u32)>,
) -> Result<Vec<String>, OcrError> {
    let Some((x, y, w, h)) = region else {
        return Ok(Vec::new());
    };

    let crop = image::imageops::crop_imm(&page.image, x, y, w, h).to_image();
    let mut fragments = reader.read_region(&crop)?;
    fragments.retain(|fragment| fragment.confidence >= confidence_floor);
    fragments.sort_by(|a, b| {
        a.bounds
            .y
            .total_cmp(&b.bounds.y)
            .then(a.bounds.x.total_cmp(&b.bounds.x))
    });

    Ok(fragments.into_iter().map(|fragment| fragment.text).collect())
}

/// Parses `SYMBOL description...` rows. The first token must look like a
/// short uppercase symbol; the description takes the next few tokens.
fn parse_schedule_row(line: &str, page_index: usize) -> Option<ScheduleRow> {
    let line = WHITESPACE.replace_all(line.trim(), " ");
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() < 3 {
        return None;
    }

    let symbol = tokens[0];
    let plausible = symbol.len() <= 6
        && symbol.chars().all(|c| c.is_ascii_alphanumeric())
        && symbol.chars().any(|c| c.is_ascii_uppercase());
    if !plausible {
        return None;
    }

    let end = tokens.len().min(5);
    Some(ScheduleRow {
        symbol: symbol.to_string(),
        description: tokens[1..end].join(" "),
        page_index,
    })
}

/// Keeps lines long enough to be prose and mentioning one of the
/// emergency-power keywords.
fn parse_note(line: &str, page_index: usize) -> Option<GeneralNote> {
    let line = line.trim();
    if line.len() <= 10 {
        return None;
    }
    let lower = line.to_lowercase();
    NOTE_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
        .then(|| GeneralNote {
            text: line.to_string(),
            page_index,
        })
}
