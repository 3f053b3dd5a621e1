//! Per-symbol fixture summary.
//!
//! Detected fixtures are tallied by their (normalized) symbol. Descriptions
//! come from the lighting-schedule rows extracted from the document when
//! available, then from a built-in catalog of common symbols, and finally
//! fall back to a generic description.

use crate::pipeline::assemble::FixtureRecord;
use crate::pipeline::schedule::ScheduleRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Symbol used for fixtures whose label could not be read.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Known OCR confusions for fixture symbols on this drawing convention.
const SYMBOL_CORRECTIONS: &[(&str, &str)] = &[
    ("AIE", "A1E"),
    ("AlE", "A1E"),
    ("AE", "A1E"),
    ("BLOG", "A1E"),
    ("JOT", "A1E"),
    ("TA", "A1E"),
];

/// Built-in descriptions for symbols absent from the document's schedule.
const FALLBACK_CATALOG: &[(&str, &str)] = &[
    ("A1", "2x4 LED Emergency Fixture"),
    ("A1E", "Exit/Emergency Combo Unit"),
    ("W", "Wall-Mounted Emergency LED"),
    ("P", "Parking Lot Light"),
    ("EL", "Emergency Light"),
    ("EX", "Exit Sign"),
];

/// Description used when neither the schedule nor the catalog knows the
/// symbol.
const GENERIC_DESCRIPTION: &str = "Generic Emergency Light";

/// Count and description for one fixture symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureTally {
    /// Number of fixtures carrying the symbol.
    pub count: usize,
    /// Resolved fixture description.
    pub description: String,
}

/// Returns true when `token` plausibly is a fixture symbol: short,
/// uppercase, alphanumeric (hyphens allowed between characters).
pub fn looks_like_symbol(token: &str) -> bool {
    let len = token.chars().count();
    if !(2..=6).contains(&len) {
        return false;
    }
    if !token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return false;
    }
    if token.starts_with('-') || token.ends_with('-') {
        return false;
    }
    token.chars().any(|c| c.is_ascii_uppercase())
        && !token.chars().any(|c| c.is_ascii_lowercase())
}

/// Canonicalizes a raw symbol, correcting known OCR confusions.
pub fn normalize_symbol(raw: &str) -> String {
    for (wrong, right) in SYMBOL_CORRECTIONS {
        if raw == *wrong {
            return (*right).to_string();
        }
    }
    raw.to_string()
}

/// Resolves a symbol's description: schedule rows first, then the built-in
/// catalog, then the generic fallback.
pub fn describe_symbol(symbol: &str, schedule: &[ScheduleRow]) -> String {
    if let Some(row) = schedule.iter().find(|row| row.symbol.trim() == symbol) {
        return row.description.clone();
    }
    FALLBACK_CATALOG
        .iter()
        .find(|(known, _)| *known == symbol)
        .map(|(_, description)| (*description).to_string())
        .unwrap_or_else(|| GENERIC_DESCRIPTION.to_string())
}

/// Tallies fixture records by normalized symbol.
///
/// Unlabeled fixtures are counted under [`UNKNOWN_SYMBOL`]. The map is
/// ordered for deterministic serialization.
pub fn summarize(
    records: &[FixtureRecord],
    schedule: &[ScheduleRow],
) -> BTreeMap<String, FixtureTally> {
    let mut summary: BTreeMap<String, FixtureTally> = BTreeMap::new();

    for record in records {
        let symbol = match &record.label_text {
            Some(label) => normalize_symbol(label),
            None => UNKNOWN_SYMBOL.to_string(),
        };
        let entry = summary.entry(symbol.clone()).or_insert_with(|| FixtureTally {
            count: 0,
            description: describe_symbol(&symbol, schedule),
        });
        entry.count += 1;
    }

    summary
}
