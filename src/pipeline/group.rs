//! Grouping of raw candidates into fixture records.
//!
//! Contour and template matching routinely produce several candidates for
//! one physical symbol. The grouping engine collapses them with a greedy
//! sort-then-merge pass and attaches nearby OCR readings. The pass is
//! deterministic: the sort is total (confidence descending, then top-left
//! position) and every tie-break is positional.

use crate::pipeline::detect::Candidate;
use crate::pipeline::ocr::OcrReading;
use crate::pipeline::summary::looks_like_symbol;
use crate::processors::geometry::Rect;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A cluster of candidates judged to be the same physical fixture, with the
/// OCR readings attached to it. Immutable after assembly.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureGroup {
    /// Zero-based page index the fixture was found on.
    pub page_index: usize,
    /// Union of all member candidate boxes.
    pub bounds: Rect,
    /// Member candidates, in assignment order.
    pub members: Vec<Candidate>,
    /// Attached readings, in attachment order.
    pub readings: Vec<OcrReading>,
}

impl FixtureGroup {
    fn seed(page_index: usize, candidate: Candidate) -> Self {
        Self {
            page_index,
            bounds: candidate.bounds,
            members: vec![candidate],
            readings: Vec::new(),
        }
    }

    fn absorb(&mut self, candidate: Candidate) {
        self.bounds = self.bounds.union(&candidate.bounds);
        self.members.push(candidate);
    }

    /// Highest member-candidate confidence.
    pub fn confidence(&self) -> f32 {
        self.members
            .iter()
            .map(|member| member.confidence)
            .fold(0.0, f32::max)
    }

    /// Fixture label extracted from the attached readings.
    ///
    /// Readings are scanned in confidence-descending order; the first
    /// whitespace-separated token that looks like a fixture symbol (short,
    /// alphanumeric, uppercase) wins. `None` when no reading carries one.
    pub fn label(&self) -> Option<Arc<str>> {
        let mut ordered: Vec<&OcrReading> = self.readings.iter().collect();
        ordered.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        for reading in ordered {
            for token in reading.text.split_whitespace() {
                let token = token.trim_matches(|c: char| ".,;:()".contains(c));
                if looks_like_symbol(token) {
                    return Some(Arc::from(token));
                }
            }
        }
        None
    }
}

/// Collapses duplicate and overlapping candidates into fixture groups.
#[derive(Debug, Clone, Copy)]
pub struct GroupingEngine {
    /// Minimum IoU (exclusive) with a group's merged box for membership.
    pub iou_threshold: f32,
    /// Maximum center distance (exclusive) for membership and for reading
    /// attachment.
    pub distance_threshold: f32,
}

impl GroupingEngine {
    /// Creates a grouping engine with the given thresholds.
    pub fn new(iou_threshold: f32, distance_threshold: f32) -> Self {
        Self {
            iou_threshold,
            distance_threshold,
        }
    }

    /// Groups one page's candidates and attaches its readings.
    ///
    /// Every candidate either joins an existing group or seeds a new one;
    /// none is dropped. Readings attach to the group whose merged box
    /// contains them, or the nearest group within the distance threshold;
    /// readings farther than that from every group are dropped.
    pub fn group(
        &self,
        page_index: usize,
        mut candidates: Vec<Candidate>,
        readings: Vec<OcrReading>,
    ) -> Vec<FixtureGroup> {
        candidates.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.bounds.y.total_cmp(&b.bounds.y))
                .then(a.bounds.x.total_cmp(&b.bounds.x))
        });

        let mut groups: Vec<FixtureGroup> = Vec::new();
        for candidate in candidates {
            let target = groups.iter_mut().find(|group| {
                group.bounds.iou(&candidate.bounds) > self.iou_threshold
                    || group.bounds.center_distance(&candidate.bounds) < self.distance_threshold
            });
            match target {
                Some(group) => group.absorb(candidate),
                None => groups.push(FixtureGroup::seed(page_index, candidate)),
            }
        }

        let mut dropped = 0usize;
        for reading in readings {
            match self.attachment_target(&groups, &reading) {
                Some(index) => groups[index].readings.push(reading),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!(page = page_index, dropped, "unattached readings dropped");
        }

        groups
    }

    /// Index of the group a reading attaches to, or `None` when every group
    /// is farther than the distance threshold.
    ///
    /// Containment beats proximity; among non-containing groups the nearest
    /// center wins, with exact ties going to the earlier group.
    fn attachment_target(&self, groups: &[FixtureGroup], reading: &OcrReading) -> Option<usize> {
        let center = reading.bounds.center();
        let mut best: Option<(bool, f32, usize)> = None;

        for (index, group) in groups.iter().enumerate() {
            let contained = group.bounds.contains_point(&center);
            let distance = group.bounds.center_distance(&reading.bounds);
            if !contained && distance >= self.distance_threshold {
                continue;
            }

            let key = (contained, distance, index);
            best = match best {
                None => Some(key),
                Some(current) => {
                    // Prefer containment, then smaller distance, then the
                    // earlier group.
                    let better = (key.0 && !current.0)
                        || (key.0 == current.0 && key.1 < current.1);
                    if better { Some(key) } else { Some(current) }
                }
            };
        }

        best.map(|(_, _, index)| index)
    }
}
