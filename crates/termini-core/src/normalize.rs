//! Candidate normalization and crawl-scoped deduplication.

use std::collections::HashSet;

use crate::types::{DedupKey, NormalizedSlot, SlotCandidate};

/// Display string combining zone and town.
///
/// Mirrors the site's own header form: `"Območje 2 , Ljubljana"`, falling
/// back to whichever half is present.
pub fn compose_location(zone: Option<u8>, town: Option<&str>) -> Option<String> {
    match (zone, town) {
        (Some(zone), Some(town)) => Some(format!("Območje {zone} , {town}")),
        (Some(zone), None) => Some(format!("Območje {zone}")),
        (None, Some(town)) => Some(town.to_string()),
        (None, None) => None,
    }
}

/// Turns candidates into finished records, rejecting incomplete ones and
/// absorbing duplicates.
///
/// The dedup set lives here and is scoped to one crawl; a fresh crawl gets
/// a fresh normalizer.
#[derive(Debug, Default)]
pub struct Normalizer {
    seen: HashSet<DedupKey>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize one candidate found on page `source_page`.
    ///
    /// Returns `None` for candidates missing their date or time, and for
    /// candidates whose identity was already seen in this crawl. Duplicates
    /// are absorbed silently; they are not an error condition.
    pub fn normalize(
        &mut self,
        candidate: SlotCandidate,
        source_page: u32,
    ) -> Option<NormalizedSlot> {
        let key = candidate.dedup_key()?;
        if !self.seen.insert(key) {
            return None;
        }

        let (Some(date_text), Some(time_text)) = (candidate.date_text, candidate.time_text)
        else {
            return None;
        };

        let location = compose_location(candidate.zone, candidate.town.as_deref());

        Some(NormalizedSlot {
            date_text,
            time_text,
            zone: candidate.zone,
            town: candidate.town,
            exam_type: candidate.exam_type,
            places_left: candidate.places_left,
            interpreter: candidate.interpreter,
            categories: candidate.categories,
            location,
            source_page,
        })
    }
}
