//! Data types for the slot crawler.
//!
//! [`SlotCandidate`] is the transient per-fragment shape the parsers fill
//! in; [`NormalizedSlot`] is the finished output unit handed to storage.
//! All types serialize to JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of exam a slot belongs to, inferred from the fragment text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    /// Theory knowledge check ("preverjanje znanja teorije")
    Theory,
    /// Driving skills check ("preverjanje znanja vožnje")
    Practical,
    /// The fragment text matched neither marker
    #[default]
    Unknown,
}

impl ExamType {
    /// Stable text form used in the slot store
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Theory => "theory",
            ExamType::Practical => "practical",
            ExamType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial record produced from one slot fragment.
///
/// Every field tolerates absence; the normalizer decides whether the
/// candidate is complete enough to keep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotCandidate {
    /// Raw localized date string ("13. 9. 2025"); required for inclusion
    pub date_text: Option<String>,
    /// Raw "HH:MM" string; required for inclusion
    pub time_text: Option<String>,
    /// Administrative region code, one of the five known zones
    pub zone: Option<u8>,
    /// Town name resolved from the header line
    pub town: Option<String>,
    /// Exam kind inferred from the content text
    pub exam_type: ExamType,
    /// Remaining capacity from the "Še N …" banner
    pub places_left: Option<u32>,
    /// Whether the fragment mentions interpreter availability
    pub interpreter: bool,
    /// License category codes in source listing order
    pub categories: Vec<String>,
}

impl SlotCandidate {
    /// Composite identity of this candidate, or `None` when the required
    /// date or time is missing.
    pub fn dedup_key(&self) -> Option<DedupKey> {
        let date_text = self.date_text.as_deref()?;
        let time_text = self.time_text.as_deref()?;
        Some(DedupKey {
            date_text: date_text.to_string(),
            time_text: time_text.to_string(),
            zone: self.zone,
            town: self
                .town
                .as_deref()
                .map(|t| t.trim().to_lowercase())
                .unwrap_or_default(),
            categories: self.categories.join(","),
        })
    }
}

/// Composite identity used to recognize a slot already captured in one crawl
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey {
    pub date_text: String,
    pub time_text: String,
    pub zone: Option<u8>,
    /// Lowercased, trimmed town name; empty when the town is absent
    pub town: String,
    /// Category codes joined with ","
    pub categories: String,
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zone = self.zone.map(|z| z.to_string()).unwrap_or_default();
        write!(
            f,
            "{}|{}|{}|{}|{}",
            self.date_text, self.time_text, zone, self.town, self.categories
        )
    }
}

/// Finished, immutable slot record produced by one crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSlot {
    /// Raw localized date string, always present
    pub date_text: String,
    /// Raw "HH:MM" string, always present
    pub time_text: String,
    /// Administrative region code, one of the five known zones
    pub zone: Option<u8>,
    /// Town name resolved from the header line
    pub town: Option<String>,
    /// Exam kind inferred from the content text
    pub exam_type: ExamType,
    /// Remaining capacity from the "Še N …" banner
    pub places_left: Option<u32>,
    /// Whether the fragment mentions interpreter availability
    pub interpreter: bool,
    /// License category codes in source listing order
    pub categories: Vec<String>,
    /// Display string combining zone and town
    pub location: Option<String>,
    /// Zero-based page index the fragment was found on
    pub source_page: u32,
}

impl NormalizedSlot {
    /// Composite identity of this record, derived from its fields so the
    /// key can never disagree with them.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            date_text: self.date_text.clone(),
            time_text: self.time_text.clone(),
            zone: self.zone,
            town: self
                .town
                .as_deref()
                .map(|t| t.trim().to_lowercase())
                .unwrap_or_default(),
            categories: self.categories.join(","),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_type_serialization() {
        let json = serde_json::to_string(&ExamType::Practical).unwrap();
        assert_eq!(json, "\"practical\"");

        let json = serde_json::to_string(&ExamType::Unknown).unwrap();
        assert_eq!(json, "\"unknown\"");
    }

    #[test]
    fn test_candidate_key_requires_date_and_time() {
        let mut candidate = SlotCandidate {
            time_text: Some("08:00".to_string()),
            ..Default::default()
        };
        assert!(candidate.dedup_key().is_none());

        candidate.date_text = Some("13. 9. 2025".to_string());
        assert!(candidate.dedup_key().is_some());
    }

    #[test]
    fn test_key_lowercases_and_trims_town() {
        let candidate = SlotCandidate {
            date_text: Some("13. 9. 2025".to_string()),
            time_text: Some("08:00".to_string()),
            zone: Some(2),
            town: Some("  Ljubljana ".to_string()),
            categories: vec!["B".to_string(), "BE".to_string()],
            ..Default::default()
        };
        let key = candidate.dedup_key().unwrap();
        assert_eq!(key.town, "ljubljana");
        assert_eq!(key.categories, "B,BE");
        assert_eq!(key.to_string(), "13. 9. 2025|08:00|2|ljubljana|B,BE");
    }

    #[test]
    fn test_record_key_matches_candidate_key() {
        let candidate = SlotCandidate {
            date_text: Some("1. 10. 2025".to_string()),
            time_text: Some("10:30".to_string()),
            zone: Some(5),
            town: Some("Maribor".to_string()),
            categories: vec!["A1".to_string()],
            ..Default::default()
        };
        let record = NormalizedSlot {
            date_text: "1. 10. 2025".to_string(),
            time_text: "10:30".to_string(),
            zone: Some(5),
            town: Some("Maribor".to_string()),
            exam_type: ExamType::Unknown,
            places_left: None,
            interpreter: false,
            categories: vec!["A1".to_string()],
            location: None,
            source_page: 0,
        };
        assert_eq!(candidate.dedup_key().unwrap(), record.dedup_key());
    }

    #[test]
    fn test_record_serialization_round_trip() {
        let record = NormalizedSlot {
            date_text: "13. 9. 2025".to_string(),
            time_text: "08:00".to_string(),
            zone: Some(2),
            town: Some("Ljubljana".to_string()),
            exam_type: ExamType::Theory,
            places_left: Some(3),
            interpreter: true,
            categories: vec!["B".to_string()],
            location: Some("Območje 2 , Ljubljana".to_string()),
            source_page: 1,
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: NormalizedSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.date_text, "13. 9. 2025");
        assert_eq!(back.exam_type, ExamType::Theory);
        assert_eq!(back.places_left, Some(3));
        assert!(back.interpreter);
    }
}
