//! Per-fragment field parsers.
//!
//! Each function reads one optional field out of a slot fragment. A missing
//! sub-element or non-matching pattern yields an absent value, never an
//! error; the markup is scraped, not trusted.

use regex_lite::Regex;
use scraper::{ElementRef, Selector};

use super::{element_text, interpreter_marker, select_first};
use crate::types::ExamType;

/// Marker text preceding the bolded start time
const TIME_MARKER: &str = "Začetek ob";

/// Marker text preceding the bolded category codes
const CATEGORIES_MARKER: &str = "Kategorije:";

/// Raw date string of the fragment.
///
/// Read from the calendar box `aria-label`, falling back to its
/// screen-reader-only text node.
pub fn parse_date(block: &ElementRef<'_>) -> Option<String> {
    let calendar = select_first(block, "div.calendarBox")?;

    if let Some(label) = calendar.value().attr("aria-label") {
        let label = label.trim();
        if !label.is_empty() {
            return Some(label.to_string());
        }
    }

    let sr_only = select_first(block, "div.calendarBox .sr-only")?;
    let text = element_text(&sr_only);
    (!text.is_empty()).then_some(text)
}

/// Raw "HH:MM" string of the fragment.
///
/// Only the first content row containing the "Začetek ob" marker is
/// consulted: its bolded span wins, else the first HH:MM pattern in the
/// row's text.
pub fn parse_time(block: &ElementRef<'_>) -> Option<String> {
    let rows = Selector::parse("div.contentOpomnik > div").ok()?;
    let time_re = Regex::new(r"\b(\d{1,2}:\d{2})\b").ok()?;

    for row in block.select(&rows) {
        let text = element_text(&row);
        if !text.contains(TIME_MARKER) {
            continue;
        }
        return match select_first(&row, "span.bold") {
            Some(bold) => {
                let time = element_text(&bold);
                (!time.is_empty()).then_some(time)
            }
            None => time_re.captures(&text).map(|caps| caps[1].to_string()),
        };
    }
    None
}

/// Remaining capacity from the green "Še N …" banner
pub fn parse_places_left(block: &ElementRef<'_>) -> Option<u32> {
    let banner = select_first(block, "div.contentOpomnik .lessImportant.green")?;
    let text = element_text(&banner).to_lowercase();
    let re = Regex::new(r"še\s+(\d+)\s+").ok()?;
    re.captures(&text).and_then(|caps| caps[1].parse().ok())
}

/// Exam kind inferred from the content text
pub fn parse_exam_type(block: &ElementRef<'_>) -> ExamType {
    let Some(content) = select_first(block, "div.contentOpomnik") else {
        return ExamType::Unknown;
    };
    let text = element_text(&content).to_lowercase();
    if text.contains("preverjanje znanja vožnje") {
        ExamType::Practical
    } else if text.contains("preverjanje znanja teorije") {
        ExamType::Theory
    } else {
        ExamType::Unknown
    }
}

/// Whether the fragment's content block mentions an interpreter anywhere
pub fn parse_interpreter(block: &ElementRef<'_>) -> bool {
    select_first(block, "div.contentOpomnik")
        .map(|content| interpreter_marker(&element_text(&content)))
        .unwrap_or(false)
}

/// License category codes, in document order.
///
/// Taken from the bolded spans of the first content row carrying the
/// "Kategorije:" marker, trailing commas stripped.
pub fn parse_categories(block: &ElementRef<'_>) -> Vec<String> {
    let Ok(rows) = Selector::parse("div.contentOpomnik > div") else {
        return Vec::new();
    };
    let Ok(bold) = Selector::parse("span.bold") else {
        return Vec::new();
    };

    for row in block.select(&rows) {
        if !element_text(&row).contains(CATEGORIES_MARKER) {
            continue;
        }
        return row
            .select(&bold)
            .map(|span| element_text(&span).trim_end_matches(',').to_string())
            .filter(|code| !code.is_empty())
            .collect();
    }
    Vec::new()
}
