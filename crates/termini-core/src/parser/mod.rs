//! HTML parsers for the slot listing pages.
//!
//! This module turns one page of script-rendered HTML into slot candidates:
//! - `block`: locate the slot fragments and assemble candidates
//! - `fields`: per-fragment field parsers (date, time, capacity, type, ...)
//! - `location`: zone/town header parsing with the fixed zone table
//!
//! All parsers tolerate missing sub-elements by returning absent values;
//! nothing in here raises on malformed markup.

pub mod block;
pub mod fields;
pub mod location;

// Re-export main parsing functions
pub use block::{extract_blocks, parse_block, parse_page};
pub use fields::{
    parse_categories, parse_date, parse_exam_type, parse_interpreter, parse_places_left,
    parse_time,
};
pub use location::{parse_zone_line, resolve_town};

use regex_lite::Regex;
use scraper::{ElementRef, Selector};

/// Collapse whitespace runs (including non-breaking spaces) into single
/// spaces and trim the ends, the way the site's text nodes are compared.
pub(crate) fn normalize_space(s: &str) -> String {
    s.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whitespace-normalized text content of an element
pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    normalize_space(&el.text().collect::<String>())
}

/// First descendant matching `selector`, or `None` when the selector is
/// invalid or matches nothing
pub(crate) fn select_first<'a>(el: &ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    el.select(&selector).next()
}

/// Whether the text mentions an interpreter ("tolmač", diacritic-tolerant).
///
/// The input is lowercased first; `regex-lite` only case-folds ASCII, and
/// the marker has to match ALL-CAPS header lines too.
pub(crate) fn interpreter_marker(text: &str) -> bool {
    Regex::new(r"tolma[cč]")
        .map(|re| re.is_match(&text.to_lowercase()))
        .unwrap_or(false)
}
