//! Slot fragment extraction and candidate assembly.

use scraper::{ElementRef, Html, Selector};

use super::{fields, location};
use crate::types::SlotCandidate;

/// Selector for slot fragments inside the results wrapper
const BLOCK_SELECTOR: &str = "div.dogodki div#results div.js_dogodekBox.dogodek";

/// Loose fallback used when the wrapper markup is absent
const BLOCK_SELECTOR_LOOSE: &str = "div.js_dogodekBox.dogodek";

/// All slot fragments of one page, in document order.
///
/// An empty result is the normal "no more data" outcome, not an error.
pub fn extract_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    for selector in [BLOCK_SELECTOR, BLOCK_SELECTOR_LOOSE] {
        if let Ok(selector) = Selector::parse(selector) {
            let blocks: Vec<_> = document.select(&selector).collect();
            if !blocks.is_empty() {
                return blocks;
            }
        }
    }
    Vec::new()
}

/// Assemble a [`SlotCandidate`] from one fragment.
///
/// Never fails; fields the fragment doesn't carry stay absent and the
/// normalizer decides what to do with the candidate.
pub fn parse_block(block: &ElementRef<'_>) -> SlotCandidate {
    let (zone, town, interpreter_in_header) = location::parse_zone_line(block);

    SlotCandidate {
        date_text: fields::parse_date(block),
        time_text: fields::parse_time(block),
        zone,
        town,
        exam_type: fields::parse_exam_type(block),
        places_left: fields::parse_places_left(block),
        interpreter: interpreter_in_header || fields::parse_interpreter(block),
        categories: fields::parse_categories(block),
    }
}

/// Parse one page body into slot candidates.
///
/// The `Html` document lives only inside this call; it is not `Send`, and
/// the crawler must not hold it across awaits.
pub fn parse_page(html: &str) -> Vec<SlotCandidate> {
    let document = Html::parse_document(html);
    extract_blocks(&document).iter().map(parse_block).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExamType;

    const FULL_BLOCK: &str = r#"
        <div class="dogodki"><div id="results">
          <div class="js_dogodekBox dogodek">
            <div class="calendarBox" aria-label="13. 9. 2025">SEP 13</div>
            <div class="contentOpomnik">
              <div class="upperOpomnikDiv">Območje 2 , Ljubljana center</div>
              <div>Preverjanje znanja vožnje</div>
              <div>Začetek ob <span class="bold">08:00</span></div>
              <div>Kategorije: <span class="bold">B,</span> <span class="bold">BE,</span></div>
              <div class="lessImportant green">Še 3 prosta mesta</div>
            </div>
          </div>
        </div></div>"#;

    #[test]
    fn test_extract_blocks_in_document_order() {
        let html = r#"
            <div class="dogodki"><div id="results">
              <div class="js_dogodekBox dogodek"><div class="calendarBox" aria-label="1. 9. 2025"></div></div>
              <div class="js_dogodekBox dogodek"><div class="calendarBox" aria-label="2. 9. 2025"></div></div>
            </div></div>"#;
        let document = Html::parse_document(html);
        let blocks = extract_blocks(&document);
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            fields::parse_date(&blocks[0]),
            Some("1. 9. 2025".to_string())
        );
        assert_eq!(
            fields::parse_date(&blocks[1]),
            Some("2. 9. 2025".to_string())
        );
    }

    #[test]
    fn test_extract_blocks_loose_fallback() {
        let html = r#"<div class="js_dogodekBox dogodek"><div class="calendarBox" aria-label="1. 9. 2025"></div></div>"#;
        let document = Html::parse_document(html);
        assert_eq!(extract_blocks(&document).len(), 1);
    }

    #[test]
    fn test_extract_blocks_empty_page() {
        let document = Html::parse_document("<html><body><p>ni terminov</p></body></html>");
        assert!(extract_blocks(&document).is_empty());
    }

    #[test]
    fn test_extract_blocks_tolerates_malformed_markup() {
        let html = r#"<div class="js_dogodekBox dogodek"><div class="calendarBox" aria-label="1. 9. 2025"><span></div>"#;
        let document = Html::parse_document(html);
        assert_eq!(extract_blocks(&document).len(), 1);
    }

    #[test]
    fn test_parse_block_full_fragment() {
        let candidates = parse_page(FULL_BLOCK);
        assert_eq!(candidates.len(), 1);

        let candidate = &candidates[0];
        assert_eq!(candidate.date_text.as_deref(), Some("13. 9. 2025"));
        assert_eq!(candidate.time_text.as_deref(), Some("08:00"));
        assert_eq!(candidate.zone, Some(2));
        assert_eq!(candidate.town.as_deref(), Some("Ljubljana"));
        assert_eq!(candidate.exam_type, ExamType::Practical);
        assert_eq!(candidate.places_left, Some(3));
        assert!(!candidate.interpreter);
        assert_eq!(candidate.categories, vec!["B", "BE"]);
    }

    #[test]
    fn test_parse_block_sparse_fragment() {
        let html = r#"<div class="js_dogodekBox dogodek"><div class="contentOpomnik"><div>kmalu</div></div></div>"#;
        let candidates = parse_page(html);
        assert_eq!(candidates.len(), 1);

        let candidate = &candidates[0];
        assert!(candidate.date_text.is_none());
        assert!(candidate.time_text.is_none());
        assert_eq!(candidate.exam_type, ExamType::Unknown);
        assert!(candidate.categories.is_empty());
    }
}
