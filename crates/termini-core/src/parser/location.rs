//! Zone and town parsing for the fragment header line.
//!
//! The header reads like `"Območje 2 , Ljubljana center"`: a zone segment,
//! then a free-form remainder naming the venue. Towns are resolved against
//! a fixed table of the five zones first; only when that fails does the
//! token heuristic take over. The heuristic's stopping conditions are an
//! ordered first-match-wins rule list tuned to this site's markup; keep
//! them as they are.

use regex_lite::Regex;
use scraper::ElementRef;

use super::{element_text, interpreter_marker, select_first};

/// Fixed mapping of the five administrative zones to their known towns
const ZONE_TOWNS: [(u8, &[&str]); 5] = [
    (
        1,
        &[
            "Ajdovščina",
            "Idrija",
            "Ilirska Bistrica",
            "Koper",
            "Nova Gorica",
            "Postojna",
            "Sežana",
            "Tolmin",
        ],
    ),
    (
        2,
        &["Domžale", "Ig", "Jesenice", "Kranj", "Ljubljana", "Vrhnika"],
    ),
    (
        3,
        &[
            "Celje",
            "Laško",
            "Ločica ob Savinji",
            "Ravne na Koroškem",
            "Slovenske Konjice",
            "Slovenj Gradec",
            "Šentjur",
            "Šmarje pri Jelšah",
            "Trbovlje",
            "Velenje",
        ],
    ),
    (
        4,
        &["Brežice", "Črnomelj", "Kočevje", "Krško", "Novo mesto", "Sevnica"],
    ),
    (
        5,
        &["Maribor", "Murska Sobota", "Ormož", "Ptuj", "Slovenska Bistrica"],
    ),
];

/// Generic venue words that end the town token scan
const TOWN_STOP_WORDS: &[&str] = &[
    "ulica",
    "cesta",
    "naselje",
    "center",
    "trg",
    "testirnica",
    "vožnja",
    "voznja",
];

/// Parse the fragment's header line into zone, town and the line-level
/// interpreter flag.
///
/// The line is split on its first comma: the zone segment is matched with
/// `Območje <N>`, the remainder feeds town resolution. When no comma is
/// present the whole line is scanned for a town.
pub fn parse_zone_line(block: &ElementRef<'_>) -> (Option<u8>, Option<String>, bool) {
    let Some(header) = select_first(block, "div.contentOpomnik div.upperOpomnikDiv") else {
        return (None, None, false);
    };
    let raw = element_text(&header);

    let zone = parse_zone(&raw);
    let interpreter = interpreter_marker(&raw);
    let remainder = raw
        .split_once(',')
        .map(|(_, rest)| rest.trim())
        .unwrap_or(raw.as_str());

    (zone, resolve_town(remainder), interpreter)
}

/// Zone code from the header line, constrained to the five known zones.
///
/// Matched on a lowercased copy; `regex-lite` case folding is ASCII-only
/// and the site occasionally shouts the header.
fn parse_zone(raw: &str) -> Option<u8> {
    let re = Regex::new(r"območje\s+(\d+)").ok()?;
    let lowered = raw.to_lowercase();
    let caps = re.captures(&lowered)?;
    let zone: u8 = caps[1].parse().ok()?;
    (1..=5).contains(&zone).then_some(zone)
}

/// Resolve a town name from the header remainder.
///
/// Exact (case-insensitive) substring match against the zone table wins and
/// returns the canonical spelling; otherwise the token heuristic scans the
/// remainder.
pub fn resolve_town(raw: &str) -> Option<String> {
    let raw_lower = raw.to_lowercase();
    for (_, towns) in ZONE_TOWNS.iter() {
        for town in *towns {
            if raw_lower.contains(&town.to_lowercase()) {
                return Some((*town).to_string());
            }
        }
    }
    scan_town_tokens(raw)
}

/// Token scan for towns missing from the table.
///
/// Walks the remainder's words and, per token, applies the first matching
/// rule: starts with a digit -> stop; starts lowercase -> stop; stop-word ->
/// stop; capitalized or ALL-CAPS -> capture title-cased. The joined capture
/// is the town.
fn scan_town_tokens(raw: &str) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    for token in raw.replace(',', " ").split_whitespace() {
        let Some(first) = token.chars().next() else {
            break;
        };
        if first.is_ascii_digit() {
            break;
        }
        if first.is_lowercase() {
            break;
        }
        if TOWN_STOP_WORDS.contains(&token.to_lowercase().as_str()) {
            break;
        }
        if first.is_uppercase() {
            parts.push(title_case(token));
        } else {
            break;
        }
    }

    let town = parts.join(" ");
    let town = town.trim_matches(&[' ', '.', ','][..]);
    (!town.is_empty()).then(|| town.to_string())
}

/// First character uppercased, the rest lowercased ("NOVO" -> "Novo")
fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
