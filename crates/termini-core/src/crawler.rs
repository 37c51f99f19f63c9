//! Paginated crawl orchestration.
//!
//! Drives the fetch -> extract -> parse -> normalize loop over page indexes
//! 0, 1, 2, ... and enforces every stopping condition: empty or stagnant
//! body, no fragments, day-ahead cutoff, no new items, hard page ceiling.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Europe::Ljubljana;
use chrono_tz::Tz;
use rand::Rng;

use crate::client::UpravaClient;
use crate::error::Result;
use crate::normalize::Normalizer;
use crate::parser;
use crate::types::NormalizedSlot;

/// Expected shape of the slot date strings ("13. 9. 2025")
const DATE_FORMAT: &str = "%d. %m. %Y";

/// A body shorter than this repeating the previous page's exact byte length
/// is read as an empty template, i.e. the end of available data.
const MIN_PAGE_LEN: usize = 100;

/// Configuration for one crawl.
///
/// The four filter codes are passed through to the site verbatim; their
/// defaults are the site's own "no filter" values.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Slot type filter code ("-" = all)
    pub slot_type: String,
    /// License category filter code ("-" = all)
    pub category: String,
    /// Exam center filter code ("-1" = all)
    pub exam_center: String,
    /// Location filter code ("-1" = all)
    pub location: String,
    /// Hard page-count ceiling
    pub max_pages: u32,
    /// Slots dated further ahead than this many days are not collected
    pub max_days_ahead: i64,
    /// Bounds in seconds of the randomized pause between pages
    pub page_pause: (f64, f64),
    /// When set, the first two page bodies are written here for inspection
    pub dump_dir: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            slot_type: "-".to_string(),
            category: "-".to_string(),
            exam_center: "-1".to_string(),
            location: "-1".to_string(),
            max_pages: 300,
            max_days_ahead: 30,
            page_pause: (0.6, 1.1),
            dump_dir: None,
        }
    }
}

/// Orchestrator for one sequential crawl.
///
/// Owns the HTTP session and the dedup state for exactly one invocation;
/// run concurrent crawls on separate crawlers.
///
/// # Example
/// ```no_run
/// use termini_core::SlotCrawler;
///
/// #[tokio::main]
/// async fn main() -> Result<(), termini_core::ScrapeError> {
///     let crawler = SlotCrawler::new()?;
///     let slots = crawler.crawl().await?;
///     println!("collected {} slots", slots.len());
///     Ok(())
/// }
/// ```
pub struct SlotCrawler {
    client: UpravaClient,
    config: CrawlConfig,
}

impl SlotCrawler {
    /// Create a crawler against the live site with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: UpravaClient::new()?,
            config: CrawlConfig::default(),
        })
    }

    /// Create a crawler from a pre-built client and configuration.
    pub fn with_client(client: UpravaClient, config: CrawlConfig) -> Self {
        Self { client, config }
    }

    /// Run one crawl to completion.
    ///
    /// Returns the accumulated, deduplicated records in page-fetch order.
    ///
    /// # Errors
    /// Only exhausted retries abort the crawl; page-level anomalies are
    /// normal termination and fragment-level parse failures are dropped.
    pub async fn crawl(&self) -> Result<Vec<NormalizedSlot>> {
        let cutoff =
            Utc::now().with_timezone(&Ljubljana) + ChronoDuration::days(self.config.max_days_ahead);
        tracing::info!(cutoff = %cutoff.date_naive(), max_pages = self.config.max_pages, "starting crawl");

        if let Err(error) = self.client.warm_up().await {
            tracing::warn!(%error, "warmup request failed, continuing without session cookies");
        }

        let mut slots: Vec<NormalizedSlot> = Vec::new();
        let mut normalizer = Normalizer::new();
        let mut last_len: Option<usize> = None;
        let mut stop_due_to_cutoff = false;

        for page in 0..self.config.max_pages {
            let html = self.client.fetch_page(&self.build_query(page)).await?;

            if page <= 1 {
                self.dump_page(page, &html);
            }

            if page_looks_exhausted(&html, last_len) {
                tracing::info!(page, len = html.len(), "page body empty or stagnant, stopping");
                break;
            }
            last_len = Some(html.len());

            let candidates = parser::parse_page(&html);
            tracing::debug!(page, blocks = candidates.len(), "extracted slot blocks");
            if candidates.is_empty() {
                tracing::info!(page, "no slot blocks found, stopping");
                break;
            }

            let mut page_new = 0usize;
            for candidate in candidates {
                let Some(date_text) = candidate.date_text.as_deref() else {
                    continue;
                };
                if candidate.time_text.is_none() {
                    continue;
                }

                match slot_date(date_text) {
                    Some(slot_day) if slot_day > cutoff => {
                        tracing::info!(page, date = date_text, "slot beyond cutoff, stopping crawl");
                        stop_due_to_cutoff = true;
                        break;
                    }
                    Some(_) => {}
                    None => {
                        tracing::warn!(page, date = date_text, "unparseable slot date, dropping fragment");
                        continue;
                    }
                }

                if let Some(slot) = normalizer.normalize(candidate, page) {
                    slots.push(slot);
                    page_new += 1;
                }
            }

            tracing::info!(page, new_items = page_new, total = slots.len(), "page processed");

            if stop_due_to_cutoff {
                break;
            }
            if page_new == 0 {
                tracing::info!(page, "no new items on page, stopping");
                break;
            }

            let pause = pause_secs(self.config.page_pause);
            if pause > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(pause)).await;
            }
        }

        tracing::info!(total = slots.len(), "crawl complete");
        Ok(slots)
    }

    /// Query string for page `page`; the page parameter is omitted for the
    /// first page, exactly as the site's own script does.
    fn build_query(&self, page: u32) -> String {
        let mut pairs: Vec<(&str, String)> = vec![
            ("lang", "si".to_string()),
            ("type", self.config.slot_type.clone()),
            ("cat", self.config.category.clone()),
            ("izpitniCenter", self.config.exam_center.clone()),
            ("lokacija", self.config.location.clone()),
            ("offset", "0".to_string()),
            ("sentinel_type", "ok".to_string()),
            ("sentinel_status", "ok".to_string()),
            ("is_ajax", "1".to_string()),
            ("complete", "false".to_string()),
        ];
        if page > 0 {
            pairs.push(("page", page.to_string()));
        }

        pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Write one fetched body into the configured dump directory.
    fn dump_page(&self, page: u32, html: &str) {
        let Some(dir) = &self.config.dump_dir else {
            return;
        };
        let write = std::fs::create_dir_all(dir)
            .and_then(|_| std::fs::write(dir.join(format!("page_{page}.html")), html));
        if let Err(error) = write {
            tracing::warn!(%error, page, "failed to write debug page dump");
        }
    }
}

/// Whether a fetched body signals the end of available data: empty, or
/// byte-length-identical to the previous page while suspiciously small.
fn page_looks_exhausted(html: &str, last_len: Option<usize>) -> bool {
    html.is_empty()
        || last_len.is_some_and(|prev| prev == html.len() && html.len() < MIN_PAGE_LEN)
}

/// Slot date as midnight in the site's time zone, or `None` when the text
/// does not parse as `d. m. yyyy`.
fn slot_date(date_text: &str) -> Option<DateTime<Tz>> {
    let date = NaiveDate::parse_from_str(date_text.trim(), DATE_FORMAT).ok()?;
    Ljubljana
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
}

/// Uniform random pause within the configured bounds
fn pause_secs((lo, hi): (f64, f64)) -> f64 {
    if hi > lo {
        rand::thread_rng().gen_range(lo..hi)
    } else {
        lo.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientConfig, UpravaClient};

    fn crawler_with(config: CrawlConfig) -> SlotCrawler {
        let client = UpravaClient::with_config(ClientConfig::default()).unwrap();
        SlotCrawler::with_client(client, config)
    }

    #[test]
    fn test_first_page_query_has_no_page_param() {
        let crawler = crawler_with(CrawlConfig::default());
        let query = crawler.build_query(0);
        assert!(!query.contains("page="));
        assert!(query.starts_with("lang=si&type=-&cat=-&izpitniCenter=-1&lokacija=-1"));
        assert!(query.contains("is_ajax=1"));
        assert!(query.contains("complete=false"));
    }

    #[test]
    fn test_later_page_query_carries_page_param() {
        let crawler = crawler_with(CrawlConfig::default());
        assert!(crawler.build_query(2).ends_with("&page=2"));
    }

    #[test]
    fn test_query_encodes_filter_overrides() {
        let crawler = crawler_with(CrawlConfig {
            category: "B 1".to_string(),
            ..CrawlConfig::default()
        });
        assert!(crawler.build_query(0).contains("cat=B%201"));
    }

    #[test]
    fn test_slot_date_parses_unpadded_form() {
        let parsed = slot_date("1. 9. 2026").unwrap();
        assert_eq!(parsed.date_naive(), NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());

        let parsed = slot_date(" 13. 12. 2025 ").unwrap();
        assert_eq!(parsed.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 13).unwrap());
    }

    #[test]
    fn test_slot_date_rejects_garbage() {
        assert!(slot_date("kmalu").is_none());
        assert!(slot_date("2025-09-13").is_none());
        assert!(slot_date("").is_none());
    }

    #[test]
    fn test_far_future_slot_exceeds_cutoff() {
        let cutoff = Utc::now().with_timezone(&Ljubljana) + ChronoDuration::days(30);
        assert!(slot_date("1. 1. 2099").unwrap() > cutoff);
    }

    #[test]
    fn test_page_exhaustion_predicate() {
        // Empty body always terminates.
        assert!(page_looks_exhausted("", None));
        assert!(page_looks_exhausted("", Some(500)));

        // Stagnant length below the threshold terminates.
        let short = "x".repeat(50);
        assert!(page_looks_exhausted(&short, Some(50)));

        // Same length but substantial content does not.
        let long = "x".repeat(400);
        assert!(!page_looks_exhausted(&long, Some(400)));

        // Different length below the threshold does not.
        assert!(!page_looks_exhausted(&short, Some(51)));

        // The first page has no previous length to compare against.
        assert!(!page_looks_exhausted(&short, None));
    }

    #[test]
    fn test_pause_bounds() {
        for _ in 0..50 {
            let pause = pause_secs((0.6, 1.1));
            assert!((0.6..1.1).contains(&pause));
        }
        assert_eq!(pause_secs((0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_default_config_matches_site_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.slot_type, "-");
        assert_eq!(config.category, "-");
        assert_eq!(config.exam_center, "-1");
        assert_eq!(config.location, "-1");
        assert_eq!(config.max_pages, 300);
        assert_eq!(config.max_days_ahead, 30);
    }
}
