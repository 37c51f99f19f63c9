//! Slot Crawler Core Library
//!
//! This crate collects publicly listed driving-exam time slots from the
//! Slovenian e-uprava site. The listing is served as paginated,
//! script-rendered HTML fragments; the crate turns it into a normalized,
//! deduplicated set of slot records and hands them to a storage collaborator.
//!
//! # Features
//! - Session-aware HTTP client with retry and exponential backoff
//! - Tolerant fragment parsing (zone, town, exam type, capacity,
//!   interpreter flag, license categories)
//! - Paginated crawl with day-ahead cutoff and multiple stop conditions
//! - SQLite-backed slot store implementing the storage contract

pub mod client;
pub mod crawler;
pub mod error;
pub mod normalize;
pub mod parser;
pub mod storage;
pub mod types;

// Re-export main types for convenience
pub use client::{ClientConfig, UpravaClient};
pub use crawler::{CrawlConfig, SlotCrawler};
pub use error::{Result, ScrapeError};
pub use normalize::Normalizer;
pub use storage::{SlotStore, SqliteStore, UpsertSummary};
pub use types::{DedupKey, ExamType, NormalizedSlot, SlotCandidate};
