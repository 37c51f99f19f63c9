//! CLI entry for the slot crawler.
//!
//! Initializes the store schema, runs one crawl with default configuration,
//! upserts the results and prints a short report.
//!
//! Environment toggles:
//! - `DB_PATH`  - SQLite file location (default: `slots.db`)
//! - `DEBUG=1`  - dump the first two fetched page bodies into `OUTDIR`
//! - `OUTDIR`   - dump directory (default: `/tmp/debug_pages`)
//! - `RUST_LOG` - tracing filter (default: `info`)

use std::env;
use std::error::Error;
use std::path::PathBuf;

use termini_core::{ClientConfig, CrawlConfig, SlotCrawler, SlotStore, SqliteStore, UpravaClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dump_dir = match env::var("DEBUG") {
        Ok(flag) if flag == "1" => Some(PathBuf::from(
            env::var("OUTDIR").unwrap_or_else(|_| "/tmp/debug_pages".to_string()),
        )),
        _ => None,
    };
    let db_path = env::var("DB_PATH").unwrap_or_else(|_| "slots.db".to_string());

    let store = SqliteStore::open(&db_path)?;
    store.init_schema()?;

    let client = UpravaClient::with_config(ClientConfig::default())?;
    let config = CrawlConfig {
        dump_dir,
        ..CrawlConfig::default()
    };
    let crawler = SlotCrawler::with_client(client, config);

    let slots = crawler.crawl().await?;
    let summary = store.upsert(&slots)?;

    println!(
        "Found {} slots | opened(new): {} | touched: {}",
        slots.len(),
        summary.opened,
        summary.touched
    );
    for (i, slot) in slots.iter().take(5).enumerate() {
        let location = slot.location.as_deref().unwrap_or("-");
        let categories = if slot.categories.is_empty() {
            "-".to_string()
        } else {
            slot.categories.join(",")
        };
        println!(
            "{}. {} {} | {} | {}",
            i + 1,
            slot.date_text,
            slot.time_text,
            location,
            categories
        );
    }

    Ok(())
}
