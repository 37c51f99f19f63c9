use termini_core::SlotCrawler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let crawler = SlotCrawler::new()?;

    println!("Iščem proste termine...\n");

    let slots = crawler.crawl().await?;

    println!("Najdenih {} terminov:", slots.len());
    for (i, slot) in slots.iter().take(10).enumerate() {
        let location = slot.location.as_deref().unwrap_or("-");
        let categories = if slot.categories.is_empty() {
            "-".to_string()
        } else {
            slot.categories.join(",")
        };
        println!(
            "  {}. {} {} | {} | {} | {:?}",
            i + 1,
            slot.date_text,
            slot.time_text,
            location,
            categories,
            slot.exam_type
        );
    }

    Ok(())
}
