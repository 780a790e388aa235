//! Searches MobyGames for a ROM and prints the best match
//!
//! Usage: `MOBYGAMES_API_KEY=... cargo run --example search_game -- "Castlevania" "Nintendo NES"`

use mobygames_core::{AssetKind, CacheKey, MobyGamesScraper, Scraper, ScraperConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let term = args.next().unwrap_or_else(|| "Castlevania".to_string());
    let platform = args.next().unwrap_or_else(|| "Nintendo NES".to_string());

    let mut scraper = MobyGamesScraper::new(ScraperConfig::from_env())?;
    scraper.check_ready()?;

    let key = CacheKey::new(&term, &platform);
    let candidates = scraper.search_candidates(&term, &key, &platform).await?;
    println!("Found {} candidates for '{}' on {}\n", candidates.len(), term, platform);
    for candidate in &candidates {
        println!("  [{}] {} (id {})", candidate.order, candidate.display_name, candidate.id);
    }

    let Some(best) = candidates.first() else {
        return Ok(());
    };

    let meta = scraper.fetch_metadata(best).await?;
    println!("\n=== {} ===", meta.title);
    println!("Year:      {}", meta.year);
    println!("Genre:     {}", meta.genre);
    println!("Developer: {}", meta.developer);
    println!("Players:   {}", meta.nplayers);
    println!("ESRB:      {}", meta.esrb);
    println!("Tags:      {}", meta.tags.join(", "));
    println!("\n{}", meta.plot);

    for kind in [AssetKind::Title, AssetKind::BoxFront] {
        for asset in scraper.fetch_assets(best, kind).await? {
            println!("{kind}: {}", scraper.resolve_asset_url(&asset).url_log);
        }
    }

    scraper.flush_cache()?;
    Ok(())
}
