//! MobyGames Scraper Core Library
//!
//! Provides async API for matching ROM files to MobyGames games and
//! collecting their metadata and artwork.
//!
//! # Overview
//!
//! This crate provides a complete scraping engine for the MobyGames API with:
//! - Rate-limited HTTP client that honours the API quota and asks before waiting out a 429
//! - Persistent JSON cache for candidates, metadata and assets
//! - JSON parsers turning API records into launcher metadata and asset lists
//! - Platform mapping between launcher platform names and MobyGames platform codes
//!
//! # Example
//!
//! ```no_run
//! use mobygames_core::{AssetKind, CacheKey, MobyGamesScraper, Result, Scraper, ScraperConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut scraper = MobyGamesScraper::new(ScraperConfig::from_env())?;
//!     scraper.check_ready()?;
//!
//!     let key = CacheKey::new("Castlevania (USA)", "Nintendo NES");
//!     let candidates = scraper.search_candidates("Castlevania", &key, "Nintendo NES").await?;
//!
//!     if let Some(best) = candidates.first() {
//!         let meta = scraper.fetch_metadata(best).await?;
//!         println!("{} - {}", meta.title, meta.developer);
//!
//!         for asset in scraper.fetch_assets(best, AssetKind::BoxFront).await? {
//!             let resolved = scraper.resolve_asset_url(&asset);
//!             println!("{}: {}", asset.display_name, resolved.url_log);
//!         }
//!     }
//!
//!     scraper.flush_cache()?;
//!     Ok(())
//! }
//! ```
//!
//! # API key
//!
//! Every request carries the key in its query string. Use
//! [`url::redact_api_key`] before logging a URL; the client does so for
//! everything it logs.

pub mod cache;
mod client;
pub mod credentials;
mod error;
pub mod parser;
pub mod platform;
pub mod prompt;
mod scraper;
mod types;
pub mod url;

// Re-export client types
pub use client::{HttpResponse, HttpTransport, MobyGamesClient, RateLimiter, ReqwestTransport, ScraperConfig};

// Re-export error types
pub use error::{Result, ScraperError};

// Re-export cache and platform types
pub use cache::{CacheStore, JsonFileCache, MemoryCache, Namespace};
pub use platform::{Platform, PlatformMapper};

// Re-export main scraper API
pub use crate::scraper::{MobyGamesScraper, Scraper, ScraperParts};

// Re-export data types
pub use types::{
    AssetKind, AssetRecord, CacheKey, Candidate, GameMetadata, MetadataField, RemotePlatform,
    ResolvedUrl,
};

// Re-export URL helper functions for convenience
pub use url::{asset_url_extension, redact_api_key, to_secure_scheme};
