//! Main scraper API for MobyGames
//!
//! Provides the capability trait shared by scraper providers and the
//! MobyGames implementation, combining the HTTP client, the cache and
//! the JSON parsers.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::{CacheStore, JsonFileCache, MemoryCache, Namespace, PersistentCache};
use crate::client::{HttpTransport, MobyGamesClient, ReqwestTransport, ScraperConfig};
use crate::credentials::{CredentialProvider, StaticCredential};
use crate::error::{Result, ScraperError};
use crate::parser::{
    SearchContext, build_metadata, parse_covers, parse_platform_catalog, parse_screenshots,
    parse_search_results,
};
use crate::platform::PlatformMapper;
use crate::prompt::{AlwaysWait, UserPrompt};
use crate::types::{
    AssetKind, AssetRecord, CacheKey, Candidate, GameMetadata, MetadataField, RemotePlatform,
    ResolvedUrl,
};
use crate::url::{
    asset_url_extension, build_covers_url, build_game_platform_url, build_game_url,
    build_platforms_url, build_screenshots_url, build_search_url, redact_api_key,
    to_secure_scheme,
};

const SCRAPER_NAME: &str = "MobyGames";

const SUPPORTED_ASSETS: [AssetKind; 6] = [
    AssetKind::Title,
    AssetKind::Snap,
    AssetKind::BoxFront,
    AssetKind::BoxBack,
    AssetKind::Cartridge,
    AssetKind::Map,
];

/// Operations every scraper provider offers
///
/// A disabled scraper answers every operation with an empty or default
/// result instead of an error, so callers need no special case for an
/// unavailable provider.
#[async_trait]
pub trait Scraper: Send {
    fn name(&self) -> &'static str;

    fn supports_metadata(&self, field: MetadataField) -> bool;

    fn supports_asset(&self, kind: AssetKind) -> bool;

    fn is_disabled(&self) -> bool;

    /// Verifies the scraper can run
    ///
    /// # Errors
    /// `NotConfigured` when no API key is available, `Cancelled` once a
    /// rate-limit wait was declined. In both cases the scraper is disabled
    /// but remains usable as a no-op.
    fn check_ready(&mut self) -> Result<()>;

    /// Searches candidates for a ROM, best match first
    ///
    /// Results are cached per ROM and search term.
    async fn search_candidates(
        &mut self,
        term: &str,
        cache_key: &CacheKey,
        platform: &str,
    ) -> Result<Vec<Candidate>>;

    /// Metadata of a candidate, cached under its cache key
    async fn fetch_metadata(&mut self, candidate: &Candidate) -> Result<GameMetadata>;

    /// Assets of one kind for a candidate
    async fn fetch_assets(&mut self, candidate: &Candidate, kind: AssetKind) -> Result<Vec<AssetRecord>>;

    /// Download URL of an asset and the same URL safe for logging
    fn resolve_asset_url(&self, asset: &AssetRecord) -> ResolvedUrl;

    fn resolve_asset_url_extension(&self, url: &str) -> Option<String> {
        asset_url_extension(url)
    }

    /// Downloads an image to `destination`
    ///
    /// Returns `false` without touching the network when disabled.
    async fn download_asset(&mut self, url: &str, destination: &Path) -> Result<bool>;

    /// Persists the cache; call after a batch of operations
    fn flush_cache(&mut self) -> Result<()>;
}

/// Per-session state owned by one scraper instance
struct Session {
    api_key: Option<String>,
    /// Set once the user declines a rate-limit wait; lasts for the session
    cancelled: bool,
}

impl Session {
    fn disabled(&self) -> bool {
        self.cancelled || self.api_key.is_none()
    }
}

/// Collaborators of a [`MobyGamesScraper`]
pub struct ScraperParts {
    pub transport: Box<dyn HttpTransport>,
    pub prompt: Box<dyn UserPrompt>,
    pub cache: Box<dyn PersistentCache>,
    pub credentials: Box<dyn CredentialProvider>,
}

/// MobyGames scraper
///
/// # Example
/// ```no_run
/// # async fn example() -> mobygames_core::Result<()> {
/// use mobygames_core::{CacheKey, MobyGamesScraper, Scraper, ScraperConfig};
/// let mut scraper = MobyGamesScraper::new(ScraperConfig::from_env())?;
/// scraper.check_ready()?;
///
/// let key = CacheKey::new("Castlevania (USA)", "Nintendo NES");
/// let candidates = scraper.search_candidates("Castlevania", &key, "Nintendo NES").await?;
/// if let Some(best) = candidates.first() {
///     let meta = scraper.fetch_metadata(best).await?;
///     println!("{} ({})", meta.title, meta.year);
/// }
/// scraper.flush_cache()?;
/// # Ok(())
/// # }
/// ```
pub struct MobyGamesScraper {
    config: ScraperConfig,
    client: MobyGamesClient,
    cache: CacheStore,
    credentials: Box<dyn CredentialProvider>,
    session: Session,
}

impl MobyGamesScraper {
    /// Create a scraper with the default network stack
    ///
    /// Uses `reqwest`, a prompt that always waits out rate windows, and a
    /// disk cache when `cache_dir` is configured.
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout_secs)?;
        let cache: Box<dyn PersistentCache> = match &config.cache_dir {
            Some(dir) => Box::new(JsonFileCache::new(dir, SCRAPER_NAME)),
            None => Box::new(MemoryCache),
        };
        let credentials = Box::new(StaticCredential::new(config.api_key.clone()));
        Ok(Self::with_parts(
            config,
            ScraperParts {
                transport: Box::new(transport),
                prompt: Box::new(AlwaysWait),
                cache,
                credentials,
            },
        ))
    }

    /// Create a scraper from explicit collaborators
    pub fn with_parts(config: ScraperConfig, parts: ScraperParts) -> Self {
        let api_key = parts.credentials.api_key();
        let client = MobyGamesClient::new(&config, parts.transport, parts.prompt);
        Self {
            client,
            cache: CacheStore::new(parts.cache),
            credentials: parts.credentials,
            session: Session {
                api_key,
                cancelled: false,
            },
            config,
        }
    }

    fn api_key(&self) -> &str {
        self.session.api_key.as_deref().unwrap_or_default()
    }

    /// Retrieves MobyGames' platform catalog
    pub async fn fetch_platform_catalog(&mut self) -> Result<Vec<RemotePlatform>> {
        if self.session.disabled() {
            tracing::debug!("Scraper disabled. Returning empty data");
            return Ok(Vec::new());
        }
        let url = build_platforms_url(&self.config.base_url, self.api_key());
        let json = self.get_json(&url, "MobyGames_get_platforms.json").await?;
        Ok(parse_platform_catalog(&json))
    }

    /// Calls the API, disabling the session if the user cancels a rate-limit wait
    async fn get_json(&mut self, url: &str, dump_name: &str) -> Result<Value> {
        match self.client.get_json(url).await {
            Ok(json) => {
                dump_json(self.config.debug_dump_dir.as_deref(), dump_name, &json).await;
                Ok(json)
            }
            Err(ScraperError::Cancelled) => {
                self.session.cancelled = true;
                Err(ScraperError::Cancelled)
            }
            Err(e) => Err(e),
        }
    }

    /// Every asset of a candidate, fetched once and cached in the internal namespace
    async fn retrieve_all_assets(&mut self, candidate: &Candidate) -> Result<Vec<AssetRecord>> {
        let key = &candidate.cache_key;
        if self.cache.has(Namespace::Internal, key)
            && let Some(assets) = self.cache.get(Namespace::Internal, key)
        {
            tracing::debug!(cache_key = %key, "Internal cache hit");
            return Ok(assets);
        }
        tracing::debug!(cache_key = %key, "Internal cache miss");

        let assets = match candidate.effective_platform() {
            Some(platform) => {
                let base = &self.config.base_url;
                let snaps_url = build_screenshots_url(base, self.api_key(), candidate.id, platform);
                let covers_url = build_covers_url(base, self.api_key(), candidate.id, platform);

                tracing::debug!("Getting Snaps...");
                let snaps = self.get_json(&snaps_url, "MobyGames_assets_snap.json").await?;
                tracing::debug!("Getting Covers...");
                let covers = self.get_json(&covers_url, "MobyGames_assets_cover.json").await?;

                let mut assets = parse_screenshots(&snaps);
                let snap_count = assets.len();
                assets.extend(parse_covers(&covers));
                tracing::debug!(
                    candidate = candidate.id,
                    snaps = snap_count,
                    covers = assets.len() - snap_count,
                    "Assets found"
                );
                assets
            }
            None => {
                tracing::warn!(candidate = candidate.id, "No platform known for candidate, no assets");
                Vec::new()
            }
        };

        self.cache.put(Namespace::Internal, key, &assets)?;
        Ok(assets)
    }
}

/// Writes a raw response under the debug directory; failures are only logged
async fn dump_json(dir: Option<&Path>, name: &str, json: &Value) {
    let Some(dir) = dir else {
        return;
    };
    let path = dir.join(name);
    let written = match serde_json::to_vec_pretty(json) {
        Ok(bytes) => match tokio::fs::create_dir_all(dir).await {
            Ok(()) => tokio::fs::write(&path, bytes).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(std::io::Error::other(e)),
    };
    if let Err(e) = written {
        tracing::warn!(path = %path.display(), error = %e, "Could not dump JSON");
    }
}

#[async_trait]
impl Scraper for MobyGamesScraper {
    fn name(&self) -> &'static str {
        SCRAPER_NAME
    }

    fn supports_metadata(&self, _field: MetadataField) -> bool {
        true
    }

    fn supports_asset(&self, kind: AssetKind) -> bool {
        SUPPORTED_ASSETS.contains(&kind)
    }

    fn is_disabled(&self) -> bool {
        self.session.disabled()
    }

    fn check_ready(&mut self) -> Result<()> {
        self.session.api_key = self.credentials.api_key();
        if self.session.cancelled {
            tracing::warn!("MobyGames scraper disabled for this session after a cancelled rate limit wait");
            return Err(ScraperError::Cancelled);
        }
        if self.session.api_key.is_none() {
            tracing::error!("MobyGames API key not configured. Disabling MobyGames scraper");
            return Err(ScraperError::NotConfigured);
        }
        tracing::debug!("MobyGames API key looks OK");
        Ok(())
    }

    async fn search_candidates(
        &mut self,
        term: &str,
        cache_key: &CacheKey,
        platform: &str,
    ) -> Result<Vec<Candidate>> {
        if self.session.disabled() {
            tracing::debug!("Scraper disabled. Returning empty data");
            return Ok(Vec::new());
        }
        let search_key = cache_key.with_term(term);
        if self.cache.has(Namespace::Candidates, &search_key)
            && let Some(candidates) = self.cache.get(Namespace::Candidates, &search_key)
        {
            tracing::debug!(cache_key = %search_key, "Candidates cache hit");
            return Ok(candidates);
        }

        let scraper_platform = PlatformMapper::global().to_external(platform);
        tracing::debug!(term, platform, scraper_platform, "Searching candidates");

        let url = build_search_url(&self.config.base_url, self.api_key(), term, scraper_platform);
        let json = self.get_json(&url, "MobyGames_get_candidates.json").await?;
        let candidates = parse_search_results(
            &json,
            &SearchContext {
                term,
                platform,
                scraper_platform,
                cache_key,
            },
        );
        tracing::info!(term, count = candidates.len(), "Candidates found");

        self.cache.put(Namespace::Candidates, &search_key, &candidates)?;
        Ok(candidates)
    }

    async fn fetch_metadata(&mut self, candidate: &Candidate) -> Result<GameMetadata> {
        if self.session.disabled() {
            tracing::debug!("Scraper disabled. Returning empty data");
            return Ok(GameMetadata::default());
        }
        let key = &candidate.cache_key;
        if self.cache.has(Namespace::Metadata, key)
            && let Some(metadata) = self.cache.get(Namespace::Metadata, key)
        {
            tracing::debug!(cache_key = %key, "Metadata cache hit");
            return Ok(metadata);
        }
        tracing::debug!(cache_key = %key, "Metadata cache miss");

        let game_url = build_game_url(&self.config.base_url, self.api_key(), candidate.id);
        let game = self.get_json(&game_url, "MobyGames_get_metadata.json").await?;

        let platform_code = candidate.effective_platform();
        let platform = match platform_code {
            Some(code) => {
                let url = build_game_platform_url(&self.config.base_url, self.api_key(), candidate.id, code);
                Some(self.get_json(&url, "MobyGames_get_metadata_platform.json").await?)
            }
            None => None,
        };

        let metadata = build_metadata(&game, platform.as_ref(), platform_code);
        tracing::debug!(cache_key = %key, "Adding to metadata cache");
        self.cache.put(Namespace::Metadata, key, &metadata)?;
        Ok(metadata)
    }

    async fn fetch_assets(&mut self, candidate: &Candidate, kind: AssetKind) -> Result<Vec<AssetRecord>> {
        if self.session.disabled() {
            tracing::debug!("Scraper disabled. Returning empty data");
            return Ok(Vec::new());
        }
        let all = self.retrieve_all_assets(candidate).await?;
        let total = all.len();
        let assets: Vec<AssetRecord> = all.into_iter().filter(|a| a.kind == kind).collect();
        tracing::debug!(%kind, total, returned = assets.len(), "Assets filtered");
        Ok(assets)
    }

    fn resolve_asset_url(&self, asset: &AssetRecord) -> ResolvedUrl {
        let url = to_secure_scheme(&asset.url);
        let url_log = redact_api_key(&url);
        ResolvedUrl { url, url_log }
    }

    async fn download_asset(&mut self, url: &str, destination: &Path) -> Result<bool> {
        if self.session.disabled() {
            return Ok(false);
        }
        self.client.download(url, destination).await?;
        Ok(true)
    }

    fn flush_cache(&mut self) -> Result<()> {
        self.cache.flush()
    }
}
