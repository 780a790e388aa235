//! Core data types for the MobyGames scraper
//!
//! Contains the records produced by searches, metadata lookups and
//! asset listings. All of them round-trip through serde so they can
//! live in the disk cache.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_META_TITLE: &str = "";
pub const DEFAULT_META_YEAR: &str = "";
pub const DEFAULT_META_GENRE: &str = "";
pub const DEFAULT_META_PLOT: &str = "";
pub const DEFAULT_META_RATING: &str = "";
pub const DEFAULT_META_DEVELOPER: &str = "";
pub const DEFAULT_META_ESRB: &str = "RP - Rating Pending";
pub const DEFAULT_META_PEGI: &str = "";
pub const DEFAULT_META_NPLAYERS: &str = "";
pub const DEFAULT_META_NPLAYERS_ONLINE: &str = "";

/// Media categories understood by the launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Title,
    Snap,
    BoxFront,
    BoxBack,
    Cartridge,
    Map,
    Manual,
}

impl AssetKind {
    pub const ALL: [AssetKind; 7] = [
        AssetKind::Title,
        AssetKind::Snap,
        AssetKind::BoxFront,
        AssetKind::BoxBack,
        AssetKind::Cartridge,
        AssetKind::Map,
        AssetKind::Manual,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Title => "Title",
            AssetKind::Snap => "Snap",
            AssetKind::BoxFront => "Boxfront",
            AssetKind::BoxBack => "Boxback",
            AssetKind::Cartridge => "Cartridge",
            AssetKind::Map => "Map",
            AssetKind::Manual => "Manual",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata fields a scraper may be able to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Title,
    Year,
    Genre,
    Plot,
    Rating,
    Developer,
    Esrb,
    Pegi,
    NPlayers,
    NPlayersOnline,
    Tags,
}

/// Key shared by all three cache namespaces
///
/// Built from the ROM file name (without extension) and the internal
/// platform name, so the same ROM scraped for two platforms gets two keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(rom_name: &str, platform: &str) -> Self {
        Self(format!("{}__{}", rom_name.trim(), platform.trim()))
    }

    /// Derives the key from a ROM path, dropping directories and extension
    pub fn for_rom(rom_path: &Path, platform: &str) -> Self {
        let stem = rom_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(&stem, platform)
    }

    /// Key of one search for this ROM
    ///
    /// Terms differing only in case or surrounding space share a key.
    pub fn with_term(&self, term: &str) -> Self {
        Self(format!("{}__{}", self.0, term.trim().to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One possible match for a ROM, as returned by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// MobyGames game id
    pub id: u64,

    /// Title exactly as MobyGames returned it
    pub title: String,

    /// Title plus platform, e.g. "Castlevania (Nintendo NES)"
    pub display_name: String,

    /// Internal platform the search was issued for
    pub platform: String,

    /// MobyGames platform code used in the query (0 when unknown)
    pub scraper_platform: u32,

    /// First platform code the search result listed for this game
    pub listed_platform: Option<u32>,

    /// Relevance score, higher first
    pub order: u32,

    /// Cache key the candidate was searched under
    pub cache_key: CacheKey,
}

impl Candidate {
    /// Platform code to use for platform-scoped endpoints
    ///
    /// Falls back to the platform listed by the search result when the
    /// query was issued without a platform filter.
    pub fn effective_platform(&self) -> Option<u32> {
        if self.scraper_platform != 0 {
            Some(self.scraper_platform)
        } else {
            self.listed_platform.filter(|code| *code != 0)
        }
    }
}

/// Merged metadata for one game on one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub title: String,
    pub year: String,
    pub genre: String,
    pub plot: String,
    pub rating: String,
    pub developer: String,
    pub esrb: String,
    pub pegi: String,
    pub nplayers: String,
    pub nplayers_online: String,
    pub tags: Vec<String>,
}

impl Default for GameMetadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_META_TITLE.to_string(),
            year: DEFAULT_META_YEAR.to_string(),
            genre: DEFAULT_META_GENRE.to_string(),
            plot: DEFAULT_META_PLOT.to_string(),
            rating: DEFAULT_META_RATING.to_string(),
            developer: DEFAULT_META_DEVELOPER.to_string(),
            esrb: DEFAULT_META_ESRB.to_string(),
            pegi: DEFAULT_META_PEGI.to_string(),
            nplayers: DEFAULT_META_NPLAYERS.to_string(),
            nplayers_online: DEFAULT_META_NPLAYERS_ONLINE.to_string(),
            tags: Vec::new(),
        }
    }
}

/// A single downloadable image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub kind: AssetKind,
    pub display_name: String,
    /// Full resolution image
    pub url: String,
    pub url_thumb: String,
}

/// A URL ready for download together with its loggable form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub url: String,
    pub url_log: String,
}

/// An entry of the MobyGames platform catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlatform {
    pub id: u32,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(scraper_platform: u32, listed_platform: Option<u32>) -> Candidate {
        Candidate {
            id: 1,
            title: "Castlevania".to_string(),
            display_name: "Castlevania (Nintendo NES)".to_string(),
            platform: "Nintendo NES".to_string(),
            scraper_platform,
            listed_platform,
            order: 1,
            cache_key: CacheKey::new("castlevania", "Nintendo NES"),
        }
    }

    #[test]
    fn test_cache_key_for_rom_drops_extension_and_dirs() {
        let key = CacheKey::for_rom(Path::new("/roms/nes/Castlevania (USA).zip"), "Nintendo NES");
        assert_eq!(key.as_str(), "Castlevania (USA)__Nintendo NES");
    }

    #[test]
    fn test_cache_key_with_term() {
        let key = CacheKey::new("Castlevania (J)", "Nintendo NES");
        assert_eq!(key.with_term(" Castlevania ").as_str(), "Castlevania (J)__Nintendo NES__castlevania");
        assert_eq!(key.with_term("CASTLEVANIA"), key.with_term("castlevania"));
        assert_ne!(key.with_term("Castlevania"), key.with_term("Akumajo Densetsu"));
    }

    #[test]
        fn test_cache_key_differs_per_platform() {
        let a = CacheKey::new("sonic", "Sega Genesis");
        let b = CacheKey::new("sonic", "Sega Mega Drive");
        assert_ne!(a, b);
    }

    #[test]
    fn test_effective_platform_prefers_query_code() {
        assert_eq!(candidate(22, Some(9)).effective_platform(), Some(22));
    }

    #[test]
    fn test_effective_platform_falls_back_to_listed() {
        assert_eq!(candidate(0, Some(9)).effective_platform(), Some(9));
        assert_eq!(candidate(0, None).effective_platform(), None);
        assert_eq!(candidate(0, Some(0)).effective_platform(), None);
    }

    #[test]
    fn test_metadata_defaults() {
        let meta = GameMetadata::default();
        assert_eq!(meta.esrb, DEFAULT_META_ESRB);
        assert!(meta.title.is_empty());
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_candidate_serialization() {
        let original = candidate(22, None);
        let json = serde_json::to_string(&original).expect("Serialization should succeed");
        let restored: Candidate =
            serde_json::from_str(&json).expect("Deserialization should succeed");
        assert_eq!(original, restored);
    }

    #[test]
    fn test_asset_kind_serializes_snake_case() {
        let json = serde_json::to_string(&AssetKind::BoxFront).expect("Serialization should succeed");
        assert_eq!(json, "\"box_front\"");
    }
}
