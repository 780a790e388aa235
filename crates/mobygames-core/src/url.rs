//! URL helper functions for the MobyGames API
//!
//! Provides builders for every endpoint the scraper calls, plus helpers
//! for making URLs safe to log and ready to download.

use std::sync::LazyLock;

use regex::Regex;

use crate::platform::UNKNOWN_PLATFORM_CODE;

pub const DEFAULT_BASE_URL: &str = "https://api.mobygames.com/v1";

static API_KEY_MIDDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"api_key=[^&]*&").expect("valid regex"));
static API_KEY_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"api_key=[^&]*$").expect("valid regex"));

/// Builds the game search URL
///
/// The platform filter is left out entirely when `platform` is the
/// unknown sentinel.
///
/// # Example
/// ```
/// use mobygames_core::url::build_search_url;
/// let url = build_search_url("https://api.mobygames.com/v1", "KEY", "Super Metroid", 15);
/// assert_eq!(
///     url,
///     "https://api.mobygames.com/v1/games?api_key=KEY&format=brief&title=Super%20Metroid&platform=15"
/// );
/// ```
pub fn build_search_url(base: &str, api_key: &str, term: &str, platform: u32) -> String {
    let encoded = urlencoding::encode(term);
    if platform == UNKNOWN_PLATFORM_CODE {
        format!("{base}/games?api_key={api_key}&format=brief&title={encoded}")
    } else {
        format!("{base}/games?api_key={api_key}&format=brief&title={encoded}&platform={platform}")
    }
}

/// Builds the game detail URL
pub fn build_game_url(base: &str, api_key: &str, game_id: u64) -> String {
    format!("{base}/games/{game_id}?api_key={api_key}")
}

/// Builds the platform-scoped game detail URL (attributes, ratings, releases)
pub fn build_game_platform_url(base: &str, api_key: &str, game_id: u64, platform: u32) -> String {
    format!("{base}/games/{game_id}/platforms/{platform}?api_key={api_key}")
}

pub fn build_screenshots_url(base: &str, api_key: &str, game_id: u64, platform: u32) -> String {
    format!("{base}/games/{game_id}/platforms/{platform}/screenshots?api_key={api_key}")
}

pub fn build_covers_url(base: &str, api_key: &str, game_id: u64, platform: u32) -> String {
    format!("{base}/games/{game_id}/platforms/{platform}/covers?api_key={api_key}")
}

pub fn build_platforms_url(base: &str, api_key: &str) -> String {
    format!("{base}/platforms?api_key={api_key}")
}

/// Replaces the API key value with `***`
///
/// Every other part of the URL is left untouched.
///
/// # Example
/// ```
/// use mobygames_core::url::redact_api_key;
/// assert_eq!(
///     redact_api_key("https://x/games?api_key=SECRET&title=a"),
///     "https://x/games?api_key=***&title=a"
/// );
/// assert_eq!(redact_api_key("https://x/platforms?api_key=SECRET"), "https://x/platforms?api_key=***");
/// ```
pub fn redact_api_key(url: &str) -> String {
    let clean = API_KEY_MIDDLE.replace_all(url, "api_key=***&");
    API_KEY_END.replace_all(&clean, "api_key=***").into_owned()
}

/// Rewrites `http://` URLs to `https://`, other URLs are returned as is
pub fn to_secure_scheme(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// Lower-cased file extension of the URL path, ignoring query and fragment
///
/// # Example
/// ```
/// use mobygames_core::url::asset_url_extension;
/// assert_eq!(asset_url_extension("https://cdn.mobygames.com/covers/1234.JPG?x=1"), Some("jpg".to_string()));
/// assert_eq!(asset_url_extension("https://cdn.mobygames.com/covers/"), None);
/// ```
pub fn asset_url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next()?;
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
