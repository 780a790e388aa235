//! Search results parser for MobyGames
//!
//! Turns the `/games` response into ranked [`Candidate`]s.

use serde_json::Value;

use crate::platform::PlatformMapper;
use crate::types::{CacheKey, Candidate};

/// Parameters of the search that produced a response
pub struct SearchContext<'a> {
    pub term: &'a str,
    pub platform: &'a str,
    pub scraper_platform: u32,
    pub cache_key: &'a CacheKey,
}

/// Parses the game list and ranks it, best match first
///
/// Entries without a `game_id` are skipped. A response without a `games`
/// array yields no candidates.
pub fn parse_search_results(json: &Value, ctx: &SearchContext<'_>) -> Vec<Candidate> {
    let Some(games) = json.get("games").and_then(Value::as_array) else {
        tracing::warn!("Search response has no games list");
        return Vec::new();
    };

    let mapper = PlatformMapper::global();
    let mut candidates: Vec<Candidate> = games
        .iter()
        .filter_map(|item| {
            let id = item.get("game_id").and_then(Value::as_u64)?;
            let title = item
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let listed_platform = listed_platform(item);
            let platform_name = mapper
                .to_internal(listed_platform.unwrap_or(ctx.scraper_platform))
                .long_name;

            Some(Candidate {
                id,
                display_name: format!("{} ({})", title, platform_name),
                order: score(&title, ctx.term),
                title,
                platform: ctx.platform.to_string(),
                scraper_platform: ctx.scraper_platform,
                listed_platform,
                cache_key: ctx.cache_key.clone(),
            })
        })
        .collect();

    rank_candidates(&mut candidates);
    candidates
}

/// First platform id attached to a search entry
///
/// Full-format entries carry a `platforms` list; some carry a bare
/// `platform` id instead.
fn listed_platform(item: &Value) -> Option<u32> {
    let code = item
        .get("platforms")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .and_then(|p| p.get("platform_id"))
        .and_then(Value::as_u64)
        .or_else(|| item.get("platform").and_then(Value::as_u64))?;
    u32::try_from(code).ok()
}

/// Relevance of a title for a search term
///
/// Starts at 1, +2 for a case-insensitive exact match, +1 when the term
/// appears anywhere in the title.
pub fn score(title: &str, term: &str) -> u32 {
    let title = title.to_lowercase();
    let term = term.to_lowercase();
    let mut order = 1;
    if title == term {
        order += 2;
    }
    if title.contains(&term) {
        order += 1;
    }
    order
}

/// Sorts by score, highest first; equal scores keep their API order
pub fn rank_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.order.cmp(&a.order));
}
