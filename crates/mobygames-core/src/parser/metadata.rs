//! Field extractors for game metadata
//!
//! MobyGames omits or nulls fields freely. Every extractor here checks
//! presence, type and content and falls back to the field's default
//! instead of failing.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use serde_json::Value;

use crate::types::{
    DEFAULT_META_DEVELOPER, DEFAULT_META_ESRB, DEFAULT_META_GENRE, DEFAULT_META_NPLAYERS,
    DEFAULT_META_NPLAYERS_ONLINE, DEFAULT_META_PEGI, DEFAULT_META_PLOT, DEFAULT_META_RATING,
    DEFAULT_META_TITLE, DEFAULT_META_YEAR, GameMetadata,
};

const CATEGORY_PLAYERS: &str = "Number of Players Supported";
const CATEGORY_ONLINE_PLAYERS: &str = "Number of Online Players";

/// Matches "1 Player", "1-4 Players", "2 - 16 Online Players", "8+ Players"
static PLAYERS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:\d+\s*-\s*)?(\d+)\+?\s+(?:online\s+)?players?\s*$").expect("valid regex")
});

/// MobyGames ESRB names to launcher ESRB values
static ESRB_NAMES: &[(&str, &str)] = &[
    ("early childhood", "EC - Early Childhood"),
    ("everyone", "E - Everyone"),
    ("kids to adults", "E - Everyone"),
    ("everyone 10+", "E10+ - Everyone 10+"),
    ("teen", "T - Teen"),
    ("mature", "M - Mature"),
    ("adults only", "AO - Adults Only"),
    ("rating pending", "RP - Rating Pending"),
];

/// Cleanup applied to attribute values of one category before tagging
struct TagRule {
    category: &'static str,
    /// Literal values replaced by a canonical tag
    translations: &'static [(&'static str, &'static str)],
    /// Trailing boilerplate removed before lower-casing
    strip_suffixes: &'static [&'static str],
    /// Values never turned into tags
    dropped: &'static [&'static str],
}

static TAG_RULES: &[TagRule] = &[
    TagRule {
        category: "Multiplayer Options",
        translations: &[
            ("Same/Split-Screen", "split-screen"),
            ("Hot-Seat", "hot-seat"),
            ("Online", "online multiplayer"),
            ("LAN", "lan multiplayer"),
            ("Cooperative", "co-op"),
        ],
        strip_suffixes: &[],
        dropped: &["None"],
    },
    TagRule {
        category: "Input Devices Supported",
        translations: &[("Light Gun", "lightgun")],
        strip_suffixes: &[" (Any)"],
        dropped: &["Keyboard", "Joystick", "Gamepad", "Joypad", "D-Pad"],
    },
    TagRule {
        category: "Peripherals Supported",
        translations: &[],
        strip_suffixes: &[" Support", " Supported"],
        dropped: &["None"],
    },
    TagRule {
        category: "Save Game Methods",
        translations: &[
            ("Battery-backed RAM", "battery save"),
            ("Password", "password save"),
            ("Memory Card", "memory card save"),
        ],
        strip_suffixes: &[],
        dropped: &["None", "Not Applicable"],
    },
    TagRule {
        category: "Business Model",
        translations: &[],
        strip_suffixes: &[],
        dropped: &["Commercial"],
    },
    TagRule {
        category: "Miscellaneous Attributes",
        translations: &[],
        strip_suffixes: &[" Game"],
        dropped: &[],
    },
];

impl TagRule {
    fn apply(&self, value: &str) -> Option<String> {
        let value = value.trim();
        if self.dropped.iter().any(|d| d.eq_ignore_ascii_case(value)) {
            return None;
        }
        if let Some((_, tag)) = self
            .translations
            .iter()
            .find(|(from, _)| from.eq_ignore_ascii_case(value))
        {
            return Some((*tag).to_string());
        }
        let mut cleaned = value;
        for suffix in self.strip_suffixes {
            if let Some(stripped) = cleaned.strip_suffix(suffix) {
                cleaned = stripped.trim_end();
            }
        }
        let cleaned = cleaned.to_lowercase();
        (!cleaned.is_empty()).then_some(cleaned)
    }
}

fn str_field<'a>(json: &'a Value, key: &str) -> Option<&'a str> {
    json.get(key).and_then(Value::as_str)
}

fn list_field<'a>(json: &'a Value, key: &str) -> &'a [Value] {
    json.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn parse_title(game: &Value) -> String {
    str_field(game, "title")
        .unwrap_or(DEFAULT_META_TITLE)
        .to_string()
}

/// Release year on the queried platform, else on the first listed platform
pub fn parse_year(game: &Value, scraper_platform: Option<u32>) -> String {
    let platforms = list_field(game, "platforms");
    let year_of = |p: &Value| {
        str_field(p, "first_release_date")
            .and_then(|date| date.get(0..4))
            .map(str::to_string)
    };

    let matching = scraper_platform.and_then(|code| {
        platforms
            .iter()
            .find(|p| p.get("platform_id").and_then(Value::as_u64) == Some(u64::from(code)))
    });

    matching
        .or_else(|| platforms.first())
        .and_then(year_of)
        .unwrap_or_else(|| DEFAULT_META_YEAR.to_string())
}

/// Genre names joined with ", "
pub fn parse_genre(game: &Value) -> String {
    let names: Vec<&str> = list_field(game, "genres")
        .iter()
        .filter_map(|g| str_field(g, "genre_name"))
        .collect();
    if names.is_empty() {
        DEFAULT_META_GENRE.to_string()
    } else {
        names.join(", ")
    }
}

/// Description with HTML tags removed
pub fn parse_plot(game: &Value) -> String {
    match str_field(game, "description") {
        Some(description) => strip_html(description),
        None => DEFAULT_META_PLOT.to_string(),
    }
}

pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}

/// MobyScore (0-10) rounded to an integer
pub fn parse_rating(game: &Value) -> String {
    game.get("moby_score")
        .and_then(Value::as_f64)
        .filter(|score| score.is_finite() && *score >= 0.0)
        .map(|score| format!("{}", score.round() as u32))
        .unwrap_or_else(|| DEFAULT_META_RATING.to_string())
}

/// First company credited with "Developed by" in the platform record
pub fn parse_developer(platform: &Value) -> String {
    list_field(platform, "releases")
        .iter()
        .flat_map(|release| list_field(release, "companies"))
        .find(|company| {
            str_field(company, "role")
                .map(|role| role.eq_ignore_ascii_case("Developed by"))
                .unwrap_or(false)
        })
        .and_then(|company| str_field(company, "company_name"))
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_META_DEVELOPER.to_string())
}

fn rating_in_system<'a>(platform: &'a Value, system: &str) -> Option<&'a str> {
    list_field(platform, "ratings")
        .iter()
        .find(|r| {
            str_field(r, "rating_system_name")
                .map(|name| name.to_lowercase().contains(system))
                .unwrap_or(false)
        })
        .and_then(|r| str_field(r, "rating_name"))
}

pub fn parse_esrb(platform: &Value) -> String {
    rating_in_system(platform, "esrb")
        .and_then(|name| {
            let name = name.trim().to_lowercase();
            ESRB_NAMES
                .iter()
                .find(|(moby, _)| *moby == name)
                .map(|(_, esrb)| (*esrb).to_string())
        })
        .unwrap_or_else(|| DEFAULT_META_ESRB.to_string())
}

/// PEGI age, e.g. "12"
pub fn parse_pegi(platform: &Value) -> String {
    rating_in_system(platform, "pegi")
        .map(|name| {
            let name = name.trim();
            name.strip_prefix("PEGI").unwrap_or(name).trim().to_string()
        })
        .filter(|age| !age.is_empty())
        .unwrap_or_else(|| DEFAULT_META_PEGI.to_string())
}

fn attributes_in<'a>(platform: &'a Value, category: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    list_field(platform, "attributes")
        .iter()
        .filter(move |a| str_field(a, "attribute_category_name") == Some(category))
        .filter_map(|a| str_field(a, "attribute_name"))
}

/// Largest upper bound among attributes like "1-4 Players"
fn max_players(platform: &Value, category: &str, default: &str) -> String {
    attributes_in(platform, category)
        .filter_map(|name| PLAYERS_PATTERN.captures(name))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .max()
        .map(|n| n.to_string())
        .unwrap_or_else(|| default.to_string())
}

pub fn parse_nplayers(platform: &Value) -> String {
    max_players(platform, CATEGORY_PLAYERS, DEFAULT_META_NPLAYERS)
}

pub fn parse_nplayers_online(platform: &Value) -> String {
    max_players(platform, CATEGORY_ONLINE_PLAYERS, DEFAULT_META_NPLAYERS_ONLINE)
}

/// Tags from attribute categories that have a cleanup rule
///
/// Categories without a rule are ignored. Duplicates are removed, first
/// occurrence wins.
pub fn parse_tags(platform: &Value) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for attribute in list_field(platform, "attributes") {
        let (Some(category), Some(name)) = (
            str_field(attribute, "attribute_category_name"),
            str_field(attribute, "attribute_name"),
        ) else {
            continue;
        };
        let Some(rule) = TAG_RULES.iter().find(|r| r.category == category) else {
            continue;
        };
        if let Some(tag) = rule.apply(name)
            && !tags.contains(&tag)
        {
            tags.push(tag);
        }
    }
    tags
}

/// Merges the game record and its platform record into one metadata set
///
/// Without a platform record the platform-scoped fields keep their defaults.
pub fn build_metadata(game: &Value, platform: Option<&Value>, scraper_platform: Option<u32>) -> GameMetadata {
    let mut meta = GameMetadata {
        title: parse_title(game),
        year: parse_year(game, scraper_platform),
        genre: parse_genre(game),
        plot: parse_plot(game),
        rating: parse_rating(game),
        ..GameMetadata::default()
    };

    if let Some(platform) = platform {
        meta.developer = parse_developer(platform);
        meta.esrb = parse_esrb(platform);
        meta.pegi = parse_pegi(platform);
        meta.nplayers = parse_nplayers(platform);
        meta.nplayers_online = parse_nplayers_online(platform);
        meta.tags = parse_tags(platform);
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn game() -> Value {
        json!({
            "game_id": 1104,
            "title": "Castlevania",
            "description": "<p>Simon Belmont enters <i>Dracula's</i> castle &amp; fights.</p>",
            "genres": [
                {"genre_category": "Basic Genres", "genre_name": "Action"},
                {"genre_category": "Gameplay", "genre_name": "Platform"}
            ],
            "moby_score": 7.6,
            "platforms": [
                {"platform_id": 2, "platform_name": "DOS", "first_release_date": "1990"},
                {"platform_id": 22, "platform_name": "NES", "first_release_date": "1987-05-01"}
            ]
        })
    }

    fn platform() -> Value {
        json!({
            "game_id": 1104,
            "platform_id": 22,
            "attributes": [
                {"attribute_category_name": "Number of Players Supported", "attribute_name": "1 Player"},
                {"attribute_category_name": "Number of Players Supported", "attribute_name": "1-2 Players"},
                {"attribute_category_name": "Number of Online Players", "attribute_name": "2-8 Online Players"},
                {"attribute_category_name": "Multiplayer Options", "attribute_name": "Hot-Seat"},
                {"attribute_category_name": "Multiplayer Options", "attribute_name": "None"},
                {"attribute_category_name": "Input Devices Supported", "attribute_name": "Gamepad"},
                {"attribute_category_name": "Input Devices Supported", "attribute_name": "Light Gun"},
                {"attribute_category_name": "Peripherals Supported", "attribute_name": "Rumble Pak Support"},
                {"attribute_category_name": "Save Game Methods", "attribute_name": "Password"},
                {"attribute_category_name": "Video Modes Supported", "attribute_name": "VGA"}
            ],
            "ratings": [
                {"rating_system_name": "ESRB Rating", "rating_name": "Everyone"},
                {"rating_system_name": "PEGI Rating", "rating_name": "12"}
            ],
            "releases": [
                {"companies": [
                    {"company_name": "Konami Industry Co., Ltd.", "role": "Published by"},
                    {"company_name": "Konami Co., Ltd.", "role": "Developed by"}
                ]}
            ]
        })
    }

    #[test]
    fn test_full_metadata() {
        let meta = build_metadata(&game(), Some(&platform()), Some(22));
        assert_eq!(meta.title, "Castlevania");
        assert_eq!(meta.year, "1987");
        assert_eq!(meta.genre, "Action, Platform");
        assert_eq!(meta.plot, "Simon Belmont enters Dracula's castle & fights.");
        assert_eq!(meta.rating, "8");
        assert_eq!(meta.developer, "Konami Co., Ltd.");
        assert_eq!(meta.esrb, "E - Everyone");
        assert_eq!(meta.pegi, "12");
        assert_eq!(meta.nplayers, "2");
        assert_eq!(meta.nplayers_online, "8");
        assert_eq!(
            meta.tags,
            vec!["hot-seat", "lightgun", "rumble pak", "password save"]
        );
    }

    #[test]
    fn test_empty_records_give_defaults() {
        let meta = build_metadata(&json!({}), Some(&json!({})), Some(22));
        assert_eq!(meta, GameMetadata::default());
    }

    #[test]
    fn test_null_fields_give_defaults() {
        let game = json!({"title": null, "description": null, "genres": null, "moby_score": null, "platforms": null});
        let meta = build_metadata(&game, None, None);
        assert_eq!(meta, GameMetadata::default());
    }

    #[test]
    fn test_year_falls_back_to_first_platform() {
        assert_eq!(parse_year(&game(), Some(9)), "1990");
        assert_eq!(parse_year(&game(), None), "1990");
        assert_eq!(parse_year(&json!({"platforms": []}), Some(22)), DEFAULT_META_YEAR);
        assert_eq!(
            parse_year(&json!({"platforms": [{"platform_id": 22, "first_release_date": "87"}]}), Some(22)),
            DEFAULT_META_YEAR
        );
    }

    #[test]
    fn test_players_pattern() {
        let attrs = |name: &str| json!({"attributes": [{"attribute_category_name": CATEGORY_PLAYERS, "attribute_name": name}]});
        assert_eq!(parse_nplayers(&attrs("1-4 Players")), "4");
        assert_eq!(parse_nplayers(&attrs("1 Player")), "1");
        assert_eq!(parse_nplayers(&attrs("8+ Players")), "8");
        assert_eq!(parse_nplayers(&attrs("Many players")), DEFAULT_META_NPLAYERS);
    }

    #[test]
    fn test_unknown_esrb_name_uses_default() {
        let p = json!({"ratings": [{"rating_system_name": "ESRB Rating", "rating_name": "Something new"}]});
        assert_eq!(parse_esrb(&p), DEFAULT_META_ESRB);
    }

    #[test]
    fn test_pegi_prefix_removed() {
        let p = json!({"ratings": [{"rating_system_name": "PEGI Rating", "rating_name": "PEGI 16"}]});
        assert_eq!(parse_pegi(&p), "16");
    }

    #[test]
    fn test_developer_missing_role() {
        let p = json!({"releases": [{"companies": [{"company_name": "Konami", "role": "Published by"}]}]});
        assert_eq!(parse_developer(&p), DEFAULT_META_DEVELOPER);
    }

    #[test]
    fn test_tags_deduplicated() {
        let p = json!({"attributes": [
            {"attribute_category_name": "Multiplayer Options", "attribute_name": "Same/Split-Screen"},
            {"attribute_category_name": "Multiplayer Options", "attribute_name": "same/split-screen"},
            {"attribute_category_name": "Business Model", "attribute_name": "Commercial"},
            {"attribute_category_name": "Business Model", "attribute_name": "Shareware"}
        ]});
        assert_eq!(parse_tags(&p), vec!["split-screen", "shareware"]);
    }

    #[test]
    fn test_strip_html_plain_text() {
        assert_eq!(strip_html("no tags here"), "no tags here");
        assert_eq!(strip_html("<b></b>"), "");
    }
}
