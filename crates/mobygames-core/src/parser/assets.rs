//! Screenshot and cover parsers for MobyGames
//!
//! The API does not label images with launcher asset kinds. Screenshots
//! are split into title screens and snaps by caption; covers are
//! classified by their scan type.

use serde_json::Value;

use crate::types::{AssetKind, AssetRecord};

/// Scan type (lower-cased) to asset kind
///
/// `None` marks scan types MobyGames has but the launcher does not use.
static SCAN_TYPES: &[(&str, Option<AssetKind>)] = &[
    ("front cover", Some(AssetKind::BoxFront)),
    ("back cover", Some(AssetKind::BoxBack)),
    ("media", Some(AssetKind::Cartridge)),
    ("map", Some(AssetKind::Map)),
    ("manual", None),
    ("spine/sides", None),
    ("other", None),
    ("advertisement", None),
    ("extras", None),
    ("inside cover", None),
    ("full cover", None),
    ("soundtrack", None),
];

fn text<'a>(json: &'a Value, key: &str) -> &'a str {
    json.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Screenshots whose caption mentions "title" are title screens
pub fn classify_screenshot(caption: &str) -> AssetKind {
    if caption.to_lowercase().contains("title") {
        AssetKind::Title
    } else {
        AssetKind::Snap
    }
}

/// Outcome of looking up a cover's scan type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverClass {
    Kind(AssetKind),
    /// Known scan type the launcher has no asset for
    Unused,
    /// Scan type missing from the table
    Unknown,
}

pub fn classify_cover(scan_of: &str) -> CoverClass {
    let scan_of = scan_of.trim().to_lowercase();
    match SCAN_TYPES.iter().find(|(name, _)| *name == scan_of) {
        Some((_, Some(kind))) => CoverClass::Kind(*kind),
        Some((_, None)) => CoverClass::Unused,
        None => CoverClass::Unknown,
    }
}

/// Parses the `screenshots` endpoint response
pub fn parse_screenshots(json: &Value) -> Vec<AssetRecord> {
    let Some(screenshots) = json.get("screenshots").and_then(Value::as_array) else {
        return Vec::new();
    };

    screenshots
        .iter()
        .filter_map(|image| {
            let url_thumb = text(image, "thumbnail_image");
            if url_thumb.is_empty() {
                return None;
            }
            let caption = text(image, "caption");
            Some(AssetRecord {
                kind: classify_screenshot(caption),
                display_name: caption.to_string(),
                url: text(image, "image").to_string(),
                url_thumb: url_thumb.to_string(),
            })
        })
        .collect()
}

/// Parses the `covers` endpoint response
///
/// Covers with an unused scan type are skipped. Unknown scan types are
/// logged and skipped as well.
pub fn parse_covers(json: &Value) -> Vec<AssetRecord> {
    let Some(groups) = json.get("cover_groups").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut assets = Vec::new();
    for group in groups {
        let countries: Vec<&str> = group
            .get("countries")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let country_names = countries.join(" / ");

        let covers = group.get("covers").and_then(Value::as_array);
        for image in covers.into_iter().flatten() {
            let scan_of = text(image, "scan_of");
            let kind = match classify_cover(scan_of) {
                CoverClass::Kind(kind) => kind,
                CoverClass::Unused => continue,
                CoverClass::Unknown => {
                    tracing::warn!(scan_of, "Scan type not implemented yet, skipping cover");
                    continue;
                }
            };
            let url_thumb = text(image, "thumbnail_image");
            if url_thumb.is_empty() {
                continue;
            }

            assets.push(AssetRecord {
                kind,
                display_name: format!("{} - {} ({})", scan_of, text(image, "description"), country_names),
                url: text(image, "image").to_string(),
                url_thumb: url_thumb.to_string(),
            });
        }
    }
    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_screenshot() {
        assert_eq!(classify_screenshot("Title screen"), AssetKind::Title);
        assert_eq!(classify_screenshot("TITLE"), AssetKind::Title);
        assert_eq!(classify_screenshot("Subtitles are shown"), AssetKind::Title);
        assert_eq!(classify_screenshot("First level"), AssetKind::Snap);
        assert_eq!(classify_screenshot(""), AssetKind::Snap);
    }

    #[test]
    fn test_classify_cover() {
        assert_eq!(classify_cover("Front Cover"), CoverClass::Kind(AssetKind::BoxFront));
        assert_eq!(classify_cover("media"), CoverClass::Kind(AssetKind::Cartridge));
        assert_eq!(classify_cover("Manual"), CoverClass::Unused);
        assert_eq!(classify_cover("Hologram"), CoverClass::Unknown);
    }

    #[test]
    fn test_parse_screenshots() {
        let body = json!({"screenshots": [
            {"caption": "Title screen", "image": "https://cdn/s1.png", "thumbnail_image": "https://cdn/t1.png"},
            {"caption": "Stage 1", "image": "https://cdn/s2.png", "thumbnail_image": "https://cdn/t2.png"},
            {"caption": "no thumb", "image": "https://cdn/s3.png"}
        ]});
        let assets = parse_screenshots(&body);
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].kind, AssetKind::Title);
        assert_eq!(assets[0].display_name, "Title screen");
        assert_eq!(assets[0].url, "https://cdn/s1.png");
        assert_eq!(assets[1].kind, AssetKind::Snap);
        assert_eq!(assets[1].url_thumb, "https://cdn/t2.png");
    }

    #[test]
    fn test_parse_covers_skips_unmapped_scan_types() {
        let body = json!({"cover_groups": [
            {
                "countries": ["United States", "Canada"],
                "covers": [
                    {"scan_of": "Front Cover", "description": "Front", "image": "http://cdn/f.jpg", "thumbnail_image": "http://cdn/tf.jpg"},
                    {"scan_of": "Hologram", "description": "?", "image": "http://cdn/h.jpg", "thumbnail_image": "http://cdn/th.jpg"},
                    {"scan_of": "Manual", "description": "Page 1", "image": "http://cdn/m.jpg", "thumbnail_image": "http://cdn/tm.jpg"},
                    {"scan_of": "Back Cover", "description": "Back", "image": "http://cdn/b.jpg", "thumbnail_image": "http://cdn/tb.jpg"}
                ]
            },
            {
                "countries": ["Japan"],
                "covers": [
                    {"scan_of": "Media", "description": "Cartridge", "image": "http://cdn/c.jpg", "thumbnail_image": "http://cdn/tc.jpg"}
                ]
            }
        ]});
        let assets = parse_covers(&body);
        let kinds: Vec<AssetKind> = assets.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AssetKind::BoxFront, AssetKind::BoxBack, AssetKind::Cartridge]);
        assert_eq!(assets[0].display_name, "Front Cover - Front (United States / Canada)");
        assert_eq!(assets[2].display_name, "Media - Cartridge (Japan)");
    }

    #[test]
    fn test_parse_missing_lists() {
        assert!(parse_screenshots(&json!({})).is_empty());
        assert!(parse_covers(&json!({"cover_groups": null})).is_empty());
        assert!(parse_covers(&json!({"cover_groups": [{"countries": ["X"]}]})).is_empty());
    }
}
