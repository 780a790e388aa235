//! Platform catalog parser

use serde_json::Value;

use crate::types::RemotePlatform;

/// Parses the `/platforms` response, sorted by name
pub fn parse_platform_catalog(json: &Value) -> Vec<RemotePlatform> {
    let mut platforms: Vec<RemotePlatform> = json
        .get("platforms")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(|p| {
            let id = p.get("platform_id").and_then(Value::as_u64)?;
            let name = p.get("platform_name").and_then(Value::as_str)?;
            Some(RemotePlatform {
                id: u32::try_from(id).ok()?,
                name: name.to_string(),
            })
        })
        .collect();
    platforms.sort_by(|a, b| a.name.cmp(&b.name));
    platforms
}
