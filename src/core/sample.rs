//! Attached-file sampling
//!
//! Attached files can be arbitrarily large; only a bounded preview is
//! embedded into the opening prompt so prompt size stays predictable.

use serde_json::Value;

/// Maximum number of GeoJSON features / array elements kept.
const MAX_ITEMS: usize = 5;

/// Maximum number of raw text lines kept (one header plus [`MAX_ITEMS`]
/// data lines for tabular formats).
const MAX_LINES: usize = 6;

/// Shrink file content to a bounded preview.
///
/// A GeoJSON FeatureCollection keeps its first five features with all
/// other top-level keys intact; a JSON array keeps its first five
/// elements. Anything else, including content that does not parse as
/// JSON, is truncated to its first six lines. Never fails.
pub fn sample_data(content: &str) -> String {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(mut map)) if is_feature_collection(&map) => {
            if let Some(Value::Array(features)) = map.get_mut("features") {
                features.truncate(MAX_ITEMS);
            }
            serde_json::to_string_pretty(&Value::Object(map))
                .unwrap_or_else(|_| sample_lines(content))
        }
        Ok(Value::Array(mut items)) => {
            items.truncate(MAX_ITEMS);
            serde_json::to_string_pretty(&Value::Array(items))
                .unwrap_or_else(|_| sample_lines(content))
        }
        _ => sample_lines(content),
    }
}

fn is_feature_collection(map: &serde_json::Map<String, Value>) -> bool {
    map.get("type").and_then(Value::as_str) == Some("FeatureCollection")
}

fn sample_lines(content: &str) -> String {
    content
        .lines()
        .take(MAX_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}
