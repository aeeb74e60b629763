use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Title used whenever a document declares no title or an empty one.
pub const UNTITLED: &str = "Untitled";

/// Readable content of one successfully processed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub title: String,
    pub url: Url,
    pub content: String,
}

/// One entry of a search engine's result listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPage {
    pub url_string: String,
    pub title: String,
    pub snippet: String,
}

/// Ordered result listing, in the engine's presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub web_pages: Vec<WebPage>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.web_pages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.web_pages.len()
    }
}

/// Serialize `value` as pretty-printed JSON with object keys sorted at every
/// level, independent of how `serde_json` orders its maps.
pub fn to_sorted_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let value = sort_keys(serde_json::to_value(value)?);
    serde_json::to_string_pretty(&value)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, sort_keys(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
