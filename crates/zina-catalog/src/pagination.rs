//! Page metadata for the catalog API's page-numbered collections.
//!
//! The API reports `current_page`/`last_page` either under a `meta` object,
//! at the top level, or inside a paginator nested under `data`. Responses
//! without any of these are a single page.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
}

impl Default for PageMeta {
    fn default() -> Self {
        Self::single()
    }
}

impl PageMeta {
    #[must_use]
    pub fn single() -> Self {
        Self {
            current_page: 1,
            last_page: 1,
        }
    }

    /// Reads page metadata from a collection response body.
    #[must_use]
    pub fn from_body(body: &Value) -> Self {
        let candidates = [body.get("meta"), Some(body), body.get("data")];
        for candidate in candidates.into_iter().flatten() {
            if let (Some(current), Some(last)) = (
                read_page(candidate.get("current_page")),
                read_page(candidate.get("last_page")),
            ) {
                return Self {
                    current_page: current,
                    last_page: last.max(current),
                };
            }
        }
        Self::single()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }
}

/// Accepts numbers and numeric strings; rejects zero.
fn read_page(value: Option<&Value>) -> Option<u32> {
    let page = match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }?;
    (page > 0).then_some(page)
}
