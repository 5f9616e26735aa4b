//! Listing-page envelope parsing.
//!
//! Listing responses wrap their items in `_embedded.<collection>` and point
//! at the next page via `_links.next.href`; a missing `next` link ends the
//! walk.

use serde_json::Value;

/// One parsed listing page.
pub(crate) struct Page {
    /// Items under `_embedded.<collection>`, in page order.
    pub items: Vec<Value>,
    /// Absolute URL of the next page, when the envelope provides one.
    pub next: Option<String>,
}

/// Parse a listing envelope. Missing or malformed `_embedded` sections
/// yield an empty item list rather than an error; a page with no items and
/// no next link simply ends the walk.
pub(crate) fn parse_page(body: &Value, collection: &str) -> Page {
    let items = body
        .pointer(&format!("/_embedded/{collection}"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let next = body
        .pointer("/_links/next/href")
        .and_then(Value::as_str)
        .map(str::to_string);
    Page { items, next }
}
