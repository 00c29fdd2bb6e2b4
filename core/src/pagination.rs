//! The `meta.pagination` block of listing responses.

use serde::Serialize;
use serde_json::Value;

/// Previous/next page URLs, when the API provides them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaginationLinks {
    pub previous: Option<String>,
    pub next: Option<String>,
}

/// Page position and size of a listing response.
///
/// Counters that are absent (or not unsigned integers) read as `0`. The
/// original subtree is kept so fields this type does not model remain
/// reachable through `raw()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub count: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub links: PaginationLinks,
    #[serde(skip)]
    raw: Value,
}

impl Pagination {
    pub fn from_value(value: &Value) -> Self {
        let counter = |key: &str| value.get(key).and_then(Value::as_u64).unwrap_or(0);
        let link = |key: &str| {
            value
                .get("links")
                .and_then(|links| links.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            total: counter("total"),
            count: counter("count"),
            per_page: counter("per_page"),
            current_page: counter("current_page"),
            total_pages: counter("total_pages"),
            links: PaginationLinks {
                previous: link("previous"),
                next: link("next"),
            },
            raw: value.clone(),
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn has_next_page(&self) -> bool {
        self.links.next.is_some() || self.current_page < self.total_pages
    }

    /// Number of the following page, `None` on the last one or when the
    /// current page is unknown.
    pub fn next_page(&self) -> Option<u64> {
        if self.current_page == 0 || !self.has_next_page() {
            return None;
        }
        self.current_page.checked_add(1)
    }
}
