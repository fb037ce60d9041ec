//! Offset pagination for admin list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size used by the dashboard lists.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size the backend accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query for one page of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
    /// Free-text filter; blank values are not sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl PageQuery {
    /// Creates a query, clamping `page` to at least 1 and `limit` to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            search: None,
        }
    }

    /// Sets the search term; whitespace-only terms clear it.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let trimmed = search.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Returns the query for the following page.
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self.clone()
        }
    }

    /// Encodes the query as ordered key/value pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        pairs
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub limit: u32,
}

impl<T> Page<T> {
    /// Returns true if further pages exist.
    #[must_use]
    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.limit) < self.total
    }

    /// Total number of pages.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_clamping() {
        let query = PageQuery::new(0, 500);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_SIZE);
        assert_eq!(PageQuery::new(3, 0).limit, 1);
    }

    #[test]
    fn test_search_is_trimmed_and_blank_dropped() {
        let query = PageQuery::default().with_search("  Yilmaz ");
        assert_eq!(query.search.as_deref(), Some("Yilmaz"));
        assert_eq!(query.to_pairs().last().unwrap().1, "Yilmaz");

        let query = query.with_search("   ");
        assert_eq!(query.search, None);
        assert_eq!(query.to_pairs().len(), 2);
    }

    #[test]
    fn test_next_keeps_search() {
        let next = PageQuery::new(2, 10).with_search("B blok").next();
        assert_eq!(next.page, 3);
        assert_eq!(next.search.as_deref(), Some("B blok"));
    }

    #[test]
    fn test_page_counts() {
        let page: Page<u8> = Page {
            data: vec![1, 2],
            total: 45,
            page: 2,
            limit: 20,
        };
        assert!(page.has_more());
        assert_eq!(page.page_count(), 3);

        let last = Page::<u8> { page: 3, ..page };
        assert!(!last.has_more());
    }
}
