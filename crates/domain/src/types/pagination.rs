//! Pagination envelope shared by every list endpoint
//!
//! List responses carry `more`/`offset`/`limit`/`total` next to the resource
//! array. The resource array's key differs per endpoint, so the stats are
//! decoded on their own and paired with the items in a [`PageEnvelope`].

use serde::{Deserialize, Serialize};

use crate::constants::{QUERY_LIMIT, QUERY_OFFSET, QUERY_TOTAL};

/// Pagination metadata echoed by the server for one page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListStats {
    #[serde(default)]
    pub more: bool,
    #[serde(default)]
    pub offset: u32,
    /// Page size actually applied by the server (it may clamp the request)
    #[serde(default)]
    pub limit: u32,
    /// Only populated when the request asked for `total=true`
    #[serde(default)]
    pub total: u32,
}

impl ListStats {
    /// Offset of the page following this one.
    #[must_use]
    pub fn next_offset(&self) -> u32 {
        self.offset.saturating_add(self.limit)
    }
}

/// One decoded page: its items plus the server's pagination stats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEnvelope<T> {
    pub stats: ListStats,
    pub items: Vec<T>,
}

impl<T> PageEnvelope<T> {
    #[must_use]
    pub fn new(stats: ListStats, items: Vec<T>) -> Self {
        Self { stats, items }
    }
}

/// Query options accepted by list endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Ask the server to compute `total` (more expensive server-side)
    pub total: bool,
}

impl ListOptions {
    /// Render as query pairs, omitting unset options.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push((QUERY_LIMIT.to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push((QUERY_OFFSET.to_string(), offset.to_string()));
        }
        if self.total {
            pairs.push((QUERY_TOTAL.to_string(), "true".to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_decode_alongside_resource_array() {
        let stats: ListStats = serde_json::from_str(
            r#"{"teams":[{"id":"T1"}],"more":true,"offset":25,"limit":25,"total":0}"#,
        )
        .unwrap();

        assert!(stats.more);
        assert_eq!(stats.next_offset(), 50);
    }

    #[test]
    fn missing_stats_default_to_last_page() {
        let stats: ListStats = serde_json::from_str(r#"{"tags":[]}"#).unwrap();
        assert_eq!(stats, ListStats::default());
        assert!(!stats.more);
    }

    #[test]
    fn list_options_skip_unset_fields() {
        let options = ListOptions { limit: Some(100), offset: None, total: true };
        assert_eq!(
            options.query_pairs(),
            vec![
                ("limit".to_string(), "100".to_string()),
                ("total".to_string(), "true".to_string())
            ]
        );
        assert!(ListOptions::default().query_pairs().is_empty());
    }
}
