//! Search request and response models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::QueryOrigin;

/// Sort order for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Sort field for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevance,
    SubmittedDate,
    LastUpdatedDate,
}

/// Search query parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Main search query string (provider syntax)
    pub query: String,

    /// Maximum number of results to return
    pub max_results: usize,

    /// Sort by field
    pub sort_by: SortBy,

    /// Sort order
    pub sort_order: SortOrder,

    /// Only papers submitted within this inclusive date range
    pub submitted_between: Option<(NaiveDate, NaiveDate)>,

    /// Whether the query came from the user or was derived
    pub origin: QueryOrigin,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: 10,
            sort_by: SortBy::SubmittedDate,
            sort_order: SortOrder::Descending,
            submitted_between: None,
            origin: QueryOrigin::Manual,
        }
    }
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set sort by
    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort_by = sort;
        self
    }

    /// Set sort order
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Restrict to papers submitted between `from` and `to` (inclusive)
    pub fn submitted_between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.submitted_between = Some((from, to));
        self
    }

    /// Restrict to the last `days` days ending at `today`; `0` disables the window
    pub fn within_days(self, days: u32, today: NaiveDate) -> Self {
        if days == 0 {
            return self;
        }
        let from = today - chrono::Duration::days(i64::from(days));
        self.submitted_between(from, today)
    }

    /// Set the query origin
    pub fn origin(mut self, origin: QueryOrigin) -> Self {
        self.origin = origin;
        self
    }
}

/// Search response containing papers and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Papers found
    pub papers: Vec<crate::models::Paper>,

    /// Total number of results (may be more than returned)
    pub total_results: Option<usize>,

    /// Source of the results
    pub source: String,

    /// Query that was executed
    pub query: String,
}

impl SearchResponse {
    /// Create a new search response
    pub fn new(
        papers: Vec<crate::models::Paper>,
        source: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            papers,
            total_results: None,
            source: source.into(),
            query: query.into(),
        }
    }

    /// Set total results
    pub fn total_results(mut self, total: usize) -> Self {
        self.total_results = Some(total);
        self
    }
}
