//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::models::{Paper, SearchQuery, SearchResponse};
use crate::sources::{Source, SourceError};

/// A mock source that serves predefined papers per query text.
///
/// Returned papers are tagged with the query and its origin, like a real
/// source would. Every executed query is recorded.
#[derive(Debug, Default)]
pub struct MockSource {
    responses: Mutex<HashMap<String, Vec<Paper>>>,
    failing: Mutex<HashSet<String>>,
    executed: Mutex<Vec<SearchQuery>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `papers` for queries whose text equals `query`.
    pub fn with_results(self, query: &str, papers: Vec<Paper>) -> Self {
        lock(&self.responses).insert(query.to_string(), papers);
        self
    }

    /// Fail queries whose text equals `query`.
    pub fn with_failure(self, query: &str) -> Self {
        lock(&self.failing).insert(query.to_string());
        self
    }

    /// Queries executed so far, in order.
    pub fn executed(&self) -> Vec<SearchQuery> {
        lock(&self.executed).clone()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        lock(&self.executed).push(query.clone());

        if lock(&self.failing).contains(&query.query) {
            return Err(SourceError::Network(format!("mock failure for {:?}", query.query)));
        }

        let papers = lock(&self.responses)
            .get(&query.query)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(query.max_results)
            .map(|mut paper| {
                paper.search_term = query.query.clone();
                paper.origin = query.origin;
                paper
            })
            .collect();

        Ok(SearchResponse::new(papers, "Mock Source", &query.query))
    }
}

/// Helper function to create a mock paper for testing.
pub fn make_paper(paper_id: &str, title: &str) -> Paper {
    Paper::new(
        paper_id.to_string(),
        title.to_string(),
        format!("https://arxiv.org/abs/{}", paper_id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryOrigin;

    #[tokio::test]
    async fn test_mock_tags_results() {
        let source = MockSource::new().with_results("q", vec![make_paper("1", "One")]);
        let response = source
            .search(&SearchQuery::new("q").origin(QueryOrigin::Derived))
            .await
            .unwrap();

        assert_eq!(response.papers.len(), 1);
        assert_eq!(response.papers[0].search_term, "q");
        assert_eq!(response.papers[0].origin, QueryOrigin::Derived);
        assert_eq!(source.executed().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let source = MockSource::new().with_failure("bad");
        assert!(source.search(&SearchQuery::new("bad")).await.is_err());
        assert!(source.search(&SearchQuery::new("other")).await.unwrap().papers.is_empty());
    }
}
