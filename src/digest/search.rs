//! Mixed manual/derived search with de-duplication.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::models::{Paper, QueryOrigin, SearchQuery, SortBy, SortOrder};
use crate::sources::Source;

/// Parameters shared by every query of a run
#[derive(Debug, Clone, Copy)]
pub struct SearchWindow {
    /// Results per query
    pub max_results: usize,
    /// Submission window in days; 0 disables it
    pub days: u32,
    /// Last day of the window
    pub today: NaiveDate,
}

impl SearchWindow {
    fn query(&self, text: &str, origin: QueryOrigin) -> SearchQuery {
        SearchQuery::new(text)
            .max_results(self.max_results)
            .sort_by(SortBy::SubmittedDate)
            .sort_order(SortOrder::Descending)
            .within_days(self.days, self.today)
            .origin(origin)
    }
}

/// Run manual queries, then derived ones, and merge results by paper id
///
/// The first occurrence of a paper is kept, but any paper returned by a
/// manual query is tagged manual. Failing queries are logged and skipped.
pub async fn collect_papers(
    source: &dyn Source,
    manual: &[String],
    derived: &[String],
    window: SearchWindow,
) -> Vec<Paper> {
    let tasks = manual
        .iter()
        .map(|q| (q, QueryOrigin::Manual))
        .chain(derived.iter().map(|q| (q, QueryOrigin::Derived)));

    let mut papers: Vec<Paper> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (text, origin) in tasks {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        tracing::info!(query = text, origin = %origin, "Searching");
        let response = match source.search(&window.query(text, origin)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(query = text, error = %e, "Search failed, skipping query");
                continue;
            }
        };

        for paper in response.papers {
            match index.get(&paper.paper_id) {
                Some(&pos) => {
                    if origin == QueryOrigin::Manual {
                        papers[pos].origin = QueryOrigin::Manual;
                    }
                }
                None => {
                    index.insert(paper.paper_id.clone(), papers.len());
                    papers.push(paper);
                }
            }
        }
    }

    tracing::info!(
        papers = papers.len(),
        manual = papers.iter().filter(|p| p.origin == QueryOrigin::Manual).count(),
        "Search finished"
    );
    papers
}
