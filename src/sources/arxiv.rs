//! arXiv research source implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use feed_rs::parser;
use reqwest::StatusCode;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::models::{Paper, PaperBuilder, SearchQuery, SearchResponse, SortBy, SortOrder};
use crate::sources::{Source, SourceError};
use crate::utils::{
    normalize_arxiv_id, run_attempts, AttemptOutcome, AttemptResult, HttpClient, RetryPolicy,
};

/// Base URL for arXiv API
const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";
/// Base URL for arXiv PDFs
const ARXIV_PDF_URL: &str = "https://arxiv.org/pdf";
/// Largest page the API serves in one response
const ARXIV_MAX_RESULTS: usize = 2000;

/// arXiv research source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    api_url: String,
    retry: RetryPolicy,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new(config: &SearchConfig) -> Result<Self, SourceError> {
        Ok(Self::with_client(HttpClient::new()?, &config.api_url)
            .retry(RetryPolicy::attempts(3).delay(Duration::from_secs(3))))
    }

    /// Create with a custom HTTP client and endpoint
    pub fn with_client(client: HttpClient, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
            retry: RetryPolicy::attempts(1),
        }
    }

    /// Set the retry policy for transient API failures
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build search query for arXiv API
    ///
    /// The query text is passed through verbatim (so field prefixes such as
    /// `cat:` work) and combined with the submission window, if any.
    pub fn build_search_query(query: &SearchQuery) -> String {
        let text = query.query.trim();
        let window = query
            .submitted_between
            .map(|(from, to)| submitted_date_filter(from, to));

        match (text.is_empty(), window) {
            (true, None) => "all:*".to_string(),
            (true, Some(window)) => window,
            (false, None) => text.to_string(),
            (false, Some(window)) => format!("({}) AND {}", text, window),
        }
    }

    fn request_url(&self, query: &SearchQuery) -> String {
        let sort_by = match query.sort_by {
            SortBy::Relevance => "relevance",
            SortBy::SubmittedDate => "submittedDate",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
        };
        let sort_order = match query.sort_order {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        };

        format!(
            "{}?search_query={}&start=0&max_results={}&sortBy={}&sortOrder={}",
            self.api_url,
            urlencoding::encode(&Self::build_search_query(query)),
            query.max_results.min(ARXIV_MAX_RESULTS),
            sort_by,
            sort_order
        )
    }

    async fn fetch_feed(&self, url: &str) -> AttemptOutcome<Vec<u8>> {
        let response = match self
            .client
            .client()
            .get(url)
            .header("Accept", "application/atom+xml")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::from_reqwest_error(&e),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return AttemptOutcome::Transient(format!("arXiv API returned status: {}", status));
        }
        if !status.is_success() {
            return AttemptOutcome::Terminal(format!("arXiv API returned status: {}", status));
        }

        match response.bytes().await {
            Ok(bytes) => AttemptOutcome::Success(bytes.to_vec()),
            Err(e) => AttemptOutcome::from_reqwest_error(&e),
        }
    }

    /// Parse arXiv Atom feed entry into Paper
    fn parse_entry(entry: &feed_rs::model::Entry, query: &SearchQuery) -> Result<Paper, SourceError> {
        let paper_id = normalize_arxiv_id(&entry.id)
            .map_err(|e| SourceError::Parse(format!("entry id {:?}: {}", entry.id, e)))?;

        let title = entry
            .title
            .as_ref()
            .map(|t| collapse_whitespace(&t.content))
            .unwrap_or_default();

        let abstract_text = entry
            .summary
            .as_ref()
            .map(|s| collapse_whitespace(&s.content))
            .unwrap_or_default();

        let pdf_url = entry
            .links
            .iter()
            .find(|l| {
                l.media_type.as_deref() == Some("application/pdf")
                    || l.title.as_deref() == Some("pdf")
            })
            .map(|l| l.href.clone())
            .unwrap_or_else(|| format!("{}/{}", ARXIV_PDF_URL, paper_id));

        let url = format!("https://arxiv.org/abs/{}", paper_id);

        let mut builder = PaperBuilder::new(paper_id, title, url)
            .authors(entry.authors.iter().map(|a| a.name.trim().to_string()))
            .abstract_text(abstract_text)
            .pdf_url(pdf_url)
            .search_term(query.query.clone(), query.origin);

        if let Some(published) = entry.published {
            builder = builder.published_date(published.format("%Y-%m-%d").to_string());
        }
        // The primary category is listed first
        if let Some(category) = entry.categories.first() {
            builder = builder.primary_category(category.term.clone());
        }

        Ok(builder.build())
    }
}

/// `submittedDate:[YYYYMMDD000000 TO YYYYMMDD235959]`
pub fn submitted_date_filter(from: NaiveDate, to: NaiveDate) -> String {
    format!(
        "submittedDate:[{}000000 TO {}235959]",
        from.format("%Y%m%d"),
        to.format("%Y%m%d")
    )
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let url = self.request_url(query);
        tracing::debug!(query = %query.query, origin = %query.origin, "Searching arXiv");

        let body = match run_attempts(self.retry, |_| self.fetch_feed(&url)).await {
            AttemptResult::Success { value, .. } => value,
            AttemptResult::Terminal { cause, .. } => return Err(SourceError::Api(cause)),
            AttemptResult::Exhausted { cause, attempts } => {
                return Err(SourceError::Network(format!(
                    "{} (after {} attempts)",
                    cause, attempts
                )))
            }
        };

        let feed = parser::parse(body.as_slice())?;

        let papers: Vec<Paper> = feed
            .entries
            .iter()
            .filter_map(|entry| match Self::parse_entry(entry, query) {
                Ok(paper) => Some(paper),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unparseable arXiv entry");
                    None
                }
            })
            .collect();

        tracing::debug!(query = %query.query, count = papers.len(), "arXiv search finished");
        Ok(SearchResponse::new(papers, "arXiv", &query.query))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Render an Atom feed with one entry per `(id, title, category)`
    pub fn atom_feed(entries: &[(&str, &str, &str)]) -> String {
        let mut feed = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\">\n<title>arXiv Query Results</title>\n<id>http://arxiv.org/api/test</id>\n<updated>2024-01-03T00:00:00Z</updated>\n",
        );
        for (id, title, category) in entries {
            feed.push_str(&format!(
                "<entry>\n<id>http://arxiv.org/abs/{id}v1</id>\n<updated>2024-01-02T10:00:00Z</updated>\n<published>2024-01-02T10:00:00Z</published>\n<title>{title}</title>\n<summary>Abstract of {title}.</summary>\n<author><name>Ada Lovelace</name></author>\n<author><name>Alan Turing</name></author>\n<link href=\"http://arxiv.org/abs/{id}v1\" rel=\"alternate\" type=\"text/html\"/>\n<link title=\"pdf\" href=\"http://arxiv.org/pdf/{id}v1\" rel=\"related\" type=\"application/pdf\"/>\n<category term=\"{category}\" scheme=\"http://arxiv.org/schemas/atom\"/>\n<category term=\"cs.AI\" scheme=\"http://arxiv.org/schemas/atom\"/>\n</entry>\n"
            ));
        }
        feed.push_str("</feed>\n");
        feed
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::atom_feed;
    use super::*;
    use crate::models::QueryOrigin;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_search_query_plain() {
        let query = SearchQuery::new("machine learning");
        assert_eq!(ArxivSource::build_search_query(&query), "machine learning");
    }

    #[test]
    fn test_build_search_query_with_window() {
        let query = SearchQuery::new("llm agent").within_days(3, date(2024, 1, 10));
        assert_eq!(
            ArxivSource::build_search_query(&query),
            "(llm agent) AND submittedDate:[20240107000000 TO 20240110235959]"
        );
    }

    #[test]
    fn test_build_search_query_empty() {
        assert_eq!(ArxivSource::build_search_query(&SearchQuery::new("  ")), "all:*");
        let windowed = SearchQuery::new("").within_days(1, date(2024, 3, 1));
        assert_eq!(
            ArxivSource::build_search_query(&windowed),
            "submittedDate:[20240229000000 TO 20240301235959]"
        );
    }

    #[test]
    fn test_zero_days_disables_window() {
        let query = SearchQuery::new("x").within_days(0, date(2024, 1, 10));
        assert!(query.submitted_between.is_none());
    }

    #[test]
    fn test_parse_entry() {
        let feed = parser::parse(atom_feed(&[("2401.00001", "A  Paper\n  Title", "cs.CV")]).as_bytes())
            .unwrap();
        let query = SearchQuery::new("vision").origin(QueryOrigin::Derived);
        let paper = ArxivSource::parse_entry(&feed.entries[0], &query).unwrap();

        assert_eq!(paper.paper_id, "2401.00001");
        assert_eq!(paper.title, "A Paper Title");
        assert_eq!(paper.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(paper.published_date.as_deref(), Some("2024-01-02"));
        assert_eq!(paper.primary_category.as_deref(), Some("cs.CV"));
        assert_eq!(paper.pdf_url.as_deref(), Some("http://arxiv.org/pdf/2401.00001v1"));
        assert_eq!(paper.url, "https://arxiv.org/abs/2401.00001");
        assert_eq!(paper.search_term, "vision");
        assert_eq!(paper.origin, QueryOrigin::Derived);
    }

    #[tokio::test]
    async fn test_search_with_mockito() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("search_query".into(), "graph networks".into()),
                mockito::Matcher::UrlEncoded("max_results".into(), "5".into()),
                mockito::Matcher::UrlEncoded("sortBy".into(), "submittedDate".into()),
                mockito::Matcher::UrlEncoded("sortOrder".into(), "descending".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(atom_feed(&[
                ("2401.00001", "First", "cs.LG"),
                ("2401.00002", "Second", "cs.CL"),
            ]))
            .create_async()
            .await;

        let source = ArxivSource::with_client(
            HttpClient::new().unwrap(),
            &format!("{}/api/query", server.url()),
        );
        let response = source
            .search(&SearchQuery::new("graph networks").max_results(5))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.papers.len(), 2);
        assert_eq!(response.papers[1].paper_id, "2401.00002");
        assert_eq!(response.papers[1].primary_category.as_deref(), Some("cs.CL"));
        assert_eq!(response.source, "arXiv");
    }

    #[tokio::test]
    async fn test_search_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let source = ArxivSource::with_client(HttpClient::new().unwrap(), &server.url())
            .retry(RetryPolicy::attempts(2));
        let err = source.search(&SearchQuery::new("x")).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, SourceError::Network(_)));
    }

    #[tokio::test]
    async fn test_search_client_error_is_terminal() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(400)
            .expect(1)
            .create_async()
            .await;

        let source = ArxivSource::with_client(HttpClient::new().unwrap(), &server.url())
            .retry(RetryPolicy::attempts(3));
        let err = source.search(&SearchQuery::new("x")).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, SourceError::Api(_)));
    }
}
