//! Paper model representing a preprint as it moves through the digest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the query that surfaced a paper was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOrigin {
    /// Query typed by the user
    Manual,
    /// Query generated from the user profile
    Derived,
}

impl QueryOrigin {
    /// Returns the display label of the origin
    pub fn label(&self) -> &'static str {
        match self {
            QueryOrigin::Manual => "Manual",
            QueryOrigin::Derived => "AI Derived",
        }
    }
}

impl std::fmt::Display for QueryOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where a code-repository link was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkProvenance {
    /// Link taken from the paper's abstract
    Declared,
    /// Link discovered only inside the source archive
    Hidden,
}

/// Outcome of the repository metadata lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryStatus {
    /// Metadata was retrieved
    Found,
    /// Hosting platform answered 404
    NotFound,
    /// Lookup failed; only the link is known
    Unavailable,
}

impl RepositoryStatus {
    /// Human-readable status description
    pub fn description(&self) -> &'static str {
        match self {
            RepositoryStatus::Found => "Repo found",
            RepositoryStatus::NotFound => "404 not found",
            RepositoryStatus::Unavailable => "Link found",
        }
    }
}

/// A code repository attached to a paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Canonical repository URL
    pub url: String,

    /// Star count, if the lookup succeeded
    pub stars: Option<u64>,

    /// Date of the last push, if the lookup succeeded
    pub last_push: Option<NaiveDate>,

    /// Lookup status
    pub status: RepositoryStatus,

    /// Whether the link was declared or hidden
    pub provenance: LinkProvenance,
}

impl RepositoryRecord {
    /// Placeholder record used when metadata could not be fetched
    pub fn placeholder(
        url: impl Into<String>,
        status: RepositoryStatus,
        provenance: LinkProvenance,
    ) -> Self {
        Self {
            url: url.into(),
            stars: None,
            last_push: None,
            status,
            provenance,
        }
    }

    /// True when the link was only found in the source archive
    pub fn is_hidden(&self) -> bool {
        self.provenance == LinkProvenance::Hidden
    }
}

/// State of the LLM analysis for a paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Analysis returned usable output
    Completed,
    /// Analysis call failed; textual fields are the originals
    Failed,
    /// No analysis service configured
    Skipped,
}

/// Fields attached to a paper by the enrichment step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Translated title (original title when analysis did not run)
    pub title_translated: String,

    /// Translated abstract (original abstract when analysis did not run)
    pub summary_translated: String,

    /// One-line synopsis
    pub synopsis: String,

    /// Relevance score, 0-10
    pub score: u8,

    /// Why the score was given, or why analysis failed
    pub rationale: String,

    /// Resolved topic label
    pub topic: String,

    /// Venue detected from the source archive
    pub venue: Option<String>,

    /// Resolved code repository
    pub repository: Option<RepositoryRecord>,

    /// How the analysis went
    pub analysis: AnalysisStatus,
}

/// A preprint from the search provider
///
/// Search-time fields are set once by the provider; `enrichment` is
/// populated exactly once by the enrichment coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    /// Normalized arXiv identifier (version suffix stripped)
    pub paper_id: String,

    /// Paper title
    pub title: String,

    /// Author names in order
    pub authors: Vec<String>,

    /// Abstract text
    pub r#abstract: String,

    /// Publication date (YYYY-MM-DD)
    pub published_date: Option<String>,

    /// Primary subject code, e.g. `cs.CV`
    pub primary_category: Option<String>,

    /// Abstract page URL
    pub url: String,

    /// Direct PDF URL
    pub pdf_url: Option<String>,

    /// Search term that surfaced this paper
    pub search_term: String,

    /// Whether the search term was manual or derived
    pub origin: QueryOrigin,

    /// Enrichment output, absent until processed
    pub enrichment: Option<Enrichment>,
}

impl Paper {
    /// Create a new paper with required fields
    pub fn new(paper_id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            title: title.into(),
            authors: Vec::new(),
            r#abstract: String::new(),
            published_date: None,
            primary_category: None,
            url: url.into(),
            pdf_url: None,
            search_term: String::new(),
            origin: QueryOrigin::Manual,
            enrichment: None,
        }
    }

    /// Relevance score, 0 for papers that have not been enriched
    pub fn score(&self) -> u8 {
        self.enrichment.as_ref().map(|e| e.score).unwrap_or(0)
    }

    /// Detected venue, if any
    pub fn venue(&self) -> Option<&str> {
        self.enrichment.as_ref().and_then(|e| e.venue.as_deref())
    }

    /// Resolved repository, if any
    pub fn repository(&self) -> Option<&RepositoryRecord> {
        self.enrichment.as_ref().and_then(|e| e.repository.as_ref())
    }

    /// Display title, preferring the translation
    pub fn display_title(&self) -> &str {
        self.enrichment
            .as_ref()
            .map(|e| e.title_translated.as_str())
            .unwrap_or(&self.title)
    }
}

/// Builder for constructing Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a new builder with required fields
    pub fn new(paper_id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            paper: Paper::new(paper_id, title, url),
        }
    }

    /// Set authors
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paper.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.paper.r#abstract = abstract_text.into();
        self
    }

    /// Set publication date
    pub fn published_date(mut self, date: impl Into<String>) -> Self {
        self.paper.published_date = Some(date.into());
        self
    }

    /// Set primary category
    pub fn primary_category(mut self, category: impl Into<String>) -> Self {
        self.paper.primary_category = Some(category.into());
        self
    }

    /// Set PDF URL
    pub fn pdf_url(mut self, url: impl Into<String>) -> Self {
        self.paper.pdf_url = Some(url.into());
        self
    }

    /// Set the search term and its origin
    pub fn search_term(mut self, term: impl Into<String>, origin: QueryOrigin) -> Self {
        self.paper.search_term = term.into();
        self.paper.origin = origin;
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_builder() {
        let paper = PaperBuilder::new("2401.01234", "Test Paper", "https://arxiv.org/abs/2401.01234")
            .authors(["John Doe", "Jane Smith"])
            .abstract_text("This is a test abstract.")
            .primary_category("cs.CV")
            .search_term("vision", QueryOrigin::Derived)
            .build();

        assert_eq!(paper.paper_id, "2401.01234");
        assert_eq!(paper.authors, vec!["John Doe", "Jane Smith"]);
        assert_eq!(paper.primary_category.as_deref(), Some("cs.CV"));
        assert_eq!(paper.origin, QueryOrigin::Derived);
        assert!(paper.enrichment.is_none());
    }

    #[test]
    fn test_unenriched_paper_defaults() {
        let paper = Paper::new("1", "Original", "https://example.com");
        assert_eq!(paper.score(), 0);
        assert_eq!(paper.venue(), None);
        assert_eq!(paper.display_title(), "Original");
    }

    #[test]
    fn test_repository_placeholder() {
        let record = RepositoryRecord::placeholder(
            "https://github.com/a/b",
            RepositoryStatus::Unavailable,
            LinkProvenance::Hidden,
        );
        assert!(record.is_hidden());
        assert_eq!(record.stars, None);
        assert_eq!(record.status.description(), "Link found");
    }
}
