//! Daily digest pipeline.
//!
//! A run derives extra queries from the reader's profile, searches the
//! catalog with manual and derived queries while sampling field-wide
//! category statistics, and hands the de-duplicated papers to the
//! [`EnrichmentCoordinator`]. A short briefing closes the run.

pub mod briefing;
pub mod expand;
pub mod search;
pub mod trends;

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{Config, SearchConfig};
use crate::enrich::{
    AnalysisService, ChatAnalysisService, ChatClient, EnrichmentCoordinator, GitHubLookup,
    UnconfiguredAnalysis,
};
use crate::inspect::{ConcurrencyGate, SignatureMatcher, SourceInspector};
use crate::models::{Paper, QueryOrigin, UserProfile};
use crate::sources::{ArxivSource, Source, SourceError};

pub use briefing::{write_briefing, BRIEFING_UNAVAILABLE};
pub use search::{collect_papers, SearchWindow};
pub use trends::{category_name, fetch_category_stats, CategoryStats, CATEGORY_NAMES};

/// Score from which a paper counts as highly relevant
pub const HIGH_SCORE: u8 = 8;

/// Per-run search settings
#[derive(Debug, Clone, PartialEq)]
pub struct DigestSettings {
    pub queries: Vec<String>,
    pub max_results: usize,
    pub days: u32,
    pub broad_category: String,
    pub stats_sample_size: usize,
    /// Sample field-wide category statistics
    pub collect_stats: bool,
}

impl DigestSettings {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            queries: config.query_list(),
            max_results: config.max_results,
            days: config.days,
            broad_category: config.broad_category.clone(),
            stats_sample_size: config.stats_sample_size,
            collect_stats: true,
        }
    }
}

/// Outcome of one digest run
#[derive(Debug, Clone, Serialize)]
pub struct DigestReport {
    /// Enriched papers, highest score first
    pub papers: Vec<Paper>,
    pub manual_queries: Vec<String>,
    pub derived_queries: Vec<String>,
    pub trends: CategoryStats,
    /// Model-written overview; absent when there were no papers
    pub briefing: Option<String>,
    pub generated_on: NaiveDate,
}

impl DigestReport {
    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn count_by_origin(&self, origin: QueryOrigin) -> usize {
        self.papers.iter().filter(|p| p.origin == origin).count()
    }

    pub fn high_score_count(&self) -> usize {
        self.papers.iter().filter(|p| p.score() >= HIGH_SCORE).count()
    }

    pub fn with_code_count(&self) -> usize {
        self.papers.iter().filter(|p| p.repository().is_some()).count()
    }
}

/// Runs the digest pipeline end to end
pub struct DigestRunner {
    source: Arc<dyn Source>,
    coordinator: EnrichmentCoordinator,
    chat: Option<ChatClient>,
    profile: Arc<UserProfile>,
    settings: DigestSettings,
}

impl std::fmt::Debug for DigestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestRunner")
            .field("source", &self.source.id())
            .field("settings", &self.settings)
            .field("query_expansion", &self.chat.is_some())
            .finish_non_exhaustive()
    }
}

impl DigestRunner {
    pub fn new(
        source: Arc<dyn Source>,
        coordinator: EnrichmentCoordinator,
        settings: DigestSettings,
    ) -> Self {
        Self {
            source,
            coordinator,
            chat: None,
            profile: Arc::new(UserProfile::default()),
            settings,
        }
    }

    /// Enable query derivation from `profile` and the model-written briefing
    pub fn with_expansion(mut self, chat: ChatClient, profile: Arc<UserProfile>) -> Self {
        self.chat = Some(chat);
        self.profile = profile;
        self
    }

    /// Wire every collaborator from configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let profile = Arc::new(
            config
                .profile_path
                .as_deref()
                .map(UserProfile::load_or_empty)
                .unwrap_or_default(),
        );

        let matcher = Arc::new(SignatureMatcher::default());
        let inspector = SourceInspector::new(&config.inspection, matcher.clone())?;
        let repositories = GitHubLookup::new(&config.github)?;
        let chat = ChatClient::from_config(&config.llm)?;

        let analysis: Arc<dyn AnalysisService> = match &chat {
            Some(chat) => Arc::new(ChatAnalysisService::new(
                chat.clone(),
                &config.llm,
                profile.clone(),
            )),
            None => {
                tracing::warn!("No API key configured, AI analysis will be skipped");
                Arc::new(UnconfiguredAnalysis)
            }
        };

        let coordinator = EnrichmentCoordinator::new(
            analysis,
            Arc::new(inspector),
            Arc::new(repositories),
            matcher,
            ConcurrencyGate::new(config.inspection.max_concurrent_downloads),
        );

        let runner = Self::new(
            Arc::new(ArxivSource::new(&config.search)?),
            coordinator,
            DigestSettings::from_config(&config.search),
        );

        Ok(match chat {
            Some(chat) => runner.with_expansion(chat, profile),
            None => runner,
        })
    }

    pub fn settings(&self) -> &DigestSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut DigestSettings {
        &mut self.settings
    }

    /// Run the digest for the window ending on `today`
    pub async fn run(&self, today: NaiveDate) -> DigestReport {
        let derived_queries = match &self.chat {
            Some(chat) => expand::derive_queries(chat, &self.profile).await,
            None => Vec::new(),
        };

        let window = SearchWindow {
            max_results: self.settings.max_results,
            days: self.settings.days,
            today,
        };

        let (papers, trends) = tokio::join!(
            collect_papers(
                self.source.as_ref(),
                &self.settings.queries,
                &derived_queries,
                window
            ),
            self.trends(today),
        );

        if papers.is_empty() {
            tracing::info!("No papers found for this window");
        }

        let papers = self.coordinator.enrich_batch(papers).await;

        let briefing = if papers.is_empty() {
            None
        } else {
            Some(write_briefing(self.chat.as_ref(), &papers, &trends).await)
        };

        DigestReport {
            papers,
            manual_queries: self.settings.queries.clone(),
            derived_queries,
            trends,
            briefing,
            generated_on: today,
        }
    }

    async fn trends(&self, today: NaiveDate) -> CategoryStats {
        if !self.settings.collect_stats {
            return CategoryStats::default();
        }
        fetch_category_stats(
            self.source.as_ref(),
            &self.settings.broad_category,
            self.settings.stats_sample_size,
            today,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::chat_fixtures::chat_reply;
    use crate::enrich::{LookupError, RepoMetadata, RepositoryLookup, NEUTRAL_SCORE};
    use crate::inspect::{SourceInspection, SourceInspectionResult};
    use crate::models::PaperBuilder;
    use crate::sources::mock::make_paper;
    use crate::sources::MockSource;
    use crate::utils::HttpClient;
    use async_trait::async_trait;
    use mockito::Matcher;

    struct NoInspection;

    #[async_trait]
    impl SourceInspection for NoInspection {
        async fn inspect(&self, _paper_id: &str, _gate: &ConcurrencyGate) -> SourceInspectionResult {
            SourceInspectionResult::empty()
        }
    }

    struct NoLookup;

    #[async_trait]
    impl RepositoryLookup for NoLookup {
        async fn lookup(&self, _repo_path: &str) -> Result<RepoMetadata, LookupError> {
            Err(LookupError::NotFound)
        }
    }

    fn coordinator() -> EnrichmentCoordinator {
        EnrichmentCoordinator::new(
            Arc::new(UnconfiguredAnalysis),
            Arc::new(NoInspection),
            Arc::new(NoLookup),
            Arc::new(SignatureMatcher::default()),
            ConcurrencyGate::new(3),
        )
    }

    fn settings(queries: &[&str]) -> DigestSettings {
        DigestSettings {
            queries: queries.iter().map(|q| q.to_string()).collect(),
            max_results: 10,
            days: 3,
            broad_category: "cs".to_string(),
            stats_sample_size: 50,
            collect_stats: true,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn test_settings_from_config() {
        let config = SearchConfig {
            queries: "a; b".to_string(),
            ..Default::default()
        };
        let s = DigestSettings::from_config(&config);
        assert_eq!(s.queries, vec!["a", "b"]);
        assert!(s.collect_stats);
    }

    #[tokio::test]
    async fn test_run_without_analysis() {
        let stats_paper = PaperBuilder::new("9", "t", "u").primary_category("cs.RO").build();
        let source = Arc::new(
            MockSource::new()
                .with_results("agents", vec![make_paper("1", "One"), make_paper("2", "Two")])
                .with_results("cat:cs.*", vec![stats_paper]),
        );
        let runner = DigestRunner::new(source.clone(), coordinator(), settings(&["agents"]));

        let report = runner.run(today()).await;
        assert_eq!(report.papers.len(), 2);
        assert!(report.derived_queries.is_empty());
        assert_eq!(report.count_by_origin(QueryOrigin::Manual), 2);
        assert!(report.papers.iter().all(|p| p.score() == NEUTRAL_SCORE));
        assert_eq!(report.high_score_count(), 0);
        assert_eq!(report.trends.top(1), vec![("Robotics", 1)]);
        assert_eq!(source.executed().len(), 2);
        assert_eq!(report.briefing.as_deref(), Some(BRIEFING_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_run_with_no_results_is_empty() {
        let source = Arc::new(MockSource::new());
        let mut runner = DigestRunner::new(source.clone(), coordinator(), settings(&["nothing"]));
        runner.settings_mut().collect_stats = false;

        let report = runner.run(today()).await;
        assert!(report.is_empty());
        assert!(report.trends.is_empty());
        assert!(report.briefing.is_none());
        assert_eq!(source.executed().len(), 1);
    }

    #[tokio::test]
    async fn test_run_with_derived_queries() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "response_format": {"type": "json_object"}
            })))
            .with_status(200)
            .with_body(chat_reply(r#"{"queries": ["derived one"]}"#))
            .create_async()
            .await;
        let briefing = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({"temperature": 0.7})))
            .with_status(200)
            .with_body(chat_reply("Robotics is busy."))
            .expect(1)
            .create_async()
            .await;

        let source = Arc::new(
            MockSource::new()
                .with_results("manual", vec![make_paper("1", "One")])
                .with_results("derived one", vec![make_paper("1", "One"), make_paper("2", "Two")]),
        );
        let chat = ChatClient::new(HttpClient::new().unwrap(), &server.url(), "k", "m");
        let profile = Arc::new(UserProfile {
            research_interests: vec!["robots".to_string()],
            publications: Vec::new(),
        });

        let mut runner = DigestRunner::new(source, coordinator(), settings(&["manual"]))
            .with_expansion(chat, profile);
        runner.settings_mut().collect_stats = false;

        let report = runner.run(today()).await;
        assert_eq!(report.derived_queries, vec!["derived one"]);
        assert_eq!(report.papers.len(), 2);
        assert_eq!(report.count_by_origin(QueryOrigin::Manual), 1);
        assert_eq!(report.count_by_origin(QueryOrigin::Derived), 1);
        briefing.assert_async().await;
        assert_eq!(report.briefing.as_deref(), Some("Robotics is busy."));
    }
}
