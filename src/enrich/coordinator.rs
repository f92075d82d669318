//! Per-paper enrichment: analysis and source inspection side by side.

use futures_util::future::join_all;
use std::sync::Arc;

use super::analysis::{AnalysisError, AnalysisService, PaperAnalysis};
use super::repository::{LookupError, RepositoryLookup};
use crate::inspect::{ConcurrencyGate, SignatureMatcher, SourceInspection, SourceInspectionResult};
use crate::models::{
    AnalysisStatus, Enrichment, LinkProvenance, Paper, RepositoryRecord, RepositoryStatus,
};

/// Score given when analysis failed
pub const FAILURE_SCORE: u8 = 0;

/// Score given when no analysis service is configured
pub const NEUTRAL_SCORE: u8 = 5;

const UNKNOWN_TOPIC: &str = "Unknown";

/// Runs analysis and source inspection for each paper and merges the results
///
/// Every paper handed in comes back exactly once with its enrichment set;
/// failures of either side only degrade that paper's fields.
#[derive(Clone)]
pub struct EnrichmentCoordinator {
    analysis: Arc<dyn AnalysisService>,
    inspector: Arc<dyn SourceInspection>,
    repositories: Arc<dyn RepositoryLookup>,
    matcher: Arc<SignatureMatcher>,
    gate: ConcurrencyGate,
}

impl std::fmt::Debug for EnrichmentCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentCoordinator")
            .field("gate_capacity", &self.gate.capacity())
            .finish_non_exhaustive()
    }
}

impl EnrichmentCoordinator {
    pub fn new(
        analysis: Arc<dyn AnalysisService>,
        inspector: Arc<dyn SourceInspection>,
        repositories: Arc<dyn RepositoryLookup>,
        matcher: Arc<SignatureMatcher>,
        gate: ConcurrencyGate,
    ) -> Self {
        Self {
            analysis,
            inspector,
            repositories,
            matcher,
            gate,
        }
    }

    /// Gate shared by every inspection this coordinator starts
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Enrich one paper
    pub async fn enrich(&self, mut paper: Paper) -> Paper {
        let (analysis, inspection) = tokio::join!(
            self.analysis.analyze(&paper),
            self.inspector.inspect(&paper.paper_id, &self.gate),
        );

        let repository = match self.resolve_link(&paper.r#abstract, &inspection) {
            Some((url, provenance)) => Some(self.describe_repository(url, provenance).await),
            None => None,
        };

        let enrichment = match analysis {
            Ok(analysis) => completed(&paper, analysis, inspection.venue, repository),
            Err(err) => {
                if !matches!(err, AnalysisError::NotConfigured) {
                    tracing::warn!(paper_id = %paper.paper_id, error = %err, "Analysis failed");
                }
                degraded(&paper, &err, inspection.venue, repository)
            }
        };

        tracing::debug!(
            paper_id = %paper.paper_id,
            score = enrichment.score,
            analysis = ?enrichment.analysis,
            venue = enrichment.venue.as_deref().unwrap_or("-"),
            "Paper enriched"
        );

        paper.enrichment = Some(enrichment);
        paper
    }

    /// Enrich every paper concurrently, then order by score, highest first
    ///
    /// The sort is stable: equal scores keep their input order.
    pub async fn enrich_batch(&self, papers: Vec<Paper>) -> Vec<Paper> {
        let total = papers.len();
        let mut enriched = join_all(papers.into_iter().map(|paper| self.enrich(paper))).await;
        enriched.sort_by(|a, b| b.score().cmp(&a.score()));

        tracing::info!(
            papers = total,
            peak_downloads = self.gate.peak(),
            "Batch enrichment finished"
        );
        enriched
    }

    /// Pick the surviving repository link
    ///
    /// A link in the abstract always wins and is declared. Otherwise the link
    /// found in the source bundle, if any, is used and marked hidden.
    pub fn resolve_link(
        &self,
        abstract_text: &str,
        inspection: &SourceInspectionResult,
    ) -> Option<(String, LinkProvenance)> {
        if let Some(url) = self.matcher.match_repository_link(abstract_text) {
            return Some((url.to_string(), LinkProvenance::Declared));
        }
        inspection
            .repository_url
            .clone()
            .map(|url| (url, LinkProvenance::Hidden))
    }

    async fn describe_repository(&self, url: String, provenance: LinkProvenance) -> RepositoryRecord {
        let Some(path) = self.matcher.repository_path(&url).map(str::to_string) else {
            return RepositoryRecord::placeholder(url, RepositoryStatus::Unavailable, provenance);
        };

        match self.repositories.lookup(&path).await {
            Ok(meta) => RepositoryRecord {
                url,
                stars: meta.stars,
                last_push: meta.last_push,
                status: RepositoryStatus::Found,
                provenance,
            },
            Err(LookupError::NotFound) => {
                RepositoryRecord::placeholder(url, RepositoryStatus::NotFound, provenance)
            }
            Err(err) => {
                tracing::debug!(repository = %path, error = %err, "Repository lookup failed");
                RepositoryRecord::placeholder(url, RepositoryStatus::Unavailable, provenance)
            }
        }
    }
}

fn fallback_topic(paper: &Paper) -> String {
    paper
        .primary_category
        .clone()
        .unwrap_or_else(|| UNKNOWN_TOPIC.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn completed(
    paper: &Paper,
    analysis: PaperAnalysis,
    venue: Option<String>,
    repository: Option<RepositoryRecord>,
) -> Enrichment {
    let score = analysis.clamped_score();
    Enrichment {
        title_translated: non_empty(analysis.title_translated).unwrap_or_else(|| paper.title.clone()),
        summary_translated: non_empty(analysis.summary_translated)
            .unwrap_or_else(|| paper.r#abstract.clone()),
        synopsis: non_empty(analysis.synopsis).unwrap_or_else(|| "No summary".to_string()),
        score,
        rationale: analysis.rationale.unwrap_or_default(),
        topic: non_empty(analysis.topic).unwrap_or_else(|| fallback_topic(paper)),
        venue,
        repository,
        analysis: AnalysisStatus::Completed,
    }
}

fn degraded(
    paper: &Paper,
    err: &AnalysisError,
    venue: Option<String>,
    repository: Option<RepositoryRecord>,
) -> Enrichment {
    let (score, synopsis, rationale, status) = match err {
        AnalysisError::NotConfigured => (
            NEUTRAL_SCORE,
            "AI analysis unavailable".to_string(),
            err.to_string(),
            AnalysisStatus::Skipped,
        ),
        _ => (
            FAILURE_SCORE,
            "Analysis failed".to_string(),
            format!("Analysis failed: {}", err),
            AnalysisStatus::Failed,
        ),
    };

    Enrichment {
        title_translated: paper.title.clone(),
        summary_translated: paper.r#abstract.clone(),
        synopsis,
        score,
        rationale,
        topic: fallback_topic(paper),
        venue,
        repository,
        analysis: status,
    }
}
