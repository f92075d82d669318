//! Paper enrichment.
//!
//! [`EnrichmentCoordinator`] runs an [`AnalysisService`] call and a source
//! inspection for each paper at the same time, then merges the results:
//! translated text and a relevance score from the analysis; venue and
//! repository link from the inspection, with repository metadata looked up
//! through a [`RepositoryLookup`].

mod analysis;
mod chat;
mod coordinator;
mod repository;

pub use analysis::{
    AnalysisError, AnalysisService, ChatAnalysisService, PaperAnalysis, UnconfiguredAnalysis,
    MAX_SCORE,
};
pub(crate) use analysis::strip_code_fence;
pub use chat::ChatClient;
pub use coordinator::{EnrichmentCoordinator, FAILURE_SCORE, NEUTRAL_SCORE};
pub use repository::{GitHubLookup, LookupError, RepoMetadata, RepositoryLookup};

#[cfg(test)]
pub(crate) use chat::fixtures as chat_fixtures;
