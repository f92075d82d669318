//! Core data models for preprints, profiles and search operations.

mod paper;
mod profile;
mod search;

pub use paper::{
    AnalysisStatus, Enrichment, LinkProvenance, Paper, PaperBuilder, QueryOrigin,
    RepositoryRecord, RepositoryStatus,
};
pub use profile::{Publication, UserProfile};
pub use search::{SearchQuery, SearchResponse, SortBy, SortOrder};
