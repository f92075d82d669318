//! # arXiv Scout
//!
//! A daily research digest for arXiv. Recent preprints are searched with
//! manual and profile-derived queries, scored and translated by an LLM, and
//! inspected at the LaTeX-source level for the venue they were formatted for
//! and code links their abstracts leave out.
//!
//! ## Architecture
//!
//! - [`models`]: Core data structures (Paper, SearchQuery, UserProfile)
//! - [`sources`]: Catalog search behind the [`Source`] trait
//! - [`inspect`]: Source-bundle scanning, signature matching, download gate
//! - [`enrich`]: LLM analysis, repository lookups and the per-paper coordinator
//! - [`digest`]: The end-to-end run: query expansion, mixed search, trends
//! - [`ui`]: Terminal rendering
//! - [`utils`]: HTTP client, typed retry loop, identifier normalization
//! - [`config`]: Configuration management

pub mod config;
pub mod digest;
pub mod enrich;
pub mod inspect;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use digest::{DigestReport, DigestRunner};
pub use enrich::EnrichmentCoordinator;
pub use inspect::{ConcurrencyGate, SignatureMatcher, SourceInspector};
pub use models::Paper;
pub use sources::Source;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
