//! Identifier validation and normalization for arXiv papers.
//!
//! Identifiers end up in request paths, so they are checked for path
//! traversal and injection characters before use.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid paper ID: {0}")]
    InvalidPaperId(String),

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),
}

static VERSION_SUFFIX: OnceLock<Regex> = OnceLock::new();

fn version_suffix() -> &'static Regex {
    VERSION_SUFFIX.get_or_init(|| Regex::new(r"v\d+$").expect("valid version regex"))
}

/// Validate a paper ID to prevent injection attacks
///
/// arXiv IDs only contain alphanumerics, dots, hyphens and (for old-style
/// IDs such as `hep-th/9901001`) a single slash.
pub fn sanitize_paper_id(id: &str) -> Result<String, ValidationError> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::InvalidPaperId("empty ID".to_string()));
    }

    if id.contains("..") || id.contains("./") || id.starts_with('/') {
        return Err(ValidationError::PathTraversal(id.to_string()));
    }

    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '/' | '_')))
    {
        return Err(ValidationError::InvalidPaperId(format!(
            "contains disallowed character: {:?}",
            bad
        )));
    }

    Ok(id.to_string())
}

/// Normalize an arXiv identifier to its version-less form
///
/// Handles formats like:
/// - "2301.12345"
/// - "2301.12345v2" (version is stripped)
/// - "arXiv:2301.12345"
/// - "https://arxiv.org/abs/2301.12345v1"
/// - "http://arxiv.org/abs/hep-th/9901001v3"
pub fn normalize_arxiv_id(id: &str) -> Result<String, ValidationError> {
    let trimmed = id.trim();

    let without_url = ["/abs/", "/pdf/", "/src/"]
        .iter()
        .find_map(|marker| trimmed.find(marker).map(|pos| &trimmed[pos + marker.len()..]))
        .unwrap_or(trimmed);

    let without_prefix = match without_url.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("arxiv:") => &without_url[6..],
        _ => without_url,
    };

    let without_ext = without_prefix
        .strip_suffix(".pdf")
        .unwrap_or(without_prefix)
        .trim_end_matches('/');

    let clean = version_suffix().replace(without_ext, "");
    sanitize_paper_id(&clean)
}
