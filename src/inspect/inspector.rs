//! Fetches a paper's source bundle and recovers venue and repository link.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::Arc;

use super::archive::{
    scan_with_fallback, ArchiveVisitor, ScanSummary, DEFAULT_TEXT_FALLBACK_BYTES,
};
use super::gate::ConcurrencyGate;
use super::signatures::SignatureMatcher;
use crate::config::InspectionConfig;
use crate::utils::{
    normalize_arxiv_id, run_attempts, AttemptOutcome, AttemptResult, HttpClient, RetryPolicy,
};

/// Signals recovered from a source bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceInspectionResult {
    /// Publication venue, if a signature matched
    pub venue: Option<String>,
    /// First repository URL found in a document
    pub repository_url: Option<String>,
}

impl SourceInspectionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Both signals were found
    pub fn is_complete(&self) -> bool {
        self.venue.is_some() && self.repository_url.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.venue.is_none() && self.repository_url.is_none()
    }
}

/// Inspects source bundles; never fails, an inspection without signals is empty
#[async_trait]
pub trait SourceInspection: Send + Sync {
    /// Inspect the bundle of `paper_id`, fetching under `gate`
    async fn inspect(&self, paper_id: &str, gate: &ConcurrencyGate) -> SourceInspectionResult;
}

/// How an inspection ended; only surfaced in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InspectionOutcome {
    SignalsFound,
    NoSignal,
    NotInspectable,
    Unreachable,
}

/// Collects signals while a bundle streams past
///
/// Any filename match outranks any content match, wherever the files sit in
/// the archive. Documents stop being decoded once a venue and a link are
/// known, and the scan ends once the venue came from a filename.
struct SignalCollector<'m> {
    matcher: &'m SignatureMatcher,
    filename_venue: Option<String>,
    content_venue: Option<String>,
    repository_url: Option<String>,
}

impl<'m> SignalCollector<'m> {
    fn new(matcher: &'m SignatureMatcher) -> Self {
        Self {
            matcher,
            filename_venue: None,
            content_venue: None,
            repository_url: None,
        }
    }

    fn settled(&self) -> ControlFlow<()> {
        if self.filename_venue.is_some() && self.repository_url.is_some() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn into_result(self) -> SourceInspectionResult {
        SourceInspectionResult {
            venue: self.filename_venue.or(self.content_venue),
            repository_url: self.repository_url,
        }
    }
}

impl ArchiveVisitor for SignalCollector<'_> {
    fn file(&mut self, name: &str, _size: u64) -> ControlFlow<()> {
        if self.filename_venue.is_none() {
            self.filename_venue = self.matcher.match_venue_by_filename(name).map(str::to_string);
        }
        self.settled()
    }

    fn wants_documents(&self) -> bool {
        self.repository_url.is_none()
            || (self.filename_venue.is_none() && self.content_venue.is_none())
    }

    fn document(&mut self, name: &str, text: &str) -> ControlFlow<()> {
        if self.filename_venue.is_none() && self.content_venue.is_none() {
            self.content_venue = self.matcher.match_venue_by_content(text).map(str::to_string);
        }
        if self.repository_url.is_none() {
            self.repository_url = self.matcher.match_repository_link(text).map(str::to_string);
            if self.repository_url.is_some() {
                tracing::trace!(file = name, "Repository link found in document");
            }
        }
        self.settled()
    }
}

/// Scan bundle bytes and match them against the signature tables
pub fn inspect_bundle(
    matcher: &SignatureMatcher,
    bytes: &[u8],
    fallback_bytes: usize,
) -> (SourceInspectionResult, ScanSummary) {
    let mut collector = SignalCollector::new(matcher);
    let summary = scan_with_fallback(bytes, fallback_bytes, &mut collector);
    tracing::trace!(
        files = summary.files,
        documents = summary.documents,
        stopped_early = summary.stopped_early,
        "Bundle scanned"
    );
    (collector.into_result(), summary)
}

/// Source-bundle inspector for arXiv's `/src/<id>` endpoint
#[derive(Debug, Clone)]
pub struct SourceInspector {
    client: HttpClient,
    base_url: String,
    matcher: Arc<SignatureMatcher>,
    retry: RetryPolicy,
    text_fallback_bytes: usize,
}

impl SourceInspector {
    /// Build an inspector from configuration
    pub fn new(config: &InspectionConfig, matcher: Arc<SignatureMatcher>) -> Result<Self, reqwest::Error> {
        let client = HttpClient::for_source_bundles(
            &config.user_agent,
            config.total_timeout(),
            config.connect_timeout(),
        )?;

        Ok(Self::with_client(
            client,
            &config.source_base_url,
            matcher,
            RetryPolicy::attempts(config.max_attempts),
        )
        .text_fallback_bytes(config.text_fallback_bytes))
    }

    /// Build an inspector around an existing client
    pub fn with_client(
        client: HttpClient,
        base_url: &str,
        matcher: Arc<SignatureMatcher>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            matcher,
            retry,
            text_fallback_bytes: DEFAULT_TEXT_FALLBACK_BYTES,
        }
    }

    /// Set the window inspected by the text fallback
    pub fn text_fallback_bytes(mut self, bytes: usize) -> Self {
        self.text_fallback_bytes = bytes;
        self
    }

    /// Bundle URL for a normalized id
    pub fn source_url(&self, paper_id: &str) -> String {
        format!("{}/{}", self.base_url, paper_id)
    }

    /// Scan bundle bytes and match them against the signature tables
    pub fn inspect_bytes(&self, bytes: &[u8]) -> SourceInspectionResult {
        inspect_bundle(&self.matcher, bytes, self.text_fallback_bytes).0
    }

    async fn fetch_attempt(&self, url: &str, attempt: u32) -> AttemptOutcome<Vec<u8>> {
        tracing::debug!(url, attempt, "Fetching source bundle");

        let response = match self.client.client().get(url).send().await {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::from_reqwest_error(&e),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return AttemptOutcome::Terminal(format!("HTTP {}", status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.contains("pdf") {
            return AttemptOutcome::Terminal("only a PDF is available".to_string());
        }

        match response.bytes().await {
            Ok(body) if body.is_empty() => AttemptOutcome::Terminal("empty body".to_string()),
            Ok(body) => AttemptOutcome::Success(body.to_vec()),
            Err(e) => AttemptOutcome::from_reqwest_error(&e),
        }
    }
}

#[async_trait]
impl SourceInspection for SourceInspector {
    async fn inspect(&self, paper_id: &str, gate: &ConcurrencyGate) -> SourceInspectionResult {
        let paper_id = match normalize_arxiv_id(paper_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(paper_id, error = %e, "Refusing to inspect invalid id");
                return SourceInspectionResult::empty();
            }
        };
        let url = self.source_url(&paper_id);

        // The slot covers every fetch attempt and is released before scanning.
        let fetched = {
            let _permit = match gate.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::warn!(paper_id = %paper_id, error = %e, "Inspection skipped");
                    return SourceInspectionResult::empty();
                }
            };
            run_attempts(self.retry, |attempt| self.fetch_attempt(&url, attempt)).await
        };

        let (result, outcome) = match fetched {
            AttemptResult::Success { value, .. } => {
                let result = self.inspect_bytes(&value);
                let outcome = if result.is_empty() {
                    InspectionOutcome::NoSignal
                } else {
                    InspectionOutcome::SignalsFound
                };
                (result, outcome)
            }
            AttemptResult::Terminal { cause, .. } => {
                tracing::debug!(paper_id = %paper_id, cause = %cause, "Source bundle not inspectable");
                (SourceInspectionResult::empty(), InspectionOutcome::NotInspectable)
            }
            AttemptResult::Exhausted { cause, attempts } => {
                tracing::warn!(paper_id = %paper_id, attempts, cause = %cause, "Source bundle unreachable");
                (SourceInspectionResult::empty(), InspectionOutcome::Unreachable)
            }
        };

        tracing::info!(
            paper_id = %paper_id,
            outcome = ?outcome,
            venue = result.venue.as_deref().unwrap_or("-"),
            repository = result.repository_url.as_deref().unwrap_or("-"),
            "Source inspection finished"
        );

        result
    }
}
