//! Utility modules supporting the digest pipeline.
//!
//! - [`HttpClient`]: shared HTTP client, with a decompression-free variant for source bundles
//! - [`run_attempts`]: bounded retry loop over typed [`AttemptOutcome`]s
//! - [`normalize_arxiv_id`]: strip URL, prefix and version suffix from an arXiv identifier
//!
//! # Bounded retries
//!
//! ```rust
//! use arxiv_scout::utils::{run_attempts, AttemptOutcome, RetryPolicy};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let result = run_attempts(RetryPolicy::attempts(2), |attempt| async move {
//!     if attempt == 1 {
//!         AttemptOutcome::Transient("timeout".to_string())
//!     } else {
//!         AttemptOutcome::Success(attempt)
//!     }
//! })
//! .await;
//! assert_eq!(result.ok(), Some(2));
//! # }
//! ```

mod http;
mod retry;
mod validate;

pub use http::{HttpClient, DEFAULT_USER_AGENT};
pub use retry::{run_attempts, AttemptOutcome, AttemptResult, RetryPolicy};
pub use validate::{normalize_arxiv_id, sanitize_paper_id, ValidationError};
