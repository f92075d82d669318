//! Source-bundle inspection.
//!
//! A paper's LaTeX sources often reveal what its abstract does not: the
//! venue it was formatted for (through style files and document classes)
//! and a link to its code. This module downloads the bundle under a shared
//! [`ConcurrencyGate`], streams its members through [`archive::scan`], and
//! matches each one against a [`SignatureMatcher`] as it goes by.
//!
//! ```rust
//! use arxiv_scout::inspect::SignatureMatcher;
//!
//! let matcher = SignatureMatcher::default();
//! assert_eq!(matcher.match_venue_by_filename("figures/../cvpr.sty"), Some("CVPR"));
//! assert_eq!(
//!     matcher.match_repository_link("code: https://github.com/acme/net."),
//!     Some("https://github.com/acme/net")
//! );
//! ```

pub mod archive;
mod gate;
mod inspector;
mod signatures;

pub use archive::{scan, scan_with_fallback, ArchiveVisitor, ScanKind, ScanSummary};
pub use gate::{ConcurrencyGate, GateClosed, GatePermit, DEFAULT_GATE_CAPACITY};
pub use inspector::{inspect_bundle, SourceInspection, SourceInspectionResult, SourceInspector};
pub use signatures::{
    SignatureMatcher, SignatureRule, DEFAULT_CONTENT_SIGNATURES, DEFAULT_FILENAME_SIGNATURES,
    DEFAULT_REPOSITORY_PATTERN,
};
