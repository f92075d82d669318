//! Best-effort text extraction from untrusted source bundles.
//!
//! A bundle is expected to be a gzip-compressed tar archive. Anything that
//! does not open as one is given a second chance as raw LaTeX text; anything
//! else yields an empty scan. Scanning never fails.
//!
//! Members are streamed to an [`ArchiveVisitor`] one at a time. A document's
//! text lives only for the duration of its [`ArchiveVisitor::document`] call,
//! and the visitor decides when reading stops.

use flate2::read::GzDecoder;
use std::io::Read;
use std::ops::ControlFlow;
use tar::Archive;

/// Extension of files whose contents are scanned
pub const DOCUMENT_EXTENSION: &str = ".tex";

/// Bytes of a non-archive body inspected by the text fallback
pub const DEFAULT_TEXT_FALLBACK_BYTES: usize = 10_000;

/// Name given to the synthetic entry produced by the text fallback
pub const FALLBACK_ENTRY_NAME: &str = "source.tex";

/// Upper bound on text read from a single document
const MAX_DOCUMENT_BYTES: u64 = 8 * 1024 * 1024;

/// Upper bound on archive members considered
const MAX_ENTRIES: usize = 10_000;

/// Markers that identify a LaTeX body
const MARKUP_DIRECTIVES: [&str; 2] = ["\\documentclass", "\\usepackage"];

/// How the scanned entries were obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanKind {
    /// Entries come from a `.tar.gz` archive
    Archive,
    /// The body was not an archive but looked like LaTeX
    TextFallback,
    /// Nothing inspectable
    #[default]
    Empty,
}

/// Receives the members of a bundle in enumeration order
pub trait ArchiveVisitor {
    /// Called for every regular file, before any of its contents are read
    fn file(&mut self, name: &str, size: u64) -> ControlFlow<()>;

    /// Whether the next document should be decoded at all
    fn wants_documents(&self) -> bool {
        true
    }

    /// Called with the decoded text of a document file
    fn document(&mut self, name: &str, text: &str) -> ControlFlow<()>;
}

/// What a scan went through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// How the bundle was interpreted
    pub kind: ScanKind,
    /// Regular files handed to the visitor
    pub files: usize,
    /// Documents decoded and handed to the visitor
    pub documents: usize,
    /// Bytes of document text decoded
    pub text_bytes: u64,
    /// The visitor asked to stop before the end of the bundle
    pub stopped_early: bool,
}

impl ScanSummary {
    fn new(kind: ScanKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// True when nothing was handed to the visitor
    pub fn is_empty(&self) -> bool {
        self.files == 0
    }
}

/// Scan a bundle with the default text-fallback window
pub fn scan(bytes: &[u8], visitor: &mut impl ArchiveVisitor) -> ScanSummary {
    scan_with_fallback(bytes, DEFAULT_TEXT_FALLBACK_BYTES, visitor)
}

/// Scan a bundle, inspecting at most `fallback_bytes` of a non-archive body
pub fn scan_with_fallback(
    bytes: &[u8],
    fallback_bytes: usize,
    visitor: &mut impl ArchiveVisitor,
) -> ScanSummary {
    if bytes.is_empty() {
        return ScanSummary::default();
    }

    match read_tar_gz(bytes, visitor) {
        Ok(summary) => summary,
        Err(err) => {
            tracing::debug!(error = %err, "Body is not a tar.gz archive, trying text fallback");
            text_fallback(bytes, fallback_bytes, visitor)
        }
    }
}

/// Stream the regular files of a `.tar.gz` archive to `visitor`
///
/// An error before the first member means the body is not an archive, and the
/// visitor has seen nothing. An error after that (a truncated download) ends
/// the scan with the members visited so far.
fn read_tar_gz(bytes: &[u8], visitor: &mut impl ArchiveVisitor) -> std::io::Result<ScanSummary> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let mut summary = ScanSummary::new(ScanKind::Archive);
    let mut seen_member = false;

    for member in archive.entries()? {
        let mut member = match member {
            Ok(member) => member,
            Err(err) if seen_member => {
                tracing::debug!(error = %err, read = summary.files, "Archive truncated, keeping members read so far");
                break;
            }
            Err(err) => return Err(err),
        };
        seen_member = true;

        if !member.header().entry_type().is_file() {
            continue;
        }
        if summary.files >= MAX_ENTRIES {
            tracing::debug!(limit = MAX_ENTRIES, "Archive member limit reached");
            break;
        }

        let name = match member.path() {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(_) => String::from_utf8_lossy(&member.path_bytes()).into_owned(),
        };

        summary.files += 1;
        if visitor.file(&name, member.size()).is_break() {
            summary.stopped_early = true;
            break;
        }
        if !name.ends_with(DOCUMENT_EXTENSION) || !visitor.wants_documents() {
            continue;
        }

        let mut buf = Vec::new();
        if let Err(err) = (&mut member).take(MAX_DOCUMENT_BYTES).read_to_end(&mut buf) {
            tracing::debug!(file = %name, error = %err, "Could not read document member");
            continue;
        }
        summary.documents += 1;
        summary.text_bytes += buf.len() as u64;
        if visitor.document(&name, &String::from_utf8_lossy(&buf)).is_break() {
            summary.stopped_early = true;
            break;
        }
    }

    Ok(summary)
}

/// Treat the head of the body as LaTeX if it looks like it
///
/// Single-file submissions arrive as a bare gzip stream rather than a tar
/// archive, so a gzip body is decompressed before the check.
fn text_fallback(
    bytes: &[u8],
    fallback_bytes: usize,
    visitor: &mut impl ArchiveVisitor,
) -> ScanSummary {
    let head = match gunzip_head(bytes, fallback_bytes) {
        Some(decompressed) => decompressed,
        None => bytes[..bytes.len().min(fallback_bytes)].to_vec(),
    };

    let text = String::from_utf8_lossy(&head);
    if !MARKUP_DIRECTIVES.iter().any(|d| text.contains(d)) {
        return ScanSummary::default();
    }

    let mut summary = ScanSummary::new(ScanKind::TextFallback);
    summary.files = 1;
    if visitor.file(FALLBACK_ENTRY_NAME, head.len() as u64).is_break() {
        summary.stopped_early = true;
        return summary;
    }
    if visitor.wants_documents() {
        summary.documents = 1;
        summary.text_bytes = head.len() as u64;
        let _ = visitor.document(FALLBACK_ENTRY_NAME, &text);
    }
    summary
}

fn gunzip_head(bytes: &[u8], limit: usize) -> Option<Vec<u8>> {
    if !bytes.starts_with(&[0x1f, 0x8b]) {
        return None;
    }
    let mut head = Vec::new();
    GzDecoder::new(bytes)
        .take(limit as u64)
        .read_to_end(&mut head)
        .ok()?;
    Some(head)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::ArchiveVisitor;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::ops::ControlFlow;

    /// Build a `.tar.gz` archive from `(path, contents)` pairs
    pub fn tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, *contents)
                .expect("append tar member");
        }
        builder
            .into_inner()
            .expect("finish tar")
            .finish()
            .expect("finish gzip")
    }

    /// Gzip a byte slice without tar framing
    pub fn gzip(contents: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(contents).expect("write gzip");
        encoder.finish().expect("finish gzip")
    }

    /// Visitor that keeps everything it is shown
    #[derive(Debug, Default)]
    pub struct Collect {
        pub files: Vec<(String, u64)>,
        pub documents: Vec<(String, String)>,
    }

    impl ArchiveVisitor for Collect {
        fn file(&mut self, name: &str, size: u64) -> ControlFlow<()> {
            self.files.push((name.to_string(), size));
            ControlFlow::Continue(())
        }

        fn document(&mut self, name: &str, text: &str) -> ControlFlow<()> {
            self.documents.push((name.to_string(), text.to_string()));
            ControlFlow::Continue(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{gzip, tar_gz, Collect};
    use super::*;

    fn collect(bytes: &[u8]) -> (ScanSummary, Collect) {
        let mut seen = Collect::default();
        let summary = scan(bytes, &mut seen);
        (summary, seen)
    }

    #[test]
    fn test_empty_input() {
        let (summary, seen) = collect(&[]);
        assert_eq!(summary.kind, ScanKind::Empty);
        assert!(summary.is_empty());
        assert!(seen.files.is_empty());
    }

    #[test]
    fn test_garbage_input_is_empty() {
        let garbage: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(2654435761) >> 7) as u8).collect();
        let (summary, seen) = collect(&garbage);
        assert!(summary.is_empty());
        assert!(seen.files.is_empty());
    }

    #[test]
    fn test_archive_lists_all_files_but_reads_only_tex() {
        let bundle = tar_gz(&[
            ("main.tex", b"\\documentclass{article}\n".as_slice()),
            ("figures/plot.png", &[0x89, 0x50, 0x4e, 0x47]),
            ("cvpr.sty", b"% style".as_slice()),
        ]);

        let (summary, seen) = collect(&bundle);
        assert_eq!(summary.kind, ScanKind::Archive);
        assert_eq!(summary.files, 3);
        assert_eq!(summary.documents, 1);
        assert!(!summary.stopped_early);
        let names: Vec<_> = seen.files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["main.tex", "figures/plot.png", "cvpr.sty"]);
        assert_eq!(seen.files[1].1, 4);
        assert_eq!(
            seen.documents,
            vec![("main.tex".to_string(), "\\documentclass{article}\n".to_string())]
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let bundle = tar_gz(&[("paper.tex", &[b'a', 0xff, 0xfe, b'b'])]);
        let (_, seen) = collect(&bundle);
        let text = &seen.documents[0].1;
        assert!(text.starts_with('a'));
        assert!(text.ends_with('b'));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_truncated_archive_never_panics() {
        let bundle = tar_gz(&[
            ("a.tex", "x".repeat(20_000).as_bytes()),
            ("b.tex", b"\\usepackage{cvpr}".as_slice()),
        ]);
        for cut in [1, 10, 100, bundle.len() / 2, bundle.len() - 1] {
            let _ = collect(&bundle[..cut]);
        }
    }

    #[test]
    fn test_plain_text_fallback() {
        let mut body = b"\\documentclass{IEEEtran}\n\\begin{document}".to_vec();
        body.resize(200, b' ');

        let (summary, seen) = collect(&body);
        assert_eq!(summary.kind, ScanKind::TextFallback);
        assert_eq!(summary.files, 1);
        assert_eq!(seen.files[0].0, FALLBACK_ENTRY_NAME);
        assert!(seen.documents[0].1.contains("IEEEtran"));
    }

    #[test]
    fn test_plain_text_without_markup_is_empty() {
        let (summary, _) = collect(b"Just some prose without any LaTeX directives.");
        assert!(summary.is_empty());
    }

    #[test]
    fn test_fallback_only_reads_window() {
        let mut body = vec![b'x'; 50];
        body.extend_from_slice(b"\\documentclass{article}");
        assert!(scan_with_fallback(&body, 40, &mut Collect::default()).is_empty());
        assert!(!scan_with_fallback(&body, 100, &mut Collect::default()).is_empty());
    }

    #[test]
    fn test_single_gzipped_tex_file() {
        let body = gzip(b"\\documentclass[conference]{IEEEtran}\n");
        let (summary, seen) = collect(&body);
        assert_eq!(summary.kind, ScanKind::TextFallback);
        assert!(seen.documents[0].1.contains("IEEEtran"));
    }

    #[test]
    fn test_empty_archive_has_no_entries() {
        let (summary, _) = collect(&tar_gz(&[]));
        assert!(summary.is_empty());
    }

    /// Stops at the first file and declines every document
    struct FirstNameOnly(Vec<String>);

    impl ArchiveVisitor for FirstNameOnly {
        fn file(&mut self, name: &str, _size: u64) -> ControlFlow<()> {
            self.0.push(name.to_string());
            ControlFlow::Break(())
        }

        fn wants_documents(&self) -> bool {
            false
        }

        fn document(&mut self, name: &str, _text: &str) -> ControlFlow<()> {
            panic!("{name} should not have been decoded");
        }
    }

    #[test]
    fn test_visitor_can_stop_before_any_document_is_read() {
        let bundle = tar_gz(&[
            ("a.tex", b"\\usepackage{cvpr}".as_slice()),
            ("b.tex", b"\\usepackage{iccv}".as_slice()),
        ]);
        let mut visitor = FirstNameOnly(Vec::new());
        let summary = scan(&bundle, &mut visitor);

        assert!(summary.stopped_early);
        assert_eq!(summary.files, 1);
        assert_eq!(summary.documents, 0);
        assert_eq!(summary.text_bytes, 0);
        assert_eq!(visitor.0, vec!["a.tex"]);
    }
}
