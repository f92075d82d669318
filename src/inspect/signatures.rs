//! Venue and repository-link signatures.
//!
//! Rule tables are ordered: the first matching rule wins, so more specific
//! patterns come before looser ones. The tables are plain data and can be
//! replaced without touching the matching logic.

use regex::{Regex, RegexBuilder};

/// Filename rules, matched case-insensitively against a member's base name
pub const DEFAULT_FILENAME_SIGNATURES: &[(&str, &str)] = &[
    (r"^nips[_-]?(style|\d{4})?\.sty$", "NeurIPS"),
    (r"^neurips[_-]?(style|\d{4})?\.sty$", "NeurIPS"),
    (r"^iclr\d*(_conference)?\.sty$", "ICLR"),
    (r"^cvpr\.sty$", "CVPR"),
    (r"^iccv\.sty$", "ICCV"),
    (r"^eccv\.sty$", "ECCV"),
    (r"^aaai\d*\.sty$", "AAAI"),
    (r"^naacl\d*\.sty$", "NAACL"),
    (r"^emnlp\d*\.sty$", "EMNLP"),
    (r"^acl\d*\.sty$", "ACL"),
    (r"^icml\d*\.sty$", "ICML"),
];

/// Content rules, matched case-insensitively against document text
///
/// Package rules accept the template anywhere in a `\usepackage{a,b,c}` list.
pub const DEFAULT_CONTENT_SIGNATURES: &[(&str, &str)] = &[
    (r"\\usepackage[^{]*\{[^}]*\biclr\d*(_conference)?\b[^}]*\}", "ICLR"),
    (r"\\usepackage[^{]*\{[^}]*\bcvpr\b[^}]*\}", "CVPR"),
    (r"\\usepackage[^{]*\{[^}]*\biccv\b[^}]*\}", "ICCV"),
    (r"\\usepackage[^{]*\{[^}]*\beccv\b[^}]*\}", "ECCV"),
    (r"\\usepackage[^{]*\{[^}]*\bneurips(_\d{4}|\d*)\b[^}]*\}", "NeurIPS"),
    (r"\\usepackage[^{]*\{[^}]*\bnips(_\d{4}|\d*)\b[^}]*\}", "NeurIPS"),
    (r"\\usepackage[^{]*\{[^}]*\baaai\d*\b[^}]*\}", "AAAI"),
    (r"\\usepackage[^{]*\{[^}]*\bacl\d*\b[^}]*\}", "ACL"),
    (r"\\usepackage[^{]*\{[^}]*\bnaacl\d*\b[^}]*\}", "NAACL"),
    (r"\\usepackage[^{]*\{[^}]*\bemnlp\d*\b[^}]*\}", "EMNLP"),
    (r"\\documentclass.*\{acmart\}", "ACM"),
    (r"\\documentclass.*\{IEEEtran\}", "IEEE"),
    (r"\\documentclass.*\{nature\}", "Nature"),
    (r"\\documentclass.*\{llncs\}", "Springer (LNCS)"),
    (r"\\usepackage[^{]*\{[^}]*\bspconf\b[^}]*\}", "ICASSP"),
    (r"\\usepackage[^{]*\{[^}]*\bjmlr\d*\b[^}]*\}", "JMLR"),
    (r"\\usepackage[^{]*\{[^}]*\bicml\d*\b[^}]*\}", "ICML"),
    (r"Submitted to.*\bCVPR\b", "CVPR"),
    (r"Submitted to.*\bICCV\b", "ICCV"),
    (r"Submitted to.*\bECCV\b", "ECCV"),
    (r"Submitted to.*\bNeurIPS\b", "NeurIPS"),
    (r"Submitted to.*\bICLR\b", "ICLR"),
];

/// Hosted-repository link; group 1 is the `owner/name` path
pub const DEFAULT_REPOSITORY_PATTERN: &str = r"https?://github\.com/([\w-]+/[\w.-]+)";

/// A single pattern and the label it yields
#[derive(Debug, Clone)]
pub struct SignatureRule {
    pattern: Regex,
    label: String,
}

impl SignatureRule {
    /// Compile a case-insensitive rule
    pub fn new(pattern: &str, label: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            pattern,
            label: label.into(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Matches archive contents against venue and repository-link rules
#[derive(Debug, Clone)]
pub struct SignatureMatcher {
    filename_rules: Vec<SignatureRule>,
    content_rules: Vec<SignatureRule>,
    repository_link: Regex,
}

impl SignatureMatcher {
    /// Build a matcher from explicit rules
    pub fn new(
        filename_rules: Vec<SignatureRule>,
        content_rules: Vec<SignatureRule>,
        repository_link: Regex,
    ) -> Self {
        Self {
            filename_rules,
            content_rules,
            repository_link,
        }
    }

    /// Compile a matcher from `(pattern, label)` tables
    pub fn from_tables(
        filename_rules: &[(&str, &str)],
        content_rules: &[(&str, &str)],
        repository_pattern: &str,
    ) -> Result<Self, regex::Error> {
        let compile = |table: &[(&str, &str)]| {
            table
                .iter()
                .map(|(pattern, label)| SignatureRule::new(pattern, *label))
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self::new(
            compile(filename_rules)?,
            compile(content_rules)?,
            Regex::new(repository_pattern)?,
        ))
    }

    /// Label of the first filename rule matching the member's base name
    pub fn match_venue_by_filename(&self, path: &str) -> Option<&str> {
        let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
        self.filename_rules
            .iter()
            .find(|rule| rule.is_match(base))
            .map(SignatureRule::label)
    }

    /// Label of the first content rule found anywhere in `text`
    pub fn match_venue_by_content(&self, text: &str) -> Option<&str> {
        self.content_rules
            .iter()
            .find(|rule| rule.is_match(text))
            .map(SignatureRule::label)
    }

    /// First repository URL in `text`, with trailing sentence punctuation removed
    pub fn match_repository_link<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.repository_link
            .find(text)
            .map(|m| m.as_str().trim_end_matches('.'))
    }

    /// `owner/name` path of a repository URL
    pub fn repository_path<'u>(&self, url: &'u str) -> Option<&'u str> {
        self.repository_link
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end_matches('.'))
            .map(|path| path.strip_suffix(".git").unwrap_or(path))
    }
}

impl Default for SignatureMatcher {
    fn default() -> Self {
        Self::from_tables(
            DEFAULT_FILENAME_SIGNATURES,
            DEFAULT_CONTENT_SIGNATURES,
            DEFAULT_REPOSITORY_PATTERN,
        )
        .expect("built-in signature tables compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_compile() {
        let matcher = SignatureMatcher::default();
        assert_eq!(matcher.filename_rules.len(), DEFAULT_FILENAME_SIGNATURES.len());
        assert_eq!(matcher.content_rules.len(), DEFAULT_CONTENT_SIGNATURES.len());
    }

    #[test]
    fn test_filename_rules() {
        let matcher = SignatureMatcher::default();
        assert_eq!(matcher.match_venue_by_filename("cvpr.sty"), Some("CVPR"));
        assert_eq!(matcher.match_venue_by_filename("style/CVPR.sty"), Some("CVPR"));
        assert_eq!(matcher.match_venue_by_filename("neurips_2024.sty"), Some("NeurIPS"));
        assert_eq!(matcher.match_venue_by_filename("nips_style.sty"), Some("NeurIPS"));
        assert_eq!(matcher.match_venue_by_filename("iclr2025_conference.sty"), Some("ICLR"));
        assert_eq!(matcher.match_venue_by_filename("naacl2021.sty"), Some("NAACL"));
        assert_eq!(matcher.match_venue_by_filename("acl.sty"), Some("ACL"));
        assert_eq!(matcher.match_venue_by_filename("main.tex"), None);
        assert_eq!(matcher.match_venue_by_filename("mycvpr.sty"), None);
    }

    #[test]
    fn test_content_rules() {
        let matcher = SignatureMatcher::default();
        assert_eq!(
            matcher.match_venue_by_content("\\usepackage[final]{neurips_2023}"),
            Some("NeurIPS")
        );
        assert_eq!(
            matcher.match_venue_by_content("\\documentclass[conference]{IEEEtran}"),
            Some("IEEE")
        );
        assert_eq!(
            matcher.match_venue_by_content("\\documentclass[sigconf]{acmart}"),
            Some("ACM")
        );
        assert_eq!(
            matcher.match_venue_by_content("\\usepackage[hyperref]{acl2023}"),
            Some("ACL")
        );
        assert_eq!(matcher.match_venue_by_content("\\usepackage{amsmath}"), None);
    }

    #[test]
    fn test_template_inside_package_list() {
        let matcher = SignatureMatcher::default();
        assert_eq!(
            matcher.match_venue_by_content("\\usepackage{iclr2024_conference,times}"),
            Some("ICLR")
        );
        assert_eq!(
            matcher.match_venue_by_content("\\usepackage{times, neurips_2024}"),
            Some("NeurIPS")
        );
        assert_eq!(
            matcher.match_venue_by_content("\\usepackage[review]{graphicx,cvpr,amsmath}"),
            Some("CVPR")
        );
        assert_eq!(
            matcher.match_venue_by_content("\\usepackage{times,\n  naacl2021}"),
            Some("NAACL")
        );
        assert_eq!(
            matcher.match_venue_by_content("\\usepackage{times}\n% cvpr camera ready"),
            None
        );
        assert_eq!(matcher.match_venue_by_content("\\usepackage{cvpr_extras}"), None);
    }

    #[test]
    fn test_content_rules_are_case_insensitive() {
        let matcher = SignatureMatcher::default();
        assert_eq!(
            matcher.match_venue_by_content("\\DocumentClass{ieeetran}"),
            Some("IEEE")
        );
    }

    #[test]
    fn test_first_content_rule_wins() {
        let matcher = SignatureMatcher::default();
        let text = "\\documentclass{IEEEtran}\n\\usepackage{cvpr}";
        assert_eq!(matcher.match_venue_by_content(text), Some("CVPR"));
    }

    #[test]
    fn test_text_fallback_rule() {
        let matcher = SignatureMatcher::default();
        assert_eq!(
            matcher.match_venue_by_content("% Submitted to ICLR 2025"),
            Some("ICLR")
        );
    }

    #[test]
    fn test_repository_link() {
        let matcher = SignatureMatcher::default();
        let text = "Code is available at https://github.com/acme/fast-net. See appendix.";
        assert_eq!(
            matcher.match_repository_link(text),
            Some("https://github.com/acme/fast-net")
        );
        assert_eq!(matcher.match_repository_link("no links here"), None);
        assert_eq!(
            matcher.match_repository_link("see http://github.com/a_b/c.d"),
            Some("http://github.com/a_b/c.d")
        );
    }

    #[test]
    fn test_repository_path() {
        let matcher = SignatureMatcher::default();
        assert_eq!(
            matcher.repository_path("https://github.com/acme/fast-net"),
            Some("acme/fast-net")
        );
        assert_eq!(
            matcher.repository_path("https://github.com/acme/fast-net.git"),
            Some("acme/fast-net")
        );
        assert_eq!(matcher.repository_path("https://gitlab.com/acme/x"), None);
    }

    #[test]
    fn test_injected_tables() {
        let matcher = SignatureMatcher::from_tables(
            &[(r"^venue\.sty$", "Venue")],
            &[(r"\\usepackage\{venue\}", "Venue")],
            r"https://code\.example/([\w-]+/[\w-]+)",
        )
        .unwrap();

        assert_eq!(matcher.match_venue_by_filename("venue.sty"), Some("Venue"));
        assert_eq!(matcher.match_venue_by_filename("cvpr.sty"), None);
        assert_eq!(
            matcher.match_repository_link("at https://code.example/a/b"),
            Some("https://code.example/a/b")
        );
    }

    #[test]
    fn test_invalid_rule_is_error() {
        assert!(SignatureRule::new("(unclosed", "X").is_err());
    }
}
