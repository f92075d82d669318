//! Terminal rendering for digests and inspections.
//!
//! Cards, tables and plain text for an enriched batch, plus the spinner
//! shown while a run is in progress.

use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::digest::{CategoryStats, DigestReport};
use crate::inspect::SourceInspectionResult;
use crate::models::{LinkProvenance, Paper, QueryOrigin, RepositoryRecord};

/// Categories shown in the trend summary
pub const TREND_TOP_N: usize = 3;

const CARD_WIDTH: usize = 76;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Coarse relevance band of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn of(score: u8) -> Self {
        match score {
            8..=u8::MAX => ScoreBand::High,
            5..=7 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }

    fn table_color(self) -> Color {
        match self {
            ScoreBand::High => Color::Green,
            ScoreBand::Medium => Color::Yellow,
            ScoreBand::Low => Color::Red,
        }
    }
}

fn colored_score(score: u8) -> String {
    let text = format!("{}/10", score);
    match ScoreBand::of(score) {
        ScoreBand::High => text.green().bold().to_string(),
        ScoreBand::Medium => text.yellow().bold().to_string(),
        ScoreBand::Low => text.red().bold().to_string(),
    }
}

/// Badge text for a repository, e.g. `Code (found in source) ★ 120`
pub fn code_badge(repo: &RepositoryRecord) -> String {
    let place = match repo.provenance {
        LinkProvenance::Hidden => "found in source",
        LinkProvenance::Declared => "in abstract",
    };
    match repo.stars {
        Some(stars) => format!("Code ({}) ★ {}", place, stars),
        None => format!("Code ({}) {}", place, repo.status.description()),
    }
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= 3 {
        return "...".to_string();
    }

    let budget = max_width - 3;
    let mut width = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(1);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

fn first_authors(paper: &Paper, n: usize) -> String {
    let mut names = paper.authors.iter().take(n).cloned().collect::<Vec<_>>().join(", ");
    if paper.authors.len() > n {
        names.push_str(" et al.");
    }
    names
}

/// Trend summary line, empty when nothing was sampled
pub fn trend_line(trends: &CategoryStats) -> String {
    if trends.is_empty() {
        return String::new();
    }
    format!(
        "Field trends over {} new papers: {}",
        trends.sample_size(),
        trends.summary(TREND_TOP_N)
    )
}

/// Briefing text, if the report carries a non-blank one
pub fn briefing_text(report: &DigestReport) -> Option<&str> {
    report
        .briefing
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
}

/// One-line digest counts
pub fn summary_line(report: &DigestReport) -> String {
    format!(
        "{} papers ({} manual, {} derived), {} highly relevant, {} with code",
        report.papers.len(),
        report.count_by_origin(QueryOrigin::Manual),
        report.count_by_origin(QueryOrigin::Derived),
        report.high_score_count(),
        report.with_code_count()
    )
}

/// Print one paper as a card.
pub fn print_paper_card(paper: &Paper) {
    let rule = "─".repeat(CARD_WIDTH);
    println!("┌{}", rule.dimmed());

    let mut badges = vec![colored_score(paper.score())];
    badges.push(match paper.origin {
        QueryOrigin::Manual => paper.origin.label().blue().to_string(),
        QueryOrigin::Derived => paper.origin.label().magenta().to_string(),
    });
    if let Some(venue) = paper.venue() {
        badges.push(format!("🏛 {}", venue).cyan().bold().to_string());
    }
    if let Some(repo) = paper.repository() {
        let badge = code_badge(repo);
        badges.push(if repo.is_hidden() {
            badge.yellow().bold().to_string()
        } else {
            badge.green().to_string()
        });
    }
    println!("│ {}", badges.join("  "));

    println!("│ {}", truncate_with_ellipsis(paper.display_title(), CARD_WIDTH).bold());
    if paper.display_title() != paper.title {
        println!("│ {}", truncate_with_ellipsis(&paper.title, CARD_WIDTH).dimmed());
    }
    println!(
        "│ {}  {}",
        truncate_with_ellipsis(&first_authors(paper, 3), 50),
        paper.published_date.as_deref().unwrap_or("").dimmed()
    );

    if let Some(e) = &paper.enrichment {
        println!("│ {} {}", "TL;DR".bold(), e.synopsis);
        println!("│ {} {}", "Topic".bold(), e.topic);
        if !e.rationale.is_empty() {
            println!("│ {} {}", "Why".bold(), e.rationale.dimmed());
        }
        if let Some(repo) = &e.repository {
            println!("│ {}", repo.url.underline());
        }
    }
    println!("│ {}  [{}]", paper.url.blue(), paper.search_term.dimmed());
    println!("└{}", rule.dimmed());
}

/// Print the whole report as cards.
pub fn print_report_cards(report: &DigestReport) {
    print_section(&format!("arXiv digest for {}", report.generated_on));
    println!("{}", summary_line(report));
    let trends = trend_line(&report.trends);
    if !trends.is_empty() {
        println!("{}", trends.dimmed());
    }
    if !report.derived_queries.is_empty() {
        println!("{} {}", "Derived queries:".dimmed(), report.derived_queries.join("; "));
    }
    if let Some(briefing) = briefing_text(report) {
        println!();
        println!("{}", "Briefing".bold());
        println!("{}", briefing);
    }
    println!();

    for paper in &report.papers {
        print_paper_card(paper);
    }
}

/// Render the report as a table.
pub fn report_table(report: &DigestReport) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Score", "Title", "Origin", "Venue", "Code", "ID"]);

    for paper in &report.papers {
        let score = paper.score();
        table.add_row(vec![
            Cell::new(format!("{}/10", score))
                .fg(ScoreBand::of(score).table_color())
                .add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(paper.display_title(), 50)),
            Cell::new(paper.origin.label()),
            Cell::new(paper.venue().unwrap_or("-")),
            Cell::new(paper.repository().map(code_badge).unwrap_or_else(|| "-".to_string())),
            Cell::new(&paper.paper_id),
        ]);
    }
    table
}

/// Render the report as plain text, one block per paper.
pub fn report_plain(report: &DigestReport) -> String {
    let mut out = String::new();
    for paper in &report.papers {
        out.push_str(&format!(
            "[{}/10] {} ({})\n",
            paper.score(),
            paper.display_title(),
            paper.paper_id
        ));
        out.push_str(&format!("  Origin: {} ({})\n", paper.origin, paper.search_term));
        if let Some(venue) = paper.venue() {
            out.push_str(&format!("  Venue: {}\n", venue));
        }
        if let Some(repo) = paper.repository() {
            out.push_str(&format!("  {}: {}\n", code_badge(repo), repo.url));
        }
        out.push_str(&format!("  URL: {}\n\n", paper.url));
    }
    let trends = trend_line(&report.trends);
    if !trends.is_empty() {
        out.push_str(&trends);
        out.push('\n');
    }
    if let Some(briefing) = briefing_text(report) {
        out.push_str(&format!("Briefing:\n{}\n", briefing));
    }
    out
}

/// Render per-id inspection results as a table.
pub fn inspection_table(results: &[(String, SourceInspectionResult)]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["ID", "Venue", "Repository"]);
    for (id, result) in results {
        table.add_row(vec![
            Cell::new(id).add_attribute(Attribute::Bold),
            Cell::new(result.venue.as_deref().unwrap_or("-")),
            Cell::new(result.repository_url.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

/// Plain `id<TAB>venue<TAB>link` lines.
pub fn inspection_plain(results: &[(String, SourceInspectionResult)]) -> String {
    results
        .iter()
        .map(|(id, r)| {
            format!(
                "{}\t{}\t{}\n",
                id,
                r.venue.as_deref().unwrap_or("-"),
                r.repository_url.as_deref().unwrap_or("-")
            )
        })
        .collect()
}

/// Loading spinner shown on stderr.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing.
    pub fn hidden() -> Self {
        Self {
            pb: indicatif::ProgressBar::hidden(),
        }
    }

    /// Set the message.
    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb
            .finish_with_message(format!("{} {}", status_icon(Status::Success).green(), msg));
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb
            .finish_with_message(format!("{} {}", status_icon(Status::Error).red(), msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisStatus, Enrichment, PaperBuilder, RepositoryStatus};
    use chrono::NaiveDate;

    fn enriched(id: &str, score: u8, venue: Option<&str>, repo: Option<RepositoryRecord>) -> Paper {
        let mut paper = PaperBuilder::new(id, format!("Paper {}", id), format!("https://arxiv.org/abs/{}", id))
            .search_term("agents", QueryOrigin::Derived)
            .build();
        paper.enrichment = Some(Enrichment {
            title_translated: format!("Paper {}", id),
            summary_translated: String::new(),
            synopsis: "short".to_string(),
            score,
            rationale: String::new(),
            topic: "ML".to_string(),
            venue: venue.map(str::to_string),
            repository: repo,
            analysis: AnalysisStatus::Completed,
        });
        paper
    }

    fn report(papers: Vec<Paper>) -> DigestReport {
        DigestReport {
            papers,
            manual_queries: vec!["agents".to_string()],
            derived_queries: Vec::new(),
            trends: CategoryStats::from_codes(["cs.CV", "cs.CV", "cs.AI"]),
            briefing: Some("Vision leads today.".to_string()),
            generated_on: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        }
    }

    #[test]
    fn test_score_band() {
        assert_eq!(ScoreBand::of(10), ScoreBand::High);
        assert_eq!(ScoreBand::of(8), ScoreBand::High);
        assert_eq!(ScoreBand::of(5), ScoreBand::Medium);
        assert_eq!(ScoreBand::of(4), ScoreBand::Low);
        assert_eq!(ScoreBand::of(0), ScoreBand::Low);
    }

    #[test]
    fn test_code_badge() {
        let mut repo = RepositoryRecord::placeholder(
            "https://github.com/a/b",
            RepositoryStatus::Found,
            LinkProvenance::Hidden,
        );
        repo.stars = Some(120);
        assert_eq!(code_badge(&repo), "Code (found in source) ★ 120");

        let repo = RepositoryRecord::placeholder(
            "https://github.com/a/b",
            RepositoryStatus::NotFound,
            LinkProvenance::Declared,
        );
        assert_eq!(code_badge(&repo), "Code (in abstract) 404 not found");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello", 10), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("Hello", 3), "...");
        assert_eq!(truncate_with_ellipsis("机器学习论文", 7), "机器...");
    }

    #[test]
    fn test_trend_and_summary_lines() {
        let r = report(vec![enriched("1", 9, Some("CVPR"), None), enriched("2", 3, None, None)]);
        assert_eq!(
            trend_line(&r.trends),
            "Field trends over 3 new papers: Computer Vision (2), Artificial Intelligence (1)"
        );
        assert_eq!(
            summary_line(&r),
            "2 papers (0 manual, 2 derived), 1 highly relevant, 0 with code"
        );
        assert_eq!(trend_line(&CategoryStats::default()), "");
    }

    #[test]
    fn test_report_plain() {
        let repo = RepositoryRecord::placeholder(
            "https://github.com/a/b",
            RepositoryStatus::Unavailable,
            LinkProvenance::Hidden,
        );
        let text = report_plain(&report(vec![enriched("1", 9, Some("ICLR"), Some(repo))]));
        assert!(text.starts_with("[9/10] Paper 1 (1)\n"));
        assert!(text.contains("  Origin: AI Derived (agents)\n"));
        assert!(text.contains("  Venue: ICLR\n"));
        assert!(text.contains("Code (found in source) Link found: https://github.com/a/b"));
        assert!(text.ends_with("Briefing:\nVision leads today.\n"));
    }

    #[test]
    fn test_blank_briefing_is_not_rendered() {
        let mut r = report(Vec::new());
        assert_eq!(briefing_text(&r), Some("Vision leads today."));

        r.briefing = Some("  \n".to_string());
        assert_eq!(briefing_text(&r), None);
        r.briefing = None;
        assert!(!report_plain(&r).contains("Briefing"));
    }

    #[test]
    fn test_inspection_plain() {
        let results = vec![
            (
                "2401.00001".to_string(),
                SourceInspectionResult {
                    venue: Some("IEEE".to_string()),
                    repository_url: None,
                },
            ),
            ("2401.00002".to_string(), SourceInspectionResult::empty()),
        ];
        assert_eq!(
            inspection_plain(&results),
            "2401.00001\tIEEE\t-\n2401.00002\t-\t-\n"
        );
        assert_eq!(inspection_table(&results).row_iter().count(), 2);
    }

    #[test]
    fn test_report_table_rows() {
        let table = report_table(&report(vec![enriched("1", 9, None, None)]));
        assert_eq!(table.row_iter().count(), 1);
    }
}
