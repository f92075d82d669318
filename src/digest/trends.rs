//! Field-wide category statistics.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{SearchQuery, SortBy, SortOrder};
use crate::sources::Source;

/// Readable names for common subject codes
pub const CATEGORY_NAMES: &[(&str, &str)] = &[
    ("cs.AI", "Artificial Intelligence"),
    ("cs.CL", "Computation & Language (NLP)"),
    ("cs.CV", "Computer Vision"),
    ("cs.LG", "Machine Learning"),
    ("cs.RO", "Robotics"),
    ("cs.SE", "Software Engineering"),
    ("cs.CR", "Cryptography & Security"),
    ("cs.DS", "Data Structures"),
    ("cs.NE", "Neural & Evol. Computing"),
    ("cs.MA", "Multiagent Systems"),
    ("cs.SI", "Social & Info Networks"),
    ("q-bio.BM", "Biomolecules"),
    ("q-bio.GN", "Genomics"),
    ("stat.ML", "Machine Learning (Stat)"),
];

/// Readable name of a subject code; unknown codes are returned as is
pub fn category_name(code: &str) -> &str {
    CATEGORY_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Paper counts per readable category name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    counts: HashMap<String, usize>,
    sample_size: usize,
}

impl CategoryStats {
    /// Count subject codes, merging codes that share a readable name
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stats = Self::default();
        for code in codes {
            *stats
                .counts
                .entry(category_name(code.as_ref()).to_string())
                .or_insert(0) += 1;
            stats.sample_size += 1;
        }
        stats
    }

    /// Papers counted
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count for a readable name
    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// The `n` largest categories, by count descending then name
    pub fn top(&self, n: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }

    /// One-line summary such as `Computer Vision (12), Robotics (4)`
    pub fn summary(&self, n: usize) -> String {
        self.top(n)
            .iter()
            .map(|(name, count)| format!("{} ({})", name, count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Sample the last day's submissions under `prefix` and count their categories
///
/// Any failure yields empty statistics.
pub async fn fetch_category_stats(
    source: &dyn Source,
    prefix: &str,
    sample_size: usize,
    today: NaiveDate,
) -> CategoryStats {
    let query = SearchQuery::new(format!("cat:{}.*", prefix))
        .max_results(sample_size)
        .sort_by(SortBy::SubmittedDate)
        .sort_order(SortOrder::Descending)
        .within_days(1, today);

    tracing::info!(prefix, sample_size, "Sampling field-wide submissions");

    match source.search(&query).await {
        Ok(response) => {
            let stats = CategoryStats::from_codes(
                response
                    .papers
                    .iter()
                    .filter_map(|p| p.primary_category.as_deref()),
            );
            tracing::info!(sample = stats.sample_size(), "Trend sample collected");
            stats
        }
        Err(e) => {
            tracing::warn!(error = %e, "Trend statistics unavailable");
            CategoryStats::default()
        }
    }
}
