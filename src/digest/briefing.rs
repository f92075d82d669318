//! Short daily briefing written by the model.

use crate::enrich::ChatClient;
use crate::models::Paper;

use super::trends::CategoryStats;

/// Papers named in the briefing prompt
pub const BRIEFING_PAPERS: usize = 5;

/// Trend categories named in the briefing prompt
pub const BRIEFING_TRENDS: usize = 3;

/// Sampling temperature for the briefing
pub const BRIEFING_TEMPERATURE: f32 = 0.7;

/// Text used when no briefing could be written
pub const BRIEFING_UNAVAILABLE: &str =
    "Briefing unavailable: the language model could not be reached.";

/// Prompt naming the field-wide trends and the top of the ranking
pub fn briefing_prompt(papers: &[Paper], trends: &CategoryStats) -> String {
    let highlights = papers
        .iter()
        .take(BRIEFING_PAPERS)
        .map(|p| {
            let topic = p
                .enrichment
                .as_ref()
                .map(|e| e.topic.as_str())
                .filter(|t| !t.is_empty())
                .unwrap_or("Unknown");
            format!("- {} (Topic: {})", p.display_title(), topic)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let field = if trends.is_empty() {
        "not available today".to_string()
    } else {
        trends.summary(BRIEFING_TRENDS)
    };

    format!(
        "You are a research intelligence analyst.\n\n\
         Field-wide activity: today's busiest computer science areas on arXiv are {}.\n\n\
         Papers selected for this reader:\n{}\n\n\
         Write a short morning briefing in plain text.\n\
         1. Open with one sentence on which area is most active overall.\n\
         2. Then describe what is new in the reader's own areas.\n\
         3. Keep it concise and professional.",
        field, highlights
    )
}

/// Ask the model for a briefing; any failure yields [`BRIEFING_UNAVAILABLE`]
pub async fn write_briefing(
    chat: Option<&ChatClient>,
    papers: &[Paper],
    trends: &CategoryStats,
) -> String {
    let Some(chat) = chat else {
        tracing::debug!("No API key configured, using the fallback briefing");
        return BRIEFING_UNAVAILABLE.to_string();
    };

    match chat
        .complete_text(&briefing_prompt(papers, trends), BRIEFING_TEMPERATURE)
        .await
    {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Briefing generation failed");
            BRIEFING_UNAVAILABLE.to_string()
        }
    }
}
