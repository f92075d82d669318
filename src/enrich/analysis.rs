//! Relevance analysis of a paper against the reader's interests.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use super::chat::ChatClient;
use crate::config::LlmConfig;
use crate::models::{Paper, UserProfile};

/// Highest relevance score
pub const MAX_SCORE: u8 = 10;

/// Errors from the analysis service
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis service not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Request(String),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Structured output of one analysis call
///
/// Every field is optional; missing fields fall back to the paper's own data
/// when the enrichment is assembled.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaperAnalysis {
    #[serde(default, alias = "title_cn")]
    pub title_translated: Option<String>,

    #[serde(default, alias = "summary_cn")]
    pub summary_translated: Option<String>,

    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<i64>,

    #[serde(default, alias = "tldr")]
    pub synopsis: Option<String>,

    #[serde(default)]
    pub topic: Option<String>,

    #[serde(default, alias = "reasoning")]
    pub rationale: Option<String>,
}

/// Accept integers, floats and numeric strings
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }))
}

impl PaperAnalysis {
    /// Parse a reply that must be a single JSON object
    pub fn from_json(text: &str) -> Result<Self, AnalysisError> {
        let value: Value = serde_json::from_str(strip_code_fence(text))
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        if !value.is_object() {
            return Err(AnalysisError::MalformedResponse(
                "reply is not a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value).map_err(|e| AnalysisError::MalformedResponse(e.to_string()))
    }

    /// Score clamped to `0..=MAX_SCORE`, 0 when absent
    pub fn clamped_score(&self) -> u8 {
        self.score.unwrap_or(0).clamp(0, i64::from(MAX_SCORE)) as u8
    }
}

/// Remove a surrounding Markdown code fence, if any
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let body = rest.strip_prefix("json").unwrap_or(rest);
            body.strip_suffix("```").unwrap_or(body).trim()
        }
        None => trimmed,
    }
}

/// Scores and summarizes a paper
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, paper: &Paper) -> Result<PaperAnalysis, AnalysisError>;
}

/// Stand-in used when no API key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredAnalysis;

#[async_trait]
impl AnalysisService for UnconfiguredAnalysis {
    async fn analyze(&self, _paper: &Paper) -> Result<PaperAnalysis, AnalysisError> {
        Err(AnalysisError::NotConfigured)
    }
}

/// Analysis through a chat-completion model
#[derive(Debug, Clone)]
pub struct ChatAnalysisService {
    chat: ChatClient,
    user_interest: String,
    target_language: String,
    profile: Arc<UserProfile>,
}

impl ChatAnalysisService {
    pub fn new(chat: ChatClient, config: &LlmConfig, profile: Arc<UserProfile>) -> Self {
        Self {
            chat,
            user_interest: config.user_interest.clone(),
            target_language: config.target_language.clone(),
            profile,
        }
    }

    /// Instructions sent as the system message
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::from("You are a professional research assistant.\n\n");

        if !self.profile.is_empty() {
            prompt.push_str(&format!(
                "Reader profile\nResearch interests:\n{}\nRepresentative publications:\n{}\n\n\
                 Compare the paper with the reader's publications. If it extends, reuses or \
                 answers open problems of that work, say so explicitly in the rationale, and \
                 score by fit with the profile.\n\n",
                self.profile.interests_text(),
                self.profile.publications_context()
            ));
        }

        prompt.push_str(&format!(
            "The reader's research interest is:\n---\n{interest}\n---\n\n\
             Read the paper title and abstract, then:\n\
             1. Translate the title and abstract into {language} in an academic register.\n\
             2. Score the paper's relevance to the reader from 0 to 10.\n\
             3. Write a one-sentence synopsis in {language} stating the core contribution.\n\
             4. Name the core topic as a short phrase.\n\
             5. Briefly explain the score.\n\n\
             Reply with a single JSON object with the fields:\n\
             - title_translated (string)\n\
             - summary_translated (string)\n\
             - score (integer)\n\
             - synopsis (string)\n\
             - topic (string)\n\
             - rationale (string)\n",
            interest = self.user_interest,
            language = self.target_language,
        ));

        prompt
    }

    /// The paper as sent in the user message
    pub fn user_prompt(paper: &Paper) -> String {
        format!("Title: {}\nAbstract: {}", paper.title, paper.r#abstract)
    }
}

#[async_trait]
impl AnalysisService for ChatAnalysisService {
    async fn analyze(&self, paper: &Paper) -> Result<PaperAnalysis, AnalysisError> {
        let reply = self
            .chat
            .complete_json(Some(&self.system_prompt()), &Self::user_prompt(paper))
            .await?;
        PaperAnalysis::from_json(&reply)
    }
}
