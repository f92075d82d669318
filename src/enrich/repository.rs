//! Code-repository metadata lookups.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::GithubConfig;
use crate::utils::{HttpClient, DEFAULT_USER_AGENT};

/// Errors from a repository lookup
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("repository not found")]
    NotFound,

    #[error("rate limited by the hosting platform")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),
}

/// Metadata of a hosted repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMetadata {
    pub stars: Option<u64>,
    pub last_push: Option<NaiveDate>,
}

/// Looks up metadata for an `owner/name` repository path
#[async_trait]
pub trait RepositoryLookup: Send + Sync {
    async fn lookup(&self, repo_path: &str) -> Result<RepoMetadata, LookupError>;
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    #[serde(default)]
    stargazers_count: Option<u64>,
    #[serde(default)]
    pushed_at: Option<String>,
}

/// GitHub REST API lookup
#[derive(Debug, Clone)]
pub struct GitHubLookup {
    client: HttpClient,
    api_base_url: String,
    token: Option<String>,
}

impl GitHubLookup {
    pub fn new(config: &GithubConfig) -> Result<Self, reqwest::Error> {
        let client = HttpClient::with_timeout(DEFAULT_USER_AGENT, Duration::from_secs(10))?;
        Ok(Self::with_client(client, &config.api_base_url, config.token.clone()))
    }

    pub fn with_client(client: HttpClient, api_base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

/// Date part of an RFC 3339 timestamp
fn parse_push_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.date_naive())
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

#[async_trait]
impl RepositoryLookup for GitHubLookup {
    async fn lookup(&self, repo_path: &str) -> Result<RepoMetadata, LookupError> {
        let url = format!("{}/repos/{}", self.api_base_url, repo_path);

        let mut request = self
            .client
            .client()
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(LookupError::NotFound),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                return Err(LookupError::RateLimited)
            }
            status => return Err(LookupError::Api(format!("GitHub returned {}", status))),
        }

        let body: RepoResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Api(format!("invalid repository JSON: {}", e)))?;

        Ok(RepoMetadata {
            stars: body.stargazers_count,
            last_push: body.pushed_at.as_deref().and_then(parse_push_date),
        })
    }
}
