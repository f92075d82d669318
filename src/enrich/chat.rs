//! Minimal client for OpenAI-compatible chat-completion endpoints.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::AnalysisError;
use crate::config::LlmConfig;
use crate::utils::{HttpClient, DEFAULT_USER_AGENT};

/// Longest error body echoed back in an error message
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Chat-completion client for analysis (JSON mode) and free-text replies
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatClient {
    /// Build a client, or `None` when no API key is configured
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, reqwest::Error> {
        let api_key = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Ok(None),
        };

        let http = HttpClient::with_timeout(
            DEFAULT_USER_AGENT,
            Duration::from_secs(config.timeout_secs),
        )?;

        Ok(Some(
            Self::new(http, &config.base_url, api_key, &config.model)
                .temperature(config.temperature),
        ))
    }

    pub fn new(
        http: HttpClient,
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.3,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one exchange in JSON mode and return the raw text of the first choice
    pub async fn complete_json(&self, system: Option<&str>, user: &str) -> Result<String, AnalysisError> {
        let format = ResponseFormat {
            kind: "json_object",
        };
        self.complete(system, user, Some(format), self.temperature).await
    }

    /// Send a single user message and return the free-text reply
    pub async fn complete_text(&self, user: &str, temperature: f32) -> Result<String, AnalysisError> {
        self.complete(None, user, None, temperature).await
    }

    async fn complete(
        &self,
        system: Option<&str>,
        user: &str,
        response_format: Option<ResponseFormat>,
        temperature: f32,
    ) -> Result<String, AnalysisError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            response_format,
            temperature,
        };

        let response = self
            .http
            .client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.chars().take(MAX_ERROR_BODY).collect());
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AnalysisError::MalformedResponse("reply has no content".to_string()))
    }
}
