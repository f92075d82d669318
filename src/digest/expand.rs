//! Search queries derived from the reader's profile.

use serde_json::Value;

use crate::enrich::{strip_code_fence, ChatClient};
use crate::models::UserProfile;

/// Number of queries requested from the model
pub const DERIVED_QUERY_COUNT: usize = 3;

fn expansion_prompt(profile: &UserProfile) -> String {
    format!(
        "Reader profile\nInterests:\n{}\nRepresentative publications:\n{}\n\n\
         Suggest {} English arXiv search queries that would surface recent papers likely \
         to cite the reader's work or to be closely related in method. Do not just repeat \
         the interests; combine concepts (e.g. \"GNN AND Protein\").\n\n\
         Reply with a JSON object holding the queries as a list, e.g. \
         {{\"queries\": [\"query1\", \"query2\", \"query3\"]}}",
        profile.interests_text(),
        profile.publications_context(),
        DERIVED_QUERY_COUNT
    )
}

/// Extract the query list from a model reply
///
/// Accepts a bare JSON array or an object, in which case the first
/// array-valued field is used. Non-string items are skipped.
pub fn parse_query_list(reply: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(strip_code_fence(reply)).ok()?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(fields) => fields.into_iter().find_map(|(_, v)| match v {
            Value::Array(items) => Some(items),
            _ => None,
        })?,
        _ => return None,
    };

    Some(
        items
            .into_iter()
            .filter_map(|item| item.as_str().map(|s| s.trim().to_string()))
            .filter(|q| !q.is_empty())
            .collect(),
    )
}

/// Ask the model for queries related to the profile
///
/// Yields nothing for an empty profile or when anything goes wrong.
pub async fn derive_queries(chat: &ChatClient, profile: &UserProfile) -> Vec<String> {
    if profile.is_empty() {
        return Vec::new();
    }

    tracing::info!("Deriving search queries from the research profile");

    let reply = match chat.complete_json(None, &expansion_prompt(profile)).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(error = %e, "Query derivation failed");
            return Vec::new();
        }
    };

    match parse_query_list(&reply) {
        Some(queries) => {
            tracing::info!(queries = ?queries, "Derived search queries");
            queries
        }
        None => {
            tracing::warn!("Query derivation reply held no query list");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::chat_fixtures::chat_reply;
    use crate::utils::HttpClient;

    #[test]
    fn test_parse_query_list() {
        assert_eq!(
            parse_query_list(r#"{"queries": ["a", " b ", "", 3]}"#),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            parse_query_list(r#"["x", "y"]"#),
            Some(vec!["x".to_string(), "y".to_string()])
        );
        assert_eq!(
            parse_query_list(r#"{"note": "hi", "search_queries": ["q"]}"#),
            Some(vec!["q".to_string()])
        );
        assert_eq!(parse_query_list(r#"{"note": "no list"}"#), None);
        assert_eq!(parse_query_list("garbage"), None);
    }

    #[tokio::test]
    async fn test_empty_profile_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let chat = ChatClient::new(HttpClient::new().unwrap(), &server.url(), "k", "m");
        assert!(derive_queries(&chat, &UserProfile::default()).await.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_derive_queries_over_http() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(chat_reply(r#"{"queries": ["GNN AND protein", "mamba folding"]}"#))
            .create_async()
            .await;

        let chat = ChatClient::new(HttpClient::new().unwrap(), &server.url(), "k", "m");
        let profile = UserProfile {
            research_interests: vec!["proteins".to_string()],
            publications: Vec::new(),
        };
        assert_eq!(
            derive_queries(&chat, &profile).await,
            vec!["GNN AND protein", "mamba folding"]
        );
    }

    #[tokio::test]
    async fn test_derive_queries_failure_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .create_async()
            .await;

        let chat = ChatClient::new(HttpClient::new().unwrap(), &server.url(), "k", "m");
        let profile = UserProfile {
            research_interests: vec!["proteins".to_string()],
            publications: Vec::new(),
        };
        assert!(derive_queries(&chat, &profile).await.is_empty());
    }
}
