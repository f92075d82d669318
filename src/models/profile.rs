//! Reader's research profile.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Characters of each publication abstract included in prompts
const ABSTRACT_PREVIEW_CHARS: usize = 200;

/// A publication listed in the profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    #[serde(default)]
    pub title: String,

    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
}

/// Research interests and representative publications of the reader
///
/// Loaded from a JSON file of the form
/// `{"research_interests": [...], "publications": [{"title": ..., "abstract": ...}]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub research_interests: Vec<String>,

    #[serde(default)]
    pub publications: Vec<Publication>,
}

impl UserProfile {
    /// Load a profile, degrading to an empty one when the file is missing or invalid
    pub fn load_or_empty(path: &Path) -> Self {
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "Profile file not found, using basic search only");
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<Self>(&raw).map_err(|e| e.to_string()));

        match parsed {
            Ok(profile) => {
                tracing::info!(
                    path = %path.display(),
                    interests = profile.research_interests.len(),
                    publications = profile.publications.len(),
                    "Loaded research profile"
                );
                profile
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read profile");
                Self::default()
            }
        }
    }

    /// True when the profile has neither interests nor publications
    pub fn is_empty(&self) -> bool {
        self.research_interests.is_empty() && self.publications.is_empty()
    }

    /// Interests as a bullet list
    pub fn interests_text(&self) -> String {
        self.research_interests
            .iter()
            .map(|i| format!("- {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Publications with truncated abstracts, for prompt context
    pub fn publications_context(&self) -> String {
        if self.publications.is_empty() {
            return "No publications on record.".to_string();
        }

        self.publications
            .iter()
            .map(|p| {
                let preview: String = p.abstract_text.chars().take(ABSTRACT_PREVIEW_CHARS).collect();
                format!("- Title: {}\n  Abstract: {}...", p.title, preview)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
