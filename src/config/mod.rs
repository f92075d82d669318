//! Configuration management.
//!
//! Every setting has a default, most of which can be set through the
//! environment. A TOML file, found via [`find_config_file`] or passed
//! explicitly, is layered under `ARXIV_SCOUT_*` environment overrides.
//!
//! # Configuration File Format
//!
//! ```toml
//! profile_path = "~/profile.json"
//!
//! [llm]
//! api_key = "sk-..."
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-3.5-turbo"
//! user_interest = "AI for Science"
//!
//! [search]
//! queries = "machine learning, llm agent"
//! max_results = 10
//! days = 3
//! broad_category = "cs"
//!
//! [inspection]
//! max_concurrent_downloads = 3
//! total_timeout_secs = 60
//!
//! [github]
//! token = "ghp_..."
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Name of the config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "arxiv-scout.toml";

/// Prefix of layered environment overrides
pub const ENV_PREFIX: &str = "ARXIV_SCOUT";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Optional JSON research profile
    #[serde(default = "default_profile_path")]
    pub profile_path: Option<PathBuf>,

    /// Chat-completion service used for analysis and query expansion
    #[serde(default)]
    pub llm: LlmConfig,

    /// Catalog search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Source-bundle inspection settings
    #[serde(default)]
    pub inspection: InspectionConfig,

    /// Repository metadata lookups
    #[serde(default)]
    pub github: GithubConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile_path: default_profile_path(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            inspection: InspectionConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; analysis is skipped when absent
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Free-text description of what the reader cares about
    #[serde(default = "default_user_interest")]
    pub user_interest: String,

    /// Language titles and abstracts are translated into
    #[serde(default = "default_target_language")]
    pub target_language: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            base_url: default_llm_base_url(),
            model: default_model(),
            user_interest: default_user_interest(),
            target_language: default_target_language(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    /// True when an API key is present
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn default_api_key() -> Option<String> {
    env_string("OPENAI_API_KEY")
}

fn default_llm_base_url() -> String {
    env_string("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".to_string())
}

fn default_model() -> String {
    env_string("OPENAI_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string())
}

fn default_user_interest() -> String {
    env_string("USER_INTEREST").unwrap_or_else(|| "AI for Science".to_string())
}

fn default_target_language() -> String {
    "Chinese".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_llm_timeout() -> u64 {
    60
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Manual queries, separated by `,` or `;`
    #[serde(default = "default_queries")]
    pub queries: String,

    /// Results per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Submission window in days; 0 disables the window
    #[serde(default = "default_days")]
    pub days: u32,

    /// Category prefix for trend statistics (e.g. `cs`)
    #[serde(default = "default_broad_category")]
    pub broad_category: String,

    /// Papers sampled for trend statistics
    #[serde(default = "default_stats_sample_size")]
    pub stats_sample_size: usize,

    /// Catalog API endpoint
    #[serde(default = "default_search_api_url")]
    pub api_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            queries: default_queries(),
            max_results: default_max_results(),
            days: default_days(),
            broad_category: default_broad_category(),
            stats_sample_size: default_stats_sample_size(),
            api_url: default_search_api_url(),
        }
    }
}

impl SearchConfig {
    /// Manual queries, trimmed, empty entries dropped
    pub fn query_list(&self) -> Vec<String> {
        split_queries(&self.queries)
    }
}

/// Split a `,`/`;` separated query list
pub fn split_queries(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_queries() -> String {
    env_string("ARXIV_QUERY").unwrap_or_else(|| "machine learning, llm agent".to_string())
}

fn default_max_results() -> usize {
    env_parse("MAX_RESULTS", 10)
}

fn default_days() -> u32 {
    env_parse("ARXIV_DAYS", 3)
}

fn default_broad_category() -> String {
    env_string("BROAD_CATEGORY").unwrap_or_else(|| "cs".to_string())
}

fn default_stats_sample_size() -> usize {
    300
}

fn default_search_api_url() -> String {
    "https://export.arxiv.org/api/query".to_string()
}

/// Source-bundle inspection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionConfig {
    /// Base URL; the paper id is appended as a path segment
    #[serde(default = "default_source_base_url")]
    pub source_base_url: String,

    /// User agent sent with bundle requests
    #[serde(default = "default_browser_user_agent")]
    pub user_agent: String,

    /// Simultaneous bundle fetches across the whole run
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Attempts per bundle, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Bytes of a non-archive body checked for LaTeX markup
    #[serde(default = "default_text_fallback_bytes")]
    pub text_fallback_bytes: usize,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            source_base_url: default_source_base_url(),
            user_agent: default_browser_user_agent(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
            total_timeout_secs: default_total_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_attempts: default_max_attempts(),
            text_fallback_bytes: default_text_fallback_bytes(),
        }
    }
}

impl InspectionConfig {
    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_source_base_url() -> String {
    "https://arxiv.org/src".to_string()
}

fn default_browser_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_max_concurrent_downloads() -> usize {
    3
}

fn default_total_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    2
}

fn default_text_fallback_bytes() -> usize {
    10_000
}

/// Repository metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_base_url: String,

    /// Optional token for a higher rate limit
    #[serde(default = "default_github_token")]
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_github_api_url(),
            token: default_github_token(),
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_token() -> Option<String> {
    env_string("GITHUB_TOKEN")
}

fn default_profile_path() -> Option<PathBuf> {
    env_string("USER_PROFILE_PATH").map(PathBuf::from)
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match env_string(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparseable environment value");
            default
        }),
        None => default,
    }
}

impl Config {
    /// Write the configuration as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// TOML rendering of the configuration
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |secret: &Option<String>| secret.as_ref().map(|_| "********".to_string());
        let mut copy = self.clone();
        copy.llm.api_key = mask(&self.llm.api_key);
        copy.github.token = mask(&self.github.token);
        copy
    }
}

/// Load configuration from a file, with `ARXIV_SCOUT_*` overrides
///
/// Nested keys use a double underscore, e.g. `ARXIV_SCOUT_SEARCH__DAYS=7`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Locate a config file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("arxiv-scout").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}
