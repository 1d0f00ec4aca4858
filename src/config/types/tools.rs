//! Tool configuration types
//!
//! Configuration for the web search, page-fetch, and Gmail tools.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

/// Google Custom Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Google API key
    #[serde(skip_serializing, default = "default_secret")]
    pub api_key: SecretString,
    /// Custom Search Engine ID
    #[serde(default)]
    pub engine_id: String,
    /// Base URL of the Custom Search JSON API
    #[serde(default = "default_search_url")]
    pub base_url: String,
    /// Default number of results
    #[serde(default = "default_result_count")]
    pub result_count: u8,
    /// Request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            api_key: default_secret(),
            engine_id: String::new(),
            base_url: default_search_url(),
            result_count: default_result_count(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_url() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

fn default_result_count() -> u8 {
    5
}

fn default_search_timeout() -> u64 {
    30
}

/// Page-fetch tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    /// Request timeout in seconds
    #[serde(default = "default_browse_timeout")]
    pub timeout_secs: u64,
    /// Maximum characters of extracted text returned to the model
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        BrowseConfig {
            timeout_secs: default_browse_timeout(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

fn default_browse_timeout() -> u64 {
    15
}

fn default_max_content_chars() -> usize {
    4_000
}

/// Gmail tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    /// Path to the OAuth token file (access + refresh token JSON)
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    /// Base URL of the Gmail REST API
    #[serde(default = "default_gmail_url")]
    pub base_url: String,
    /// Base URL of the OAuth token endpoint
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,
    /// Maximum messages fetched per read
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Character budget for a single decoded email body
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
    /// Request timeout in seconds
    #[serde(default = "default_gmail_timeout")]
    pub timeout_secs: u64,
}

impl Default for GmailConfig {
    fn default() -> Self {
        GmailConfig {
            token_file: default_token_file(),
            base_url: default_gmail_url(),
            oauth_url: default_oauth_url(),
            max_messages: default_max_messages(),
            max_body_chars: default_max_body_chars(),
            timeout_secs: default_gmail_timeout(),
        }
    }
}

fn default_token_file() -> PathBuf {
    super::super::paths::gmail_token_path()
}

fn default_gmail_url() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}

fn default_oauth_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_max_messages() -> usize {
    3
}

fn default_max_body_chars() -> usize {
    1_500
}

fn default_gmail_timeout() -> u64 {
    30
}
