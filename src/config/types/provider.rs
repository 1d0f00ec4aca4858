//! Provider configuration types
//!
//! Configuration for the Gemini LLM provider, reached through its
//! OpenAI-compatible chat-completions endpoint.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

/// Gemini configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key
    #[serde(skip_serializing, default = "default_secret")]
    pub api_key: SecretString,
    /// Default model
    #[serde(default = "default_gemini_model")]
    pub default_model: String,
    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_gemini_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retries for retryable failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: default_secret(),
            default_model: default_gemini_model(),
            base_url: default_gemini_url(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_config_default() {
        let config = GeminiConfig::default();
        assert_eq!(config.default_model, "gemini-1.5-flash-latest");
        assert!(config.base_url.contains("generativelanguage"));
    }
}
