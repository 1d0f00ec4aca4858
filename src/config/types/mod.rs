//! Configuration types module

pub mod provider;
pub mod tools;

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub provider: provider::GeminiConfig,

    /// Web search tool configuration
    #[serde(default)]
    pub search: tools::SearchConfig,

    /// Page-fetch tool configuration
    #[serde(default)]
    pub browse: tools::BrowseConfig,

    /// Gmail tool configuration
    #[serde(default)]
    pub gmail: tools::GmailConfig,

    /// Web chat front-end configuration
    #[serde(default)]
    pub web: WebConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            agent: AgentConfig::default(),
            provider: provider::GeminiConfig::default(),
            search: tools::SearchConfig::default(),
            browse: tools::BrowseConfig::default(),
            gmail: tools::GmailConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, config file, and environment overrides
    pub fn from_env() -> crate::error::Result<Self> {
        crate::config::load_config()
    }
}

/// Agent-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum LLM round-trips per user turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Maximum tool calls per user turn
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: u32,
    /// Character budget for conversation history sent to the model
    #[serde(default = "default_max_history_chars")]
    pub max_history_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            max_iterations: default_max_iterations(),
            max_tool_calls: default_max_tool_calls(),
            max_history_chars: default_max_history_chars(),
        }
    }
}

fn default_max_iterations() -> u32 {
    10
}

fn default_max_tool_calls() -> u32 {
    10
}

fn default_max_history_chars() -> usize {
    120_000
}

/// Web chat front-end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        WebConfig {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5001
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.web.port, 5001);
    }
}
