//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;

use secrecy::SecretString;

use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file (concierge.json / concierge.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env for local development)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    // Apply environment variable overrides (highest precedence)
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        // Parse as JSON5 (more lenient than strict JSON)
        json5::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Save configuration to the default path as pretty JSON.
///
/// Secret fields are skipped during serialization, so saved files never
/// contain API keys.
pub fn save_config(config: &Config) -> Result<()> {
    let path = super::paths::config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}

/// Apply environment variable overrides to an existing config.
///
/// This loads a `.env` file if present and overlays any set environment
/// variables onto the config. Env vars have the highest precedence:
/// defaults < file < env.
pub fn apply_env_overrides(config: &mut Config) {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    // Provider overrides
    if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
        config.provider.api_key = SecretString::from(api_key);
    }
    if let Ok(model) = std::env::var("GEMINI_MODEL") {
        config.provider.default_model = model;
    }
    if let Ok(url) = std::env::var("GEMINI_BASE_URL") {
        config.provider.base_url = url;
    }

    // Search overrides
    if let Ok(api_key) = std::env::var("GOOGLE_API_KEY") {
        config.search.api_key = SecretString::from(api_key);
    }
    if let Ok(cse_id) = std::env::var("GOOGLE_CSE_ID") {
        config.search.engine_id = cse_id;
    }

    // Gmail overrides
    if let Ok(token_file) = std::env::var("GMAIL_TOKEN_FILE") {
        config.gmail.token_file = token_file.into();
    }

    // Web front-end overrides
    if let Ok(bind) = std::env::var("CONCIERGE_BIND") {
        config.web.bind = bind;
    }
    if let Ok(port) = std::env::var("CONCIERGE_PORT") {
        if let Ok(port) = port.parse() {
            config.web.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_json_config() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(
            file,
            r#"{{ "agent": {{ "max_iterations": 7 }}, "web": {{ "port": 8080 }} }}"#
        )
        .unwrap();

        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.agent.max_iterations, 7);
        assert_eq!(config.web.port, 8080);
        // Untouched sections fall back to defaults
        assert_eq!(config.search.result_count, 5);
    }

    #[test]
    fn test_load_toml_config() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        write!(file, "[provider]\ndefault_model = \"gemini-2.0-flash\"\n").unwrap();

        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.provider.default_model, "gemini-2.0-flash");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(file, "{{ not valid").unwrap();
        assert!(load_config_from_path(file.path()).is_err());
    }
}
