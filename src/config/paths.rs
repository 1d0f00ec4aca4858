//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("CONCIERGE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    // Use XDG config directory or fallback
    dirs::config_dir()
        .map(|d| d.join("concierge"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("concierge"))
                .unwrap_or_else(|| PathBuf::from(".concierge"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    // Check for explicit override
    if let Ok(path) = std::env::var("CONCIERGE_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("concierge.json")
}

/// Get the state directory (token files, etc.)
pub fn state_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("CONCIERGE_STATE_DIR") {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .map(|d| d.join("concierge"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".local").join("share").join("concierge"))
                .unwrap_or_else(|| PathBuf::from(".concierge"))
        })
}

/// Default location of the Gmail token file
pub fn gmail_token_path() -> PathBuf {
    state_dir().join("gmail_token.json")
}

/// Ensure a directory exists
pub fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        // Just ensure these don't panic
        let _ = config_dir();
        let _ = config_path();
        let _ = state_dir();
        let _ = gmail_token_path();
    }
}
