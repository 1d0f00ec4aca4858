//! Configuration validation
//!
//! Validates configuration and reports issues. Missing credentials for a
//! tool are warnings, not errors: the assistant degrades to the tools that
//! are configured.

use secrecy::ExposeSecret;

use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    // The model client is mandatory; everything else degrades gracefully.
    if config.provider.api_key.expose_secret().is_empty() {
        result = result.with_error(
            ValidationIssue::new("provider.api_key", "Gemini API key is not set.")
                .with_suggestion("Set GEMINI_API_KEY or provider.api_key in the config file."),
        );
    }

    if config.search.api_key.expose_secret().is_empty() || config.search.engine_id.is_empty() {
        result = result.with_warning(
            ValidationIssue::new(
                "search",
                "Google Custom Search is not configured; the google_search tool will be unavailable.",
            )
            .with_suggestion("Set GOOGLE_API_KEY and GOOGLE_CSE_ID."),
        );
    }

    if !config.gmail.token_file.exists() {
        result = result.with_warning(
            ValidationIssue::new(
                "gmail.token_file",
                format!(
                    "No Gmail token file at {}; read_email and send_email will be unavailable.",
                    config.gmail.token_file.display()
                ),
            )
            .with_suggestion(
                "Complete the Google OAuth consent flow out-of-band and save the token JSON there, \
                 or point GMAIL_TOKEN_FILE at an existing token.",
            ),
        );
    }

    if config.agent.max_iterations == 0 {
        result = result.with_error(ValidationIssue::new(
            "agent.max_iterations",
            "max_iterations must be at least 1.",
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn missing_provider_key_is_an_error() {
        let config = Config::default();
        let result = validate_config(&config);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|i| i.path == "provider.api_key"));
    }

    #[test]
    fn missing_tool_credentials_are_warnings() {
        let mut config = Config::default();
        config.provider.api_key = SecretString::from("key");
        let result = validate_config(&config);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|i| i.path == "search"));
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = Config::default();
        config.provider.api_key = SecretString::from("key");
        config.agent.max_iterations = 0;
        assert!(!validate_config(&config).valid);
    }
}
