//! Configuration module - Modular configuration management
//!
//! Configuration is split into focused modules:
//! - types/mod.rs: Core configuration types (Config, AgentConfig, WebConfig)
//! - types/provider.rs: LLM provider configuration
//! - types/tools.rs: Tool configuration (search, browse, gmail)
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{AgentConfig, Config, WebConfig};

// Re-export provider types
pub use types::provider::GeminiConfig;

// Re-export tool types
pub use types::tools::{BrowseConfig, GmailConfig, SearchConfig};

// Re-export IO and utilities
pub use io::{apply_env_overrides, load_config, load_config_from_path, save_config};
pub use paths::{config_dir, config_path, state_dir};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
