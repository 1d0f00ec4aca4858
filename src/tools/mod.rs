//! Tools module - Modular tool system for agent capabilities
//!
//! Each tool is a self-contained module that implements the `Tool` trait.
//! Tools are registered into a `ToolRegistry` and made available to the
//! model for function calling.
//!
//! ## Built-in Tools
//!
//! - **google_search**: Web search via the Custom Search JSON API
//! - **browse_website**: Fetch a URL and extract readable text
//! - **read_email**: Read Gmail messages matching a query
//! - **send_email**: Send an email from the user's Gmail account
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `src/tools/` (e.g., `my_tool.rs`)
//! 2. Implement the `Tool` trait
//! 3. Add `mod my_tool;` and `pub use` in this file
//! 4. Register it in `build_registry` below

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;

mod browse_website;
mod gmail;
mod google_search;
mod registry;
mod traits;

// Core trait and types
pub use traits::{Tool, ToolCall, ToolResult};

// Registry
pub use registry::ToolRegistry;

// Built-in tools
pub use browse_website::BrowseWebsiteTool;
pub use gmail::{GmailAuth, ReadEmailTool, SendEmailTool};
pub use google_search::{GoogleSearchTool, SearchResult};

/// Build the standard registry with all four assistant tools.
pub fn build_registry(config: &Config) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    registry.register(GoogleSearchTool::new(config.search.clone())?);
    registry.register(BrowseWebsiteTool::new(config.browse.clone())?);

    let auth = Arc::new(GmailAuth::new(config.gmail.clone())?);
    registry.register(ReadEmailTool::new(config.gmail.clone(), auth.clone())?);
    registry.register(SendEmailTool::new(config.gmail.clone(), auth)?);

    Ok(registry)
}

/// URL encoding helper
pub(crate) mod urlencoding {
    pub fn encode(s: &str) -> String {
        url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
    }
}
