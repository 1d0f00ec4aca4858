//! # Concierge
//!
//! A conversational assistant that turns natural-language requests into web
//! search, page browsing, and Gmail tool calls, and synthesizes the results
//! back into natural language.
//!
//! ## Features
//!
//! - **Agent loop:** the model decides per turn whether to answer directly or
//!   call a tool; tool results are fed back until it produces a final answer
//! - **Gemini Integration:** OpenAI-compatible chat completions with function
//!   calling
//! - **Built-in tools:** `google_search`, `browse_website`, `read_email`,
//!   `send_email`
//! - **Two front-ends:** a terminal REPL and a single-endpoint web chat

pub mod agent;
pub mod config;
pub mod error;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
