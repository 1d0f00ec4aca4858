//! Prompt templates
//!
//! The system prompt is rendered from a Handlebars template so the tool list
//! and current date are injected rather than hard-coded.

use crate::error::{Error, Result};
use chrono::Utc;
use handlebars::Handlebars;
use serde::Serialize;

/// A prompt template using Handlebars syntax
pub struct PromptTemplate {
    /// Template name
    name: String,
    /// Handlebars registry
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(name: impl Into<String>, template: &str) -> Result<Self> {
        let name = name.into();
        let mut registry = Handlebars::new();

        registry
            .register_template_string(&name, template)
            .map_err(|e| Error::Internal(format!("Invalid template: {}", e)))?;

        Ok(PromptTemplate { name, registry })
    }

    /// Render the template with given data
    pub fn render<T: Serialize>(&self, data: &T) -> Result<String> {
        self.registry
            .render(&self.name, data)
            .map_err(|e| Error::Internal(format!("Template render error: {}", e)))
    }
}

/// System prompt template for the assistant
const SYSTEM_PROMPT_TEMPLATE: &str = "\
You are a helpful AI assistant designed to integrate with external tools.
Your available tools are: {{tool_names}}.
Today's date is {{current_date}}.

Instructions:
1. Analyze the user's request carefully, paying attention to context from \
previous messages (e.g., if the user says \"it\", figure out what \"it\" refers to).
2. Determine if any of your available tools can fulfill the request. Break \
down multi-step requests into sequential tool calls if necessary.
3. If a tool is available for the task, you MUST attempt to use it. Do not \
claim you cannot perform the action if a relevant tool exists.
4. Think step-by-step before deciding which tool to use and what arguments \
to provide. Construct the arguments precisely according to the tool's requirements.
5. If multiple tools are needed (e.g., browse a website then send its \
content via email), plan and execute the steps sequentially. Use the output \
from one step as input for the next.
6. If no tool is suitable, or if a tool fails unexpectedly after you attempt \
to use it, explain the situation clearly.
7. If unsure about context or the required action, ask the user for clarification.
";

#[derive(Serialize)]
struct SystemPromptData {
    tool_names: String,
    current_date: String,
}

/// Render the system prompt for a given set of tool names
pub fn system_prompt(tool_names: &[&str]) -> Result<String> {
    let template = PromptTemplate::new("system", SYSTEM_PROMPT_TEMPLATE)?;
    template.render(&SystemPromptData {
        tool_names: tool_names.join(", "),
        current_date: Utc::now().format("%Y-%m-%d").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_tool_names_and_date() {
        let prompt = system_prompt(&["google_search", "browse_website"]).unwrap();
        assert!(prompt.contains("google_search, browse_website"));
        assert!(prompt.contains("Today's date is"));
        // No unexpanded placeholders left behind
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn invalid_template_is_an_error() {
        assert!(PromptTemplate::new("bad", "{{#if}}").is_err());
    }
}
