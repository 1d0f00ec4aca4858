//! Tool registry - manages available tools for the agent

use std::collections::HashMap;

use crate::agent::types::ToolDefinition;
use crate::error::Result;

use super::traits::{Tool, ToolCall, ToolResult};

/// Registry of available tools
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ToolRegistry {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        // Stable ordering keeps prompts and request payloads reproducible
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Execute a tool call. An unknown tool name is a failure result the
    /// model can read, never a process error.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        match self.get(&call.name) {
            Some(tool) => tool.execute(call.arguments.clone()).await,
            None => Ok(ToolResult::failure(format!("Unknown tool: {}", call.name))),
        }
    }

    /// Get tool count
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// List tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::super::traits::ToolResult;
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes its input"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }
        async fn execute(&self, args: Value) -> crate::Result<ToolResult> {
            Ok(ToolResult::success(
                args.get("text").and_then(|v| v.as_str()).unwrap_or("").to_string(),
            ))
        }
    }

    #[test]
    fn test_tool_result() {
        let success = ToolResult::success("Done!");
        assert!(success.success);
        assert_eq!(success.content.as_deref(), Some("Done!"));

        let failure = ToolResult::failure("Oops!");
        assert!(!failure.success);
        assert_eq!(failure.error.as_deref(), Some("Oops!"));
    }

    #[tokio::test]
    async fn test_registry_roundtrip() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.names(), vec!["echo"]);

        let result = registry
            .execute(&ToolCall {
                id: "c1".into(),
                name: "echo".into(),
                arguments: serde_json::json!({"text": "hi"}),
            })
            .await
            .unwrap();
        assert_eq!(result.to_llm_string(), "hi");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_failure_result() {
        let registry = ToolRegistry::new();
        let result = registry
            .execute(&ToolCall {
                id: "c1".into(),
                name: "nope".into(),
                arguments: serde_json::json!({}),
            })
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.to_llm_string().contains("Unknown tool"));
    }
}
