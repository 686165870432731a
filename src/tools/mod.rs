//! Tool definitions and registry for the agent-facing surface.
//!
//! An external agent framework drives the pipeline by calling these tools.
//! Each tool is a name, a description, a JSON parameter schema, and an async
//! function returning text. Side effects happen on the workspace, never on
//! the return channel: the pipeline tools return short status strings, not
//! artifact content.

pub mod clock;
pub mod stage_tools;
pub mod web;

pub use clock::NowTool;
pub use stage_tools::{
    DataGeneratorFileTool, PromptArchitectFileTool, PromptBuilderFileTool, PromptEvaluatorTool,
};
pub use web::{WebConfig, WebReaderTool, WebSearchTool};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Invalid parameters provided to the tool.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool execution was successful.
    pub success: bool,
    /// Output from the tool execution.
    pub output: String,
    /// Error message if execution failed.
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// Create a failed tool result.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Trait for tools callable by an external agent framework.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique name of the tool.
    fn name(&self) -> &str;

    /// Returns a description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: Value) -> Result<ToolResult, ToolError>;
}

/// Registry for managing available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool in the registry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool names.
    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Generate a JSON schema for all registered tools.
    ///
    /// Returns a JSON array of tool definitions suitable for LLM function
    /// calling.
    pub fn to_json_schema(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .values()
            .map(|tool| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.parameters_schema()
                    }
                })
            })
            .collect();

        Value::Array(tools)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyTool;

    #[async_trait]
    impl Tool for DummyTool {
        fn name(&self) -> &str {
            "dummy"
        }

        fn description(&self) -> &str {
            "A dummy tool"
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::success("done"))
        }
    }

    #[test]
    fn test_tool_result_constructors() {
        let ok = ToolResult::success("output text");
        assert!(ok.success);
        assert_eq!(ok.output, "output text");
        assert!(ok.error.is_none());

        let fail = ToolResult::failure("error message");
        assert!(!fail.success);
        assert!(fail.output.is_empty());
        assert_eq!(fail.error, Some("error message".to_string()));
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(DummyTool));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("dummy").is_some());
        assert!(registry.get("absent").is_none());
    }

    #[test]
    fn test_registry_to_json_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(DummyTool));

        let schema = registry.to_json_schema();
        let arr = schema.as_array().expect("schema should be an array");
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["type"], "function");
        assert_eq!(arr[0]["function"]["name"], "dummy");
        assert!(arr[0]["function"]["parameters"].is_object());
    }
}
