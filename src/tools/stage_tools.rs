//! Pipeline stages exposed as agent-callable tools.
//!
//! The three file-mediated tools take zero or few arguments because their
//! real inputs and outputs live in the workspace; each returns only a short
//! status string. The evaluator tool is the exception: it is not
//! file-mediated and takes its material as arguments.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{Tool, ToolError, ToolResult};
use crate::pipeline::FilePipeline;
use crate::stages::EvaluatorStage;

/// Default number of test cases when the agent does not pass `num`.
pub const DEFAULT_CASE_COUNT: u32 = 3;

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing required argument '{key}'")))
}

/// `prompt_architect_file`: requirement.txt -> analysis.json.
pub struct PromptArchitectFileTool {
    pipeline: Arc<FilePipeline>,
}

impl PromptArchitectFileTool {
    pub fn new(pipeline: Arc<FilePipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Tool for PromptArchitectFileTool {
    fn name(&self) -> &str {
        "prompt_architect_file"
    }

    fn description(&self) -> &str {
        "Turn the user requirement into a technical specification. \
         Reads requirement.txt from the workspace and writes analysis.json. \
         Call this first, after the requirement has been written."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult, ToolError> {
        let status = self
            .pipeline
            .run_architect()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(ToolResult::success(status))
    }
}

/// `data_generator_file`: analysis.json -> test_data.json.
pub struct DataGeneratorFileTool {
    pipeline: Arc<FilePipeline>,
}

impl DataGeneratorFileTool {
    pub fn new(pipeline: Arc<FilePipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Tool for DataGeneratorFileTool {
    fn name(&self) -> &str {
        "data_generator_file"
    }

    fn description(&self) -> &str {
        "Generate a synthetic test dataset from the technical specification. \
         Reads analysis.json from the workspace and writes test_data.json. \
         Call this second, after prompt_architect_file."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "num": {
                    "type": "integer",
                    "description": "Number of test cases to generate (default 3)"
                },
                "notion": {
                    "type": "string",
                    "description": "Focus instruction, e.g. 'test boundary conditions'"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult, ToolError> {
        let num = match args.get("num") {
            None | Some(Value::Null) => DEFAULT_CASE_COUNT,
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    ToolError::InvalidParameters("'num' must be a non-negative integer".to_string())
                })?,
        };
        let notion = args.get("notion").and_then(|v| v.as_str());

        let status = self
            .pipeline
            .run_data_generator(num, notion)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(ToolResult::success(status))
    }
}

/// `prompt_builder_file`: analysis.json + test_data.json -> final_prompt.json.
pub struct PromptBuilderFileTool {
    pipeline: Arc<FilePipeline>,
}

impl PromptBuilderFileTool {
    pub fn new(pipeline: Arc<FilePipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Tool for PromptBuilderFileTool {
    fn name(&self) -> &str {
        "prompt_builder_file"
    }

    fn description(&self) -> &str {
        "Assemble the final ready-to-call prompt. Reads analysis.json and \
         test_data.json from the workspace and writes final_prompt.json. \
         Call this last."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult, ToolError> {
        let status = self
            .pipeline
            .run_builder()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(ToolResult::success(status))
    }
}

/// `prompt_evaluator`: score an execution result against the specification.
pub struct PromptEvaluatorTool {
    evaluator: EvaluatorStage,
}

impl PromptEvaluatorTool {
    pub fn new(evaluator: EvaluatorStage) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl Tool for PromptEvaluatorTool {
    fn name(&self) -> &str {
        "prompt_evaluator"
    }

    fn description(&self) -> &str {
        "Evaluate an agent's output against a technical specification. \
         Returns a JSON report with reasoning, issues, suggestions, and a \
         0-100 score."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "analysis": {
                    "type": "string",
                    "description": "The technical specification (JSON text)"
                },
                "input_data": {
                    "type": "string",
                    "description": "Input that was given to the agent"
                },
                "actual_output": {
                    "type": "string",
                    "description": "Output the agent produced"
                },
                "expected_output": {
                    "type": "string",
                    "description": "Known-good answer, if available"
                }
            },
            "required": ["analysis", "input_data", "actual_output"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult, ToolError> {
        let analysis = required_str(&args, "analysis")?;
        let input_data = required_str(&args, "input_data")?;
        let actual_output = required_str(&args, "actual_output")?;
        let expected_output = args.get("expected_output").and_then(|v| v.as_str());

        let report = self
            .evaluator
            .run(analysis, input_data, actual_output, expected_output)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(ToolResult::success(report))
    }
}
