//! Current-time tool.

use async_trait::async_trait;
use chrono::Local;
use serde_json::Value;

use super::{Tool, ToolError, ToolResult};

/// `now`: report the current local date and time.
///
/// Models have no clock; agents ask for one when a task mentions "today"
/// or "this week".
pub struct NowTool;

impl NowTool {
    fn current() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[async_trait]
impl Tool for NowTool {
    fn name(&self) -> &str {
        "now"
    }

    fn description(&self) -> &str {
        "Get the current local date and time, formatted as YYYY-MM-DD HH:MM:SS."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::success(Self::current()))
    }
}
