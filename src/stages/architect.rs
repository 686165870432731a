//! Architect stage: turns a free-text requirement into a technical
//! specification document.

use crate::error::StageError;
use crate::llm::ModelInvoker;
use crate::template::{render, TemplateStore, Vars};

/// Template name resolved by this stage.
pub const ARCHITECT_TEMPLATE: &str = "prompt_architect";

/// Converts a user requirement into a JSON technical specification with
/// input/output schema, task, goal, and constraints.
///
/// The requirement is passed to the model verbatim; no validation of either
/// the input or the model's output happens here.
#[derive(Debug, Clone)]
pub struct ArchitectStage {
    invoker: ModelInvoker,
    templates: TemplateStore,
}

impl ArchitectStage {
    /// Create the stage over an invoker and template store.
    pub fn new(invoker: ModelInvoker, templates: TemplateStore) -> Self {
        Self { invoker, templates }
    }

    /// Generate a technical specification for the given requirement.
    pub async fn run(&self, requirement: &str) -> Result<String, StageError> {
        let template = self.templates.load(ARCHITECT_TEMPLATE)?;
        let messages = render(&template, &Vars::new().set("requirement", requirement));

        tracing::info!(template = ARCHITECT_TEMPLATE, "Running architect stage");
        Ok(self.invoker.invoke(&messages).await?)
    }
}
