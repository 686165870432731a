//! Evaluator stage: scores an execution result against the specification.
//!
//! Unlike the first three stages this one is not file-mediated; callers
//! hand it the specification and the input/output pair directly.

use crate::error::StageError;
use crate::llm::ModelInvoker;
use crate::template::{render, TemplateStore, Vars};

/// Template name resolved by this stage.
pub const EVALUATOR_TEMPLATE: &str = "prompt_evaluator";

/// Placeholder value rendered when no expected output is supplied.
pub const NO_EXPECTED_OUTPUT: &str = "None provided";

/// Asks the model for a JSON evaluation report: reasoning, issues,
/// suggestions, and a numeric score.
///
/// The template's scoring contract asks for 0-100, but nothing in this
/// layer parses or enforces the range; the report is returned as raw text.
#[derive(Debug, Clone)]
pub struct EvaluatorStage {
    invoker: ModelInvoker,
    templates: TemplateStore,
}

impl EvaluatorStage {
    /// Create the stage over an invoker and template store.
    pub fn new(invoker: ModelInvoker, templates: TemplateStore) -> Self {
        Self { invoker, templates }
    }

    /// Evaluate an actual output against the specification.
    ///
    /// # Arguments
    ///
    /// * `analysis` - The technical specification (JSON text)
    /// * `input_data` - The input that was given to the agent under test
    /// * `actual_output` - What the agent produced
    /// * `expected_output` - The known-good answer, when one exists
    pub async fn run(
        &self,
        analysis: &str,
        input_data: &str,
        actual_output: &str,
        expected_output: Option<&str>,
    ) -> Result<String, StageError> {
        let template = self.templates.load(EVALUATOR_TEMPLATE)?;
        let vars = Vars::new()
            .set("analysis", analysis)
            .set("input_data", input_data)
            .set("actual_output", actual_output)
            .set("expected_output", expected_output.unwrap_or(NO_EXPECTED_OUTPUT));
        let messages = render(&template, &vars);

        tracing::info!(template = EVALUATOR_TEMPLATE, "Running evaluator stage");
        Ok(self.invoker.invoke(&messages).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm::testing::EchoLlmProvider;

    fn store_with_template(dir: &tempfile::TempDir) -> TemplateStore {
        std::fs::write(
            dir.path().join("prompt_evaluator.yaml"),
            "messages:\n  - role: system\n    content: You evaluate outputs.\n  - role: user\n    content: \"spec={{analysis}} in={{input_data}} out={{actual_output}} want={{expected_output}}\"\n",
        )
        .expect("write template fixture");
        TemplateStore::new(dir.path())
    }

    #[tokio::test]
    async fn test_run_renders_all_fields() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let stage = EvaluatorStage::new(
            ModelInvoker::with_defaults(Arc::new(EchoLlmProvider)),
            store_with_template(&dir),
        );

        let output = stage
            .run("{\"goal\":\"g\"}", "input text", "actual text", Some("expected text"))
            .await
            .expect("stage should succeed");

        assert!(output.contains("in=input text"));
        assert!(output.contains("out=actual text"));
        assert!(output.contains("want=expected text"));
    }

    #[tokio::test]
    async fn test_run_without_expected_output() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let stage = EvaluatorStage::new(
            ModelInvoker::with_defaults(Arc::new(EchoLlmProvider)),
            store_with_template(&dir),
        );

        let output = stage
            .run("{}", "in", "out", None)
            .await
            .expect("stage should succeed");

        assert!(output.contains(&format!("want={NO_EXPECTED_OUTPUT}")));
    }
}
