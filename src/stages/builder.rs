//! Builder stage: assembles the final ready-to-call prompt from the
//! specification and the test dataset.

use crate::error::StageError;
use crate::llm::ModelInvoker;
use crate::template::{render, TemplateStore, Vars};

/// Template name resolved by this stage.
pub const BUILDER_TEMPLATE: &str = "prompt_builder";

/// Produces a JSON array of messages ready to be sent to a model API,
/// derived from both upstream artifacts.
#[derive(Debug, Clone)]
pub struct BuilderStage {
    invoker: ModelInvoker,
    templates: TemplateStore,
}

impl BuilderStage {
    /// Create the stage over an invoker and template store.
    pub fn new(invoker: ModelInvoker, templates: TemplateStore) -> Self {
        Self { invoker, templates }
    }

    /// Build the final prompt from the specification and test data.
    pub async fn run(&self, analysis: &str, test_data: &str) -> Result<String, StageError> {
        let template = self.templates.load(BUILDER_TEMPLATE)?;
        let vars = Vars::new()
            .set("analysis", analysis)
            .set("test_data", test_data);
        let messages = render(&template, &vars);

        tracing::info!(template = BUILDER_TEMPLATE, "Running builder stage");
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
            dir.path().join("prompt_builder.yaml"),
            "messages:\n  - role: system\n    content: You assemble prompts.\n  - role: user\n    content: \"spec={{analysis}} data={{test_data}}\"\n",
        )
        .expect("write template fixture");
        TemplateStore::new(dir.path())
    }

    #[tokio::test]
    async fn test_run_depends_on_both_inputs() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let stage = BuilderStage::new(
            ModelInvoker::with_defaults(Arc::new(EchoLlmProvider)),
            store_with_template(&dir),
        );

        let first = stage
            .run("SPEC-A", "DATA-1")
            .await
            .expect("stage should succeed");
        let changed_spec = stage
            .run("SPEC-B", "DATA-1")
            .await
            .expect("stage should succeed");
        let changed_data = stage
            .run("SPEC-A", "DATA-2")
            .await
            .expect("stage should succeed");

        assert!(first.contains("spec=SPEC-A") && first.contains("data=DATA-1"));
        assert_ne!(first, changed_spec);
        assert_ne!(first, changed_data);
    }
}
