//! Data generator stage: produces a synthetic test dataset from a
//! technical specification.

use crate::error::StageError;
use crate::llm::ModelInvoker;
use crate::template::{render, TemplateStore, Vars};

/// Template name resolved by this stage.
pub const DATA_GENERATOR_TEMPLATE: &str = "data_generator";

/// Focus instruction used when the caller supplies none.
pub const DEFAULT_NOTION: &str = "Generate diverse test cases covering edge cases";

/// Generates a JSON dataset (a `dataset` key holding a list of test cases)
/// from the architect's specification.
///
/// The requested case count is forwarded to the model but never checked
/// against the actual length of the returned dataset.
#[derive(Debug, Clone)]
pub struct DataGeneratorStage {
    invoker: ModelInvoker,
    templates: TemplateStore,
}

impl DataGeneratorStage {
    /// Create the stage over an invoker and template store.
    pub fn new(invoker: ModelInvoker, templates: TemplateStore) -> Self {
        Self { invoker, templates }
    }

    /// Generate `num` test cases for the given specification.
    ///
    /// # Arguments
    ///
    /// * `analysis` - The architect's technical specification (JSON text)
    /// * `num` - Desired number of test cases
    /// * `notion` - Optional focus instruction (e.g. "test boundary
    ///   conditions"); defaults to [`DEFAULT_NOTION`]
    /// * `require_output` - Whether each case should carry an expected output
    pub async fn run(
        &self,
        analysis: &str,
        num: u32,
        notion: Option<&str>,
        require_output: bool,
    ) -> Result<String, StageError> {
        let template = self.templates.load(DATA_GENERATOR_TEMPLATE)?;
        let vars = Vars::new()
            .set("num", num)
            .set("analysis", analysis)
            .set("notion", notion.unwrap_or(DEFAULT_NOTION))
            .set("require_output", require_output);
        let messages = render(&template, &vars);

        tracing::info!(
            template = DATA_GENERATOR_TEMPLATE,
            num,
            "Running data generator stage"
        );
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
            dir.path().join("data_generator.yaml"),
            "messages:\n  - role: system\n    content: You generate test data.\n  - role: user\n    content: \"num={{num}} notion={{notion}} require_output={{require_output}} spec={{analysis}}\"\n",
        )
        .expect("write template fixture");
        TemplateStore::new(dir.path())
    }

    #[tokio::test]
    async fn test_run_renders_all_variables() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let stage = DataGeneratorStage::new(
            ModelInvoker::with_defaults(Arc::new(EchoLlmProvider)),
            store_with_template(&dir),
        );

        let output = stage
            .run("{\"task\":\"t\"}", 5, Some("boundary conditions"), true)
            .await
            .expect("stage should succeed");

        assert!(output.contains("num=5"));
        assert!(output.contains("notion=boundary conditions"));
        assert!(output.contains("require_output=true"));
        assert!(output.contains("spec={\"task\":\"t\"}"));
    }

    #[tokio::test]
    async fn test_run_uses_default_notion() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let stage = DataGeneratorStage::new(
            ModelInvoker::with_defaults(Arc::new(EchoLlmProvider)),
            store_with_template(&dir),
        );

        let output = stage
            .run("{}", 3, None, false)
            .await
            .expect("stage should succeed");

        assert!(output.contains(DEFAULT_NOTION));
        assert!(output.contains("require_output=false"));
    }
}
