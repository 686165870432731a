//! File-mediated wrappers around the first three pipeline stages.
//!
//! Each wrapper reads its fixed upstream artifact(s), runs the stage, and
//! writes the fixed downstream artifact. A missing upstream artifact is an
//! operator-facing condition, not a program error: the wrapper returns a
//! human-readable string, performs no write, and leaves the workspace
//! untouched so an earlier stage can be (re-)run first. The returned string
//! is always a short status for display, never the artifact content.

use crate::error::{StageError, WorkspaceError};
use crate::stages::{ArchitectStage, BuilderStage, DataGeneratorStage};
use crate::workspace::Workspace;

use super::{ANALYSIS_ARTIFACT, FINAL_PROMPT_ARTIFACT, REQUIREMENT_ARTIFACT, TEST_DATA_ARTIFACT};

/// The resumable, inspectable pipeline: three file-mediated stage wrappers
/// sharing one workspace.
#[derive(Debug)]
pub struct FilePipeline {
    workspace: Workspace,
    architect: ArchitectStage,
    data_generator: DataGeneratorStage,
    builder: BuilderStage,
}

impl FilePipeline {
    /// Assemble the pipeline from its stages and workspace.
    pub fn new(
        workspace: Workspace,
        architect: ArchitectStage,
        data_generator: DataGeneratorStage,
        builder: BuilderStage,
    ) -> Self {
        Self {
            workspace,
            architect,
            data_generator,
            builder,
        }
    }

    /// The workspace this pipeline reads and writes.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Read an upstream artifact, mapping absence to a displayable message.
    fn read_upstream(&self, name: &str, hint: &str) -> Result<Result<String, String>, StageError> {
        match self.workspace.read_artifact(name) {
            Ok(text) => Ok(Ok(text)),
            Err(WorkspaceError::Missing(_)) => {
                tracing::warn!(artifact = name, "Upstream artifact missing");
                Ok(Err(format!("error: '{name}' not found in workspace; {hint}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run the architect stage: `requirement.txt` -> `analysis.json`.
    pub async fn run_architect(&self) -> Result<String, StageError> {
        let requirement = match self.read_upstream(
            REQUIREMENT_ARTIFACT,
            "write the requirement first",
        )? {
            Ok(text) => text,
            Err(message) => return Ok(message),
        };

        let analysis = self.architect.run(&requirement).await?;
        self.workspace.write_artifact(ANALYSIS_ARTIFACT, &analysis)?;

        Ok(format!("technical specification written to {ANALYSIS_ARTIFACT}"))
    }

    /// Run the data generator stage: `analysis.json` -> `test_data.json`.
    ///
    /// `num` and `notion` are forwarded to the stage; expected outputs are
    /// always requested in the file-mediated flow.
    pub async fn run_data_generator(
        &self,
        num: u32,
        notion: Option<&str>,
    ) -> Result<String, StageError> {
        let analysis = match self.read_upstream(
            ANALYSIS_ARTIFACT,
            "run the architect stage first",
        )? {
            Ok(text) => text,
            Err(message) => return Ok(message),
        };

        let dataset = self
            .data_generator
            .run(&analysis, num, notion, true)
            .await?;
        self.workspace.write_artifact(TEST_DATA_ARTIFACT, &dataset)?;

        Ok(format!("test dataset ({num} cases) written to {TEST_DATA_ARTIFACT}"))
    }

    /// Run the builder stage: `analysis.json` + `test_data.json` ->
    /// `final_prompt.json`.
    pub async fn run_builder(&self) -> Result<String, StageError> {
        let analysis = match self.read_upstream(
            ANALYSIS_ARTIFACT,
            "run the architect stage first",
        )? {
            Ok(text) => text,
            Err(message) => return Ok(message),
        };
        let test_data = match self.read_upstream(
            TEST_DATA_ARTIFACT,
            "run the data generator stage first",
        )? {
            Ok(text) => text,
            Err(message) => return Ok(message),
        };

        let final_prompt = self.builder.run(&analysis, &test_data).await?;
        self.workspace
            .write_artifact(FINAL_PROMPT_ARTIFACT, &final_prompt)?;

        Ok(format!("final prompt written to {FINAL_PROMPT_ARTIFACT}"))
    }
}
