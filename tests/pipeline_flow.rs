//! End-to-end pipeline flow over a real template directory and workspace,
//! with a scripted in-process model provider.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use promptforge::llm::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, ModelInvoker, Usage,
};
use promptforge::pipeline::{
    FilePipeline, PipelineStatus, ANALYSIS_ARTIFACT, FINAL_PROMPT_ARTIFACT, REQUIREMENT_ARTIFACT,
    TEST_DATA_ARTIFACT,
};
use promptforge::stages::{ArchitectStage, BuilderStage, DataGeneratorStage};
use promptforge::template::TemplateStore;
use promptforge::workspace::Workspace;
use promptforge::LlmError;

/// Echoes the concatenated prompt back as the completion and records every
/// request it sees.
struct ScriptedProvider {
    response: Mutex<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    fn new(response: &str) -> Self {
        Self {
            response: Mutex::new(response.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn set_response(&self, response: &str) {
        *self.response.lock().unwrap() = response.to_string();
    }

    fn last_prompt(&self) -> String {
        let requests = self.requests.lock().unwrap();
        let last = requests.last().expect("at least one request recorded");
        last.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let content = self.response.lock().unwrap().clone();
        Ok(GenerationResponse {
            id: "scripted".to_string(),
            model: request.model,
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage {
                prompt_tokens: 0,
                completion_tokens: 0,
                total_tokens: 0,
            },
        })
    }
}

fn write_templates(dir: &Path) {
    let fixtures = [
        ("prompt_architect", "Specify: {{requirement}}"),
        (
            "data_generator",
            "Dataset of {{num}} from {{analysis}}, focus {{notion}}, outputs {{require_output}}",
        ),
        ("prompt_builder", "Assemble from {{analysis}} and {{test_data}}"),
    ];
    for (name, content) in fixtures {
        std::fs::write(
            dir.join(format!("{name}.yaml")),
            format!("messages:\n  - role: user\n    content: \"{content}\"\n"),
        )
        .expect("write template fixture");
    }
}

fn pipeline(provider: Arc<ScriptedProvider>, base: &Path, templates: &Path) -> FilePipeline {
    write_templates(templates);
    let store = TemplateStore::new(templates);
    let invoker = ModelInvoker::with_defaults(provider);
    FilePipeline::new(
        Workspace::new(base),
        ArchitectStage::new(invoker.clone(), store.clone()),
        DataGeneratorStage::new(invoker.clone(), store.clone()),
        BuilderStage::new(invoker, store),
    )
}

#[tokio::test]
async fn full_run_creates_every_artifact_in_order() {
    let base = TempDir::new().expect("tempdir");
    let templates = TempDir::new().expect("tempdir");
    let provider = Arc::new(ScriptedProvider::new("model output"));
    let pipeline = pipeline(provider.clone(), base.path(), templates.path());

    pipeline
        .workspace()
        .write_artifact(REQUIREMENT_ARTIFACT, "classify support tickets")
        .expect("seed requirement");

    let status = PipelineStatus::probe(pipeline.workspace());
    assert_eq!(status.next_missing(), Some(ANALYSIS_ARTIFACT));

    pipeline.run_architect().await.expect("architect");
    assert!(provider.last_prompt().contains("classify support tickets"));

    pipeline
        .run_data_generator(5, Some("edge cases"))
        .await
        .expect("data generator");
    let prompt = provider.last_prompt();
    assert!(prompt.contains("Dataset of 5"));
    assert!(prompt.contains("focus edge cases"));

    pipeline.run_builder().await.expect("builder");

    let status = PipelineStatus::probe(pipeline.workspace());
    assert!(status.is_complete());
    for artifact in [ANALYSIS_ARTIFACT, TEST_DATA_ARTIFACT, FINAL_PROMPT_ARTIFACT] {
        assert_eq!(
            pipeline.workspace().read_artifact(artifact).expect("read"),
            "model output"
        );
    }
}

#[tokio::test]
async fn stages_refuse_to_run_ahead_of_their_inputs() {
    let base = TempDir::new().expect("tempdir");
    let templates = TempDir::new().expect("tempdir");
    let provider = Arc::new(ScriptedProvider::new("unused"));
    let pipeline = pipeline(provider, base.path(), templates.path());

    let status = pipeline.run_data_generator(3, None).await.expect("adapter");
    assert!(status.starts_with("error:"));
    assert!(status.contains(ANALYSIS_ARTIFACT));
    assert!(!pipeline.workspace().exists(TEST_DATA_ARTIFACT));

    let status = pipeline.run_builder().await.expect("adapter");
    assert!(status.starts_with("error:"));
    assert!(!pipeline.workspace().exists(FINAL_PROMPT_ARTIFACT));
}

#[tokio::test]
async fn rerunning_a_stage_replaces_its_artifact() {
    let base = TempDir::new().expect("tempdir");
    let templates = TempDir::new().expect("tempdir");
    let provider = Arc::new(ScriptedProvider::new("first specification"));
    let pipeline = pipeline(provider.clone(), base.path(), templates.path());

    pipeline
        .workspace()
        .write_artifact(REQUIREMENT_ARTIFACT, "requirement")
        .expect("seed");

    pipeline.run_architect().await.expect("first run");
    provider.set_response("second specification");
    pipeline.run_architect().await.expect("second run");

    assert_eq!(
        pipeline
            .workspace()
            .read_artifact(ANALYSIS_ARTIFACT)
            .expect("read"),
        "second specification"
    );
}

#[tokio::test]
async fn hand_edited_artifacts_steer_downstream_stages() {
    let base = TempDir::new().expect("tempdir");
    let templates = TempDir::new().expect("tempdir");
    let provider = Arc::new(ScriptedProvider::new("built prompt"));
    let pipeline = pipeline(provider.clone(), base.path(), templates.path());

    // The operator inspects and rewrites the intermediate results by hand.
    pipeline
        .workspace()
        .write_artifact(ANALYSIS_ARTIFACT, "tightened specification")
        .expect("seed");
    pipeline
        .workspace()
        .write_artifact(TEST_DATA_ARTIFACT, "curated dataset")
        .expect("seed");

    pipeline.run_builder().await.expect("builder");

    let prompt = provider.last_prompt();
    assert!(prompt.contains("tightened specification"));
    assert!(prompt.contains("curated dataset"));
}
