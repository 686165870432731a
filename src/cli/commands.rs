//! CLI argument definitions and command dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;

use crate::display;
use crate::llm::{ChatClient, InvokerConfig, ModelInvoker};
use crate::pipeline::{FilePipeline, PipelineStatus, REQUIREMENT_ARTIFACT};
use crate::stages::{ArchitectStage, BuilderStage, DataGeneratorStage, EvaluatorStage};
use crate::template::TemplateStore;
use crate::tools::{
    DataGeneratorFileTool, NowTool, PromptArchitectFileTool, PromptBuilderFileTool,
    PromptEvaluatorTool, ToolRegistry, WebConfig, WebReaderTool, WebSearchTool,
};
use crate::workspace::Workspace;

/// Prompt engineering pipeline: requirement -> specification -> test data ->
/// final prompt, with every intermediate result on disk.
#[derive(Parser, Debug)]
#[command(name = "promptforge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base directory; artifacts live in its `workspace/` subdirectory
    #[arg(long, global = true, default_value = "./memories")]
    pub workspace: PathBuf,

    /// Directory holding the stage prompt templates
    #[arg(long, global = true, default_value = "./meta_prompts")]
    pub templates: PathBuf,

    /// Model identifier passed to the gateway
    #[arg(long, global = true, default_value = "deepseek/deepseek-chat")]
    pub model: String,

    /// OpenAI-compatible gateway base URL
    #[arg(long, global = true, env = "LITELLM_API_BASE", default_value = "http://localhost:4000")]
    pub api_base: String,

    /// Gateway API key, if the deployment requires one
    #[arg(long, global = true, env = "LITELLM_API_KEY")]
    pub api_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run all three stages end to end from a requirement
    Run {
        /// The requirement text
        requirement: Option<String>,

        /// Read the requirement from a file instead
        #[arg(long, conflicts_with = "requirement")]
        file: Option<PathBuf>,

        /// Number of test cases to generate
        #[arg(long, default_value_t = 3)]
        cases: u32,

        /// Focus instruction for the test data stage
        #[arg(long)]
        notion: Option<String>,

        /// Stream model output to stdout as it arrives
        #[arg(long)]
        stream: bool,
    },

    /// Run only the architect stage (requirement.txt -> analysis.json)
    Architect {
        /// Stream model output to stdout as it arrives
        #[arg(long)]
        stream: bool,
    },

    /// Run only the data generator stage (analysis.json -> test_data.json)
    Testdata {
        /// Number of test cases to generate
        #[arg(long, default_value_t = 3)]
        cases: u32,

        /// Focus instruction for the test data stage
        #[arg(long)]
        notion: Option<String>,

        /// Stream model output to stdout as it arrives
        #[arg(long)]
        stream: bool,
    },

    /// Run only the builder stage (analysis.json + test_data.json -> final_prompt.json)
    Build {
        /// Stream model output to stdout as it arrives
        #[arg(long)]
        stream: bool,
    },

    /// Score an execution result against the technical specification
    Evaluate {
        /// Input that was given to the agent under test
        #[arg(long)]
        input: String,

        /// Output the agent under test produced
        #[arg(long)]
        actual: String,

        /// Known-good answer, if available
        #[arg(long)]
        expected: Option<String>,

        /// Read the specification from this file instead of the workspace
        #[arg(long)]
        analysis_file: Option<PathBuf>,

        /// Stream model output to stdout as it arrives
        #[arg(long)]
        stream: bool,
    },

    /// Show which pipeline artifacts exist and when they changed
    Status,

    /// Print the agent-facing tool definitions as JSON
    Tools,
}

/// Parse CLI arguments. Split out so main can read `log_level` before
/// dispatching.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// One invoker plus the stdout printer draining its delta channel, if any.
struct InvokerHandle {
    invoker: ModelInvoker,
    printer: Option<JoinHandle<()>>,
}

impl InvokerHandle {
    fn build(cli: &Cli, stream: bool) -> anyhow::Result<Self> {
        let client = ChatClient::new(
            cli.api_base.clone(),
            cli.api_key.clone(),
            cli.model.clone(),
        )
        .context("Failed to construct LLM client")?;
        let config = InvokerConfig::new().with_model(cli.model.clone());
        let invoker = ModelInvoker::new(Arc::new(client), config);

        if stream {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            let printer = tokio::spawn(display::print_deltas(rx));
            Ok(Self {
                invoker: invoker.with_progress(tx),
                printer: Some(printer),
            })
        } else {
            Ok(Self {
                invoker,
                printer: None,
            })
        }
    }

    /// Drop the delta sender and wait for the printer to drain.
    async fn finish(self) -> anyhow::Result<()> {
        drop(self.invoker);
        if let Some(printer) = self.printer {
            printer.await.context("Streaming printer task failed")?;
        }
        Ok(())
    }
}

fn file_pipeline(cli: &Cli, invoker: ModelInvoker) -> FilePipeline {
    let store = TemplateStore::new(&cli.templates);
    FilePipeline::new(
        Workspace::new(&cli.workspace),
        ArchitectStage::new(invoker.clone(), store.clone()),
        DataGeneratorStage::new(invoker.clone(), store.clone()),
        BuilderStage::new(invoker, store),
    )
}

/// Execute the parsed command.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Run {
            requirement,
            file,
            cases,
            notion,
            stream,
        } => {
            let requirement = match (requirement, file) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read requirement from {}", path.display()))?,
                (None, None) => {
                    anyhow::bail!("Provide a requirement as an argument or via --file")
                }
            };

            let handle = InvokerHandle::build(&cli, *stream)?;
            let pipeline = file_pipeline(&cli, handle.invoker.clone());

            pipeline
                .workspace()
                .write_artifact(REQUIREMENT_ARTIFACT, &requirement)
                .context("Failed to write the requirement")?;

            println!("{}", pipeline.run_architect().await?);
            println!("{}", pipeline.run_data_generator(*cases, notion.as_deref()).await?);
            println!("{}", pipeline.run_builder().await?);

            drop(pipeline);
            handle.finish().await
        }

        Commands::Architect { stream } => {
            let handle = InvokerHandle::build(&cli, *stream)?;
            let pipeline = file_pipeline(&cli, handle.invoker.clone());

            println!("{}", pipeline.run_architect().await?);

            drop(pipeline);
            handle.finish().await
        }

        Commands::Testdata {
            cases,
            notion,
            stream,
        } => {
            let handle = InvokerHandle::build(&cli, *stream)?;
            let pipeline = file_pipeline(&cli, handle.invoker.clone());

            println!("{}", pipeline.run_data_generator(*cases, notion.as_deref()).await?);

            drop(pipeline);
            handle.finish().await
        }

        Commands::Build { stream } => {
            let handle = InvokerHandle::build(&cli, *stream)?;
            let pipeline = file_pipeline(&cli, handle.invoker.clone());

            println!("{}", pipeline.run_builder().await?);

            drop(pipeline);
            handle.finish().await
        }

        Commands::Evaluate {
            input,
            actual,
            expected,
            analysis_file,
            stream,
        } => {
            let analysis = match analysis_file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read analysis from {}", path.display()))?,
                None => Workspace::new(&cli.workspace)
                    .read_artifact(crate::pipeline::ANALYSIS_ARTIFACT)
                    .context("No analysis in the workspace; run the architect stage first or pass --analysis-file")?,
            };

            let handle = InvokerHandle::build(&cli, *stream)?;
            let evaluator = EvaluatorStage::new(
                handle.invoker.clone(),
                TemplateStore::new(&cli.templates),
            );

            let report = evaluator
                .run(&analysis, input, actual, expected.as_deref())
                .await?;
            println!("{report}");

            drop(evaluator);
            handle.finish().await
        }

        Commands::Status => {
            let workspace = Workspace::new(&cli.workspace);
            let status = PipelineStatus::probe(&workspace);

            println!("Workspace: {}", workspace.root().display());
            for artifact in &status.artifacts {
                let state = if artifact.present {
                    match artifact.modified {
                        Some(ts) => format!("present  (modified {})", ts.format("%Y-%m-%d %H:%M:%S UTC")),
                        None => "present".to_string(),
                    }
                } else {
                    "missing".to_string()
                };
                println!("  {:<18} {state}", artifact.name);
            }
            match status.next_missing() {
                Some(name) => println!("Next: produce {name}"),
                None => println!("Pipeline complete."),
            }
            Ok(())
        }

        Commands::Tools => {
            let handle = InvokerHandle::build(&cli, false)?;
            let pipeline = Arc::new(file_pipeline(&cli, handle.invoker.clone()));
            let evaluator = EvaluatorStage::new(
                handle.invoker.clone(),
                TemplateStore::new(&cli.templates),
            );

            let mut registry = ToolRegistry::new();
            registry.register(Arc::new(PromptArchitectFileTool::new(pipeline.clone())));
            registry.register(Arc::new(DataGeneratorFileTool::new(pipeline.clone())));
            registry.register(Arc::new(PromptBuilderFileTool::new(pipeline)));
            registry.register(Arc::new(PromptEvaluatorTool::new(evaluator)));
            registry.register(Arc::new(NowTool));
            let web = WebConfig::default();
            registry.register(Arc::new(WebSearchTool::new(web.clone())?));
            registry.register(Arc::new(WebReaderTool::new(web)?));

            let schema = registry.to_json_schema();
            println!(
                "{}",
                serde_json::to_string_pretty(&schema).context("Failed to serialize tool schema")?
            );
            Ok(())
        }
    }
}
