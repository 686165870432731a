//! The four fixed pipeline stages.
//!
//! Each stage composes the template store, renderer, and model invoker
//! around one input/output contract:
//!
//! - **architect**: free-text requirement -> technical specification (JSON)
//! - **data generator**: specification -> synthetic test dataset (JSON)
//! - **builder**: specification + dataset -> ready-to-call message list (JSON)
//! - **evaluator**: specification + input/output pair -> scored report (JSON)
//!
//! Stages are stateless with respect to each other and return the model's
//! raw text unchanged: none of them validates that the response is
//! well-formed JSON. Malformed model output lands in the artifact as-is,
//! where a human can inspect and fix it between stages.

pub mod architect;
pub mod builder;
pub mod data_generator;
pub mod evaluator;

pub use architect::ArchitectStage;
pub use builder::BuilderStage;
pub use data_generator::DataGeneratorStage;
pub use evaluator::EvaluatorStage;
