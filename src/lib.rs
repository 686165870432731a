//! promptforge: file-mediated prompt engineering pipeline.
//!
//! This library drives a chat model through a fixed four-stage workflow
//! (architect -> data generator -> builder, plus a standalone evaluator),
//! passing intermediate results through named artifact files in a disk-backed
//! workspace so every step can be inspected, edited, and re-run by hand.

// Core modules
pub mod cli;
pub mod display;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod stages;
pub mod template;
pub mod tools;
pub mod workspace;

// Re-export commonly used error types
pub use error::{LlmError, StageError, TemplateError, WorkspaceError};
