//! Error types for promptforge operations.
//!
//! Defines error types for the major subsystems:
//! - Template loading and parsing
//! - LLM API interactions
//! - Workspace artifact I/O
//! - Pipeline stage execution

use thiserror::Error;

/// Errors that can occur during template operations.
///
/// Templates are deployment-time configuration, so a missing or malformed
/// template is a hard stop for the caller, not a retryable condition.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to parse template file '{path}': {message}")]
    ParseError { path: String, message: String },

    #[error("Template '{0}' contains no messages")]
    Empty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API base URL: LITELLM_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when reading or writing workspace artifacts.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Artifact '{0}' not found in workspace")]
    Missing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while running a pipeline stage.
///
/// A missing upstream artifact is deliberately *not* represented here: the
/// file-mediated adapter reports it as a human-readable status string so the
/// operator can seed the file and re-run. Only hard failures surface as
/// `StageError`.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}
