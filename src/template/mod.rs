//! Message templates for the prompt engineering stages.
//!
//! A template is a named YAML document containing an ordered sequence of
//! role-tagged message fragments whose contents may hold `{{variable}}`
//! placeholders. Templates are loaded fresh on every invocation so edits to
//! a template file take effect on the next call, with no cache to invalidate.

pub mod render;

pub use render::{render, RenderedMessage, Vars};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

/// Role of a message fragment within a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single role-tagged message fragment in a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    /// Role the fragment is tagged with.
    pub role: Role,
    /// Fragment text, possibly containing `{{variable}}` placeholders.
    pub content: String,
}

/// A named, ordered sequence of message fragments.
///
/// Identity is the template name (the file stem it was loaded from). A
/// loaded template is immutable.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// Template name.
    pub name: String,
    /// Ordered message fragments.
    pub messages: Vec<MessageTemplate>,
}

/// On-disk document shape for a template file.
#[derive(Debug, Deserialize)]
struct TemplateDoc {
    messages: Vec<MessageTemplate>,
}

/// Loads named templates from a configured directory.
///
/// Each template lives at `{dir}/{name}.yaml`. Loading resolves and parses
/// the document on every call; there is no caching.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    /// Create a store rooted at the given templates directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The templates directory this store resolves against.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load and parse the template with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] if no file exists for the name,
    /// [`TemplateError::ParseError`] if the document is malformed, and
    /// [`TemplateError::Empty`] if it declares no messages. All of these are
    /// hard failures for the caller.
    pub fn load(&self, name: &str) -> Result<PromptTemplate, TemplateError> {
        let path = self.dir.join(format!("{name}.yaml"));

        let raw = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TemplateError::NotFound(name.to_string())
            } else {
                TemplateError::Io(e)
            }
        })?;

        let doc: TemplateDoc =
            serde_yaml::from_str(&raw).map_err(|e| TemplateError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        if doc.messages.is_empty() {
            return Err(TemplateError::Empty(name.to_string()));
        }

        Ok(PromptTemplate {
            name: name.to_string(),
            messages: doc.messages,
        })
    }
}
