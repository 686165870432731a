//! LLM integration for promptforge.
//!
//! Provides the chat-completions client used by the pipeline stages and the
//! model invoker that maps rendered template messages onto live API turns.
//!
//! ```ignore
//! use promptforge::llm::{ChatClient, GenerationRequest, LlmProvider, Message};
//!
//! let client = ChatClient::from_env()?;
//! let request = GenerationRequest::new("", vec![Message::user("Hello!")]);
//! let response = client.generate(request).await?;
//! ```

pub mod client;
pub mod invoker;

pub use client::{
    ChatClient, Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage,
};
pub use invoker::{InvokerConfig, ModelInvoker, EXEMPLAR_PREFIX};
