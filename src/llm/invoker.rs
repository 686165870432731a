//! Converts rendered template messages into a single live model call.
//!
//! The one deliberate asymmetry lives here: an assistant-tagged fragment in
//! a template is a historical exemplar embedded in configuration, not real
//! multi-turn history. Re-sending it as an assistant turn would make the
//! model treat the exemplar as its own prior dialogue, so it is folded into
//! a user message behind a distinguishing prefix instead.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use super::{GenerationRequest, LlmProvider, Message};
use crate::error::LlmError;
use crate::template::{RenderedMessage, Role};

/// Prefix marking a folded assistant exemplar in the outgoing user turn.
pub const EXEMPLAR_PREFIX: &str = "(Previous assistant response): ";

/// Sampling configuration for the invoker.
#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// Model to use for requests. Empty selects the provider's default.
    pub model: String,
    /// Sampling temperature, if overridden.
    pub temperature: Option<f64>,
    /// Maximum tokens for the response, if capped.
    pub max_tokens: Option<u32>,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl InvokerConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens for the response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Turns a rendered message sequence into one model call and returns the
/// textual completion.
///
/// No structured parsing or validation of the response happens here; if the
/// caller expects JSON, checking that is the caller's responsibility.
#[derive(Clone)]
pub struct ModelInvoker {
    client: Arc<dyn LlmProvider>,
    config: InvokerConfig,
    progress: Option<UnboundedSender<String>>,
}

impl std::fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInvoker")
            .field("config", &self.config)
            .field("streaming", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl ModelInvoker {
    /// Create a new invoker over the given provider.
    pub fn new(client: Arc<dyn LlmProvider>, config: InvokerConfig) -> Self {
        Self {
            client,
            config,
            progress: None,
        }
    }

    /// Create an invoker with default configuration.
    pub fn with_defaults(client: Arc<dyn LlmProvider>) -> Self {
        Self::new(client, InvokerConfig::default())
    }

    /// Attach a progress sink receiving text deltas during generation.
    ///
    /// Streaming is display-only: `invoke` still blocks until the full
    /// completion is available and returns it whole.
    pub fn with_progress(mut self, deltas: UnboundedSender<String>) -> Self {
        self.progress = Some(deltas);
        self
    }

    /// Map rendered template messages onto live API turns.
    fn to_request(&self, messages: &[RenderedMessage]) -> GenerationRequest {
        let api_messages = messages
            .iter()
            .map(|m| match m.role {
                Role::System => Message::system(m.content.clone()),
                Role::User => Message::user(m.content.clone()),
                // Templated exemplar, not live history: fold into a user turn.
                Role::Assistant => Message::user(format!("{EXEMPLAR_PREFIX}{}", m.content)),
            })
            .collect();

        let mut request = GenerationRequest::new(self.config.model.clone(), api_messages);
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }

    /// Invoke the model once and return the raw text completion.
    pub async fn invoke(&self, messages: &[RenderedMessage]) -> Result<String, LlmError> {
        let request = self.to_request(messages);

        tracing::debug!(
            messages = request.messages.len(),
            model = %request.model,
            "Invoking model"
        );

        let response = match &self.progress {
            Some(deltas) => {
                self.client
                    .generate_streamed(request, deltas.clone())
                    .await?
            }
            None => self.client.generate(request).await?,
        };

        response
            .first_content()
            .map(|s| s.to_string())
            .ok_or_else(|| LlmError::ParseError("No content in LLM response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockLlmProvider;

    fn rendered(role: Role, content: &str) -> RenderedMessage {
        RenderedMessage {
            role,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_invoke_returns_text() {
        let provider = Arc::new(MockLlmProvider::new("the completion"));
        let invoker = ModelInvoker::with_defaults(provider);

        let text = invoker
            .invoke(&[rendered(Role::User, "hello")])
            .await
            .expect("invoke should succeed");

        assert_eq!(text, "the completion");
    }

    #[tokio::test]
    async fn test_assistant_fragments_fold_into_user_turns() {
        let provider = Arc::new(MockLlmProvider::new("ok"));
        let invoker = ModelInvoker::with_defaults(provider.clone());

        invoker
            .invoke(&[
                rendered(Role::System, "rules"),
                rendered(Role::User, "example input"),
                rendered(Role::Assistant, "example output"),
                rendered(Role::User, "real input"),
            ])
            .await
            .expect("invoke should succeed");

        let request = provider
            .last_request
            .lock()
            .expect("lock not poisoned")
            .clone()
            .expect("request recorded");

        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        // The exemplar never reaches the wire as an assistant turn.
        assert_eq!(request.messages[2].role, "user");
        assert_eq!(
            request.messages[2].content,
            format!("{EXEMPLAR_PREFIX}example output")
        );
        assert_eq!(request.messages[3].role, "user");
        assert!(request.messages.iter().all(|m| m.role != "assistant"));
    }

    #[tokio::test]
    async fn test_config_flows_into_request() {
        let provider = Arc::new(MockLlmProvider::new("ok"));
        let config = InvokerConfig::new()
            .with_model("test-model")
            .with_temperature(0.2)
            .with_max_tokens(512);
        let invoker = ModelInvoker::new(provider.clone(), config);

        invoker
            .invoke(&[rendered(Role::User, "hi")])
            .await
            .expect("invoke should succeed");

        let request = provider
            .last_request
            .lock()
            .expect("lock not poisoned")
            .clone()
            .expect("request recorded");
        assert_eq!(request.model, "test-model");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(512));
    }

    #[tokio::test]
    async fn test_progress_sink_receives_deltas() {
        let provider = Arc::new(MockLlmProvider::new("streamed text"));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let invoker = ModelInvoker::with_defaults(provider).with_progress(tx);

        let text = invoker
            .invoke(&[rendered(Role::User, "hi")])
            .await
            .expect("invoke should succeed");

        assert_eq!(text, "streamed text");
        // Default trait streaming emits the whole completion once.
        assert_eq!(rx.try_recv().expect("delta"), "streamed text");
    }
}
