//! Chat-completions client for OpenAI-compatible APIs.
//!
//! The pipeline talks to its model through the [`LlmProvider`] trait; the
//! concrete [`ChatClient`] targets any LiteLLM-style `/chat/completions`
//! endpoint. No retry or backoff lives at this layer: a failed call surfaces
//! immediately to the caller.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::LlmError;

/// A message in a conversation with an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "system", "user", "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request for text generation from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier to use for generation. Empty selects the client's
    /// default model.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Sampling temperature (0.0 - 2.0). Higher values = more random.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Create a new generation request with default parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max tokens for this request.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from an LLM generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Unique identifier for this response.
    pub id: String,
    /// Model that generated this response.
    pub model: String,
    /// Generated choices/completions.
    pub choices: Vec<Choice>,
    /// Token usage statistics.
    pub usage: Usage,
}

impl GenerationResponse {
    /// Get the content of the first choice, if available.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// A single generated choice from the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice in the response.
    pub index: u32,
    /// Generated message.
    pub message: Message,
    /// Reason the generation stopped (e.g., "stop", "length").
    pub finish_reason: String,
}

/// Token usage statistics for a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,
    /// Number of tokens generated.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// Trait for LLM providers that can generate text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;

    /// Generate a response, emitting text deltas on `deltas` as they arrive.
    ///
    /// This is presentation-layer streaming over the same blocking call: the
    /// full response is still returned at the end. The default implementation
    /// performs a plain call and emits the complete text once.
    async fn generate_streamed(
        &self,
        request: GenerationRequest,
        deltas: UnboundedSender<String>,
    ) -> Result<GenerationResponse, LlmError> {
        let response = self.generate(request).await?;
        if let Some(content) = response.first_content() {
            let _ = deltas.send(content.to_string());
        }
        Ok(response)
    }
}

/// Client for OpenAI-compatible chat-completions APIs.
pub struct ChatClient {
    /// Base URL for the API.
    api_base: String,
    /// Optional API key for authentication.
    api_key: Option<String>,
    /// Default model to use for requests.
    default_model: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl ChatClient {
    /// Create a new client with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL for the API (e.g., "http://localhost:4000")
    /// * `api_key` - Optional API key for authentication
    /// * `default_model` - Default model to use when none is specified
    pub fn new(api_base: String, api_key: Option<String>, default_model: String) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        Ok(Self {
            api_base,
            api_key,
            default_model,
            http_client,
        })
    }

    /// Create a new client from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `LITELLM_API_BASE`: Base URL for the API (required)
    /// - `LITELLM_API_KEY`: API key for authentication (optional)
    /// - `LITELLM_DEFAULT_MODEL`: Default model (defaults to "deepseek/deepseek-chat")
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiBase` if `LITELLM_API_BASE` is not set.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_base = env::var("LITELLM_API_BASE").map_err(|_| LlmError::MissingApiBase)?;
        let api_key = env::var("LITELLM_API_KEY").ok();
        let default_model = env::var("LITELLM_DEFAULT_MODEL")
            .unwrap_or_else(|_| "deepseek/deepseek-chat".to_string());

        Self::new(api_base, api_key, default_model)
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Check if an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_request(&self, request: &GenerationRequest, stream: bool) -> ApiRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        ApiRequest {
            model,
            messages: request.messages.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: stream.then_some(true),
        }
    }

    async fn post(&self, api_request: &ApiRequest) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/chat/completions", self.api_base);

        let mut http_request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let http_response = http_request
            .json(api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if status.is_success() {
            return Ok(http_response);
        }

        let status_code = status.as_u16();
        let error_text = http_response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());

        // Try to parse as structured error
        if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
            if status_code == 429 {
                return Err(LlmError::RateLimited(error_response.error.message));
            }
            return Err(LlmError::ApiError {
                code: status_code,
                message: error_response.error.message,
            });
        }

        Err(LlmError::ApiError {
            code: status_code,
            message: error_text,
        })
    }
}

#[async_trait]
impl LlmProvider for ChatClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let api_request = self.build_request(&request, false);
        let http_response = self.post(&api_request).await?;

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        Ok(api_response.into())
    }

    async fn generate_streamed(
        &self,
        request: GenerationRequest,
        deltas: UnboundedSender<String>,
    ) -> Result<GenerationResponse, LlmError> {
        let api_request = self.build_request(&request, true);
        let model = api_request.model.clone();
        let http_response = self.post(&api_request).await?;

        let mut byte_stream = http_response.bytes_stream();
        let mut buffer = String::new();
        let mut assembled = StreamedResponse::new(model);

        while let Some(chunk) = byte_stream.next().await {
            let bytes = chunk.map_err(|e| LlmError::RequestFailed(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));
            assembled.apply_complete_lines(&mut buffer, &deltas)?;
        }
        // The stream may end without a trailing newline on the last line.
        assembled.apply_line(&buffer, &deltas)?;

        Ok(assembled.finish())
    }
}

/// Partial response assembled from stream events.
struct StreamedResponse {
    id: String,
    model: String,
    content: String,
    finish_reason: String,
    usage: Option<Usage>,
}

impl StreamedResponse {
    fn new(model: String) -> Self {
        Self {
            id: String::new(),
            model,
            content: String::new(),
            finish_reason: "stop".to_string(),
            usage: None,
        }
    }

    /// Drain every newline-terminated line from `buffer` and apply it.
    fn apply_complete_lines(
        &mut self,
        buffer: &mut String,
        deltas: &UnboundedSender<String>,
    ) -> Result<(), LlmError> {
        while let Some(pos) = buffer.find('\n') {
            let line: String = buffer.drain(..=pos).collect();
            self.apply_line(&line, deltas)?;
        }
        Ok(())
    }

    /// Parse one (possibly unterminated) SSE line and apply its chunk.
    fn apply_line(
        &mut self,
        line: &str,
        deltas: &UnboundedSender<String>,
    ) -> Result<(), LlmError> {
        if let Some(event) = parse_stream_line(line.trim())? {
            self.apply(event, deltas);
        }
        Ok(())
    }

    fn apply(&mut self, event: StreamChunk, deltas: &UnboundedSender<String>) {
        if self.id.is_empty() && !event.id.is_empty() {
            self.id = event.id;
        }
        if !event.model.is_empty() {
            self.model = event.model;
        }
        if let Some(usage) = event.usage {
            self.usage = Some(usage);
        }
        for choice in event.choices {
            if let Some(text) = choice.delta.content {
                self.content.push_str(&text);
                // A closed receiver only means nobody is watching the stream.
                let _ = deltas.send(text);
            }
            if let Some(reason) = choice.finish_reason {
                self.finish_reason = reason;
            }
        }
    }

    fn finish(self) -> GenerationResponse {
        GenerationResponse {
            id: self.id,
            model: self.model,
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(self.content),
                finish_reason: self.finish_reason,
            }],
            usage: self.usage.unwrap_or(Usage {
                prompt_tokens: 0,
                completion_tokens: 0,
                total_tokens: 0,
            }),
        }
    }
}

/// Parse one SSE line into a stream chunk.
///
/// Returns `None` for blank lines, non-data fields, and the `[DONE]`
/// terminator.
fn parse_stream_line(line: &str) -> Result<Option<StreamChunk>, LlmError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    serde_json::from_str(data)
        .map(Some)
        .map_err(|e| LlmError::ParseError(format!("Invalid stream chunk: {}", e)))
}

/// Internal request structure for the OpenAI-compatible API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Internal response structure from the OpenAI-compatible API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: String,
    model: String,
    choices: Vec<ApiChoice>,
    usage: Usage,
}

impl From<ApiResponse> for GenerationResponse {
    fn from(api: ApiResponse) -> Self {
        GenerationResponse {
            id: api.id,
            model: api.model,
            choices: api
                .choices
                .into_iter()
                .map(|choice| Choice {
                    index: choice.index,
                    message: choice.message,
                    finish_reason: choice.finish_reason,
                })
                .collect(),
            usage: api.usage,
        }
    }
}

/// Internal choice structure from the API response.
#[derive(Debug, Deserialize)]
struct ApiChoice {
    index: u32,
    message: Message,
    finish_reason: String,
}

/// One SSE chunk of a streamed completion.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

/// Error detail from the API.
#[derive(Debug, Deserialize)]
#[allow(dead_code)] // Fields kept for complete API error deserialization
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}
