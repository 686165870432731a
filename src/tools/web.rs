//! Web search and page reader tools.
//!
//! Auxiliary tools backed by two opaque HTTP services: a SearXNG search
//! endpoint and a Crawl4AI page-fetch endpoint. They are not part of the
//! core pipeline. Backend failures are reported as tool text so the calling
//! agent can react; only malformed arguments surface as `ToolError`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{Tool, ToolError, ToolResult};

/// Page content is clipped to this many characters before returning.
const MAX_PAGE_CHARS: usize = 5000;

/// Endpoints for the web tools.
///
/// Both URLs are explicit configuration; the defaults point at local
/// deployments of the respective services.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// SearXNG search endpoint (the `/search` URL).
    pub search_url: String,
    /// Crawl4AI page-fetch endpoint.
    pub reader_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            search_url: "http://localhost:8888/search".to_string(),
            reader_url: "http://localhost:11235/md".to_string(),
            timeout_secs: 30,
        }
    }
}

impl WebConfig {
    /// Set the search endpoint.
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    /// Set the page reader endpoint.
    pub fn with_reader_url(mut self, url: impl Into<String>) -> Self {
        self.reader_url = url.into();
        self
    }
}

fn build_client(config: &WebConfig) -> Result<Client, ToolError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| ToolError::ExecutionFailed(e.to_string()))
}

/// Format raw SearXNG results into model-readable text.
fn format_search_results(raw: &Value, max_results: usize) -> String {
    let results = raw
        .get("results")
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[]);

    let formatted: Vec<String> = results
        .iter()
        .take(max_results)
        .map(|res| {
            let title = res.get("title").and_then(|v| v.as_str()).unwrap_or("(no title)");
            let link = res.get("url").and_then(|v| v.as_str()).unwrap_or("(no link)");
            let snippet = res
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or("(no description)");
            format!("Title: {title}\nLink: {link}\nSnippet: {snippet}\n---")
        })
        .collect();

    if formatted.is_empty() {
        "No results found.".to_string()
    } else {
        formatted.join("\n")
    }
}

/// `web_search`: query a SearXNG instance and return trimmed results.
pub struct WebSearchTool {
    client: Client,
    config: WebConfig,
}

impl WebSearchTool {
    pub fn new(config: WebConfig) -> Result<Self, ToolError> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web via a SearXNG instance. Returns a list of results, \
         each with title, link, and snippet. Useful for current events, \
         technical documentation, and reference material."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search keywords"
                },
                "max_results": {
                    "type": "integer",
                    "description": "How many results to return (default 5)"
                },
                "categories": {
                    "type": "string",
                    "description": "Search category: general, it, science, news, images, videos"
                },
                "language": {
                    "type": "string",
                    "description": "Search language code (default en)"
                },
                "engine": {
                    "type": "string",
                    "description": "Specific engine to use, e.g. google or bing"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult, ToolError> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidParameters("missing required argument 'query'".to_string()))?;
        let max_results = args
            .get("max_results")
            .and_then(|v| v.as_u64())
            .unwrap_or(5) as usize;
        let categories = args
            .get("categories")
            .and_then(|v| v.as_str())
            .unwrap_or("general");
        let language = args.get("language").and_then(|v| v.as_str()).unwrap_or("en");

        let mut params = vec![
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("categories", categories.to_string()),
            ("language", language.to_string()),
        ];
        if let Some(engine) = args.get("engine").and_then(|v| v.as_str()) {
            params.push(("engine", engine.to_string()));
        }

        let response = match self
            .client
            .get(&self.config.search_url)
            .query(&params)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(e) => return Ok(ToolResult::failure(format!("search failed: {e}"))),
        };

        let raw: Value = match response.json().await {
            Ok(raw) => raw,
            Err(e) => return Ok(ToolResult::failure(format!("search failed: {e}"))),
        };

        Ok(ToolResult::success(format_search_results(&raw, max_results)))
    }
}

/// `web_reader`: fetch one page as markdown via Crawl4AI.
pub struct WebReaderTool {
    client: Client,
    config: WebConfig,
}

impl WebReaderTool {
    pub fn new(config: WebConfig) -> Result<Self, ToolError> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Tool for WebReaderTool {
    fn name(&self) -> &str {
        "web_reader"
    }

    fn description(&self) -> &str {
        "Read the full content of a specific web page as markdown. Handles \
         dynamically rendered pages. Long content is truncated."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Complete URL of the page to read"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult, ToolError> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidParameters("missing required argument 'url'".to_string()))?;

        let payload = serde_json::json!({"url": url, "f": "fit"});

        let response = match self
            .client
            .post(&self.config.reader_url)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(e) => return Ok(ToolResult::failure(format!("page fetch failed: {e}"))),
        };

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => return Ok(ToolResult::failure(format!("page fetch failed: {e}"))),
        };

        let success = data.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
        let markdown = data.get("markdown").and_then(|v| v.as_str()).unwrap_or("");

        if !success || markdown.is_empty() {
            let reason = data
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            return Ok(ToolResult::failure(format!("could not extract content: {reason}")));
        }

        let mut content = markdown.to_string();
        if content.chars().count() > MAX_PAGE_CHARS {
            content = content.chars().take(MAX_PAGE_CHARS).collect();
            content.push_str("\n\n(content truncated)");
        }

        Ok(ToolResult::success(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_search_results_trims_and_formats() {
        let raw = serde_json::json!({
            "results": [
                {"title": "First", "url": "https://a", "content": "one"},
                {"title": "Second", "url": "https://b", "content": "two"},
                {"title": "Third", "url": "https://c", "content": "three"}
            ]
        });

        let text = format_search_results(&raw, 2);

        assert!(text.contains("Title: First"));
        assert!(text.contains("Link: https://b"));
        assert!(!text.contains("Third"));
    }

    #[test]
    fn test_format_search_results_handles_missing_fields() {
        let raw = serde_json::json!({"results": [{}]});
        let text = format_search_results(&raw, 5);
        assert!(text.contains("(no title)"));
        assert!(text.contains("(no link)"));
    }

    #[test]
    fn test_format_search_results_empty() {
        assert_eq!(
            format_search_results(&serde_json::json!({}), 5),
            "No results found."
        );
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let tool = WebSearchTool::new(WebConfig::default()).expect("tool should build");
        let err = tool
            .execute(serde_json::json!({}))
            .await
            .expect_err("tool should reject");
        assert!(matches!(err, ToolError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn test_reader_requires_url() {
        let tool = WebReaderTool::new(WebConfig::default()).expect("tool should build");
        let err = tool
            .execute(serde_json::json!({}))
            .await
            .expect_err("tool should reject");
        assert!(matches!(err, ToolError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn test_search_backend_failure_is_tool_text() {
        // Port with no listener: the failure comes back as tool output.
        let config = WebConfig::default().with_search_url("http://localhost:65535/search");
        let tool = WebSearchTool::new(config).expect("tool should build");

        let result = tool
            .execute(serde_json::json!({"query": "anything"}))
            .await
            .expect("tool should not error");
        assert!(!result.success);
        assert!(result.error.expect("error text").contains("search failed"));
    }
}
