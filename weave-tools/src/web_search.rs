//! Web search tool: calls a configured external search API over HTTP.
//! Fails cleanly with an "unconfigured" error when no API key is present
//! rather than silently no-op'ing, so the orchestrator surfaces it to the
//! caller instead of treating a misconfiguration as zero results.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use weave_message::ToolCall;
use weave_tool_registry::{ParamSchema, ParamType, Tool, ToolError, ToolSchema};

pub const TOOL_WEB_SEARCH: &str = "web_search";

const DEFAULT_ENDPOINT: &str = "https://api.exa.ai/search";

#[derive(Deserialize)]
struct SearchResponseItem {
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResponseItem>,
}

pub struct WebSearchTool {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        TOOL_WEB_SEARCH
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_WEB_SEARCH, "Search the web for a query and return ranked results.", "web").with_parameters(vec![
            ParamSchema::required("query", ParamType::String),
            ParamSchema::optional("num_results", ParamType::Number).with_range(1.0, 20.0),
        ])
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::ExecutionFailed("web search is unconfigured: no API key set".to_string()))?;

        let query = call
            .arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'query'".to_string()))?;
        let num_results = call.arguments.get("num_results").and_then(|v| v.as_u64()).unwrap_or(5);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .json(&json!({ "query": query, "numResults": num_results, "contents": { "text": true } }))
            .send()
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ToolError::Transport(format!("search API returned {}", response.status())));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("bad search response: {}", e)))?;

        let content = if parsed.results.is_empty() {
            "no results".to_string()
        } else {
            parsed
                .results
                .iter()
                .map(|r| {
                    format!(
                        "{} ({})\n{}",
                        r.title.as_deref().unwrap_or("untitled"),
                        r.url.as_deref().unwrap_or(""),
                        r.text.as_deref().unwrap_or("").chars().take(500).collect::<String>()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        Ok(weave_message::ToolResult {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            content,
            data: Some(json!({ "result_count": parsed.results.len() })),
            error: None,
            duration_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(args: serde_json::Value) -> ToolCall {
        ToolCall::new("c1", TOOL_WEB_SEARCH, args)
    }

    #[tokio::test]
    async fn unconfigured_key_fails_explicitly() {
        let tool = WebSearchTool::new(None);
        let err = tool.execute(&call(json!({"query": "rust async"}))).await.unwrap_err();
        match err {
            ToolError::ExecutionFailed(msg) => assert!(msg.contains("unconfigured")),
            other => panic!("expected ExecutionFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_query_is_invalid_input() {
        let tool = WebSearchTool::new(Some("key".to_string()));
        let err = tool.execute(&call(json!({}))).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
