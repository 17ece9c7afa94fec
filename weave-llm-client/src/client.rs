//! `LmClient`: non-streaming `chat` and SSE-streaming `chat_stream`,
//! mirroring an OpenAI-compatible `/chat/completions` endpoint
//! (spec.md §4.7, §6).

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc;

use weave_message::{Message, ToolCall};

use crate::config::{ModelConfig, ModelType};
use crate::sse::{SseEvent, SseLineSplitter};
use crate::types::{ChatDelta, ChatRequest, ChatResponse, ToolCallDelta, TokenUsage};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no endpoint configured for model type {0:?}")]
    NoEndpointConfigured(ModelType),
    #[error("request failed: status {status}")]
    RequestFailed { status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<OpenAiUsage> for TokenUsage {
    fn from(u: OpenAiUsage) -> Self {
        TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct OpenAiFunctionCall {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    id: Option<String>,
    function: OpenAiFunctionCall,
}

#[derive(Deserialize, Default)]
struct OpenAiMessageOrDelta {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OpenAiToolCall>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    #[serde(default)]
    message: Option<OpenAiMessageOrDelta>,
    #[serde(default)]
    delta: Option<OpenAiMessageOrDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiCompletion {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

fn tool_calls_from_wire(calls: Vec<OpenAiToolCall>) -> Vec<ToolCall> {
    calls
        .into_iter()
        .filter_map(|c| {
            let name = c.function.name?;
            let arguments: serde_json::Value = serde_json::from_str(&c.function.arguments).unwrap_or(json!({}));
            Some(ToolCall::new(c.id.unwrap_or_default(), name, arguments))
        })
        .collect()
}

#[async_trait]
pub trait LmClient: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Streaming variant. Default implementation calls `chat` and
    /// forwards the whole response as a single delta, mirroring the
    /// teacher's non-streaming-client fallback.
    async fn chat_stream(&self, request: &ChatRequest) -> Result<mpsc::Receiver<Result<ChatDelta, LlmError>>, LlmError> {
        let response = self.chat(request).await;
        let (tx, rx) = mpsc::channel(1);
        match response {
            Ok(response) => {
                let delta = ChatDelta {
                    role: Some("assistant".to_string()),
                    content: Some(response.content),
                    tool_call_deltas: response
                        .tool_calls
                        .into_iter()
                        .enumerate()
                        .map(|(i, c)| ToolCallDelta {
                            index: i,
                            id: Some(c.id),
                            name: Some(c.name),
                            arguments_delta: c.arguments.to_string(),
                        })
                        .collect(),
                    finish_reason: response.finish_reason,
                    reasoning: None,
                    usage: response.usage,
                };
                let _ = tx.send(Ok(delta)).await;
            }
            Err(e) => {
                let _ = tx.send(Err(e)).await;
            }
        }
        Ok(rx)
    }
}

fn wire_messages(messages: &[Message]) -> Result<Vec<serde_json::Value>, LlmError> {
    messages
        .iter()
        .map(|m| m.to_llm_wire().map_err(|e| LlmError::Malformed(e.to_string())))
        .map(|r| r.and_then(|w| serde_json::to_value(w).map_err(|e| LlmError::Malformed(e.to_string()))))
        .collect()
}

pub struct HttpLmClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl HttpLmClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn body(&self, request: &ChatRequest, model_name: &str, stream: bool) -> Result<serde_json::Value, LlmError> {
        let mut body = json!({
            "model": model_name,
            "messages": wire_messages(&request.messages)?,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": stream,
        });
        if !request.tools.is_empty() {
            body["tools"] = json!(request.tools);
        }
        Ok(body)
    }
}

#[async_trait]
impl LmClient for HttpLmClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let endpoint = self
            .config
            .resolve(request.model_type)
            .ok_or(LlmError::NoEndpointConfigured(request.model_type))?;

        let body = self.body(request, &endpoint.model_name, false)?;

        let response = self
            .http
            .post(format!("{}/chat/completions", endpoint.base_url))
            .bearer_auth(&endpoint.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::RequestFailed {
                status: response.status().as_u16(),
            });
        }

        let parsed: OpenAiCompletion = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Malformed("no choices in response".to_string()))?;
        let message = choice.message.unwrap_or_default();

        Ok(ChatResponse {
            content: message.content.unwrap_or_default(),
            tool_calls: tool_calls_from_wire(message.tool_calls),
            usage: parsed.usage.map(Into::into),
            finish_reason: choice.finish_reason,
        })
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<mpsc::Receiver<Result<ChatDelta, LlmError>>, LlmError> {
        let endpoint = self
            .config
            .resolve(request.model_type)
            .ok_or(LlmError::NoEndpointConfigured(request.model_type))?
            .clone();

        let body = self.body(request, &endpoint.model_name, true)?;
        let http = self.http.clone();

        let response = http
            .post(format!("{}/chat/completions", endpoint.base_url))
            .bearer_auth(&endpoint.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::RequestFailed {
                status: response.status().as_u16(),
            });
        }

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut splitter = SseLineSplitter::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::Transport(e.to_string()))).await;
                        return;
                    }
                };

                for event in splitter.push(&chunk) {
                    match event {
                        SseEvent::Done => return,
                        SseEvent::Data(payload) => {
                            let parsed: Result<OpenAiCompletion, _> = serde_json::from_str(&payload);
                            match parsed {
                                Ok(completion) => {
                                    let usage = completion.usage.map(Into::into);
                                    if let Some(choice) = completion.choices.into_iter().next() {
                                        let delta_body = choice.delta.unwrap_or_default();
                                        let delta = ChatDelta {
                                            role: delta_body.role,
                                            content: delta_body.content,
                                            tool_call_deltas: delta_body
                                                .tool_calls
                                                .into_iter()
                                                .map(|c| ToolCallDelta {
                                                    index: c.index,
                                                    id: c.id,
                                                    name: c.function.name,
                                                    arguments_delta: c.function.arguments,
                                                })
                                                .collect(),
                                            finish_reason: choice.finish_reason,
                                            reasoning: delta_body.reasoning_content,
                                            usage,
                                        };
                                        if tx.send(Ok(delta)).await.is_err() {
                                            return;
                                        }
                                    }
                                }
                                Err(e) => {
                                    let _ = tx.send(Err(LlmError::Malformed(e.to_string()))).await;
                                }
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelEndpoint;

    #[tokio::test]
    async fn chat_fails_cleanly_when_model_type_unconfigured() {
        let client = HttpLmClient::new(ModelConfig::new());
        let request = ChatRequest::new(ModelType::Basic, vec![Message::user("hi")]);
        let err = client.chat(&request).await.unwrap_err();
        assert!(matches!(err, LlmError::NoEndpointConfigured(_)));
    }

    #[test]
    fn tool_calls_from_wire_parses_json_arguments() {
        let calls = vec![OpenAiToolCall {
            index: 0,
            id: Some("call_1".to_string()),
            function: OpenAiFunctionCall {
                name: Some("file_read".to_string()),
                arguments: "{\"path\":\"a.txt\"}".to_string(),
            },
        }];
        let parsed = tool_calls_from_wire(calls);
        assert_eq!(parsed[0].name, "file_read");
        assert_eq!(parsed[0].arguments["path"], "a.txt");
    }

    #[test]
    fn model_config_resolve_used_by_body_builder() {
        let config = ModelConfig::new().with_default(ModelEndpoint::new("https://api.test", "key", "gpt-test"));
        let client = HttpLmClient::new(config);
        let request = ChatRequest::new(ModelType::Basic, vec![Message::user("hi")]);
        let body = client.body(&request, "gpt-test", false).unwrap();
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["stream"], false);
    }
}
