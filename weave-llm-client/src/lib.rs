//! LM client: non-streaming `chat` and SSE-streaming `chat_stream`
//! against an OpenAI-compatible `/chat/completions` endpoint, with
//! per-model-type (basic/reasoning) configuration (spec.md §4.7).

pub mod client;
pub mod config;
pub mod sse;
pub mod types;

pub use client::{HttpLmClient, LlmError, LmClient};
pub use config::{ModelConfig, ModelEndpoint, ModelType};
pub use types::{ChatDelta, ChatRequest, ChatResponse, ToolCallDelta, ToolChoiceMode, TokenUsage};
