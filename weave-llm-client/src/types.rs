//! Request/response/delta shapes for the LM client (spec.md §4.7).

use weave_message::{Message, ToolCall};

use crate::config::ModelType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolChoiceMode {
    Auto,
    None,
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            other => Err(format!("unknown tool_choice: {} (use auto, none, or required)", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub model_type: ModelType,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub tools: Vec<serde_json::Value>,
    pub tool_choice: ToolChoiceMode,
}

impl ChatRequest {
    pub fn new(model_type: ModelType, messages: Vec<Message>) -> Self {
        Self {
            model_type,
            messages,
            temperature: 0.7,
            max_tokens: 4096,
            tools: Vec::new(),
            tool_choice: ToolChoiceMode::Auto,
        }
    }

    pub fn with_tools(mut self, tools: Vec<serde_json::Value>) -> Self {
        self.tools = tools;
        self
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Clone, Debug, Default)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

/// One piece of a streamed response. Tool-call fragments are streamed
/// piecewise by index and must be reassembled by the caller.
#[derive(Clone, Debug, Default)]
pub struct ChatDelta {
    pub role: Option<String>,
    pub content: Option<String>,
    pub tool_call_deltas: Vec<ToolCallDelta>,
    pub finish_reason: Option<String>,
    pub reasoning: Option<String>,
    pub usage: Option<TokenUsage>,
}

#[derive(Clone, Debug)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments_delta: String,
}
