//! Canonical message and tool-call types, plus conversions to the two
//! external shapes the ReAct core exchanges with: the LM wire shape
//! (`role` + `content` + `tool_calls[]` with JSON-serialized argument
//! strings) and the session-storage shape (`role` + `content` + structured
//! tool calls + timestamp).
//!
//! Reasoning fields are preserved when the LM supplies them and are
//! dropped on conversion to shapes that have no slot for them (the LM
//! wire shape has no reasoning field on the outbound side).

mod list;
mod wire;

pub use list::MessageList;
pub use wire::{LlmWireMessage, LlmWireToolCall, LlmWireToolCallFunction, StoredMessage};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The four roles a message can carry, per the canonical data model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A structured tool invocation requested by the assistant.
///
/// Arguments are validated against the target tool's parameter schema
/// before dispatch (enforced by the orchestrator, not this type).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque id, unique within a session.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Result of one tool execution, owned by the orchestrator and consumed
/// by the core to produce the corresponding `tool` message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub tool_name: String,
    pub success: bool,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Construction/invariant errors for [`Message`].
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("tool calls may only be attached to assistant messages")]
    ToolCallsOnNonAssistant,
    #[error("a tool message must carry a non-empty correlation id")]
    MissingToolCallId,
}

/// Canonical message type the ReAct core appends to the session log.
///
/// Invariants: a `tool` role message always carries `tool_call_id` set to
/// the id of a tool call on the immediately preceding assistant message;
/// `tool_calls` is only ever `Some` on an `assistant` message. Messages
/// are immutable once constructed and appended — there is no mutator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Message {
    fn bare(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            reasoning: None,
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::bare(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::bare(Role::User, content)
    }

    /// Builds an assistant message, optionally carrying tool calls and a
    /// reasoning trace. `tool_calls` being empty is the "final answer"
    /// case (spec.md §4.9 step 5).
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut m = Self::bare(Role::Assistant, content);
        if !tool_calls.is_empty() {
            m.tool_calls = Some(tool_calls);
        }
        m
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Builds a `tool` role message carrying the correlation id of the
    /// tool call it observes. Fails if `call_id` is empty (invariant:
    /// tool messages must carry a correlation id).
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Result<Self, MessageError> {
        let call_id = call_id.into();
        if call_id.is_empty() {
            return Err(MessageError::MissingToolCallId);
        }
        let mut m = Self::bare(Role::Tool, content);
        m.tool_call_id = Some(call_id);
        Ok(m)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_message_requires_call_id() {
        assert!(Message::tool("", "observation").is_err());
        assert!(Message::tool("call-1", "observation").is_ok());
    }

    #[test]
    fn assistant_with_no_tool_calls_has_none_slot() {
        let m = Message::assistant("final", vec![]);
        assert!(m.tool_calls.is_none());
        assert!(!m.has_tool_calls());
    }

    #[test]
    fn assistant_with_tool_calls_round_trips_count() {
        let calls = vec![ToolCall::new("c1", "file_read", serde_json::json!({"path": "a"}))];
        let m = Message::assistant("", calls.clone());
        assert_eq!(m.tool_calls.as_ref().unwrap().len(), 1);
        assert!(m.has_tool_calls());
    }

    #[test]
    fn role_as_str_matches_serde_rename() {
        assert_eq!(Role::Tool.as_str(), "tool");
        let v = serde_json::to_value(Role::Tool).unwrap();
        assert_eq!(v, serde_json::json!("tool"));
    }
}
