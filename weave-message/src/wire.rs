//! Conversions between [`crate::Message`] and the two external shapes:
//! the LM wire shape (OpenAI-style `tool_calls[].function.arguments` as a
//! JSON string) and the session-storage shape (structured tool calls,
//! explicit timestamp, no reasoning slot).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Message, Role, ToolCall};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmWireToolCallFunction {
    pub name: String,
    /// JSON-serialized arguments, matching the OpenAI function-call wire shape.
    pub arguments: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmWireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: LlmWireToolCallFunction,
}

/// The shape sent to/received from the LM (spec.md §6 "LM wire").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmWireMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<LlmWireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// The shape appended to the session log (spec.md §3 "Message" lifecycle).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("malformed tool call arguments: {0}")]
    BadArguments(#[from] serde_json::Error),
}

fn parse_role(s: &str) -> Result<Role, ConversionError> {
    match s {
        "system" => Ok(Role::System),
        "user" => Ok(Role::User),
        "assistant" => Ok(Role::Assistant),
        "tool" => Ok(Role::Tool),
        other => Err(ConversionError::UnknownRole(other.to_string())),
    }
}

impl Message {
    /// Converts to the LM wire shape. Arguments are serialized to a JSON
    /// string per tool call; reasoning and metadata have no slot and are
    /// dropped.
    pub fn to_llm_wire(&self) -> Result<LlmWireMessage, ConversionError> {
        let tool_calls = match &self.tool_calls {
            Some(calls) if !calls.is_empty() => Some(
                calls
                    .iter()
                    .map(|c| {
                        Ok(LlmWireToolCall {
                            id: c.id.clone(),
                            kind: "function".to_string(),
                            function: LlmWireToolCallFunction {
                                name: c.name.clone(),
                                arguments: serde_json::to_string(&c.arguments)?,
                            },
                        })
                    })
                    .collect::<Result<Vec<_>, ConversionError>>()?,
            ),
            _ => None,
        };
        Ok(LlmWireMessage {
            role: self.role.as_str().to_string(),
            content: if self.content.is_empty() { None } else { Some(self.content.clone()) },
            tool_calls,
            tool_call_id: self.tool_call_id.clone(),
        })
    }

    /// Reconstructs a [`Message`] from the LM wire shape. `reasoning` is
    /// always `None` on the result (the wire shape carries no such field).
    pub fn from_llm_wire(wire: &LlmWireMessage) -> Result<Message, ConversionError> {
        let role = parse_role(&wire.role)?;
        let tool_calls = match &wire.tool_calls {
            Some(calls) => calls
                .iter()
                .map(|c| {
                    Ok(ToolCall {
                        id: c.id.clone(),
                        name: c.function.name.clone(),
                        arguments: serde_json::from_str(&c.function.arguments)?,
                    })
                })
                .collect::<Result<Vec<_>, ConversionError>>()?,
            None => vec![],
        };
        Ok(Message {
            role,
            content: wire.content.clone().unwrap_or_default(),
            tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
            tool_call_id: wire.tool_call_id.clone(),
            reasoning: None,
            created_at: Utc::now(),
            metadata: HashMap::new(),
        })
    }

    pub fn to_session_storage(&self) -> StoredMessage {
        StoredMessage {
            role: self.role,
            content: self.content.clone(),
            tool_calls: self.tool_calls.clone(),
            tool_call_id: self.tool_call_id.clone(),
            timestamp: self.created_at,
            metadata: self.metadata.clone(),
        }
    }

    pub fn from_session_storage(stored: &StoredMessage) -> Message {
        Message {
            role: stored.role,
            content: stored.content.clone(),
            tool_calls: stored.tool_calls.clone(),
            tool_call_id: stored.tool_call_id.clone(),
            reasoning: None,
            created_at: stored.timestamp,
            metadata: stored.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_wire_round_trip_modulo_reasoning() {
        let calls = vec![ToolCall::new("c1", "file_read", serde_json::json!({"path": "a.txt"}))];
        let m = Message::assistant("let me check", calls).with_reasoning("thinking...");
        let wire = m.to_llm_wire().unwrap();
        let back = Message::from_llm_wire(&wire).unwrap();
        assert_eq!(back.role, m.role);
        assert_eq!(back.content, m.content);
        assert_eq!(back.tool_calls, m.tool_calls);
        assert!(back.reasoning.is_none());
    }

    #[test]
    fn session_storage_round_trip_preserves_timestamp_and_metadata() {
        let m = Message::user("hi").with_metadata("k", serde_json::json!(1));
        let stored = m.to_session_storage();
        let back = Message::from_session_storage(&stored);
        assert_eq!(back.content, "hi");
        assert_eq!(back.created_at, m.created_at);
        assert_eq!(back.metadata.get("k"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn tool_call_arguments_json_round_trip() {
        let args = serde_json::json!({"a": 1, "b": [1,2,3], "c": "x", "d": true});
        let call = ToolCall::new("c1", "t", args.clone());
        let serialized = serde_json::to_string(&call.arguments).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, args);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let wire = LlmWireMessage {
            role: "bogus".to_string(),
            content: Some("x".to_string()),
            tool_calls: None,
            tool_call_id: None,
        };
        assert!(Message::from_llm_wire(&wire).is_err());
    }
}
