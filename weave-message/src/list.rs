//! Bulk helpers over a slice of messages: filter by role, extract
//! messages bearing tool calls, and bulk conversions to the wire shapes.

use crate::{ConversionError, LlmWireMessage, Message, Role, StoredMessage};

/// A thin wrapper over `&[Message]` adding the filtering/conversion
/// helpers spec.md §4.1 calls out ("a helper collection").
pub struct MessageList<'a>(pub &'a [Message]);

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [Message]) -> Self {
        Self(messages)
    }

    pub fn by_role(&self, role: Role) -> Vec<&Message> {
        self.0.iter().filter(|m| m.role == role).collect()
    }

    /// Assistant messages that requested at least one tool call.
    pub fn tool_call_messages(&self) -> Vec<&Message> {
        self.0.iter().filter(|m| m.has_tool_calls()).collect()
    }

    pub fn to_llm_wire(&self) -> Result<Vec<LlmWireMessage>, ConversionError> {
        self.0.iter().map(Message::to_llm_wire).collect()
    }

    pub fn to_session_storage(&self) -> Vec<StoredMessage> {
        self.0.iter().map(Message::to_session_storage).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolCall;

    #[test]
    fn by_role_filters_correctly() {
        let msgs = vec![Message::system("s"), Message::user("u"), Message::assistant("a", vec![])];
        let list = MessageList::new(&msgs);
        assert_eq!(list.by_role(Role::User).len(), 1);
        assert_eq!(list.by_role(Role::System).len(), 1);
    }

    #[test]
    fn tool_call_messages_only_returns_assistant_with_calls() {
        let with_calls = Message::assistant("", vec![ToolCall::new("c1", "t", serde_json::json!({}))]);
        let without = Message::assistant("final", vec![]);
        let msgs = vec![with_calls, without];
        let list = MessageList::new(&msgs);
        assert_eq!(list.tool_call_messages().len(), 1);
    }

    #[test]
    fn bulk_to_llm_wire_matches_len() {
        let msgs = vec![Message::system("s"), Message::user("u")];
        let list = MessageList::new(&msgs);
        assert_eq!(list.to_llm_wire().unwrap().len(), 2);
    }
}
