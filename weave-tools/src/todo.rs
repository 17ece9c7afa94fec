//! Per-session todo list, held in memory for the lifetime of one
//! orchestrator run. Deviates intentionally from XDG-file persistence:
//! spec.md's task model is scoped to a single run, not durable across
//! process restarts, so the registry-facing tool keeps its state in an
//! `RwLock<Vec<TodoItem>>` owned by the tool instance rather than on disk.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use weave_message::ToolCall;
use weave_tool_registry::{ParamSchema, ParamType, Tool, ToolError, ToolSchema};

pub const TOOL_TODO_WRITE: &str = "todo_write";
pub const TOOL_TODO_READ: &str = "todo_read";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TodoItem {
    pub content: String,
    pub status: TodoStatus,
}

/// Holds the ordered task list for one session. Enforces at most one
/// `in_progress` item at a time: a write that would create a second is
/// rejected rather than silently demoting the existing one.
pub struct TodoStore {
    items: RwLock<Vec<TodoItem>>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_items(value: &serde_json::Value) -> Result<Vec<TodoItem>, ToolError> {
    let array = value
        .as_array()
        .ok_or_else(|| ToolError::InvalidInput("'items' must be an array".to_string()))?;
    array
        .iter()
        .map(|v| serde_json::from_value(v.clone()).map_err(|e| ToolError::InvalidInput(format!("bad todo item: {}", e))))
        .collect()
}

fn check_single_in_progress(items: &[TodoItem]) -> Result<(), ToolError> {
    let in_progress_count = items.iter().filter(|i| i.status == TodoStatus::InProgress).count();
    if in_progress_count > 1 {
        return Err(ToolError::InvalidInput(format!(
            "at most one task may be in_progress, found {}",
            in_progress_count
        )));
    }
    Ok(())
}

pub struct TodoWriteTool {
    store: std::sync::Arc<TodoStore>,
}

impl TodoWriteTool {
    pub fn new(store: std::sync::Arc<TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for TodoWriteTool {
    fn name(&self) -> &str {
        TOOL_TODO_WRITE
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_TODO_WRITE, "Replace the session's task list.", "todo").with_parameters(vec![
            ParamSchema::required("items", ParamType::Array)
                .with_description("Ordered list of {content, status} items."),
        ])
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let items_arg = call
            .arguments
            .get("items")
            .ok_or_else(|| ToolError::InvalidInput("missing 'items'".to_string()))?;
        let items = parse_items(items_arg)?;
        check_single_in_progress(&items)?;

        let count = items.len();
        *self.store.items.write().await = items;

        Ok(weave_message::ToolResult {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            content: format!("{} tasks recorded", count),
            data: None,
            error: None,
            duration_ms: 0,
        })
    }
}

pub struct TodoReadTool {
    store: std::sync::Arc<TodoStore>,
}

impl TodoReadTool {
    pub fn new(store: std::sync::Arc<TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for TodoReadTool {
    fn name(&self) -> &str {
        TOOL_TODO_READ
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_TODO_READ, "Read the session's current task list.", "todo")
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let items = self.store.items.read().await.clone();
        let content = if items.is_empty() {
            "no tasks".to_string()
        } else {
            items
                .iter()
                .map(|i| format!("[{:?}] {}", i.status, i.content))
                .collect::<Vec<_>>()
                .join("\n")
        };
        Ok(weave_message::ToolResult {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            content,
            data: Some(json!({ "items": items })),
            error: None,
            duration_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn call(name: &str, args: serde_json::Value) -> ToolCall {
        ToolCall::new("c1", name, args)
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let store = Arc::new(TodoStore::new());
        let write = TodoWriteTool::new(store.clone());
        write
            .execute(&call(
                TOOL_TODO_WRITE,
                json!({"items": [{"content": "step one", "status": "pending"}]}),
            ))
            .await
            .unwrap();
        let read = TodoReadTool::new(store);
        let result = read.execute(&call(TOOL_TODO_READ, json!({}))).await.unwrap();
        assert!(result.content.contains("step one"));
    }

    #[tokio::test]
    async fn two_in_progress_items_rejected() {
        let store = Arc::new(TodoStore::new());
        let write = TodoWriteTool::new(store);
        let err = write
            .execute(&call(
                TOOL_TODO_WRITE,
                json!({"items": [
                    {"content": "a", "status": "in_progress"},
                    {"content": "b", "status": "in_progress"},
                ]}),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn empty_store_reads_as_no_tasks() {
        let store = Arc::new(TodoStore::new());
        let read = TodoReadTool::new(store);
        let result = read.execute(&call(TOOL_TODO_READ, json!({}))).await.unwrap();
        assert_eq!(result.content, "no tasks");
    }
}
