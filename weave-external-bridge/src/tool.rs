//! Wraps one discovered subprocess capability as a registry `Tool`, so
//! the orchestrator can dispatch to it exactly like a built-in.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use weave_message::{ToolCall, ToolResult};
use weave_tool_registry::{ParamSchema, ParamType, RiskClass, Tool, ToolError, ToolSchema};

use crate::server::{DiscoveredTool, ManagedServer};

pub struct BridgeTool {
    server: Arc<ManagedServer>,
    discovered: DiscoveredTool,
}

impl BridgeTool {
    pub fn new(server: Arc<ManagedServer>, discovered: DiscoveredTool) -> Self {
        Self { server, discovered }
    }

    /// Builds a best-effort parameter schema from the server's
    /// JSON-schema `inputSchema`; falls back to an untyped object
    /// parameter when the shape can't be interpreted.
    fn schema_from_input_schema(&self) -> Vec<ParamSchema> {
        let required: Vec<String> = self
            .discovered
            .input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        let properties = self
            .discovered
            .input_schema
            .get("properties")
            .and_then(Value::as_object);

        match properties {
            Some(props) => props
                .iter()
                .map(|(name, prop)| {
                    let param_type = match prop.get("type").and_then(Value::as_str) {
                        Some("number") | Some("integer") => ParamType::Number,
                        Some("boolean") => ParamType::Boolean,
                        Some("array") => ParamType::Array,
                        Some("object") => ParamType::Object,
                        _ => ParamType::String,
                    };
                    let mut schema = if required.contains(name) {
                        ParamSchema::required(name.clone(), param_type)
                    } else {
                        ParamSchema::optional(name.clone(), param_type)
                    };
                    if let Some(desc) = prop.get("description").and_then(Value::as_str) {
                        schema = schema.with_description(desc);
                    }
                    schema
                })
                .collect(),
            None => vec![ParamSchema::optional("arguments", ParamType::Object)],
        }
    }
}

#[async_trait]
impl Tool for BridgeTool {
    fn name(&self) -> &str {
        &self.discovered.name
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.discovered.name.clone(), self.discovered.description.clone(), "external")
            .with_parameters(self.schema_from_input_schema())
            .with_risk(RiskClass::Medium)
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let response = self
            .server
            .call_tool(&self.discovered.name, call.arguments.clone())
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        let content = response
            .get("content")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("text").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_else(|| response.to_string());

        let is_error = response.get("isError").and_then(Value::as_bool).unwrap_or(false);

        Ok(ToolResult {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: !is_error,
            content,
            data: Some(response),
            error: None,
            duration_ms: 0,
        })
    }
}
