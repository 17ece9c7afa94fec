//! File tools: read, update (write full content), replace (single-match
//! string replace), list. Path resolution and the working-directory
//! escape check are shared via [`crate::path::resolve_path`].

use async_trait::async_trait;
use serde_json::json;

use weave_message::ToolCall;
use weave_tool_registry::{ParamSchema, ParamType, RiskClass, Tool, ToolError, ToolSchema};

use crate::context::ToolContext;
use crate::path::resolve_path;

pub const TOOL_FILE_READ: &str = "file_read";
pub const TOOL_FILE_UPDATE: &str = "file_update";
pub const TOOL_FILE_REPLACE: &str = "file_replace";
pub const TOOL_FILE_LIST: &str = "file_list";

const DEFAULT_READ_LIMIT: usize = 2000;

fn str_arg<'a>(args: &'a serde_json::Value, name: &str) -> Result<&'a str, ToolError> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidInput(format!("missing '{}'", name)))
}

fn ok_result(call: &ToolCall, content: String) -> weave_message::ToolResult {
    weave_message::ToolResult {
        call_id: call.id.clone(),
        tool_name: call.name.clone(),
        success: true,
        content,
        data: None,
        error: None,
        duration_ms: 0,
    }
}

/// Reads the text content of a file under the working directory.
pub struct ReadFileTool {
    ctx: ToolContext,
}

impl ReadFileTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        TOOL_FILE_READ
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_FILE_READ, "Read file content, with optional offset/limit.", "file")
            .with_parameters(vec![
                ParamSchema::required("path", ParamType::String).with_description("File path to read."),
                ParamSchema::optional("offset", ParamType::Number).with_description("0-based line to start at."),
                ParamSchema::optional("limit", ParamType::Number).with_description("Max lines to read."),
            ])
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let path_arg = str_arg(&call.arguments, "path")?;
        let path = resolve_path(&self.ctx.working_dir, path_arg, &self.ctx.path_config)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        if !path.exists() {
            return Err(ToolError::InvalidInput(format!("file not found: {}", path.display())));
        }
        if path.is_dir() {
            return Err(ToolError::InvalidInput(format!("is a directory, not a file: {}", path.display())));
        }
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("read failed: {}", e)))?;

        let offset = call.arguments.get("offset").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        let limit = call.arguments.get("limit").and_then(|v| v.as_u64()).unwrap_or(DEFAULT_READ_LIMIT as u64) as usize;

        let lines: Vec<&str> = content.split('\n').collect();
        let start = offset.min(lines.len());
        let end = (start + limit).min(lines.len());

        let mut out = String::new();
        for (i, line) in lines[start..end].iter().enumerate() {
            out.push_str(&format!("{}\t{}\n", start + i + 1, line));
        }
        Ok(ok_result(call, out))
    }
}

/// Writes (creates or overwrites) the full content of a file under the
/// working directory. High-risk: the orchestrator requires confirmation
/// for this tool outside sandbox mode (spec.md §4.6).
pub struct UpdateFileTool {
    ctx: ToolContext,
}

impl UpdateFileTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for UpdateFileTool {
    fn name(&self) -> &str {
        TOOL_FILE_UPDATE
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_FILE_UPDATE, "Create or overwrite a file with the given content.", "file")
            .with_parameters(vec![
                ParamSchema::required("path", ParamType::String),
                ParamSchema::required("content", ParamType::String),
            ])
            .with_risk(RiskClass::Medium)
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let path_arg = str_arg(&call.arguments, "path")?;
        let content = str_arg(&call.arguments, "content")?;
        let path = resolve_path(&self.ctx.working_dir, path_arg, &self.ctx.path_config)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::ExecutionFailed(format!("create parent dirs failed: {}", e)))?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("write failed: {}", e)))?;
        Ok(ok_result(call, format!("wrote {} bytes to {}", content.len(), path.display())))
    }
}

/// Replaces a single occurrence of `find` with `replace` in a file.
/// Fails if `find` is not found, or is found more than once (ambiguous).
pub struct ReplaceFileTool {
    ctx: ToolContext,
}

impl ReplaceFileTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for ReplaceFileTool {
    fn name(&self) -> &str {
        TOOL_FILE_REPLACE
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_FILE_REPLACE, "Replace one exact-match occurrence of text in a file.", "file")
            .with_parameters(vec![
                ParamSchema::required("path", ParamType::String),
                ParamSchema::required("find", ParamType::String),
                ParamSchema::required("replace", ParamType::String),
            ])
            .with_risk(RiskClass::Medium)
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let path_arg = str_arg(&call.arguments, "path")?;
        let find = str_arg(&call.arguments, "find")?;
        let replace = str_arg(&call.arguments, "replace")?;
        let path = resolve_path(&self.ctx.working_dir, path_arg, &self.ctx.path_config)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("read failed: {}", e)))?;

        let count = content.matches(find).count();
        if count == 0 {
            return Err(ToolError::InvalidInput("find text not found in file".to_string()));
        }
        if count > 1 {
            return Err(ToolError::InvalidInput(format!(
                "find text is ambiguous: {} occurrences found",
                count
            )));
        }
        let updated = content.replacen(find, replace, 1);
        tokio::fs::write(&path, &updated)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("write failed: {}", e)))?;
        Ok(ok_result(call, format!("replaced 1 occurrence in {}", path.display())))
    }
}

/// Lists directory entries (non-recursive) under the working directory.
pub struct ListFilesTool {
    ctx: ToolContext,
}

impl ListFilesTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        TOOL_FILE_LIST
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_FILE_LIST, "List directory entries.", "file")
            .with_parameters(vec![ParamSchema::required("path", ParamType::String)])
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let path_arg = str_arg(&call.arguments, "path")?;
        let path = resolve_path(&self.ctx.working_dir, path_arg, &self.ctx.path_config)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        if !path.is_dir() {
            return Err(ToolError::InvalidInput(format!("not a directory: {}", path.display())));
        }
        let mut entries = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("read_dir failed: {}", e)))?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("read_dir entry failed: {}", e)))?
        {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        let mut result = ok_result(call, names.join("\n"));
        result.data = Some(json!({ "entries": names }));
        Ok(result)
    }
}

/// Creates a directory (and any missing parents) under the working directory.
pub struct CreateDirTool {
    ctx: ToolContext,
}

impl CreateDirTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

pub const TOOL_DIRECTORY_CREATE: &str = "directory_create";

#[async_trait]
impl Tool for CreateDirTool {
    fn name(&self) -> &str {
        TOOL_DIRECTORY_CREATE
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_DIRECTORY_CREATE, "Create a directory, including parents.", "file")
            .with_parameters(vec![ParamSchema::required("path", ParamType::String)])
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let path_arg = str_arg(&call.arguments, "path")?;
        let path = resolve_path(&self.ctx.working_dir, path_arg, &self.ctx.path_config)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("create_dir_all failed: {}", e)))?;
        Ok(ok_result(call, format!("created {}", path.display())))
    }
}
