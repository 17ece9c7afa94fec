//! Content and file search: `search_grep` walks the working directory
//! respecting `.gitignore` (via `ignore`) and runs a regex search per
//! file (via `grep-regex`/`grep-searcher`), `search_find` matches file
//! names by a glob-like substring/regex pattern (via `walkdir`). Both
//! are finite, lazily-bounded sequences of matches; an empty result set
//! is success, not an error.

use async_trait::async_trait;
use grep_regex::RegexMatcher;
use grep_searcher::sinks::UTF8;
use grep_searcher::Searcher;
use ignore::WalkBuilder;
use serde_json::json;

use weave_message::ToolCall;
use weave_tool_registry::{ParamSchema, ParamType, Tool, ToolError, ToolSchema};

use crate::context::ToolContext;
use crate::path::resolve_path;

pub const TOOL_SEARCH_GREP: &str = "search_grep";
pub const TOOL_SEARCH_FIND: &str = "search_find";

const DEFAULT_MAX_MATCHES: usize = 200;

pub struct SearchGrepTool {
    ctx: ToolContext,
}

impl SearchGrepTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for SearchGrepTool {
    fn name(&self) -> &str {
        TOOL_SEARCH_GREP
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_SEARCH_GREP, "Search file contents for a regex pattern.", "search").with_parameters(vec![
            ParamSchema::required("pattern", ParamType::String),
            ParamSchema::optional("path", ParamType::String).with_description("Subdirectory to search (default: working directory)."),
            ParamSchema::optional("max_matches", ParamType::Number),
        ])
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let pattern = call
            .arguments
            .get("pattern")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'pattern'".to_string()))?
            .to_string();
        let subpath = call.arguments.get("path").and_then(|v| v.as_str()).unwrap_or(".");
        let max_matches = call
            .arguments
            .get("max_matches")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_MAX_MATCHES as u64) as usize;

        let root = resolve_path(&self.ctx.working_dir, subpath, &self.ctx.path_config)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        let matcher = RegexMatcher::new(&pattern)
            .map_err(|e| ToolError::InvalidInput(format!("bad pattern: {}", e)))?;

        let mut matches: Vec<String> = Vec::new();
        let mut truncated = false;

        for entry in WalkBuilder::new(&root).hidden(false).build() {
            if matches.len() >= max_matches {
                truncated = true;
                break;
            }
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path().to_path_buf();
            let mut searcher = Searcher::new();
            let mut file_matches = Vec::new();
            let sink = UTF8(|line_num, line| {
                file_matches.push(format!("{}:{}:{}", path.display(), line_num, line.trim_end()));
                Ok(true)
            });
            if searcher.search_path(&matcher, &path, sink).is_err() {
                continue;
            }
            for m in file_matches {
                if matches.len() >= max_matches {
                    truncated = true;
                    break;
                }
                matches.push(m);
            }
        }

        let content = if matches.is_empty() {
            "no matches".to_string()
        } else {
            matches.join("\n")
        };

        let mut result = weave_message::ToolResult {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            content,
            data: Some(json!({ "match_count": matches.len(), "truncated": truncated })),
            error: None,
            duration_ms: 0,
        };
        if truncated {
            result.data = Some(json!({ "match_count": matches.len(), "truncated": true }));
        }
        Ok(result)
    }
}

pub struct SearchFindTool {
    ctx: ToolContext,
}

impl SearchFindTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for SearchFindTool {
    fn name(&self) -> &str {
        TOOL_SEARCH_FIND
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_SEARCH_FIND, "Find file paths whose name contains a substring.", "search").with_parameters(vec![
            ParamSchema::required("name_contains", ParamType::String),
            ParamSchema::optional("path", ParamType::String),
        ])
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let needle = call
            .arguments
            .get("name_contains")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'name_contains'".to_string()))?;
        let subpath = call.arguments.get("path").and_then(|v| v.as_str()).unwrap_or(".");
        let root = resolve_path(&self.ctx.working_dir, subpath, &self.ctx.path_config)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        let mut hits = Vec::new();
        for entry in walkdir::WalkDir::new(&root).into_iter().filter_map(Result::ok) {
            let name = entry.file_name().to_string_lossy();
            if name.contains(needle) {
                hits.push(entry.path().display().to_string());
            }
        }
        hits.sort();

        let content = if hits.is_empty() {
            "no matches".to_string()
        } else {
            hits.join("\n")
        };
        Ok(weave_message::ToolResult {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            content,
            data: Some(json!({ "match_count": hits.len() })),
            error: None,
            duration_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn call(name: &str, args: serde_json::Value) -> ToolCall {
        ToolCall::new("c1", name, args)
    }

    #[tokio::test]
    async fn grep_finds_matching_line() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha\nneedle here\nbeta\n").unwrap();
        let tool = SearchGrepTool::new(ToolContext::new(dir.path().to_path_buf()));
        let result = tool
            .execute(&call(TOOL_SEARCH_GREP, json!({"pattern": "needle"})))
            .await
            .unwrap();
        assert!(result.content.contains("needle here"));
    }

    #[tokio::test]
    async fn grep_with_no_matches_is_success_not_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha\nbeta\n").unwrap();
        let tool = SearchGrepTool::new(ToolContext::new(dir.path().to_path_buf()));
        let result = tool
            .execute(&call(TOOL_SEARCH_GREP, json!({"pattern": "zzz_no_such_thing"})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.content, "no matches");
    }

    #[tokio::test]
    async fn find_matches_by_substring() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "").unwrap();
        let tool = SearchFindTool::new(ToolContext::new(dir.path().to_path_buf()));
        let result = tool
            .execute(&call(TOOL_SEARCH_FIND, json!({"name_contains": "config"})))
            .await
            .unwrap();
        assert!(result.content.contains("config.toml"));
    }
}
