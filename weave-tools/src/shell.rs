//! Shell command execution tool: runs a command under the working
//! directory with a timeout and a denylist of destructive commands.
//! Grounded on the risk-classification and timeout-enforcement shape
//! used throughout the tool suite, generalized here to process spawn.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use weave_message::ToolCall;
use weave_tool_registry::{ParamSchema, ParamType, RiskClass, Tool, ToolError, ToolSchema};

use crate::context::ToolContext;

pub const TOOL_SHELL_EXECUTE: &str = "shell_execute";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// Commands that are never allowed to run, regardless of caller intent.
/// Matched as a substring of the trimmed command line.
const BLOCKED_PATTERNS: &[&str] = &[
    "rm -rf /",
    "rm -rf /*",
    ":(){ :|:& };:",
    "mkfs",
    "dd if=/dev/zero",
    "dd if=/dev/random",
    "> /dev/sda",
];

fn is_blocked(command: &str) -> bool {
    let normalized = command.trim();
    BLOCKED_PATTERNS.iter().any(|pattern| normalized.contains(pattern))
}

pub struct ShellExecuteTool {
    ctx: ToolContext,
}

impl ShellExecuteTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for ShellExecuteTool {
    fn name(&self) -> &str {
        TOOL_SHELL_EXECUTE
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_SHELL_EXECUTE, "Run a shell command and capture stdout/stderr.", "shell")
            .with_parameters(vec![
                ParamSchema::required("command", ParamType::String),
                ParamSchema::optional("timeout_secs", ParamType::Number)
                    .with_description("Kill the process after this many seconds (default 30)."),
            ])
            .with_risk(RiskClass::High)
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let command = call
            .arguments
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'command'".to_string()))?;

        if is_blocked(command) {
            return Err(ToolError::InvalidInput("command matches a blocked pattern".to_string()));
        }

        let timeout_secs = call
            .arguments
            .get("timeout_secs")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(self.ctx.working_dir.as_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolError::ExecutionFailed(format!("spawn failed: {}", e)))?;

        let mut stdout = child.stdout.take().expect("piped stdout");
        let mut stderr = child.stderr.take().expect("piped stderr");

        let run = async {
            let mut out_buf = Vec::new();
            let mut err_buf = Vec::new();
            let (_, _, status) = tokio::join!(
                stdout.read_to_end(&mut out_buf),
                stderr.read_to_end(&mut err_buf),
                child.wait(),
            );
            (out_buf, err_buf, status)
        };

        let (stdout_bytes, stderr_bytes, status) = match timeout(Duration::from_secs(timeout_secs), run).await {
            Ok((out, err, Ok(status))) => (out, err, status),
            Ok((_, _, Err(e))) => return Err(ToolError::ExecutionFailed(format!("wait failed: {}", e))),
            Err(_) => {
                let _ = child.start_kill();
                return Err(ToolError::Timeout(timeout_secs * 1000));
            }
        };

        let mut stdout_str = String::from_utf8_lossy(&stdout_bytes).to_string();
        stdout_str.truncate(MAX_OUTPUT_BYTES);
        let mut stderr_str = String::from_utf8_lossy(&stderr_bytes).to_string();
        stderr_str.truncate(MAX_OUTPUT_BYTES);

        let exit_code = status.code().unwrap_or(-1);
        let success = status.success();

        let content = if stderr_str.is_empty() {
            stdout_str.clone()
        } else {
            format!("{}\n--- stderr ---\n{}", stdout_str, stderr_str)
        };

        Ok(weave_message::ToolResult {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success,
            content,
            data: Some(json!({ "exit_code": exit_code, "stdout": stdout_str, "stderr": stderr_str })),
            error: if success { None } else { Some(format!("exit code {}", exit_code)) },
            duration_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(args: serde_json::Value) -> ToolCall {
        ToolCall::new("c1", TOOL_SHELL_EXECUTE, args)
    }

    #[tokio::test]
    async fn echo_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ShellExecuteTool::new(ToolContext::new(dir.path().to_path_buf()));
        let result = tool.execute(&call(json!({"command": "echo hi"}))).await.unwrap();
        assert!(result.success);
        assert!(result.content.contains("hi"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_as_failure_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ShellExecuteTool::new(ToolContext::new(dir.path().to_path_buf()));
        let result = tool.execute(&call(json!({"command": "exit 3"}))).await.unwrap();
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains('3'));
    }

    #[tokio::test]
    async fn blocked_command_is_rejected_before_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ShellExecuteTool::new(ToolContext::new(dir.path().to_path_buf()));
        let err = tool.execute(&call(json!({"command": "rm -rf /"}))).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ShellExecuteTool::new(ToolContext::new(dir.path().to_path_buf()));
        let err = tool
            .execute(&call(json!({"command": "sleep 5", "timeout_secs": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
    }
}
