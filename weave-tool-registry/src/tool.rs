//! The `Tool` capability trait: describe, validate (via schema), execute.
//!
//! Expressed as a capability set rather than an inheritance hierarchy
//! (spec.md §9 design note): built-in tools and external-bridged tools
//! are both just `Arc<dyn Tool>` entries in the registry.

use async_trait::async_trait;

use crate::schema::ToolSchema;
use weave_message::{ToolCall, ToolResult};

/// Errors a tool's own execution can raise. Validation failures are
/// handled by the registry before `execute` is ever called.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    #[error("timed out after {0}ms")]
    Timeout(u64),
    #[error("transport error: {0}")]
    Transport(String),
}

/// One tool that can be called by the LM: unique name, schema, execution.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn schema(&self) -> ToolSchema;

    /// Executes with already-validated arguments (the registry validates
    /// before calling this). Returns the textual/structured result.
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError>;
}
