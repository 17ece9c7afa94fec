//! Built-in tools: file read/update/replace/list, directory create,
//! shell execution, grep/find search, an in-memory todo list, web
//! search, and the think scratchpad. Each tool implements
//! `weave_tool_registry::Tool` and is registered by name at startup.

pub mod context;
pub mod file;
pub mod path;
pub mod search;
pub mod shell;
pub mod think;
pub mod todo;
pub mod web_search;

pub use context::ToolContext;
pub use file::{CreateDirTool, ListFilesTool, ReadFileTool, ReplaceFileTool, UpdateFileTool};
pub use path::{PathError, PathResolverConfig};
pub use search::{SearchFindTool, SearchGrepTool};
pub use shell::ShellExecuteTool;
pub use think::{ReasoningLm, ThinkTool};
pub use todo::{TodoReadTool, TodoStore, TodoWriteTool};
pub use web_search::WebSearchTool;

use std::sync::Arc;

use weave_tool_registry::{RegistryError, ToolRegistry};

/// Registers every built-in tool against a fresh context and todo store.
/// Convenience constructor for callers (the orchestrator, the CLI's
/// `run` subcommand) that want the full default tool set without
/// registering each tool by hand.
pub async fn register_builtin_tools(
    registry: &ToolRegistry,
    ctx: ToolContext,
    web_search_api_key: Option<String>,
) -> Result<(), RegistryError> {
    let todo_store = Arc::new(TodoStore::new());

    registry.register(Arc::new(ReadFileTool::new(ctx.clone()))).await?;
    registry.register(Arc::new(UpdateFileTool::new(ctx.clone()))).await?;
    registry.register(Arc::new(ReplaceFileTool::new(ctx.clone()))).await?;
    registry.register(Arc::new(ListFilesTool::new(ctx.clone()))).await?;
    registry.register(Arc::new(CreateDirTool::new(ctx.clone()))).await?;
    registry.register(Arc::new(ShellExecuteTool::new(ctx.clone()))).await?;
    registry.register(Arc::new(SearchGrepTool::new(ctx.clone()))).await?;
    registry.register(Arc::new(SearchFindTool::new(ctx))).await?;
    registry.register(Arc::new(TodoWriteTool::new(todo_store.clone()))).await?;
    registry.register(Arc::new(TodoReadTool::new(todo_store))).await?;
    registry.register(Arc::new(WebSearchTool::new(web_search_api_key))).await?;
    registry.register(Arc::new(ThinkTool::new())).await?;

    Ok(())
}
