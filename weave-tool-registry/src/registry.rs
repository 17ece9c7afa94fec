//! The registry itself: a name → tool map with usage stats.
//!
//! Mutations (register/unregister) are serialized through a write lock;
//! lookups take a read lock, so concurrent `execute` calls don't block
//! each other (spec.md §4.3 "registry mutations are serialized; lookups
//! are lock-free readable" — approximated here with `tokio::sync::RwLock`,
//! which is reader-concurrent though not wait-free).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::schema::ToolSchema;
use crate::tool::{Tool, ToolError};
use crate::validate::{validate_arguments, ValidationResult};
use weave_message::{ToolCall, ToolResult};

/// Rolling usage statistics the orchestrator's `recommend` step reads.
#[derive(Debug, Default)]
pub struct UsageStats {
    call_count: AtomicU64,
    /// Fixed-point milliseconds * 1000, updated via exponential moving average.
    avg_duration_micros: AtomicU64,
}

impl UsageStats {
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn avg_duration_ms(&self) -> f64 {
        self.avg_duration_micros.load(Ordering::Relaxed) as f64 / 1000.0
    }

    fn record(&self, duration_ms: u64) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let sample = duration_ms * 1000;
        let prev = self.avg_duration_micros.load(Ordering::Relaxed);
        let next = if prev == 0 {
            sample
        } else {
            // Exponential moving average, alpha = 0.2.
            (prev * 4 + sample) / 5
        };
        self.avg_duration_micros.store(next, Ordering::Relaxed);
    }
}

struct RegisteredTool {
    tool: Arc<dyn Tool>,
    stats: UsageStats,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a tool named '{0}' is already registered")]
    DuplicateName(String),
    #[error("no tool named '{0}' is registered")]
    NotFound(String),
    #[error("argument validation failed: {0:?}")]
    Invalid(ValidationResult),
    #[error(transparent)]
    Execution(#[from] ToolError),
}

/// Maps tool names to registered tools; owns schemas and usage stats
/// exclusively — other components hold only the tool name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, RegisteredTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        let mut guard = self.tools.write().await;
        if guard.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        guard.insert(
            name,
            RegisteredTool {
                tool,
                stats: UsageStats::default(),
            },
        );
        Ok(())
    }

    pub async fn unregister(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.write().await.remove(name).map(|r| r.tool)
    }

    pub async fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().await.get(name).map(|r| r.tool.clone())
    }

    pub async fn list(&self) -> Vec<ToolSchema> {
        self.tools.read().await.values().map(|r| r.tool.schema()).collect()
    }

    pub async fn list_by_category(&self, category: &str) -> Vec<ToolSchema> {
        self.tools
            .read()
            .await
            .values()
            .map(|r| r.tool.schema())
            .filter(|s| s.category == category)
            .collect()
    }

    pub async fn validate_arguments(&self, name: &str, args: &serde_json::Value) -> Result<ValidationResult, RegistryError> {
        let guard = self.tools.read().await;
        let entry = guard.get(name).ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        Ok(validate_arguments(&entry.tool.schema(), args))
    }

    pub async fn usage(&self, name: &str) -> Option<(u64, f64)> {
        let guard = self.tools.read().await;
        guard.get(name).map(|r| (r.stats.call_count(), r.stats.avg_duration_ms()))
    }

    /// Validates arguments, invokes the tool, and updates usage stats.
    /// Validation failures never reach the tool's own `execute`.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult, RegistryError> {
        let (tool, schema) = {
            let guard = self.tools.read().await;
            let entry = guard.get(&call.name).ok_or_else(|| RegistryError::NotFound(call.name.clone()))?;
            (entry.tool.clone(), entry.tool.schema())
        };

        let validation = validate_arguments(&schema, &call.arguments);
        if !validation.is_valid() {
            return Err(RegistryError::Invalid(validation));
        }

        let start = Instant::now();
        let result = tool.execute(call).await?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let guard = self.tools.read().await;
        if let Some(entry) = guard.get(&call.name) {
            entry.stats.record(elapsed_ms);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ToolSchema;
    use async_trait::async_trait;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new("echo", "echoes input", "test")
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
            Ok(ToolResult {
                call_id: call.id.clone(),
                tool_name: call.name.clone(),
                success: true,
                content: "ok".to_string(),
                data: None,
                error: None,
                duration_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).await.unwrap();
        let err = registry.register(Arc::new(EchoTool)).await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(_)));
    }

    #[tokio::test]
    async fn execute_unknown_tool_fails() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("c1", "nope", serde_json::json!({}));
        let err = registry.execute(&call).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn execute_updates_usage_stats() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).await.unwrap();
        let call = ToolCall::new("c1", "echo", serde_json::json!({}));
        registry.execute(&call).await.unwrap();
        let (count, _avg) = registry.usage("echo").await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn no_two_tools_share_a_name() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).await.unwrap();
        let names: Vec<String> = registry.list().await.into_iter().map(|s| s.name).collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len());
    }
}
