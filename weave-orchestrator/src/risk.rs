//! Validation and the confirmation gate: schema check plus a risk
//! classification that high-risk tools must clear before dispatch in
//! non-sandbox mode.

use weave_message::ToolCall;
use weave_tool_registry::{RiskClass, ToolRegistry, ValidationResult};

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub result: ValidationResult,
    pub risk: RiskClass,
    pub requires_confirmation: bool,
}

/// Validates `call`'s arguments against the registered schema and
/// reports whether the tool's risk class requires a confirmation step
/// before dispatch (spec.md §4.6: "high-risk tools require confirmation
/// in non-sandbox mode").
pub async fn validate(
    registry: &ToolRegistry,
    call: &ToolCall,
    sandbox_mode: bool,
) -> Result<ValidationOutcome, weave_tool_registry::RegistryError> {
    let result = registry.validate_arguments(&call.name, &call.arguments).await?;
    let schemas = registry.list().await;
    let risk = schemas
        .iter()
        .find(|s| s.name == call.name)
        .map(|s| s.risk_class)
        .unwrap_or(RiskClass::Low);

    let requires_confirmation = !sandbox_mode && risk == RiskClass::High;

    Ok(ValidationOutcome {
        result,
        risk,
        requires_confirmation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use weave_message::ToolResult;
    use weave_tool_registry::{Tool, ToolError, ToolSchema};
    use std::sync::Arc;

    struct ShellTool;

    #[async_trait]
    impl Tool for ShellTool {
        fn name(&self) -> &str {
            "shell_execute"
        }
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("shell_execute", "runs shell", "shell").with_risk(RiskClass::High)
        }
        async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
            Ok(ToolResult {
                call_id: call.id.clone(),
                tool_name: call.name.clone(),
                success: true,
                content: String::new(),
                data: None,
                error: None,
                duration_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn high_risk_tool_requires_confirmation_outside_sandbox() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(ShellTool)).await.unwrap();
        let call = ToolCall::new("c1", "shell_execute", serde_json::json!({}));
        let outcome = validate(&registry, &call, false).await.unwrap();
        assert!(outcome.requires_confirmation);
    }

    #[tokio::test]
    async fn high_risk_tool_skips_confirmation_in_sandbox() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(ShellTool)).await.unwrap();
        let call = ToolCall::new("c1", "shell_execute", serde_json::json!({}));
        let outcome = validate(&registry, &call, true).await.unwrap();
        assert!(!outcome.requires_confirmation);
    }
}
