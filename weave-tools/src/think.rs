//! Think tool: a pure-text scratchpad the model calls to reason before
//! acting, with an optional second LM call for deeper reflection passes.
//!
//! Deliberately does not depend on `weave-llm-client` directly — that
//! would invert the crate dependency order (leaves first). Instead this
//! module defines a minimal [`ReasoningLm`] seam; the concrete adapter
//! from `weave-llm-client`'s client onto this trait is wired up one layer
//! higher, in the orchestrator/CLI crates.

use async_trait::async_trait;
use serde_json::json;

use weave_message::ToolCall;
use weave_tool_registry::{ParamConstraints, ParamSchema, ParamType, Tool, ToolError, ToolSchema};

pub const TOOL_THINK: &str = "think";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThinkPhase {
    Analyze,
    Plan,
    Reflect,
    Reason,
    UltraThink,
}

impl ThinkPhase {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "analyze" => Some(Self::Analyze),
            "plan" => Some(Self::Plan),
            "reflect" => Some(Self::Reflect),
            "reason" => Some(Self::Reason),
            "ultra_think" => Some(Self::UltraThink),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThinkDepth {
    Shallow,
    Normal,
    Deep,
    Ultra,
}

impl ThinkDepth {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "shallow" => Some(Self::Shallow),
            "normal" => Some(Self::Normal),
            "deep" => Some(Self::Deep),
            "ultra" => Some(Self::Ultra),
            _ => None,
        }
    }

    /// Whether this depth warrants a second LM call for reflection,
    /// rather than simply echoing the thought back as a scratchpad entry.
    fn wants_reflection(self) -> bool {
        matches!(self, ThinkDepth::Deep | ThinkDepth::Ultra)
    }
}

/// The seam this tool uses for its optional second-pass reflection call.
/// Implemented by an adapter over the real LM client at a higher layer.
#[async_trait]
pub trait ReasoningLm: Send + Sync {
    async fn reflect(&self, thought: &str) -> Result<String, String>;
}

pub struct ThinkTool {
    reasoner: Option<std::sync::Arc<dyn ReasoningLm>>,
}

impl ThinkTool {
    pub fn new() -> Self {
        Self { reasoner: None }
    }

    pub fn with_reasoner(reasoner: std::sync::Arc<dyn ReasoningLm>) -> Self {
        Self {
            reasoner: Some(reasoner),
        }
    }
}

impl Default for ThinkTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ThinkTool {
    fn name(&self) -> &str {
        TOOL_THINK
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(TOOL_THINK, "Record a reasoning step without taking any external action.", "reasoning")
            .with_parameters(vec![
                ParamSchema::required("thought", ParamType::String),
                {
                    let mut phase = ParamSchema::optional("phase", ParamType::String);
                    phase.constraints = ParamConstraints {
                        allowed_values: vec![
                            json!("analyze"),
                            json!("plan"),
                            json!("reflect"),
                            json!("reason"),
                            json!("ultra_think"),
                        ],
                        ..ParamConstraints::default()
                    };
                    phase
                },
                {
                    let mut depth = ParamSchema::optional("depth", ParamType::String);
                    depth.constraints = ParamConstraints {
                        allowed_values: vec![json!("shallow"), json!("normal"), json!("deep"), json!("ultra")],
                        ..ParamConstraints::default()
                    };
                    depth
                },
            ])
    }

    async fn execute(&self, call: &ToolCall) -> Result<weave_message::ToolResult, ToolError> {
        let thought = call
            .arguments
            .get("thought")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'thought'".to_string()))?;

        let phase = match call.arguments.get("phase").and_then(|v| v.as_str()) {
            Some(s) => ThinkPhase::from_str(s)
                .ok_or_else(|| ToolError::InvalidInput("unrecognized 'phase'".to_string()))?,
            None => ThinkPhase::Reason,
        };

        let depth = match call.arguments.get("depth").and_then(|v| v.as_str()) {
            Some(s) => ThinkDepth::from_str(s)
                .ok_or_else(|| ToolError::InvalidInput("unrecognized 'depth'".to_string()))?,
            None => ThinkDepth::Normal,
        };

        if depth.wants_reflection() {
            if let Some(reasoner) = &self.reasoner {
                let reflection = reasoner
                    .reflect(thought)
                    .await
                    .map_err(ToolError::ExecutionFailed)?;
                return Ok(weave_message::ToolResult {
                    call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    success: true,
                    content: reflection,
                    data: Some(json!({ "phase": format!("{:?}", phase), "reflected": true })),
                    error: None,
                    duration_ms: 0,
                });
            }
        }

        Ok(weave_message::ToolResult {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            content: thought.to_string(),
            data: Some(json!({ "phase": format!("{:?}", phase), "reflected": false })),
            error: None,
            duration_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoReasoner;

    #[async_trait]
    impl ReasoningLm for EchoReasoner {
        async fn reflect(&self, thought: &str) -> Result<String, String> {
            Ok(format!("reflected: {}", thought))
        }
    }

    fn call(args: serde_json::Value) -> ToolCall {
        ToolCall::new("c1", TOOL_THINK, args)
    }

    #[tokio::test]
    async fn shallow_thought_is_recorded_verbatim() {
        let tool = ThinkTool::new();
        let result = tool.execute(&call(json!({"thought": "consider X"}))).await.unwrap();
        assert_eq!(result.content, "consider X");
    }

    #[tokio::test]
    async fn deep_thought_without_reasoner_falls_back_to_verbatim() {
        let tool = ThinkTool::new();
        let result = tool
            .execute(&call(json!({"thought": "consider X", "depth": "deep"})))
            .await
            .unwrap();
        assert_eq!(result.content, "consider X");
    }

    #[tokio::test]
    async fn deep_thought_with_reasoner_triggers_reflection() {
        let tool = ThinkTool::with_reasoner(std::sync::Arc::new(EchoReasoner));
        let result = tool
            .execute(&call(json!({"thought": "consider X", "depth": "ultra"})))
            .await
            .unwrap();
        assert_eq!(result.content, "reflected: consider X");
    }

    #[tokio::test]
    async fn unknown_phase_is_rejected() {
        let tool = ThinkTool::new();
        let err = tool
            .execute(&call(json!({"thought": "x", "phase": "bogus"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
