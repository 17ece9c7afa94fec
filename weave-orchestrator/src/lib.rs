//! Tool orchestrator: validation, recommendation, dependency-aware
//! execution planning, and bounded-concurrency dispatch (spec.md §4.6).

pub mod execute;
pub mod metrics;
pub mod plan;
pub mod recommend;
pub mod risk;

pub use execute::{execute, StepOutcome};
pub use metrics::{ExecutionRecord, OrchestratorMetrics, ToolMetrics};
pub use plan::{build_plan, ExecutionPlan, ExecutionStep, Strategy, StepStatus};
pub use recommend::{recommend, Recommendation};
pub use risk::{validate, ValidationOutcome};

use std::sync::Arc;

use tokio::sync::Mutex;

use weave_message::ToolCall;
use weave_tool_registry::{RegistryError, ToolRegistry};

/// Ties the registry to a running metrics ledger so callers don't have
/// to thread `OrchestratorMetrics` through every call site by hand.
pub struct Orchestrator {
    registry: Arc<ToolRegistry>,
    metrics: Mutex<OrchestratorMetrics>,
    sandbox_mode: bool,
}

impl Orchestrator {
    pub fn new(registry: Arc<ToolRegistry>, sandbox_mode: bool) -> Self {
        Self {
            registry,
            metrics: Mutex::new(OrchestratorMetrics::new()),
            sandbox_mode,
        }
    }

    pub async fn validate(&self, call: &ToolCall) -> Result<ValidationOutcome, RegistryError> {
        validate(&self.registry, call, self.sandbox_mode).await
    }

    pub async fn recommend(&self, task: &str) -> Vec<Recommendation> {
        let schemas = self.registry.list().await;
        let mut usage = Vec::new();
        for schema in &schemas {
            if let Some((_, avg)) = self.registry.usage(&schema.name).await {
                usage.push((schema.name.clone(), avg));
            }
        }
        recommend(task, &schemas, &usage)
    }

    pub fn create_plan(&self, calls: Vec<ToolCall>, strategy: Strategy, max_concurrency: usize) -> ExecutionPlan {
        build_plan(calls, strategy, max_concurrency)
    }

    pub async fn execute(&self, plan: ExecutionPlan) -> Vec<StepOutcome> {
        let mut metrics = self.metrics.lock().await;
        execute(plan, self.registry.clone(), &mut metrics).await
    }
}
