//! `execute(plan, context) -> results[]`: dispatches a plan respecting
//! its dependency edges, up to `max_concurrency` independent steps at a
//! time. A failed step fails every descendant as `skipped`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use weave_message::ToolResult;
use weave_tool_registry::ToolRegistry;

use crate::metrics::{ExecutionRecord, OrchestratorMetrics};
use crate::plan::{ExecutionPlan, StepStatus};

#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub step_id: String,
    pub status: StepStatus,
    pub result: Option<ToolResult>,
}

pub async fn execute(
    plan: ExecutionPlan,
    registry: Arc<ToolRegistry>,
    metrics: &mut OrchestratorMetrics,
) -> Vec<StepOutcome> {
    let mut outcomes: Vec<StepOutcome> = plan
        .steps
        .iter()
        .map(|s| StepOutcome {
            step_id: s.id.clone(),
            status: StepStatus::Pending,
            result: None,
        })
        .collect();

    let semaphore = Arc::new(Semaphore::new(plan.max_concurrency.max(1)));

    loop {
        let ready_indices: Vec<usize> = plan
            .steps
            .iter()
            .enumerate()
            .filter(|(i, _)| outcomes[*i].status == StepStatus::Pending)
            .filter(|(_, step)| {
                step.depends_on.iter().all(|dep_id| {
                    outcomes
                        .iter()
                        .find(|o| &o.step_id == dep_id)
                        .map(|o| o.status == StepStatus::Succeeded)
                        .unwrap_or(true)
                })
            })
            .map(|(i, _)| i)
            .collect();

        let blocked_indices: Vec<usize> = plan
            .steps
            .iter()
            .enumerate()
            .filter(|(i, _)| outcomes[*i].status == StepStatus::Pending)
            .filter(|(i, _)| !ready_indices.contains(i))
            .filter(|(_, step)| {
                step.depends_on.iter().any(|dep_id| {
                    outcomes
                        .iter()
                        .find(|o| &o.step_id == dep_id)
                        .map(|o| matches!(o.status, StepStatus::Failed | StepStatus::Skipped))
                        .unwrap_or(false)
                })
            })
            .map(|(i, _)| i)
            .collect();

        for i in &blocked_indices {
            outcomes[*i].status = StepStatus::Skipped;
        }

        if ready_indices.is_empty() {
            break;
        }

        let mut join_set: JoinSet<(usize, Result<ToolResult, weave_tool_registry::RegistryError>, Duration)> = JoinSet::new();
        for i in ready_indices {
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
            let registry = registry.clone();
            let call = plan.steps[i].call.clone();
            join_set.spawn(async move {
                let _permit = permit;
                let start = Instant::now();
                let result = registry.execute(&call).await;
                (i, result, start.elapsed())
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let (i, result, elapsed) = joined.expect("execution task panicked");
            match result {
                Ok(tool_result) => {
                    let succeeded = tool_result.success;
                    outcomes[i].status = if succeeded { StepStatus::Succeeded } else { StepStatus::Failed };
                    metrics.record(ExecutionRecord {
                        step_id: plan.steps[i].id.clone(),
                        tool_name: plan.steps[i].call.name.clone(),
                        succeeded,
                        duration_ms: elapsed.as_millis() as u64,
                    });
                    if !succeeded {
                        if let Some(err) = &tool_result.error {
                            metrics.record_error(err);
                        }
                    }
                    outcomes[i].result = Some(tool_result);
                }
                Err(e) => {
                    outcomes[i].status = StepStatus::Failed;
                    metrics.record(ExecutionRecord {
                        step_id: plan.steps[i].id.clone(),
                        tool_name: plan.steps[i].call.name.clone(),
                        succeeded: false,
                        duration_ms: elapsed.as_millis() as u64,
                    });
                    metrics.record_error(&e.to_string());
                }
            }
        }
    }

    outcomes
}

#[allow(dead_code)]
fn unresolved_step_ids(outcomes: &[StepOutcome]) -> HashSet<String> {
    outcomes
        .iter()
        .filter(|o| o.status == StepStatus::Pending)
        .map(|o| o.step_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use weave_message::ToolCall;
    use weave_tool_registry::{Tool, ToolError, ToolSchema};

    use crate::plan::{build_plan, Strategy};

    struct AlwaysFails;

    #[async_trait]
    impl Tool for AlwaysFails {
        fn name(&self) -> &str {
            "file_update"
        }
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("file_update", "d", "file")
        }
        async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
            Ok(ToolResult {
                call_id: call.id.clone(),
                tool_name: call.name.clone(),
                success: false,
                content: String::new(),
                data: None,
                error: Some("write failed".to_string()),
                duration_ms: 0,
            })
        }
    }

    struct AlwaysSucceeds(&'static str);

    #[async_trait]
    impl Tool for AlwaysSucceeds {
        fn name(&self) -> &str {
            self.0
        }
        fn schema(&self) -> ToolSchema {
            ToolSchema::new(self.0, "d", "file")
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
    async fn failed_step_skips_its_dependents() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(AlwaysFails)).await.unwrap();
        registry.register(Arc::new(AlwaysSucceeds("file_read"))).await.unwrap();

        let calls = vec![
            ToolCall::new("c1", "file_update", json!({"path": "a.txt", "content": "x"})),
            ToolCall::new("c2", "file_read", json!({"path": "a.txt"})),
        ];
        let plan = build_plan(calls, Strategy::Sequential, 2);
        let mut metrics = OrchestratorMetrics::new();
        let outcomes = execute(plan, registry, &mut metrics).await;

        assert_eq!(outcomes[0].status, StepStatus::Failed);
        assert_eq!(outcomes[1].status, StepStatus::Skipped);
    }

    #[tokio::test]
    async fn independent_steps_all_succeed() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(AlwaysSucceeds("file_read"))).await.unwrap();

        let calls = vec![
            ToolCall::new("c1", "file_read", json!({"path": "a.txt"})),
            ToolCall::new("c2", "file_read", json!({"path": "b.txt"})),
        ];
        let plan = build_plan(calls, Strategy::Parallel, 2);
        let mut metrics = OrchestratorMetrics::new();
        let outcomes = execute(plan, registry, &mut metrics).await;

        assert!(outcomes.iter().all(|o| o.status == StepStatus::Succeeded));
        assert_eq!(metrics.total, 2);
    }
}
