//! Execution plans: a DAG of tool-call steps with a dispatch strategy.

use serde_json::Value;
use weave_message::ToolCall;

/// Tool names that write to a path; used to derive write-before-read
/// dependency edges in [`build_plan`].
const WRITE_TOOLS: &[&str] = &["file_update", "file_replace", "directory_create"];
/// Tool names that read from a path.
const READ_TOOLS: &[&str] = &["file_read", "file_list", "search_grep"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    Parallel,
    Optimized,
    Adaptive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Clone, Debug)]
pub struct ExecutionStep {
    pub id: String,
    pub call: ToolCall,
    pub depends_on: Vec<String>,
    pub timeout_ms: u64,
    pub status: StepStatus,
    /// Hint used by the `optimized` strategy to order independent steps
    /// by ascending estimated duration; filled in by the caller from
    /// registry usage stats, defaults to 0 (no preference).
    pub estimated_duration_ms: f64,
}

#[derive(Clone, Debug)]
pub struct ExecutionPlan {
    pub steps: Vec<ExecutionStep>,
    pub strategy: Strategy,
    pub max_concurrency: usize,
}

fn extract_path(args: &Value) -> Option<String> {
    args.get("path")
        .or_else(|| args.get("file_path"))
        .and_then(Value::as_str)
        .map(String::from)
}

fn is_write_tool(name: &str) -> bool {
    WRITE_TOOLS.contains(&name)
}

fn is_read_tool(name: &str) -> bool {
    READ_TOOLS.contains(&name)
}

const DEFAULT_STEP_TIMEOUT_MS: u64 = 30_000;

/// Builds a plan from a batch of tool calls. A conservative rule adds a
/// dependency edge from a write step to every later read step that
/// targets the same path. Cycles are impossible by construction: edges
/// only ever point from an earlier step to a later one.
pub fn build_plan(calls: Vec<ToolCall>, strategy: Strategy, max_concurrency: usize) -> ExecutionPlan {
    let mut steps: Vec<ExecutionStep> = calls
        .into_iter()
        .enumerate()
        .map(|(i, call)| ExecutionStep {
            id: format!("step-{}", i),
            call,
            depends_on: Vec::new(),
            timeout_ms: DEFAULT_STEP_TIMEOUT_MS,
            status: StepStatus::Pending,
            estimated_duration_ms: 0.0,
        })
        .collect();

    for i in 0..steps.len() {
        if !is_write_tool(&steps[i].call.name) {
            continue;
        }
        let Some(write_path) = extract_path(&steps[i].call.arguments) else {
            continue;
        };
        let write_id = steps[i].id.clone();
        for j in (i + 1)..steps.len() {
            if !is_read_tool(&steps[j].call.name) {
                continue;
            }
            if extract_path(&steps[j].call.arguments).as_deref() == Some(write_path.as_str()) {
                steps[j].depends_on.push(write_id.clone());
            }
        }
    }

    if strategy == Strategy::Parallel || strategy == Strategy::Optimized {
        reorder_reads_before_writes_within_groups(&mut steps);
    }
    if strategy == Strategy::Optimized {
        steps.sort_by(|a, b| {
            let a_has_deps = !a.depends_on.is_empty();
            let b_has_deps = !b.depends_on.is_empty();
            a_has_deps
                .cmp(&b_has_deps)
                .then(a.estimated_duration_ms.partial_cmp(&b.estimated_duration_ms).unwrap_or(std::cmp::Ordering::Equal))
        });
    }

    ExecutionPlan {
        steps,
        strategy,
        max_concurrency,
    }
}

/// `parallel`/`optimized` group read-only steps ahead of write steps
/// that have no dependency ordering constraint between them, preserving
/// relative order within each group.
fn reorder_reads_before_writes_within_groups(steps: &mut [ExecutionStep]) {
    steps.sort_by_key(|s| is_write_tool(&s.call.name));
}
