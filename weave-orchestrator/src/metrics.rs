//! Execution metrics: totals, per-tool counters, an error histogram,
//! and a capped execution history (spec.md §4.6 "Execute").

use std::collections::{HashMap, VecDeque};

const HISTORY_CAPACITY: usize = 1000;

#[derive(Clone, Debug)]
pub struct ExecutionRecord {
    pub step_id: String,
    pub tool_name: String,
    pub succeeded: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Default)]
pub struct ToolMetrics {
    pub call_count: u64,
    pub avg_duration_ms: f64,
}

#[derive(Debug, Default)]
pub struct OrchestratorMetrics {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    per_tool: HashMap<String, ToolMetrics>,
    error_histogram: HashMap<String, u64>,
    history: VecDeque<ExecutionRecord>,
}

impl OrchestratorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: ExecutionRecord) {
        self.total += 1;
        if record.succeeded {
            self.successful += 1;
        } else {
            self.failed += 1;
        }

        let entry = self.per_tool.entry(record.tool_name.clone()).or_default();
        entry.call_count += 1;
        entry.avg_duration_ms = if entry.call_count == 1 {
            record.duration_ms as f64
        } else {
            (entry.avg_duration_ms * 4.0 + record.duration_ms as f64) / 5.0
        };

        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    pub fn record_error(&mut self, error: &str) {
        *self.error_histogram.entry(error.to_string()).or_insert(0) += 1;
    }

    pub fn tool_metrics(&self, tool_name: &str) -> Option<&ToolMetrics> {
        self.per_tool.get(tool_name)
    }

    pub fn history(&self) -> &VecDeque<ExecutionRecord> {
        &self.history
    }

    pub fn error_count(&self, error: &str) -> u64 {
        *self.error_histogram.get(error).unwrap_or(&0)
    }
}
