//! Reassembles tool-call fragments streamed piecewise by index into
//! complete [`ToolCall`]s (spec.md §4.7: "optional tool-call fragments
//! (streamed piecewise, must be reassembled by index)").

use std::collections::BTreeMap;

use weave_llm_client::ToolCallDelta;
use weave_message::ToolCall;

#[derive(Default)]
struct PendingCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Accumulates streamed tool-call deltas across an entire LM response.
#[derive(Default)]
pub struct ToolCallAccumulator {
    by_index: BTreeMap<usize, PendingCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, deltas: &[ToolCallDelta]) {
        for delta in deltas {
            let entry = self.by_index.entry(delta.index).or_default();
            if let Some(id) = &delta.id {
                entry.id = Some(id.clone());
            }
            if let Some(name) = &delta.name {
                entry.name = Some(name.clone());
            }
            entry.arguments.push_str(&delta.arguments_delta);
        }
    }

    /// Consumes the accumulator and produces the final tool-call list,
    /// in ascending index order — the order the LM emitted them.
    pub fn finish(self) -> Vec<ToolCall> {
        self.by_index
            .into_values()
            .filter_map(|pending| {
                let name = pending.name?;
                let id = pending.id.unwrap_or_default();
                let arguments = if pending.arguments.trim().is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(&pending.arguments).unwrap_or(serde_json::json!({}))
                };
                Some(ToolCall::new(id, name, arguments))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_arguments_split_across_chunks() {
        let mut acc = ToolCallAccumulator::new();
        acc.push(&[ToolCallDelta {
            index: 0,
            id: Some("call_1".to_string()),
            name: Some("file_read".to_string()),
            arguments_delta: "{\"path\":".to_string(),
        }]);
        acc.push(&[ToolCallDelta {
            index: 0,
            id: None,
            name: None,
            arguments_delta: "\"a.txt\"}".to_string(),
        }]);
        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "file_read");
        assert_eq!(calls[0].arguments["path"], "a.txt");
    }

    #[test]
    fn preserves_emission_order_by_index() {
        let mut acc = ToolCallAccumulator::new();
        acc.push(&[
            ToolCallDelta { index: 1, id: Some("c2".to_string()), name: Some("file_list".to_string()), arguments_delta: "{}".to_string() },
            ToolCallDelta { index: 0, id: Some("c1".to_string()), name: Some("file_read".to_string()), arguments_delta: "{}".to_string() },
        ]);
        let calls = acc.finish();
        assert_eq!(calls[0].name, "file_read");
        assert_eq!(calls[1].name, "file_list");
    }

    #[test]
    fn malformed_arguments_fall_back_to_empty_object() {
        let mut acc = ToolCallAccumulator::new();
        acc.push(&[ToolCallDelta {
            index: 0,
            id: Some("c1".to_string()),
            name: Some("file_read".to_string()),
            arguments_delta: "not json".to_string(),
        }]);
        let calls = acc.finish();
        assert_eq!(calls[0].arguments, serde_json::json!({}));
    }
}
