//! Stream chunk wire shape: kind + text + optional metadata + sequence number.
//!
//! A `StreamChunk` is the unit the ReAct core emits to its single consumer callback.
//! Chunks are delivered in order; `sequence` is assigned by [`crate::envelope::SequenceCounter`]
//! and is strictly increasing within one request.

use serde::Serialize;

/// Every observable phase transition the core can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Status,
    ThinkingStart,
    ThinkingResult,
    Reasoning,
    ReasoningSummary,
    Think,
    ActionStart,
    ToolStart,
    ToolResult,
    ToolError,
    Iteration,
    LlmContent,
    TokenUsage,
    FinalAnswer,
    TaskComplete,
    MaxIterations,
    Error,
    Complete,
}

/// Optional structured fields carried alongside a chunk's text.
///
/// Not every field applies to every kind; unused fields are left `None` and
/// omitted from the serialized form.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ChunkMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<bool>,
}

impl ChunkMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = Some(name.into());
        self
    }

    pub fn with_call_id(mut self, id: impl Into<String>) -> Self {
        self.call_id = Some(id.into());
        self
    }

    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    pub fn with_confidence(mut self, c: f32) -> Self {
        self.confidence = Some(c);
        self
    }

    pub fn with_tokens(mut self, prompt: u32, completion: u32, total: u32) -> Self {
        self.prompt_tokens = Some(prompt);
        self.completion_tokens = Some(completion);
        self.total_tokens = Some(total);
        self
    }

    pub fn with_iteration(mut self, n: u32) -> Self {
        self.iteration = Some(n);
        self
    }

    pub fn with_cancelled(mut self, c: bool) -> Self {
        self.cancelled = Some(c);
        self
    }
}

/// A single emitted event: kind, text content, optional metadata, sequence number.
#[derive(Clone, Debug, Serialize)]
pub struct StreamChunk {
    pub kind: ChunkKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChunkMetadata>,
    pub sequence: u64,
}

impl StreamChunk {
    /// Constructs a chunk with no metadata and sequence 0; callers set sequence
    /// via [`crate::envelope::SequenceCounter::stamp`] before delivery.
    pub fn new(kind: ChunkKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            metadata: None,
            sequence: 0,
        }
    }

    pub fn with_metadata(mut self, metadata: ChunkMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_kind_serializes_snake_case() {
        let v = serde_json::to_value(ChunkKind::ToolStart).unwrap();
        assert_eq!(v, serde_json::json!("tool_start"));
        let v = serde_json::to_value(ChunkKind::MaxIterations).unwrap();
        assert_eq!(v, serde_json::json!("max_iterations"));
    }

    #[test]
    fn metadata_omits_unset_fields() {
        let meta = ChunkMetadata::new().with_tool_name("read");
        let v = serde_json::to_value(&meta).unwrap();
        assert_eq!(v, serde_json::json!({"tool_name": "read"}));
    }

    #[test]
    fn chunk_with_metadata_roundtrips_fields() {
        let chunk = StreamChunk::new(ChunkKind::ToolResult, "ok")
            .with_metadata(ChunkMetadata::new().with_call_id("call-1").with_duration_ms(12));
        assert_eq!(chunk.metadata.as_ref().unwrap().call_id.as_deref(), Some("call-1"));
        assert_eq!(chunk.metadata.as_ref().unwrap().duration_ms, Some(12));
    }
}
