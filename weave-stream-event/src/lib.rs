//! Stream chunk protocol: kind + text + optional metadata + sequence number.
//!
//! This crate defines the wire shape the ReAct core emits to its single
//! consumer callback. It has no dependency on the core itself.

pub mod envelope;
pub mod event;

pub use envelope::SequenceCounter;
pub use event::{ChunkKind, ChunkMetadata, StreamChunk};
