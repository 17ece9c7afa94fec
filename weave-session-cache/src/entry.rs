//! One session's cached state (spec.md §3 "Session cache entry").

use std::time::Instant;

use weave_llm_client::TokenUsage;
use weave_message::Message;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub messages: Vec<Message>,
    pub summary: Option<String>,
    pub cumulative_tokens: TokenUsage,
    pub request_count: u64,
    pub last_used: Instant,
    /// Identifies which compaction pass produced the current summary;
    /// bumped every time messages are folded, so callers can tell a
    /// stale cached summary from a fresh one.
    pub fingerprint: u64,
}

impl CacheEntry {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            summary: None,
            cumulative_tokens: TokenUsage::default(),
            request_count: 0,
            last_used: Instant::now(),
            fingerprint: 0,
        }
    }

    pub fn touch(&mut self) {
        self.last_used = Instant::now();
        self.request_count += 1;
    }

    pub fn add_tokens(&mut self, usage: &TokenUsage) {
        self.cumulative_tokens.prompt_tokens += usage.prompt_tokens;
        self.cumulative_tokens.completion_tokens += usage.completion_tokens;
        self.cumulative_tokens.total_tokens += usage.total_tokens;
    }
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self::new()
    }
}
