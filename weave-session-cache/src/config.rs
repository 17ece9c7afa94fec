//! Cache sizing and compaction thresholds, mirroring the teacher's
//! `CompactionConfig` defaults (spec.md §4.8).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether to auto-compact when the context estimate overflows.
    pub auto: bool,
    /// Maximum context size in tokens; overflow triggers compaction.
    pub max_context_tokens: u32,
    /// Tokens reserved for generation; overflow = current + reserve > max.
    pub reserve_tokens: u32,
    /// Messages kept in full; older ones fold into the rolling summary.
    pub keep_recent: usize,
    /// `GetOptimizedMessages`'s most-recent-K window, separate from
    /// `keep_recent` (the compaction trigger threshold).
    pub optimized_window: usize,
    /// Sessions unused for this long are purged on next access.
    pub ttl: Duration,
    /// LRU eviction kicks in above this many cached sessions.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            auto: true,
            max_context_tokens: 128_000,
            reserve_tokens: 4_096,
            keep_recent: 20,
            optimized_window: 20,
            ttl: Duration::from_secs(3600),
            max_entries: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_teacher_compaction_numbers() {
        let c = CacheConfig::default();
        assert_eq!(c.max_context_tokens, 128_000);
        assert_eq!(c.reserve_tokens, 4_096);
        assert_eq!(c.keep_recent, 20);
    }
}
