//! Per-session rolling window cache: `update_cache` folds overflowing
//! history into an LLM-backed summary; `get_optimized_messages` builds
//! the prompt-ready message list (spec.md §4.8).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::RwLock;

use weave_llm_client::{ChatRequest, LlmError, LmClient, ModelType, TokenUsage};
use weave_message::Message;

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::tokens::{estimate_messages_tokens, is_overflow, OverflowCheck};

const SUMMARY_METADATA_FLAG: &str = "summary";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("summarization failed: {0}")]
    Summarization(#[from] LlmError),
}

pub struct SessionCache {
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry>>,
    summarizer: Arc<dyn LmClient>,
}

impl SessionCache {
    pub fn new(config: CacheConfig, summarizer: Arc<dyn LmClient>) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            summarizer,
        }
    }

    /// Appends `new_messages`, folds overflowing history into the
    /// rolling summary when `config.auto` is set and the overflow
    /// estimate trips, and records `tokens_this_call`.
    pub async fn update_cache(
        &self,
        session_id: &str,
        new_messages: Vec<Message>,
        tokens_this_call: TokenUsage,
    ) -> Result<(), CacheError> {
        self.evict_expired().await;

        let mut entries = self.entries.write().await;
        let entry = entries.entry(session_id.to_string()).or_insert_with(CacheEntry::new);
        entry.messages.extend(new_messages);
        entry.add_tokens(&tokens_this_call);
        entry.touch();

        if self.config.auto {
            let current_tokens = estimate_messages_tokens(&entry.messages);
            let overflow = is_overflow(&OverflowCheck {
                current_tokens,
                max_context_tokens: self.config.max_context_tokens,
                reserve_tokens: self.config.reserve_tokens,
            });

            if overflow && entry.messages.len() > self.config.keep_recent {
                let split_at = entry.messages.len() - self.config.keep_recent;
                let to_fold: Vec<Message> = entry.messages.drain(..split_at).collect();
                let summary = self.summarize(&to_fold, entry.summary.as_deref()).await?;
                entry.summary = Some(summary);
                entry.fingerprint += 1;
            }
        }

        Ok(())
    }

    async fn summarize(&self, messages: &[Message], prior_summary: Option<&str>) -> Result<String, LlmError> {
        let mut prompt_messages = vec![Message::system(
            "Summarize the following conversation history concisely, preserving decisions, \
             facts, and open tasks. Respond with the summary text only.",
        )];
        if let Some(prior) = prior_summary {
            prompt_messages.push(Message::system(format!("Previous summary: {}", prior)));
        }
        prompt_messages.extend_from_slice(messages);

        let request = ChatRequest::new(ModelType::Reasoning, prompt_messages);
        let response = self.summarizer.chat(&request).await?;
        Ok(response.content)
    }

    /// Builds: system message, summary-as-assistant (if present), most
    /// recent `optimized_window` messages, then `new_messages`.
    pub async fn get_optimized_messages(&self, session_id: &str, new_messages: &[Message]) -> Vec<Message> {
        let entries = self.entries.read().await;
        let mut out = Vec::new();

        if let Some(entry) = entries.get(session_id) {
            if let Some(summary) = &entry.summary {
                out.push(
                    Message::assistant(summary.clone(), Vec::new()).with_metadata(SUMMARY_METADATA_FLAG, serde_json::json!(true)),
                );
            }
            let recent_start = entry.messages.len().saturating_sub(self.config.optimized_window);
            out.extend_from_slice(&entry.messages[recent_start..]);
        }

        out.extend_from_slice(new_messages);
        out
    }

    pub async fn cumulative_tokens(&self, session_id: &str) -> Option<TokenUsage> {
        self.entries.read().await.get(session_id).map(|e| e.cumulative_tokens.clone())
    }

    async fn evict_expired(&self) {
        let mut entries = self.entries.write().await;
        let ttl = self.config.ttl;
        let now = Instant::now();
        entries.retain(|_, entry| now.duration_since(entry.last_used) < ttl);

        if entries.len() > self.config.max_entries {
            let mut by_age: Vec<(String, Instant)> = entries.iter().map(|(k, v)| (k.clone(), v.last_used)).collect();
            by_age.sort_by_key(|(_, last_used)| *last_used);
            let excess = entries.len() - self.config.max_entries;
            for (key, _) in by_age.into_iter().take(excess) {
                entries.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use weave_llm_client::ChatResponse;

    struct StubSummarizer;

    #[async_trait]
    impl LmClient for StubSummarizer {
        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, LlmError> {
            Ok(ChatResponse {
                content: "stub summary".to_string(),
                tool_calls: vec![],
                usage: None,
                finish_reason: None,
            })
        }
    }

    fn small_config() -> CacheConfig {
        CacheConfig {
            auto: true,
            max_context_tokens: 10,
            reserve_tokens: 0,
            keep_recent: 1,
            optimized_window: 5,
            ttl: std::time::Duration::from_secs(3600),
            max_entries: 256,
        }
    }

    #[tokio::test]
    async fn overflow_folds_old_messages_into_summary() {
        let cache = SessionCache::new(small_config(), Arc::new(StubSummarizer));
        let long_messages: Vec<Message> = (0..5).map(|i| Message::user(format!("message number {}", i))).collect();
        cache.update_cache("s1", long_messages, TokenUsage::default()).await.unwrap();

        let optimized = cache.get_optimized_messages("s1", &[]).await;
        assert!(optimized.iter().any(|m| m.content == "stub summary"));
    }

    #[tokio::test]
    async fn no_auto_never_folds() {
        let mut config = small_config();
        config.auto = false;
        let cache = SessionCache::new(config, Arc::new(StubSummarizer));
        let messages: Vec<Message> = (0..5).map(|i| Message::user(format!("message {}", i))).collect();
        cache.update_cache("s1", messages, TokenUsage::default()).await.unwrap();

        let optimized = cache.get_optimized_messages("s1", &[]).await;
        assert!(!optimized.iter().any(|m| m.content == "stub summary"));
        assert_eq!(optimized.len(), 5);
    }

    #[tokio::test]
    async fn get_optimized_messages_appends_new_messages_last() {
        let cache = SessionCache::new(small_config(), Arc::new(StubSummarizer));
        cache.update_cache("s1", vec![Message::user("old")], TokenUsage::default()).await.unwrap();
        let new = vec![Message::user("new")];
        let optimized = cache.get_optimized_messages("s1", &new).await;
        assert_eq!(optimized.last().unwrap().content, "new");
    }

    #[tokio::test]
    async fn cumulative_tokens_accumulate_across_calls() {
        let cache = SessionCache::new(small_config(), Arc::new(StubSummarizer));
        cache
            .update_cache(
                "s1",
                vec![Message::user("a")],
                TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            )
            .await
            .unwrap();
        cache
            .update_cache(
                "s1",
                vec![Message::user("b")],
                TokenUsage {
                    prompt_tokens: 3,
                    completion_tokens: 2,
                    total_tokens: 5,
                },
            )
            .await
            .unwrap();
        let total = cache.cumulative_tokens("s1").await.unwrap();
        assert_eq!(total.total_tokens, 20);
    }
}
