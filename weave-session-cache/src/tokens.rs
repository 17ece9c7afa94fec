//! Hybrid token estimate used to decide overflow, mirroring the
//! teacher's `context_window::is_overflow` check without requiring a
//! real tokenizer dependency.

use weave_message::Message;

/// ~4 characters per token is the common English-text heuristic; good
/// enough for an overflow trigger, not for billing accuracy.
const CHARS_PER_TOKEN: usize = 4;

pub fn estimate_tokens(text: &str) -> u32 {
    ((text.len() + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN) as u32
}

pub fn estimate_messages_tokens(messages: &[Message]) -> u32 {
    messages.iter().map(|m| estimate_tokens(&m.content)).sum()
}

pub struct OverflowCheck {
    pub current_tokens: u32,
    pub max_context_tokens: u32,
    pub reserve_tokens: u32,
}

pub fn is_overflow(check: &OverflowCheck) -> bool {
    check.current_tokens.saturating_add(check.reserve_tokens) > check.max_context_tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up_partial_token() {
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn overflow_triggers_when_current_plus_reserve_exceeds_max() {
        let check = OverflowCheck {
            current_tokens: 120_000,
            max_context_tokens: 128_000,
            reserve_tokens: 10_000,
        };
        assert!(is_overflow(&check));
    }

    #[test]
    fn no_overflow_when_comfortably_under_max() {
        let check = OverflowCheck {
            current_tokens: 1_000,
            max_context_tokens: 128_000,
            reserve_tokens: 4_096,
        };
        assert!(!is_overflow(&check));
    }
}
