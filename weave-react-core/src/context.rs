//! The per-turn bundle the core maintains across iterations (spec.md §3
//! "Task context").

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use weave_llm_client::TokenUsage;
use weave_message::Message;

/// Everything needed to start one ReAct turn.
pub struct RunRequest {
    pub session_id: String,
    pub working_dir: PathBuf,
    pub user_text: String,
    pub cancellation: CancellationToken,
}

impl RunRequest {
    pub fn new(session_id: impl Into<String>, working_dir: PathBuf, user_text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            working_dir,
            user_text: user_text.into(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

/// Mutable state threaded through the loop's iterations.
pub(crate) struct TaskContext {
    pub working_dir: PathBuf,
    pub messages: Vec<Message>,
    pub iteration: u32,
    pub total_tokens: TokenUsage,
    pub cancellation: CancellationToken,
}

impl TaskContext {
    pub fn new(working_dir: PathBuf, messages: Vec<Message>, cancellation: CancellationToken) -> Self {
        Self {
            working_dir,
            messages,
            iteration: 0,
            total_tokens: TokenUsage::default(),
            cancellation,
        }
    }

    pub fn add_tokens(&mut self, usage: &TokenUsage) {
        self.total_tokens.prompt_tokens += usage.prompt_tokens;
        self.total_tokens.completion_tokens += usage.completion_tokens;
        self.total_tokens.total_tokens += usage.total_tokens;
    }
}

/// The outcome of one `ReactCore::run` call (spec.md §4.9 step 5/6).
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub final_answer: Option<String>,
    pub iterations: u32,
    pub tool_call_count: u32,
    pub token_usage: TokenUsage,
    pub cancelled: bool,
    pub max_iterations_reached: bool,
}
