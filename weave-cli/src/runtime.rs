//! Wires the library crates into one running agent: tool registry,
//! external-bridge servers, orchestrator, session cache, and the LM
//! client the think tool's deep/ultra reflection pass adapts onto
//! (spec.md §6 external interfaces; `weave_tools::think::ReasoningLm`'s
//! own doc comment: "the concrete adapter ... is wired up one layer
//! higher, in the orchestrator/CLI crates").

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use weave_external_bridge::ServerDescriptor;
use weave_llm_client::{ChatRequest, HttpLmClient, LmClient, ModelConfig, ModelEndpoint, ModelType};
use weave_message::Message;
use weave_orchestrator::Orchestrator;
use weave_session_cache::{CacheConfig, SessionCache};
use weave_tool_registry::ToolRegistry;
use weave_tools::{ReasoningLm, ThinkTool, ToolContext};

pub struct Runtime {
    pub registry: Arc<ToolRegistry>,
    pub orchestrator: Arc<Orchestrator>,
    pub session_cache: Arc<SessionCache>,
    pub lm: Arc<dyn LmClient>,
}

struct LmReasoner {
    lm: Arc<dyn LmClient>,
}

#[async_trait]
impl ReasoningLm for LmReasoner {
    async fn reflect(&self, thought: &str) -> Result<String, String> {
        let prompt = weave_prompt_loader::render_reflect_prompt(thought, "deep");
        let request = ChatRequest::new(ModelType::Reasoning, vec![Message::user(prompt)]);
        self.lm.chat(&request).await.map(|r| r.content).map_err(|e| e.to_string())
    }
}

fn model_config_from_env() -> ModelConfig {
    let mut config = ModelConfig::new();
    if let (Ok(base_url), Ok(api_key), Ok(model_name)) = (
        std::env::var("WEAVE_LLM_BASE_URL"),
        std::env::var("WEAVE_LLM_API_KEY"),
        std::env::var("WEAVE_LLM_MODEL"),
    ) {
        config = config.with_default(ModelEndpoint::new(base_url, api_key, model_name));
    }
    if let (Ok(base_url), Ok(api_key), Ok(model_name)) = (
        std::env::var("WEAVE_LLM_REASONING_BASE_URL").or_else(|_| std::env::var("WEAVE_LLM_BASE_URL")),
        std::env::var("WEAVE_LLM_REASONING_API_KEY").or_else(|_| std::env::var("WEAVE_LLM_API_KEY")),
        std::env::var("WEAVE_LLM_REASONING_MODEL"),
    ) {
        config = config.with_entry(ModelType::Reasoning, ModelEndpoint::new(base_url, api_key, model_name));
    }
    config
}

/// Loads external tool server descriptors from the file named by
/// `WEAVE_MCP_CONFIG`, if set. A missing env var means no servers; a
/// present-but-unreadable/unparsable file is logged and treated the
/// same way, matching `bootstrap_servers`'s own skip-on-error posture.
fn load_mcp_descriptors() -> Vec<ServerDescriptor> {
    let Ok(path) = std::env::var("WEAVE_MCP_CONFIG") else {
        return Vec::new();
    };
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path, error = %e, "failed to parse WEAVE_MCP_CONFIG, ignoring");
            Vec::new()
        }),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "failed to read WEAVE_MCP_CONFIG, ignoring");
            Vec::new()
        }
    }
}

pub async fn build(working_dir: PathBuf, sandbox: bool) -> Runtime {
    let lm: Arc<dyn LmClient> = Arc::new(HttpLmClient::new(model_config_from_env()));
    let registry = Arc::new(ToolRegistry::new());

    let ctx = ToolContext::new(working_dir);
    let web_search_key = std::env::var("WEAVE_WEB_SEARCH_API_KEY").ok();
    weave_tools::register_builtin_tools(&registry, ctx, web_search_key)
        .await
        .expect("builtin tool names are fixed and never collide");

    // `register_builtin_tools` registers a reasoner-less think tool;
    // replace it with one wired onto the real LM client.
    registry.unregister(weave_tools::think::TOOL_THINK).await;
    registry
        .register(Arc::new(ThinkTool::with_reasoner(Arc::new(LmReasoner { lm: lm.clone() }))))
        .await
        .expect("think was just unregistered");

    let descriptors = load_mcp_descriptors();
    if !descriptors.is_empty() {
        weave_external_bridge::bootstrap_servers(&registry, descriptors, "npx").await;
    }

    let orchestrator = Arc::new(Orchestrator::new(registry.clone(), sandbox));
    let session_cache = Arc::new(SessionCache::new(CacheConfig::default(), lm.clone()));

    Runtime {
        registry,
        orchestrator,
        session_cache,
        lm,
    }
}
