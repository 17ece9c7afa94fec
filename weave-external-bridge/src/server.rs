//! Supervises one subprocess tool server: spawn, handshake, capability
//! discovery, call dispatch, and exit-triggered auto-restart.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tokio::time::{timeout, Duration};

use crate::descriptor::ServerDescriptor;
use crate::rpc::{RpcError, RpcTransport};
use crate::state::{ServerState, RESTART_BACKOFF_MS};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to spawn server '{0}': {1}")]
    SpawnFailed(String, String),
    #[error("handshake with server '{0}' timed out")]
    HandshakeTimeout(String),
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
    #[error("server '{0}' is disabled after repeated restart failures")]
    Disabled(String),
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct DiscoveredTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

/// One supervised subprocess. `child`/`transport` are replaced on
/// restart; `state` and `restart_attempts` track the lifecycle across
/// restarts.
pub struct ManagedServer {
    pub descriptor: ServerDescriptor,
    runner: String,
    state: RwLock<ServerState>,
    child: RwLock<Option<Child>>,
    transport: RwLock<Option<Arc<RpcTransport>>>,
    restart_attempts: AtomicUsize,
}

impl ManagedServer {
    pub fn new(descriptor: ServerDescriptor, runner: impl Into<String>) -> Self {
        Self {
            descriptor,
            runner: runner.into(),
            state: RwLock::new(ServerState::Terminated),
            child: RwLock::new(None),
            transport: RwLock::new(None),
            restart_attempts: AtomicUsize::new(0),
        }
    }

    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    async fn set_state(&self, to: ServerState) {
        *self.state.write().await = to;
    }

    /// Spawns the process, performs the JSON-RPC `initialize` handshake,
    /// and transitions to `Ready`.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.set_state(ServerState::Spawned).await;

        let (program, args) = self.descriptor.spawn_command(&self.runner);
        let mut command = Command::new(&program);
        command.args(&args).envs(&self.descriptor.env).stdin(std::process::Stdio::piped()).stdout(std::process::Stdio::piped()).stderr(std::process::Stdio::null());
        if let Some(dir) = &self.descriptor.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| ServerError::SpawnFailed(self.descriptor.id.clone(), e.to_string()))?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");
        let transport = Arc::new(RpcTransport::new(stdin, stdout));

        self.set_state(ServerState::Handshaking).await;

        let handshake = transport.call("initialize", json!({ "protocolVersion": "2024-11-05" }));
        match timeout(Duration::from_millis(self.descriptor.timeout_ms), handshake).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ServerError::Rpc(e)),
            Err(_) => return Err(ServerError::HandshakeTimeout(self.descriptor.id.clone())),
        }

        *self.child.write().await = Some(child);
        *self.transport.write().await = Some(transport);
        self.set_state(ServerState::Ready).await;
        self.restart_attempts.store(0, Ordering::Relaxed);
        Ok(())
    }

    pub async fn list_tools(&self) -> Result<Vec<DiscoveredTool>, ServerError> {
        let transport = self.current_transport().await?;
        let result = transport.call("tools/list", json!({})).await?;
        let tools = result
            .get("tools")
            .cloned()
            .unwrap_or(Value::Array(vec![]));
        Ok(serde_json::from_value(tools).unwrap_or_default())
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ServerError> {
        let transport = self.current_transport().await?;
        let result = transport
            .call("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        Ok(result)
    }

    async fn current_transport(&self) -> Result<Arc<RpcTransport>, ServerError> {
        self.transport
            .read()
            .await
            .clone()
            .ok_or_else(|| ServerError::SpawnFailed(self.descriptor.id.clone(), "not started".to_string()))
    }

    pub async fn stop(&self) {
        self.set_state(ServerState::Draining).await;
        if let Some(transport) = self.transport.write().await.take() {
            transport.shutdown();
        }
        if let Some(mut child) = self.child.write().await.take() {
            let _ = child.start_kill();
        }
        self.set_state(ServerState::Terminated).await;
    }

    /// Attempts a restart using the backoff schedule in
    /// [`RESTART_BACKOFF_MS`]; once exhausted the server is permanently
    /// disabled and callers must stop retrying.
    pub async fn restart_with_backoff(&self) -> Result<(), ServerError> {
        let attempt = self.restart_attempts.fetch_add(1, Ordering::Relaxed);
        let Some(&delay_ms) = RESTART_BACKOFF_MS.get(attempt) else {
            return Err(ServerError::Disabled(self.descriptor.id.clone()));
        };
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        self.start().await
    }
}
