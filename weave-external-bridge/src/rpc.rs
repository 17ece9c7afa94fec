//! Line-delimited JSON-RPC 2.0 transport over a child process's stdio.
//!
//! The teacher's own MCP transport (`session.rs`) wraps a private
//! `mcp_client`/`mcp_core` pair that cannot be fetched from a registry;
//! this module hand-rolls the same request/response-by-id shape directly
//! atop `tokio::process` + `serde_json`, one JSON value per line.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::{oneshot, Mutex};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport write failed: {0}")]
    Write(String),
    #[error("transport read failed: {0}")]
    Read(String),
    #[error("connection closed before a response arrived")]
    Closed,
    #[error("server returned an error response: {code} {message}")]
    ServerError { code: i64, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, RpcError>>>>>;

/// One live connection to a subprocess server: a writer half guarded by
/// a mutex (concurrent callers serialize their writes) and a background
/// reader task that demultiplexes responses to pending callers by id.
pub struct RpcTransport {
    stdin: Mutex<ChildStdin>,
    next_id: AtomicU64,
    pending: PendingMap,
    reader_task: tokio::task::JoinHandle<()>,
}

impl RpcTransport {
    pub fn new(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader_pending = pending.clone();
        let reader_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let parsed: Result<RpcResponse, _> = serde_json::from_str(&line);
                        match parsed {
                            Ok(response) => {
                                let Some(id) = response.id else { continue };
                                let mut guard = reader_pending.lock().await;
                                if let Some(sender) = guard.remove(&id) {
                                    let resolved = match response.error {
                                        Some(err) => Err(RpcError::ServerError {
                                            code: err.code,
                                            message: err.message,
                                        }),
                                        None => Ok(response.result.unwrap_or(Value::Null)),
                                    };
                                    let _ = sender.send(resolved);
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, line = %line, "malformed json-rpc line from server");
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "json-rpc stdout read failed");
                        break;
                    }
                }
            }
            let mut guard = reader_pending.lock().await;
            for (_, sender) in guard.drain() {
                let _ = sender.send(Err(RpcError::Closed));
            }
        });

        Self {
            stdin: Mutex::new(stdin),
            next_id: AtomicU64::new(1),
            pending,
            reader_task,
        }
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let mut line = serde_json::to_string(&request).map_err(|e| RpcError::Malformed(e.to_string()))?;
        line.push('\n');

        {
            let mut stdin = self.stdin.lock().await;
            stdin
                .write_all(line.as_bytes())
                .await
                .map_err(|e| RpcError::Write(e.to_string()))?;
            stdin.flush().await.map_err(|e| RpcError::Write(e.to_string()))?;
        }

        rx.await.map_err(|_| RpcError::Closed)?
    }

    pub fn shutdown(&self) {
        self.reader_task.abort();
    }
}
