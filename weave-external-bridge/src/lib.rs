//! Supervises subprocess tool servers and wraps their discovered
//! capabilities as registry tools (spec.md §4.5).

pub mod descriptor;
pub mod rpc;
pub mod server;
pub mod state;
pub mod tool;

pub use descriptor::{DescriptorError, ServerDescriptor, SpawnKind};
pub use rpc::{RpcError, RpcTransport};
pub use server::{DiscoveredTool, ManagedServer, ServerError};
pub use state::ServerState;
pub use tool::BridgeTool;

use std::sync::Arc;

use weave_tool_registry::{RegistryError, ToolRegistry};

/// Starts every enabled, auto-starting server in `descriptors` and
/// registers its discovered tools into `registry`. A server that fails
/// to start is logged and skipped; it does not abort the others.
pub async fn bootstrap_servers(
    registry: &ToolRegistry,
    descriptors: Vec<ServerDescriptor>,
    runner: &str,
) -> Vec<Arc<ManagedServer>> {
    let mut started = Vec::new();
    for descriptor in descriptors {
        if !descriptor.enabled || !descriptor.auto_start {
            continue;
        }
        if let Err(e) = descriptor.validate() {
            tracing::warn!(server = %descriptor.id, error = %e, "skipping invalid server descriptor");
            continue;
        }
        let server = Arc::new(ManagedServer::new(descriptor.clone(), runner));
        if let Err(e) = server.start().await {
            tracing::warn!(server = %descriptor.id, error = %e, "server failed to start");
            continue;
        }
        match server.list_tools().await {
            Ok(tools) => {
                for discovered in tools {
                    let bridge_tool = BridgeTool::new(server.clone(), discovered);
                    if let Err(e) = register_bridged(registry, bridge_tool).await {
                        tracing::warn!(server = %descriptor.id, error = %e, "failed to register bridged tool");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(server = %descriptor.id, error = %e, "tools/list failed");
            }
        }
        started.push(server);
    }
    started
}

async fn register_bridged(registry: &ToolRegistry, tool: BridgeTool) -> Result<(), RegistryError> {
    registry.register(Arc::new(tool)).await
}
