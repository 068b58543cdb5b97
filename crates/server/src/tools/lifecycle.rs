//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use swcache_client::{Network, ServiceWorker};
use swcache_core::CacheStore;

use super::json_result;

/// Run the install entry point and report what was precached.
pub async fn install_impl<S: CacheStore, N: Network>(
    worker: &ServiceWorker<S, N>,
) -> Result<CallToolResult, McpError> {
    let report = worker.on_install().await?;
    json_result(&report)
}

/// Run the activate entry point and report cleanup and claimed clients.
pub async fn activate_impl<S: CacheStore, N: Network>(
    worker: &ServiceWorker<S, N>,
) -> Result<CallToolResult, McpError> {
    let report = worker.on_activate().await?;
    json_result(&report)
}
