//! sw_register_client and sw_close_client tool implementations.
//!
//! Pages opened while no generation serves are uncontrolled until the next
//! activation claims them.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{Network, ServiceWorker};
use swcache_core::{CacheStore, Error};

use super::json_result;

/// Input parameters for the client tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientParams {
    /// Page identifier, as later passed to sw_fetch.
    pub client_id: String,
}

/// Output structure for the client tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientOutput {
    pub client_id: String,
    /// Whether the worker intercepts this page's subresources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controlled: Option<bool>,
    /// Whether a registered page was forgotten.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
    pub open_clients: usize,
}

fn client_id(params: ClientParams) -> Result<String, Error> {
    let id = params.client_id.trim();
    if id.is_empty() {
        return Err(Error::InvalidInput("client_id must not be empty".into()));
    }
    Ok(id.to_string())
}

pub async fn register_client_impl<S: CacheStore, N: Network>(
    worker: &ServiceWorker<S, N>, params: ClientParams,
) -> Result<CallToolResult, McpError> {
    let client_id = client_id(params)?;
    let controlled = worker.register_client(&client_id).await;
    let open_clients = worker.lifecycle().clients().len().await;
    json_result(&ClientOutput { client_id, controlled: Some(controlled), closed: None, open_clients })
}

pub async fn close_client_impl<S: CacheStore, N: Network>(
    worker: &ServiceWorker<S, N>, params: ClientParams,
) -> Result<CallToolResult, McpError> {
    let client_id = client_id(params)?;
    let closed = worker.close_client(&client_id).await;
    let open_clients = worker.lifecycle().clients().len().await;
    json_result(&ClientOutput { client_id, controlled: None, closed: Some(closed), open_clients })
}
