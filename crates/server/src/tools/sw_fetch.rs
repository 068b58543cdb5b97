//! sw_fetch tool implementation.
//!
//! Plays one intercepted request through the worker and reports which
//! policy branch answered.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{Network, ServiceWorker, fetch::canonicalize};
use swcache_core::{CacheStore, Error, Request, ResponseSource, request::parse_method};

use super::json_result;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request; site-relative paths resolve against the origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Treat the request as a full-page navigation.
    #[serde(default)]
    pub navigate: bool,

    /// Page the request originates from.
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    /// Which policy branch produced the response.
    pub source: ResponseSource,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossy.
    pub body: String,
    pub body_len: usize,
}

pub async fn fetch_impl<S: CacheStore, N: Network>(
    worker: &ServiceWorker<S, N>, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url, worker.engine().routes().origin()).map_err(Error::from)?;

    let mut request = if params.navigate { Request::navigate(url.as_str())? } else { Request::get(url.as_str())? };
    if let Some(method) = params.method.as_deref() {
        request = request.with_method(parse_method(method)?);
    }
    if let Some(client_id) = params.client_id {
        request = request.with_client(client_id);
    }

    let served = worker.on_fetch(&request).await?;
    tracing::debug!(url = %request.url, source = ?served.source, status = served.response.status, "sw_fetch");

    let response = served.response;
    let output = SwFetchOutput {
        content_type: response.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_len: response.body.len(),
        url: response.url,
        status: response.status,
        source: served.source,
        headers: response.headers,
    };
    json_result(&output)
}
