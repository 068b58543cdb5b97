//! MCP server handler implementation.
//!
//! Plays the host's registration layer: install, activate and fetch events
//! arrive as tool calls and are routed to the worker's entry points.
use std::sync::Arc;

use crate::tools::{
    CacheEntriesParams, ClientParams, SwFetchParams, activate_impl, close_client_impl, entries_impl, fetch_impl,
    generations_impl, install_impl, register_client_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swcache_client::{FetchClient, ServiceWorker};
use swcache_core::CacheDb;

pub type Worker = ServiceWorker<CacheDb, FetchClient>;

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<Worker>,
    db: CacheDb,
}

#[tool_router]
impl SwCacheServer {
    pub fn new(worker: Arc<Worker>, db: CacheDb) -> Self {
        Self { tool_router: Self::tool_router(), worker, db }
    }

    #[tool(description = "Install the configured generation: precache the manifest all-or-nothing.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(
        description = "Activate the installed generation: delete every other generation and claim open pages."
    )]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Route one request through the caching policy.
    ///
    /// The output names the branch that answered: network, cache,
    /// offline_page, synthesized or passthrough.
    #[tool(description = "Send a request through the caching policy. Returns the response and which branch served it.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(
        description = "Record a page opening. Pages opened while no generation serves stay uncontrolled until claimed."
    )]
    async fn sw_register_client(&self, params: Parameters<ClientParams>) -> Result<CallToolResult, McpError> {
        register_client_impl(&self.worker, params.0).await
    }

    #[tool(description = "Record a page closing.")]
    async fn sw_close_client(&self, params: Parameters<ClientParams>) -> Result<CallToolResult, McpError> {
        close_client_impl(&self.worker, params.0).await
    }

    #[tool(description = "List stored cache generations with their lifecycle state and entry counts.")]
    async fn cache_generations(&self) -> Result<CallToolResult, McpError> {
        generations_impl(&self.db, &self.worker).await
    }

    #[tool(description = "List entries stored in a cache generation (default: the configured generation).")]
    async fn cache_entries(&self, params: Parameters<CacheEntriesParams>) -> Result<CallToolResult, McpError> {
        entries_impl(&self.db, self.worker.lifecycle().generation(), params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
