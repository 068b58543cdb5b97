//! MCP tool implementations.
//!
//! Lifecycle tools drive the worker's install and activate entry points,
//! client tools open and close pages, `sw_fetch` plays an intercepted
//! request and the cache tools inspect the store read-only.

pub mod cache;
pub mod clients;
pub mod lifecycle;
pub mod sw_fetch;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use swcache_core::Error;

pub use cache::{CacheEntriesParams, entries_impl, generations_impl};
pub use clients::{ClientParams, close_client_impl, register_client_impl};
pub use lifecycle::{activate_impl, install_impl};
pub use sw_fetch::{SwFetchParams, fetch_impl};

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use rmcp::model::CallToolResult;
    use swcache_client::{Network, ServiceWorker};
    use swcache_core::{CacheDb, Error, Request, ResponseSnapshot, WorkerConfig};

    pub const ORIGIN: &str = "https://example.com";

    /// Fixed set of pages; everything else is a 404.
    #[derive(Default)]
    pub struct StaticSite {
        pages: HashMap<String, String>,
        pub offline: AtomicBool,
    }

    impl StaticSite {
        pub fn with_pages(paths: &[(&str, &str)]) -> Self {
            let pages = paths.iter().map(|(p, body)| (format!("{ORIGIN}{p}"), body.to_string())).collect();
            Self { pages, offline: AtomicBool::new(false) }
        }
    }

    #[async_trait]
    impl Network for StaticSite {
        async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(Error::Network("offline".into()));
            }
            let url = request.url.to_string();
            Ok(match self.pages.get(&url) {
                Some(body) => ResponseSnapshot::new(url, 200, body.clone()).with_header("Content-Type", "text/html"),
                None => ResponseSnapshot::new(url, 404, "not found"),
            })
        }
    }

    pub type TestWorker = ServiceWorker<CacheDb, StaticSite>;

    pub async fn worker(generation: &str, db: &CacheDb, site: Arc<StaticSite>) -> TestWorker {
        let config = WorkerConfig { generation: generation.into(), origin: ORIGIN.into(), ..Default::default() };
        ServiceWorker::new(config, Arc::new(db.clone()), site).unwrap()
    }

    pub fn site() -> Arc<StaticSite> {
        Arc::new(StaticSite::with_pages(&[
            ("/", "<h1>Home</h1>"),
            ("/offline.html", "<p>offline</p>"),
            ("/assets/icon.png", "png"),
        ]))
    }

    /// Parse the JSON text content of a tool result.
    pub fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
