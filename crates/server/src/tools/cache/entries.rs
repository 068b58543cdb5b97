//! cache_entries tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, CachedEntry, Error};

use crate::tools::json_result;

/// Parameters for the cache_entries tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesParams {
    /// Generation to list (default: the worker's generation).
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_entries tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesOutput {
    pub generation: String,
    pub entries: Vec<CachedEntry>,
}

pub async fn entries_impl(
    db: &CacheDb, default_generation: &str, params: CacheEntriesParams,
) -> Result<CallToolResult, McpError> {
    let generation = params.generation.unwrap_or_else(|| default_generation.to_string());
    if generation.trim().is_empty() {
        return Err(Error::InvalidInput("generation cannot be empty".into()).into());
    }
    if !db.generation_exists(&generation).await? {
        return Err(Error::CacheMiss(format!("no stored generation {generation}")).into());
    }

    let entries = db.list_entries(&generation).await?;
    json_result(&CacheEntriesOutput { generation, entries })
}
