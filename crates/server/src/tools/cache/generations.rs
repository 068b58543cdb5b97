//! cache_generations tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{Network, ServiceWorker};
use swcache_core::{CacheDb, CacheStore, GenerationState};

use crate::tools::json_result;

/// One stored generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationInfo {
    pub label: String,
    /// Lifecycle state as seen by this worker; absent for generations it
    /// never touched.
    pub state: Option<GenerationState>,
    pub entries: u64,
}

/// Output from the cache_generations tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGenerationsOutput {
    /// The generation this worker was deployed with.
    pub current: String,
    pub active: Option<String>,
    pub generations: Vec<GenerationInfo>,
}

pub async fn generations_impl<S: CacheStore, N: Network>(
    db: &CacheDb, worker: &ServiceWorker<S, N>,
) -> Result<CallToolResult, McpError> {
    let lifecycle = worker.lifecycle();
    let mut generations = Vec::new();
    for label in db.list_generation_labels().await? {
        let entries = db.entry_count(&label).await?;
        let state = lifecycle.state_of(&label).await;
        generations.push(GenerationInfo { label, state, entries });
    }

    let output = CacheGenerationsOutput {
        current: lifecycle.generation().to_string(),
        active: lifecycle.active_generation().await,
        generations,
    };
    json_result(&output)
}
