//! Generation lifecycle: install, activate, supersede, delete, claim.
//!
//! A [`LifecycleManager`] is built for one deployed generation. Install
//! precaches the core manifest all-or-nothing; activate marks the
//! generation active in the store, deletes every other stored generation
//! and claims open pages. The store's marker is the only source of truth for
//! which generation is active, so managers for older deploys see themselves
//! replaced.

mod clients;

pub use clients::ClientRegistry;

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use swcache_core::{
    CacheKey, CacheStore, ConfigError, Error, GenerationState, PrecacheManifest, Request, ResponseSnapshot,
    WorkerConfig,
};

use crate::fetch::Network;

/// Outcome of a successful install.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub generation: String,
    /// Entries written, core and data partitions together.
    pub precached: usize,
    /// Promotion requested without waiting for old pages to close.
    pub skip_waiting: bool,
}

/// Outcome of an activation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub active: String,
    pub deleted: Vec<String>,
    /// Superseded generations whose deletion failed; retried next cycle.
    pub failed: Vec<String>,
    pub claimed: usize,
}

pub struct LifecycleManager<S, N> {
    generation: String,
    manifest: PrecacheManifest,
    precache_data: bool,
    skip_waiting: bool,
    claim_clients: bool,
    store: Arc<S>,
    network: Arc<N>,
    states: RwLock<HashMap<String, GenerationState>>,
    clients: ClientRegistry,
}

impl<S: CacheStore, N: Network> LifecycleManager<S, N> {
    pub fn new(config: &WorkerConfig, store: Arc<S>, network: Arc<N>) -> Result<Self, ConfigError> {
        Ok(Self {
            generation: config.generation.clone(),
            manifest: config.manifest()?,
            precache_data: config.precache_data,
            skip_waiting: config.skip_waiting,
            claim_clients: config.claim_clients,
            store,
            network,
            states: RwLock::new(HashMap::new()),
            clients: ClientRegistry::new(),
        })
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// The generation the store marks active. Shared by every worker on the
    /// same store, so it survives restarts and newer deploys.
    pub async fn active_generation(&self) -> Option<String> {
        match self.store.active_generation().await {
            Ok(active) => active,
            Err(error) => {
                tracing::warn!(generation = %self.generation, %error, "reading active generation failed");
                None
            }
        }
    }

    /// State of `generation`, or `None` if this manager never saw it.
    ///
    /// The store's active marker wins over what this manager remembers: a
    /// generation it activated that another worker has since replaced reads
    /// as superseded.
    pub async fn state_of(&self, generation: &str) -> Option<GenerationState> {
        let active = self.active_generation().await;
        if active.as_deref() == Some(generation) {
            return Some(GenerationState::Active);
        }
        match self.states.read().await.get(generation).copied() {
            Some(GenerationState::Active) => Some(GenerationState::Superseded),
            other => other,
        }
    }

    /// The generation requests should be answered from, or `None` to pass
    /// them straight to the network.
    ///
    /// Until this generation is activated the store's active generation
    /// keeps serving. Once this generation has been activated and then
    /// replaced, this manager stops serving.
    pub async fn serving_generation(&self) -> Option<String> {
        let active = self.active_generation().await?;
        let replaced = active != self.generation
            && self.states.read().await.get(&self.generation) == Some(&GenerationState::Active);
        if replaced { None } else { Some(active) }
    }

    /// Precache the manifest into this generation.
    ///
    /// Every core URL is fetched before anything is written. A failed fetch
    /// or a non-success status aborts with [`Error::Manifest`] and leaves no
    /// new generation behind; the previously active generation keeps serving.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        if self.state_of(&self.generation).await == Some(GenerationState::Active) {
            return Err(Error::Lifecycle(format!("generation {} is already active", self.generation)));
        }

        let previous = {
            let mut states = self.states.write().await;
            let previous = states.get(&self.generation).copied();
            if previous == Some(GenerationState::Installing) {
                return Err(Error::Lifecycle(format!("generation {} is already installing", self.generation)));
            }
            states.insert(self.generation.clone(), GenerationState::Installing);
            previous
        };

        tracing::info!(generation = %self.generation, urls = self.manifest.core.len(), "installing");

        match self.precache().await {
            Ok(precached) => {
                self.set_state(GenerationState::Installed).await;
                tracing::info!(generation = %self.generation, precached, "installed");
                Ok(InstallReport { generation: self.generation.clone(), precached, skip_waiting: self.skip_waiting })
            }
            Err(error) => {
                {
                    let mut states = self.states.write().await;
                    match previous {
                        Some(state) => states.insert(self.generation.clone(), state),
                        None => states.remove(&self.generation),
                    };
                }
                tracing::error!(generation = %self.generation, %error, "install failed");
                Err(error)
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let mut fetched = Vec::with_capacity(self.manifest.core.len());
        for url in &self.manifest.core {
            let response = self.fetch_manifest_entry(url).await?;
            fetched.push((CacheKey::get(url), response));
        }

        let existed = self.store.list_generations().await?.contains(&self.generation);
        let handle = self.store.open(&self.generation).await?;

        for (key, response) in &fetched {
            if let Err(error) = self.store.put(&handle, key, response).await {
                if !existed && let Err(cleanup) = self.store.delete(&self.generation).await {
                    tracing::warn!(generation = %self.generation, error = %cleanup, "cleanup after failed install failed");
                }
                return Err(error);
            }
        }

        let mut precached = fetched.len();
        if self.precache_data {
            for url in &self.manifest.data {
                let written = match self.fetch_manifest_entry(url).await {
                    Ok(response) => self.store.put(&handle, &CacheKey::get(url), &response).await,
                    Err(error) => Err(error),
                };
                match written {
                    Ok(()) => precached += 1,
                    Err(error) => tracing::warn!(url = %url, %error, "data precache skipped"),
                }
            }
        }

        Ok(precached)
    }

    async fn fetch_manifest_entry(&self, url: &Url) -> Result<ResponseSnapshot, Error> {
        let request = Request::new(Method::GET, url.clone());
        match self.network.fetch(&request).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => {
                Err(Error::Manifest { url: url.to_string(), reason: format!("status {}", response.status) })
            }
            Err(error) => Err(Error::Manifest { url: url.to_string(), reason: error.to_string() }),
        }
    }

    /// Promote this generation and delete every other one.
    ///
    /// Deletion failures are logged and reported; the generation stays
    /// superseded and is retried on the next activation.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let current = self.state_of(&self.generation).await;
        if !current.is_some_and(GenerationState::can_activate) {
            return Err(Error::Lifecycle(format!(
                "generation {} cannot be activated from {:?}",
                self.generation, current
            )));
        }

        let previous = self.active_generation().await;
        self.store.activate(&self.generation).await?;

        let superseded: Vec<String> = {
            let mut states = self.states.write().await;
            states.insert(self.generation.clone(), GenerationState::Active);
            if let Some(previous) = previous.filter(|label| label != &self.generation) {
                tracing::info!(generation = %previous, "superseded");
                states.insert(previous, GenerationState::Superseded);
            }

            states
                .iter()
                .filter(|(label, state)| *label != &self.generation && **state == GenerationState::Superseded)
                .map(|(label, _)| label.clone())
                .collect()
        };

        let mut stale = match self.store.list_generations().await {
            Ok(labels) => labels,
            Err(error) => {
                tracing::warn!(generation = %self.generation, %error, "listing generations failed");
                Vec::new()
            }
        };
        stale.retain(|label| label != &self.generation);
        for label in superseded {
            if !stale.contains(&label) {
                stale.push(label);
            }
        }

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for label in stale {
            match self.store.delete(&label).await {
                Ok(_) => {
                    self.states.write().await.insert(label.clone(), GenerationState::Deleted);
                    tracing::info!(generation = %label, "deleted superseded generation");
                    deleted.push(label);
                }
                Err(error) => {
                    self.states.write().await.insert(label.clone(), GenerationState::Superseded);
                    tracing::warn!(generation = %label, %error, "deleting superseded generation failed");
                    failed.push(label);
                }
            }
        }

        let claimed = if self.claim_clients { self.clients.claim().await } else { 0 };

        tracing::info!(generation = %self.generation, deleted = deleted.len(), failed = failed.len(), claimed, "activated");

        Ok(ActivateReport { active: self.generation.clone(), deleted, failed, claimed })
    }

    async fn set_state(&self, state: GenerationState) {
        self.states.write().await.insert(self.generation.clone(), state);
    }
}
