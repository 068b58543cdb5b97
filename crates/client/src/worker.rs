//! Entry points a host wires to its install, activate and fetch events.

use std::sync::Arc;

use swcache_core::{CacheHandle, CacheStore, ConfigError, Error, Request, ServedResponse, WorkerConfig};

use crate::fetch::Network;
use crate::lifecycle::{ActivateReport, InstallReport, LifecycleManager};
use crate::policy::PolicyEngine;

/// One deployed generation: lifecycle plus request routing over a shared
/// store and network.
pub struct ServiceWorker<S, N> {
    config: WorkerConfig,
    lifecycle: LifecycleManager<S, N>,
    engine: PolicyEngine<S, N>,
}

impl<S: CacheStore, N: Network> ServiceWorker<S, N> {
    pub fn new(config: WorkerConfig, store: Arc<S>, network: Arc<N>) -> Result<Self, ConfigError> {
        config.validate()?;
        let lifecycle = LifecycleManager::new(&config, store.clone(), network.clone())?;
        let engine = PolicyEngine::new(&config, store, network)?;
        Ok(Self { config, lifecycle, engine })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &LifecycleManager<S, N> {
        &self.lifecycle
    }

    pub fn engine(&self) -> &PolicyEngine<S, N> {
        &self.engine
    }

    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        self.lifecycle.install().await
    }

    pub async fn on_activate(&self) -> Result<ActivateReport, Error> {
        self.lifecycle.activate().await
    }

    /// Answer an intercepted request.
    ///
    /// Until this generation is activated the store's active generation
    /// answers. With no active generation, once a newer deploy has replaced
    /// this one, and for subresources of pages it does not control, requests
    /// go straight to the network.
    pub async fn on_fetch(&self, request: &Request) -> Result<ServedResponse, Error> {
        let Some(active) = self.lifecycle.serving_generation().await else {
            return self.engine.passthrough(request).await;
        };

        if !request.is_navigation()
            && let Some(client_id) = &request.client_id
            && !self.lifecycle.clients().is_controlled(client_id).await
        {
            tracing::debug!(client_id, url = %request.url, "uncontrolled client, passing through");
            return self.engine.passthrough(request).await;
        }

        self.engine.handle(request, &CacheHandle::new(active)).await
    }

    /// Record a page opening. Pages opened while a generation is serving are
    /// controlled from the start. Returns whether the page is controlled.
    pub async fn register_client(&self, client_id: &str) -> bool {
        let controlled = self.lifecycle.serving_generation().await.is_some();
        self.lifecycle.clients().register(client_id, controlled).await;
        controlled
    }

    /// Forget a closed page. Returns `false` if it was never registered.
    pub async fn close_client(&self, client_id: &str) -> bool {
        self.lifecycle.clients().unregister(client_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeNetwork, FlakyStore};
    use swcache_core::ResponseSource;

    const ORIGIN: &str = "https://example.com";

    fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    fn config(generation: &str) -> WorkerConfig {
        WorkerConfig { generation: generation.into(), origin: ORIGIN.into(), ..Default::default() }
    }

    fn site() -> Arc<FakeNetwork> {
        let network = Arc::new(FakeNetwork::new());
        network
            .respond(&url("/"), 200, "<h1>Home</h1>")
            .respond(&url("/offline.html"), 200, "<p>offline</p>");
        network
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let store = Arc::new(FlakyStore::new().await);
        store.open("site-v0").await.unwrap();
        let network = site();
        let worker = ServiceWorker::new(config("site-v1"), store.clone(), network.clone()).unwrap();

        worker.on_install().await.unwrap();
        assert_eq!(store.inner.entry_count("site-v1").await.unwrap(), 2);

        let report = worker.on_activate().await.unwrap();
        assert_eq!(report.deleted, vec!["site-v0".to_string()]);
        assert_eq!(store.list_generations().await.unwrap(), vec!["site-v1".to_string()]);

        let icon = url("/assets/icon.png");
        network.respond(&icon, 200, "png");
        let first = worker.on_fetch(&Request::get(&icon).unwrap()).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);
        let calls = network.total_calls();
        let second = worker.on_fetch(&Request::get(&icon).unwrap()).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(network.total_calls(), calls);

        let data = url("/shop/shopIndex.json");
        network.respond(&data, 500, "error");
        assert!(worker.on_fetch(&Request::get(&data).unwrap()).await.is_err());

        network.set_offline(true);
        let page = worker.on_fetch(&Request::navigate(&url("/blog/")).unwrap()).await.unwrap();
        assert_eq!(page.source, ResponseSource::OfflinePage);
        assert_eq!(page.response.body, "<p>offline</p>");
    }

    #[tokio::test]
    async fn test_passthrough_before_activation() {
        let store = Arc::new(FlakyStore::new().await);
        let network = site();
        let worker = ServiceWorker::new(config("v1"), store.clone(), network.clone()).unwrap();
        worker.on_install().await.unwrap();

        let icon = url("/assets/icon.png");
        network.respond(&icon, 200, "png");
        let served = worker.on_fetch(&Request::get(&icon).unwrap()).await.unwrap();

        assert_eq!(served.source, ResponseSource::Passthrough);
        assert_eq!(store.inner.entry_count("v1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_uncontrolled_client_until_claimed() {
        let store = Arc::new(FlakyStore::new().await);
        let network = site();
        let worker = ServiceWorker::new(
            WorkerConfig { claim_clients: false, ..config("v1") },
            store.clone(),
            network.clone(),
        )
        .unwrap();

        worker.register_client("tab-1").await;
        worker.on_install().await.unwrap();
        worker.on_activate().await.unwrap();
        worker.register_client("tab-2").await;

        let icon = url("/assets/icon.png");
        network.respond(&icon, 200, "png");

        let old_tab = Request::get(&icon).unwrap().with_client("tab-1");
        let served = worker.on_fetch(&old_tab).await.unwrap();
        assert_eq!(served.source, ResponseSource::Passthrough);

        let new_tab = Request::get(&icon).unwrap().with_client("tab-2");
        let served = worker.on_fetch(&new_tab).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);

        let served = worker.on_fetch(&old_tab).await.unwrap();
        assert_eq!(served.source, ResponseSource::Passthrough);
    }

    #[tokio::test]
    async fn test_closed_client_is_forgotten() {
        let store = Arc::new(FlakyStore::new().await);
        let worker = ServiceWorker::new(config("v1"), store, site()).unwrap();

        assert!(!worker.register_client("tab-1").await);
        worker.on_install().await.unwrap();
        worker.on_activate().await.unwrap();
        assert!(worker.register_client("tab-2").await);
        assert_eq!(worker.lifecycle().clients().len().await, 2);

        assert!(worker.close_client("tab-1").await);
        assert!(!worker.close_client("tab-1").await);
        assert_eq!(worker.lifecycle().clients().len().await, 1);
    }

    #[tokio::test]
    async fn test_claimed_client_is_intercepted() {
        let store = Arc::new(FlakyStore::new().await);
        let network = site();
        let worker = ServiceWorker::new(config("v1"), store, network.clone()).unwrap();

        worker.register_client("tab-1").await;
        worker.on_install().await.unwrap();
        assert_eq!(worker.on_activate().await.unwrap().claimed, 1);

        let icon = url("/assets/icon.png");
        network.respond(&icon, 200, "png");
        worker.on_fetch(&Request::get(&icon).unwrap().with_client("tab-1")).await.unwrap();
        let served = worker.on_fetch(&Request::get(&icon).unwrap().with_client("tab-1")).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let store = Arc::new(FlakyStore::new().await);
        let bad = WorkerConfig { asset_patterns: vec!["(".into()], ..config("v1") };
        assert!(ServiceWorker::new(bad, store, site()).is_err());
    }

    #[tokio::test]
    async fn test_successive_deploys() {
        let store = Arc::new(FlakyStore::new().await);
        let network = site();

        let v1 = ServiceWorker::new(config("v1"), store.clone(), network.clone()).unwrap();
        v1.on_install().await.unwrap();
        v1.on_activate().await.unwrap();

        let v2 = ServiceWorker::new(config("v2"), store.clone(), network.clone()).unwrap();
        v2.on_install().await.unwrap();
        v2.on_activate().await.unwrap();

        assert_eq!(store.list_generations().await.unwrap(), vec!["v2".to_string()]);
        network.set_offline(true);
        let page = v2.on_fetch(&Request::navigate(&url("/")).unwrap()).await.unwrap();
        assert_eq!(page.source, ResponseSource::OfflinePage);
    }

    #[tokio::test]
    async fn test_replaced_worker_passes_through() {
        let store = Arc::new(FlakyStore::new().await);
        let network = site();
        let icon = url("/assets/icon.png");
        network.respond(&icon, 200, "png");

        let v1 = ServiceWorker::new(config("v1"), store.clone(), network.clone()).unwrap();
        v1.on_install().await.unwrap();
        v1.on_activate().await.unwrap();
        assert_eq!(v1.on_fetch(&Request::get(&icon).unwrap()).await.unwrap().source, ResponseSource::Network);

        let v2 = ServiceWorker::new(config("v2"), store.clone(), network.clone()).unwrap();
        v2.on_install().await.unwrap();
        v2.on_activate().await.unwrap();

        assert_eq!(v1.lifecycle().active_generation().await.as_deref(), Some("v2"));
        let served = v1.on_fetch(&Request::get(&icon).unwrap()).await.unwrap();
        assert_eq!(served.source, ResponseSource::Passthrough);
        assert!(!store.list_generations().await.unwrap().contains(&"v1".to_string()));
        assert!(v1.on_activate().await.is_err());

        let served = v2.on_fetch(&Request::get(&icon).unwrap()).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(store.inner.entry_count("v2").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_install_keeps_previous_generation_answering() {
        let store = Arc::new(FlakyStore::new().await);
        let network = site();
        let icon = url("/assets/icon.png");
        network.respond(&icon, 200, "png");

        let v1 = ServiceWorker::new(config("v1"), store.clone(), network.clone()).unwrap();
        v1.on_install().await.unwrap();
        v1.on_activate().await.unwrap();
        v1.on_fetch(&Request::get(&icon).unwrap()).await.unwrap();

        network.set_offline(true);
        let v2 = ServiceWorker::new(config("v2"), store.clone(), network.clone()).unwrap();
        assert!(v2.on_install().await.is_err());
        assert!(v2.on_activate().await.is_err());

        let served = v2.on_fetch(&Request::get(&icon).unwrap()).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body, "png");
        assert_eq!(store.active_generation().await.unwrap().as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_restarted_worker_serves_stored_generation() {
        let store = Arc::new(FlakyStore::new().await);
        let network = site();
        let icon = url("/assets/icon.png");
        network.respond(&icon, 200, "png");

        let first = ServiceWorker::new(config("v1"), store.clone(), network.clone()).unwrap();
        first.on_install().await.unwrap();
        first.on_activate().await.unwrap();
        first.on_fetch(&Request::get(&icon).unwrap()).await.unwrap();
        drop(first);

        network.set_offline(true);
        let restarted = ServiceWorker::new(config("v1"), store, network).unwrap();
        let served = restarted.on_fetch(&Request::get(&icon).unwrap()).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
    }
}
