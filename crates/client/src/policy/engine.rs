//! Strategy execution.
//!
//! Every store read or write on the request path is best effort: a storage
//! error is logged and treated as a miss or a skipped write, never as a
//! failed request. Only success-status responses are written.

use std::sync::Arc;

use url::Url;

use swcache_core::{
    CacheHandle, CacheKey, CacheStore, ConfigError, Error, Request, ResponseSnapshot, ResponseSource, ServedResponse,
    WorkerConfig,
};

use super::fallback::offline_response;
use super::route::{RoutePolicy, Strategy};
use crate::fetch::{Network, is_same_origin};

/// Answers intercepted requests against one cache generation.
pub struct PolicyEngine<S, N> {
    routes: RoutePolicy,
    offline_page: Option<Url>,
    serve_cached_navigation: bool,
    store: Arc<S>,
    network: Arc<N>,
}

impl<S: CacheStore, N: Network> PolicyEngine<S, N> {
    pub fn new(config: &WorkerConfig, store: Arc<S>, network: Arc<N>) -> Result<Self, ConfigError> {
        Ok(Self {
            routes: RoutePolicy::from_config(config)?,
            offline_page: config.offline_page_url()?,
            serve_cached_navigation: config.serve_cached_navigation,
            store,
            network,
        })
    }

    pub fn routes(&self) -> &RoutePolicy {
        &self.routes
    }

    /// Answer a request, reading from and writing to `cache`.
    pub async fn handle(&self, request: &Request, cache: &CacheHandle) -> Result<ServedResponse, Error> {
        let strategy = self.routes.strategy(request);
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            generation = cache.generation(),
            ?strategy,
            "routing request"
        );

        match strategy {
            Strategy::Bypass => self.passthrough(request).await,
            Strategy::CacheFirst => self.cache_first(request, cache).await,
            Strategy::NetworkFirstWithRefresh => self.network_first_with_refresh(request, cache).await,
            Strategy::NavigationWithFallback => self.navigate(request, cache).await,
            Strategy::NetworkFirst => self.network_first(request, cache).await,
        }
    }

    /// Forward to the network without touching the store.
    pub async fn passthrough(&self, request: &Request) -> Result<ServedResponse, Error> {
        let response = self.network.fetch(request).await?;
        Ok(ServedResponse::new(response, ResponseSource::Passthrough))
    }

    async fn cache_first(&self, request: &Request, cache: &CacheHandle) -> Result<ServedResponse, Error> {
        let key = CacheKey::for_request(request);

        if let Some(hit) = self.lookup(cache, &key).await {
            return Ok(ServedResponse::new(hit, ResponseSource::Cache));
        }

        let response = self.network.fetch(request).await?;
        self.write(cache, &key, &response).await;
        Ok(ServedResponse::new(response, ResponseSource::Network))
    }

    async fn network_first_with_refresh(
        &self, request: &Request, cache: &CacheHandle,
    ) -> Result<ServedResponse, Error> {
        let key = CacheKey::for_request(request);

        let failure = match self.network.fetch(request).await {
            Ok(response) if response.is_success() => {
                self.write(cache, &key, &response).await;
                return Ok(ServedResponse::new(response, ResponseSource::Network));
            }
            Ok(response) => Error::Http { url: request.url.to_string(), status: response.status },
            Err(e) => e,
        };

        tracing::debug!(url = %request.url, error = %failure, "data fetch failed, trying cache");
        match self.lookup(cache, &key).await {
            Some(stale) => Ok(ServedResponse::new(stale, ResponseSource::Cache)),
            None => Err(failure),
        }
    }

    async fn navigate(&self, request: &Request, cache: &CacheHandle) -> Result<ServedResponse, Error> {
        let key = CacheKey::for_request(request);

        let error = match self.network.fetch(request).await {
            Ok(response) => {
                // Pages from other origins are answered but never stored.
                if is_same_origin(&request.url, self.routes.origin()) {
                    self.write(cache, &key, &response).await;
                }
                return Ok(ServedResponse::new(response, ResponseSource::Network));
            }
            Err(e) => e,
        };

        tracing::info!(url = %request.url, %error, "navigation failed, serving offline fallback");

        if self.serve_cached_navigation
            && let Some(page) = self.lookup(cache, &key).await
        {
            return Ok(ServedResponse::new(page, ResponseSource::Cache));
        }

        if let Some(offline_url) = &self.offline_page
            && let Some(page) = self.lookup(cache, &CacheKey::get(offline_url)).await
        {
            return Ok(ServedResponse::new(page, ResponseSource::OfflinePage));
        }

        Ok(ServedResponse::new(offline_response(request.url.as_str()), ResponseSource::Synthesized))
    }

    /// Read-only: serves precached or otherwise stored copies but never
    /// writes.
    async fn network_first(&self, request: &Request, cache: &CacheHandle) -> Result<ServedResponse, Error> {
        match self.network.fetch(request).await {
            Ok(response) => Ok(ServedResponse::new(response, ResponseSource::Network)),
            Err(error) => match self.lookup(cache, &CacheKey::for_request(request)).await {
                Some(hit) => Ok(ServedResponse::new(hit, ResponseSource::Cache)),
                None => Err(error),
            },
        }
    }

    async fn lookup(&self, cache: &CacheHandle, key: &CacheKey) -> Option<ResponseSnapshot> {
        match self.store.get(cache, key).await {
            Ok(hit) => hit,
            Err(error) => {
                tracing::warn!(generation = cache.generation(), url = key.url(), %error, "cache read failed");
                None
            }
        }
    }

    async fn write(&self, cache: &CacheHandle, key: &CacheKey, response: &ResponseSnapshot) {
        if !response.is_success() {
            return;
        }
        if let Err(error) = self.store.put(cache, key, response).await {
            tracing::warn!(generation = cache.generation(), url = key.url(), %error, "cache write failed");
        }
    }
}
