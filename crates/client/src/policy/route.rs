//! Request classification.
//!
//! Classification is a pure function of the request. Rules are checked in a
//! fixed order and the first match wins: static asset, dynamic data,
//! navigation, other.

use regex::RegexSet;
use url::Url;

use swcache_core::{ConfigError, Request, WorkerConfig};

use crate::fetch::is_same_origin;

/// What kind of resource a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    StaticAsset,
    DynamicData,
    Navigation,
    Other,
}

/// How a request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Not intercepted: straight to the network, store untouched.
    Bypass,
    /// Active generation first, network on a miss.
    CacheFirst,
    /// Network first with write-through; stored copy on failure.
    NetworkFirstWithRefresh,
    /// Network first; offline page or synthesized page on failure.
    NavigationWithFallback,
    /// Network first; stored copy on failure.
    NetworkFirst,
}

/// Compiled routing rules for one site.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    origin: Url,
    assets: RegexSet,
    data: RegexSet,
}

impl RoutePolicy {
    pub fn new(origin: Url, asset_patterns: &[String], data_patterns: &[String]) -> Result<Self, ConfigError> {
        let assets = RegexSet::new(asset_patterns)
            .map_err(|e| ConfigError::Invalid { field: "asset_patterns".into(), reason: e.to_string() })?;
        let data = RegexSet::new(data_patterns)
            .map_err(|e| ConfigError::Invalid { field: "data_patterns".into(), reason: e.to_string() })?;
        Ok(Self { origin, assets, data })
    }

    pub fn from_config(config: &WorkerConfig) -> Result<Self, ConfigError> {
        Self::new(config.origin_url()?, &config.asset_patterns, &config.data_patterns)
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Classify a request. Asset and data rules only apply to the site's own
    /// origin.
    pub fn classify(&self, request: &Request) -> RouteClass {
        let same_origin = is_same_origin(&request.url, &self.origin);
        let path = request.url.path();

        if same_origin && self.assets.is_match(path) {
            RouteClass::StaticAsset
        } else if same_origin && self.data.is_match(path) {
            RouteClass::DynamicData
        } else if request.is_navigation() {
            RouteClass::Navigation
        } else {
            RouteClass::Other
        }
    }

    /// Pick the strategy for a request.
    ///
    /// Non-GET requests and cross-origin subresources bypass the engine, so
    /// they never reach the store.
    pub fn strategy(&self, request: &Request) -> Strategy {
        if !request.is_retrieval() {
            return Strategy::Bypass;
        }

        match self.classify(request) {
            RouteClass::StaticAsset => Strategy::CacheFirst,
            RouteClass::DynamicData => Strategy::NetworkFirstWithRefresh,
            RouteClass::Navigation => Strategy::NavigationWithFallback,
            RouteClass::Other if is_same_origin(&request.url, &self.origin) => Strategy::NetworkFirst,
            RouteClass::Other => Strategy::Bypass,
        }
    }
}
