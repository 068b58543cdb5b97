//! Worker configuration with layered loading.
//!
//! The lifecycle manager and routing engine take a [`WorkerConfig`] at
//! construction and never read the environment themselves. Hosts that want
//! file or environment overrides use [`WorkerConfig::load`], which layers
//! sources with figment:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Immutable configuration for one deployed generation.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Generation identifier. Changed by the deploy process on every release.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Origin the site is served from (scheme, host and port only).
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path prefix the site lives under, e.g. `/my-site`. Empty for the root.
    #[serde(default)]
    pub base_path: String,

    /// Core precache manifest. Every path must be fetched for install to succeed.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Data endpoints known at build time. Populated lazily by the
    /// dynamic-data route unless `precache_data` is set.
    #[serde(default)]
    pub data_urls: Vec<String>,

    /// Also fetch `data_urls` at install, best effort.
    #[serde(default)]
    pub precache_data: bool,

    /// Stored page served to navigations when the network is down.
    #[serde(default = "default_offline_page")]
    pub offline_page: Option<String>,

    /// Regexes over the URL path selecting cache-first static assets.
    #[serde(default = "default_asset_patterns")]
    pub asset_patterns: Vec<String>,

    /// Regexes over the URL path selecting network-first data endpoints.
    #[serde(default = "default_data_patterns")]
    pub data_patterns: Vec<String>,

    /// Serve a stored copy of the requested page before the offline page.
    #[serde(default)]
    pub serve_cached_navigation: bool,

    /// Ask for immediate promotion once install succeeds.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Take control of already-open pages on activation.
    #[serde(default = "default_true")]
    pub claim_clients: bool,

    /// Path to the SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body bytes accepted from the network.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_generation() -> String {
    "site-v1".into()
}

fn default_origin() -> String {
    "http://localhost:8000".into()
}

fn default_precache() -> Vec<String> {
    vec!["/".into(), "/offline.html".into()]
}

fn default_offline_page() -> Option<String> {
    Some("/offline.html".into())
}

fn default_asset_patterns() -> Vec<String> {
    vec![
        "/assets/".into(),
        r"/favicon[^/]*$".into(),
        r"\.webmanifest$".into(),
        r"/manifest\.json$".into(),
    ]
}

fn default_data_patterns() -> Vec<String> {
    vec![r"\.json$".into()]
}

fn default_true() -> bool {
    true
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            generation: default_generation(),
            origin: default_origin(),
            base_path: String::new(),
            precache: default_precache(),
            data_urls: Vec::new(),
            precache_data: false,
            offline_page: default_offline_page(),
            asset_patterns: default_asset_patterns(),
            data_patterns: default_data_patterns(),
            serve_cached_navigation: false,
            skip_waiting: true,
            claim_clients: true,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

/// Precache manifest resolved to absolute URLs, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheManifest {
    /// Must all succeed for install to succeed.
    pub core: Vec<Url>,
    /// Known data endpoints; precached best effort when enabled.
    pub data: Vec<Url>,
}

impl WorkerConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The parsed origin.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Resolve a site-relative path (e.g. `/offline.html`) under the origin
    /// and base path.
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        let origin = self.origin_url()?;
        let url = origin
            .join(&format!("{}{}", self.base_path, path))
            .map_err(|e| ConfigError::Invalid { field: "path".into(), reason: format!("{path}: {e}") })?;
        if url.origin() != origin.origin() {
            let reason = format!("{path}: leaves the site origin");
            return Err(ConfigError::Invalid { field: "path".into(), reason });
        }
        Ok(url)
    }

    pub fn manifest(&self) -> Result<PrecacheManifest, ConfigError> {
        let core = self.precache.iter().map(|p| self.resolve(p)).collect::<Result<_, _>>()?;
        let data = self.data_urls.iter().map(|p| self.resolve(p)).collect::<Result<_, _>>()?;
        Ok(PrecacheManifest { core, data })
    }

    pub fn offline_page_url(&self) -> Result<Option<Url>, ConfigError> {
        self.offline_page.as_deref().map(|p| self.resolve(p)).transpose()
    }
}
