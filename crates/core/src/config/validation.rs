//! Configuration validation rules.
//!
//! Checks `WorkerConfig` values after they have been loaded from
//! environment, files, or defaults.

use crate::config::WorkerConfig;
use regex::Regex;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `generation` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `origin` is not a bare http(s) origin
    /// - `base_path` or any manifest path is malformed
    /// - a route pattern does not compile
    /// - `timeout_ms` or `max_bytes` is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "generation".into(),
                hint: "Set SWCACHE_GENERATION to the release version".into(),
            });
        }
        if self.generation.chars().any(char::is_whitespace) {
            return Err(invalid("generation", "must not contain whitespace"));
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme())));
        }
        if origin.path() != "/" || origin.query().is_some() {
            return Err(invalid("origin", "must not carry a path or query; use base_path"));
        }

        if !self.base_path.is_empty() && (!is_site_path(&self.base_path) || self.base_path.ends_with('/')) {
            return Err(invalid("base_path", "must start with a single '/' and not end with '/'"));
        }

        for path in self.precache.iter().chain(&self.data_urls).chain(&self.offline_page) {
            if !is_site_path(path) {
                return Err(invalid("precache", format!("path must start with a single '/': {path}")));
            }
        }

        for (field, patterns) in [("asset_patterns", &self.asset_patterns), ("data_patterns", &self.data_patterns)] {
            for pattern in patterns {
                Regex::new(pattern).map_err(|e| invalid(field, e.to_string()))?;
            }
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if let Some(offline) = &self.offline_page
            && !self.precache.contains(offline)
        {
            tracing::warn!(
                offline_page = %offline,
                "offline_page is not in the precache manifest; it will only be served once fetched"
            );
        }

        Ok(())
    }
}

/// Rooted on the site. `//host/x` and `/\\host/x` are scheme-relative and
/// would resolve onto another host.
fn is_site_path(path: &str) -> bool {
    path.starts_with('/') && !matches!(path.as_bytes().get(1), Some(b'/' | b'\\'))
}
