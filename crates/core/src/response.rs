//! Response snapshots and where a served response came from.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A complete response as received from the network or read from the store.
///
/// Snapshots are replaced whole; nothing updates one field of a stored
/// snapshot in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseSnapshot {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// Which policy branch produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Fresh from the network.
    Network,
    /// Read from the active generation.
    Cache,
    /// The stored offline page.
    OfflinePage,
    /// Built inline because nothing else was available.
    Synthesized,
    /// Not intercepted at all.
    Passthrough,
}

/// A response handed back to the host, tagged with its source.
#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub response: ResponseSnapshot,
    pub source: ResponseSource,
}

impl ServedResponse {
    pub fn new(response: ResponseSnapshot, source: ResponseSource) -> Self {
        Self { response, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(ResponseSnapshot::new("/", 200, "").is_success());
        assert!(ResponseSnapshot::new("/", 204, "").is_success());
        assert!(!ResponseSnapshot::new("/", 304, "").is_success());
        assert!(!ResponseSnapshot::new("/", 500, "").is_success());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let resp = ResponseSnapshot::new("/", 200, "{}").with_header("Content-Type", "application/json");
        assert_eq!(resp.content_type(), Some("application/json"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(resp.header("etag"), None);
    }

    #[test]
    fn test_source_serializes_snake_case() {
        let json = serde_json::to_string(&ResponseSource::OfflinePage).unwrap();
        assert_eq!(json, "\"offline_page\"");
    }
}
