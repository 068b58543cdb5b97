//! Intercepted request model.

use http::Method;
use url::Url;

use crate::Error;

/// How the host issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// A full-page load.
    Navigate,
    /// A subresource load: script, image, fetch.
    #[default]
    SameOrigin,
}

/// A request intercepted on its way to the network.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    /// The page context that issued the request, if known.
    pub client_id: Option<String>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, mode: RequestMode::default(), headers: Vec::new(), client_id: None }
    }

    /// Build a GET request from a URL string.
    pub fn get(url: &str) -> Result<Self, Error> {
        Ok(Self::new(Method::GET, parse_url(url)?))
    }

    /// Build a navigation (full-page load) request from a URL string.
    pub fn navigate(url: &str) -> Result<Self, Error> {
        Ok(Self { mode: RequestMode::Navigate, ..Self::get(url)? })
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Whether the method is one the store may hold. The host cache API only
    /// stores GET, so HEAD and everything else bypass.
    pub fn is_retrieval(&self) -> bool {
        self.method == Method::GET
    }
}

/// Parse a method name as sent by a host (case-insensitive).
pub fn parse_method(name: &str) -> Result<Method, Error> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes())
        .map_err(|e| Error::InvalidInput(format!("invalid method {name:?}: {e}")))
}

fn parse_url(input: &str) -> Result<Url, Error> {
    Url::parse(input.trim()).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))
}
