//! In-crate fakes for the network and the store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use swcache_core::{CacheDb, CacheHandle, CacheKey, CacheStore, Error, Request, ResponseSnapshot};

use crate::fetch::Network;

/// Scripted network. Unknown URLs answer 404; `set_offline` makes every
/// fetch fail at the transport level.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, (u16, String)>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) -> &Self {
        self.routes.lock().unwrap().insert(url.to_string(), (status, body.to_string()));
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {url}")));
        }

        let route = self.routes.lock().unwrap().get(&url).cloned();
        let (status, body) = route.unwrap_or((404, "not found".to_string()));
        let content_type = if url.ends_with(".json") { "application/json" } else { "text/html" };
        Ok(ResponseSnapshot::new(url, status, body).with_header("Content-Type", content_type))
    }
}

/// SQLite store whose operations can be made to fail on demand.
pub struct FlakyStore {
    pub inner: CacheDb,
    fail_get: AtomicBool,
    fail_put: AtomicBool,
    fail_delete: AtomicBool,
    gets: AtomicUsize,
}

impl FlakyStore {
    pub async fn new() -> Self {
        Self {
            inner: CacheDb::open_in_memory().await.unwrap(),
            fail_get: AtomicBool::new(false),
            fail_put: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            gets: AtomicUsize::new(0),
        }
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Number of `get` calls seen, failed or not.
    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn open(&self, generation: &str) -> Result<CacheHandle, Error> {
        self.inner.open(generation).await
    }

    async fn get(&self, handle: &CacheHandle, key: &CacheKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Error::Storage("store unavailable".into()));
        }
        self.inner.get(handle, key).await
    }

    async fn put(&self, handle: &CacheHandle, key: &CacheKey, response: &ResponseSnapshot) -> Result<(), Error> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(Error::Storage("quota exceeded".into()));
        }
        self.inner.put(handle, key, response).await
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::Storage("store unavailable".into()));
        }
        self.inner.delete(generation).await
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.inner.list_generations().await
    }

    async fn activate(&self, generation: &str) -> Result<(), Error> {
        self.inner.activate(generation).await
    }

    async fn active_generation(&self) -> Result<Option<String>, Error> {
        self.inner.active_generation().await
    }
}
