//! The versioned cache store contract.
//!
//! The lifecycle manager and the routing policy engine only talk to the store
//! through [`CacheStore`], so hosts can plug in a different backend and tests
//! can inject failures.

use async_trait::async_trait;

use super::hash::CacheKey;
use crate::Error;
use crate::response::ResponseSnapshot;

/// An open generation. Reads and writes through a handle target only that
/// generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHandle {
    generation: String,
}

impl CacheHandle {
    pub fn new(generation: impl Into<String>) -> Self {
        Self { generation: generation.into() }
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }
}

/// Generation-tagged key-value store of response snapshots.
///
/// `get` must never touch the network. `put` replaces any entry for the key
/// whole. `put` and `delete` may fail with a storage error; callers on the
/// request path log and continue.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open (creating if needed) the store for a generation.
    async fn open(&self, generation: &str) -> Result<CacheHandle, Error>;

    async fn get(&self, handle: &CacheHandle, key: &CacheKey) -> Result<Option<ResponseSnapshot>, Error>;

    async fn put(&self, handle: &CacheHandle, key: &CacheKey, response: &ResponseSnapshot) -> Result<(), Error>;

    /// Delete a generation and all its entries. Returns whether it existed.
    async fn delete(&self, generation: &str) -> Result<bool, Error>;

    /// All stored generation labels, oldest first.
    async fn list_generations(&self) -> Result<Vec<String>, Error>;

    /// Make `generation` the only active one. Fails if it is not stored.
    async fn activate(&self, generation: &str) -> Result<(), Error>;

    /// The generation that serves requests, shared by every worker on this
    /// store.
    async fn active_generation(&self) -> Result<Option<String>, Error>;
}

#[async_trait]
impl<S: CacheStore + ?Sized> CacheStore for std::sync::Arc<S> {
    async fn open(&self, generation: &str) -> Result<CacheHandle, Error> {
        (**self).open(generation).await
    }

    async fn get(&self, handle: &CacheHandle, key: &CacheKey) -> Result<Option<ResponseSnapshot>, Error> {
        (**self).get(handle, key).await
    }

    async fn put(&self, handle: &CacheHandle, key: &CacheKey, response: &ResponseSnapshot) -> Result<(), Error> {
        (**self).put(handle, key, response).await
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        (**self).delete(generation).await
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        (**self).list_generations().await
    }

    async fn activate(&self, generation: &str) -> Result<(), Error> {
        (**self).activate(generation).await
    }

    async fn active_generation(&self) -> Result<Option<String>, Error> {
        (**self).active_generation().await
    }
}

#[async_trait]
impl CacheStore for super::CacheDb {
    async fn open(&self, generation: &str) -> Result<CacheHandle, Error> {
        if self.create_generation(generation).await? {
            tracing::debug!(generation, "created cache generation");
        }
        Ok(CacheHandle::new(generation))
    }

    async fn get(&self, handle: &CacheHandle, key: &CacheKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.get_entry(handle.generation(), key).await
    }

    async fn put(&self, handle: &CacheHandle, key: &CacheKey, response: &ResponseSnapshot) -> Result<(), Error> {
        self.put_entry(handle.generation(), key, response).await
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        self.delete_generation(generation).await
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.list_generation_labels().await
    }

    async fn activate(&self, generation: &str) -> Result<(), Error> {
        self.activate_generation(generation).await?;
        tracing::debug!(generation, "marked generation active");
        Ok(())
    }

    async fn active_generation(&self) -> Result<Option<String>, Error> {
        self.active_generation_label().await
    }
}
