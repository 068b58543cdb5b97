//! SQLite-backed versioned cache store.
//!
//! Each generation (release version) owns an isolated set of entries keyed by
//! request identity. This module provides:
//!
//! - The [`CacheStore`] contract used by the lifecycle and routing layers
//! - A SQLite implementation with async access via tokio-rusqlite
//! - SHA-256 request keys
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;
pub use hash::CacheKey;
pub use store::{CacheHandle, CacheStore};
