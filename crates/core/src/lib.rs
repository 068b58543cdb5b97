//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - The versioned cache store contract and its SQLite backend
//! - Request, response and generation data model
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod request;
pub mod response;

pub use cache::{CacheDb, CacheHandle, CacheKey, CacheStore, CachedEntry};
pub use config::{ConfigError, PrecacheManifest, WorkerConfig};
pub use error::Error;
pub use generation::GenerationState;
pub use request::{Request, RequestMode};
pub use response::{ResponseSnapshot, ResponseSource, ServedResponse};
