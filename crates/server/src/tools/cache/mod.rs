//! Read-only cache inspection tools.

pub mod entries;
pub mod generations;

pub use entries::{CacheEntriesParams, entries_impl};
pub use generations::generations_impl;
