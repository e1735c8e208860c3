//! Local cache and tombstone layer in front of the remote product API.
//!
//! This module provides:
//! - Cache key derivation from query state (by id, by category, by page)
//! - Read-through/write-through against a pluggable key-value store
//! - Tombstones so deleted entities stay hidden behind cache hits
//! - Best-effort repair of every overlapping entry on delete

mod keys;
mod layer;
mod storage;
mod traits;

pub use keys::{CatalogQuery, RemoteRequest};
pub use layer::{CacheSettings, InvalidationScope, ProductCache};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use traits::{CacheResult, CacheSource, Cacheable, LookupError};
