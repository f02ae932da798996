//! Session-scoped boundary cache.
//!
//! - `store`: storage backends ([`KeyValueStore`], [`MemoryStore`])
//! - `policy`: eviction policies
//! - `boundary`: the cache itself and its key function

mod boundary;
mod policy;
mod store;

pub use boundary::{BoundaryCache, CacheStats, PutOutcome, cache_key};
pub use policy::{EvictionPolicy, OldestHalf, OldestN};
pub use store::{KeyValueStore, MemoryStore, StorageError};
