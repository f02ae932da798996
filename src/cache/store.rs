//! Key-value storage backends for the boundary cache.

use indexmap::IndexMap;

use crate::constants::DEFAULT_MEMORY_QUOTA_BYTES;

/// Storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The store refused a write because it is full
    #[error("Storage quota exceeded")]
    QuotaExceeded,

    /// The store could not be accessed
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Session-scoped string store, modelled on the web `Storage` interface.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;

    /// All keys, oldest insertion first.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-memory store with a byte quota over keys and values.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    items: IndexMap<String, String>,
    quota_bytes: usize,
    used_bytes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_MEMORY_QUOTA_BYTES)
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: IndexMap::new(),
            quota_bytes,
            used_bytes: 0,
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn quota_bytes(&self) -> usize {
        self.quota_bytes
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let replaced = self
            .items
            .get(key)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);
        let needed = self.used_bytes - replaced + key.len() + value.len();
        if needed > self.quota_bytes {
            return Err(StorageError::QuotaExceeded);
        }
        self.items.insert(key.to_string(), value.to_string());
        self.used_bytes = needed;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if let Some(old) = self.items.shift_remove(key) {
            self.used_bytes -= key.len() + old.len();
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_counts_keys_and_values() {
        let mut store = MemoryStore::with_quota(10);
        store.set_item("ab", "cdef").expect("fits");
        assert_eq!(store.used_bytes(), 6);
        assert_eq!(store.set_item("gh", "ijk"), Err(StorageError::QuotaExceeded));
        assert_eq!(store.len(), 1);

        // Overwriting only pays for the difference
        store.set_item("ab", "cdefghij").expect("fits after replace");
        assert_eq!(store.used_bytes(), 10);
    }

    #[test]
    fn test_remove_frees_space_and_keeps_order() {
        let mut store = MemoryStore::new();
        for key in ["a", "b", "c"] {
            store.set_item(key, "1").expect("fits");
        }
        store.remove_item("b").expect("removes");
        store.remove_item("missing").expect("no-op");
        assert_eq!(store.keys(), Ok(vec!["a".to_string(), "c".to_string()]));
        assert_eq!(store.used_bytes(), 4);
    }
}
