//! Eviction policies for the boundary cache.

/// Chooses which entries to drop when the cache must make room.
pub trait EvictionPolicy {
    /// Pick victims from `keys`, given oldest insertion first.
    fn select_victims(&self, keys: &[String]) -> Vec<String>;
}

/// Drop the oldest `floor(n / 2)` entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OldestHalf;

impl EvictionPolicy for OldestHalf {
    fn select_victims(&self, keys: &[String]) -> Vec<String> {
        keys[..keys.len() / 2].to_vec()
    }
}

/// Drop a fixed number of the oldest entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OldestN(pub usize);

impl EvictionPolicy for OldestN {
    fn select_victims(&self, keys: &[String]) -> Vec<String> {
        keys.iter().take(self.0).cloned().collect()
    }
}
