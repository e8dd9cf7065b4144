//! In-memory index of the designs produced by this process.
//!
//! The index is bounded: once `capacity` ids are held, registering a new id
//! evicts the oldest one. Images on disk are not touched by eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::domain::{DesignId, DesignResult};

/// Ids retained when no capacity is given.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct Entries {
    designs: HashMap<DesignId, Arc<DesignResult>>,
    /// Insertion order of the ids in `designs`, oldest first.
    order: VecDeque<DesignId>,
}

impl Entries {
    fn insert(&mut self, result: Arc<DesignResult>, capacity: usize) {
        let id = result.design_id.clone();
        if self.designs.insert(id.clone(), result).is_none() {
            self.order.push_back(id);
        }
        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.designs.remove(&oldest);
                debug!(design_id = %oldest, "evicted design from registry");
            }
        }
    }
}

/// Results keyed by design id, shared behind `Arc` so lookups never copy.
#[derive(Debug)]
pub struct DesignRegistry {
    entries: RwLock<Entries>,
    capacity: usize,
}

impl Default for DesignRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_REGISTRY_CAPACITY)
    }
}

impl DesignRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding at most `capacity` designs (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record `result`. A result with the same id replaces the earlier one
    /// and keeps its place in the eviction order.
    pub fn register(&self, result: Arc<DesignResult>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(result, self.capacity);
    }

    pub fn register_all<I>(&self, results: I)
    where
        I: IntoIterator<Item = Arc<DesignResult>>,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for result in results {
            entries.insert(result, self.capacity);
        }
    }

    pub fn get(&self, id: &DesignId) -> Option<Arc<DesignResult>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.designs.get(id).cloned()
    }

    pub fn contains(&self, id: &DesignId) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.designs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .designs
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
