//! Per-aggregate locks
//!
//! Serialises the read, validate, write, audit sequence for one aggregate
//! key. Unrelated keys never contend. An entry lives only while a guard or a
//! waiter holds it, so the registry stays bounded by in-flight work.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock registry keyed by aggregate
#[derive(Default)]
pub struct AggregateLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive access to one key; releases and prunes the entry on drop
#[derive(Debug)]
pub struct AggregateGuard<'a> {
    registry: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    lock: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for AggregateGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The map and `self.lock` are the only holders left unless someone
        // is queued; the check runs under the shard lock, so a concurrent
        // `acquire` either bumps the count first or creates a fresh entry.
        self.registry.remove_if(&self.key, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        });
    }
}

impl AggregateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn acquire(&self, key: impl Into<String>) -> AggregateGuard<'_> {
        let key = key.into();
        // Clone the Arc out so the shard lock is released before awaiting.
        let lock = self.locks.entry(key.clone()).or_default().clone();
        let guard = lock.clone().lock_owned().await;
        AggregateGuard {
            registry: &self.locks,
            key,
            lock,
            guard: Some(guard),
        }
    }

    pub fn assessment_key(id: &impl std::fmt::Display) -> String {
        format!("assessment:{id}")
    }

    pub fn task_key(id: &impl std::fmt::Display) -> String {
        format!("task:{id}")
    }

    pub fn org_key(id: &impl std::fmt::Display) -> String {
        format!("org:{id}")
    }

    /// Single-flight key for guidance generation, separate from the task key
    pub fn guidance_key(id: &impl std::fmt::Display) -> String {
        format!("guidance:{id}")
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
