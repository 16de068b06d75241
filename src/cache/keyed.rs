// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Get-or-create cache with non-owning entries.
//!
//! Entries hold a `Weak` handle by default, so the cache never decides how
//! long a value lives: once every caller drops its `Arc`, the entry is dead
//! and the next lookup builds a fresh value. Dead entries are evicted lazily
//! on lookup or in bulk by [`KeyedCache::sweep`].
//!
//! Construction is atomic per key. The first caller on a fresh key marks it
//! in progress and runs its factory outside the map lock; concurrent callers
//! for the same key block on that marker and receive the winner's value from
//! it directly. A factory must not request its own key; doing so panics
//! instead of waiting on itself.
//!
//! A hit never invokes the factory. Whatever a redundant caller would have
//! constructed with is ignored, so changing arguments on a repeat call with
//! the same key has no effect on the returned value.

use std::convert::Infallible;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};

use crate::telemetry;

/// How the cache holds on to the values it hands out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Retention {
    /// Non-owning entries; values live only as long as callers keep them.
    #[default]
    Weak,
    /// Owning entries; values stay alive until removed from the cache.
    Strong,
}

/// Configuration for a keyed cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Label attached to log events and metrics.
    pub name: String,
    pub retention: Retention,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            retention: Retention::Weak,
        }
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct StatCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

enum Held<V: ?Sized> {
    Weak(Weak<V>),
    Strong(Arc<V>),
}

impl<V: ?Sized> Held<V> {
    fn new(value: &Arc<V>, retention: Retention) -> Self {
        match retention {
            Retention::Weak => Self::Weak(Arc::downgrade(value)),
            Retention::Strong => Self::Strong(value.clone()),
        }
    }

    fn upgrade(&self) -> Option<Arc<V>> {
        match self {
            Self::Weak(weak) => weak.upgrade(),
            Self::Strong(strong) => Some(strong.clone()),
        }
    }

    fn is_alive(&self) -> bool {
        match self {
            Self::Weak(weak) => weak.strong_count() > 0,
            Self::Strong(_) => true,
        }
    }
}

/// In-progress marker for a key whose factory is running.
///
/// The owner publishes its value here before waking waiters, so a waiter
/// gets the winning value even if every other handle to it is gone by the
/// time it wakes.
struct Pending<V: ?Sized> {
    outcome: Mutex<Outcome<V>>,
    cond: Condvar,
    owner: ThreadId,
}

enum Outcome<V: ?Sized> {
    Running,
    Built(Arc<V>),
    Abandoned,
}

impl<V: ?Sized> Pending<V> {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(Outcome::Running),
            cond: Condvar::new(),
            owner: thread::current().id(),
        }
    }

    /// Block until the owner settles. `None` means the factory failed and
    /// the caller must claim again.
    fn wait(&self) -> Option<Arc<V>> {
        let mut outcome = self.outcome.lock();
        loop {
            match &*outcome {
                Outcome::Built(value) => return Some(value.clone()),
                Outcome::Abandoned => return None,
                Outcome::Running => {}
            }
            self.cond.wait(&mut outcome);
        }
    }

    /// Record the outcome unless one is already recorded, then wake waiters.
    fn settle(&self, result: Outcome<V>) {
        let mut outcome = self.outcome.lock();
        if matches!(*outcome, Outcome::Running) {
            *outcome = result;
        }
        drop(outcome);
        self.cond.notify_all();
    }
}

enum Slot<V: ?Sized> {
    Live(Held<V>),
    Pending(Arc<Pending<V>>),
}

impl<V: ?Sized> Slot<V> {
    fn is_pending(&self, marker: &Arc<Pending<V>>) -> bool {
        matches!(self, Slot::Pending(p) if Arc::ptr_eq(p, marker))
    }
}

enum Claim<V: ?Sized> {
    Hit(Arc<V>),
    Owner(Arc<Pending<V>>),
}

/// Thread-safe get-or-create cache keyed by `K`.
pub struct KeyedCache<K, V: ?Sized> {
    entries: DashMap<K, Slot<V>>,
    config: CacheConfig,
    stats: StatCounters,
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: ?Sized + Send + Sync,
{
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            stats: StatCounters::default(),
        }
    }

    pub fn retention(&self) -> Retention {
        self.config.retention
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Return the live value for `key`, or store and return `factory()`.
    ///
    /// # Panics
    ///
    /// Panics if `factory` itself requests `key` from this cache.
    pub fn get_or_insert_with<F>(&self, key: K, factory: F) -> Arc<V>
    where
        F: FnOnce() -> Arc<V>,
    {
        match self.get_or_try_insert_with(key, || Ok::<_, Infallible>(factory())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`get_or_insert_with`](Self::get_or_insert_with).
    ///
    /// A factory error is returned to this caller unchanged and nothing is
    /// stored. Callers that were waiting on this attempt retry with their own
    /// factory.
    pub fn get_or_try_insert_with<F, E>(&self, key: K, factory: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<Arc<V>, E>,
    {
        let pending = match self.claim(&key) {
            Claim::Hit(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                telemetry::record_cache_hit(&self.config.name);
                return Ok(value);
            }
            Claim::Owner(pending) => pending,
        };

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        telemetry::record_cache_miss(&self.config.name);
        tracing::debug!(cache = %self.config.name, "instance cache miss, constructing");

        let guard = PendingGuard {
            cache: self,
            key,
            pending,
        };
        let value = factory()?;
        guard.complete(&value);
        Ok(value)
    }

    /// Look up a live value without constructing. Dead entries are evicted.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let found = match self.entries.get(key)?.value() {
            Slot::Live(held) => held.upgrade(),
            Slot::Pending(_) => return None,
        };
        if found.is_none() {
            self.evict_dead(key);
        }
        found
    }

    /// Drop the entry for `key`. In-progress constructions are left alone.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.entries
            .remove_if(key, |_, slot| matches!(slot, Slot::Live(_)))
            .and_then(|(_, slot)| match slot {
                Slot::Live(held) => held.upgrade(),
                Slot::Pending(_) => None,
            })
    }

    /// Evict every dead entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, slot| match slot {
            Slot::Live(held) => held.is_alive(),
            Slot::Pending(_) => true,
        });
        let removed = before.saturating_sub(self.entries.len());
        self.stats
            .evictions
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Number of entries, including dead ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose value is still alive.
    pub fn live_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.value(), Slot::Live(held) if held.is_alive()))
            .count()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
        }
    }

    /// Resolve `key` to a live value or to ownership of its construction,
    /// waiting out any construction already in progress.
    ///
    /// # Panics
    ///
    /// Panics if called from inside the factory that is constructing `key`,
    /// which would otherwise wait on itself forever.
    fn claim(&self, key: &K) -> Claim<V> {
        loop {
            let in_progress = match self.entries.entry(key.clone()) {
                Entry::Occupied(mut occupied) => {
                    let state = match occupied.get() {
                        Slot::Live(held) => Ok(held.upgrade()),
                        Slot::Pending(pending) => Err(pending.clone()),
                    };
                    match state {
                        Ok(Some(value)) => return Claim::Hit(value),
                        Ok(None) => {
                            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                            let pending = Arc::new(Pending::new());
                            occupied.insert(Slot::Pending(pending.clone()));
                            return Claim::Owner(pending);
                        }
                        Err(pending) => pending,
                    }
                }
                Entry::Vacant(vacant) => {
                    let pending = Arc::new(Pending::new());
                    vacant.insert(Slot::Pending(pending.clone()));
                    return Claim::Owner(pending);
                }
            };
            // Shard lock is released here.
            if in_progress.owner == thread::current().id() {
                panic!(
                    "cache `{}`: factory re-entered construction of its own key",
                    self.config.name
                );
            }
            if let Some(value) = in_progress.wait() {
                return Claim::Hit(value);
            }
        }
    }

    fn evict_dead(&self, key: &K) {
        let removed = self
            .entries
            .remove_if(key, |_, slot| matches!(slot, Slot::Live(held) if !held.is_alive()));
        if removed.is_some() {
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl<K, V> Default for KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: ?Sized + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Owns an in-progress marker. Completing publishes the value to waiters;
/// dropping without completing (factory error or panic) removes the marker
/// and sends waiters back to claim the key themselves.
struct PendingGuard<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: ?Sized + Send + Sync,
{
    cache: &'a KeyedCache<K, V>,
    key: K,
    pending: Arc<Pending<V>>,
}

impl<'a, K, V> PendingGuard<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: ?Sized + Send + Sync,
{
    fn complete(self, value: &Arc<V>) {
        if let Some(mut slot) = self.cache.entries.get_mut(&self.key) {
            if slot.is_pending(&self.pending) {
                *slot = Slot::Live(Held::new(value, self.cache.config.retention));
            }
        }
        self.pending.settle(Outcome::Built(value.clone()));
    }
}

impl<'a, K, V> Drop for PendingGuard<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: ?Sized + Send + Sync,
{
    fn drop(&mut self) {
        let marker = &self.pending;
        self.cache
            .entries
            .remove_if(&self.key, |_, slot| slot.is_pending(marker));
        self.pending.settle(Outcome::Abandoned);
    }
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Send + Sync,
{
    /// Return the live value for `key`, or construct one with `factory`.
    pub fn get_or_create<F>(&self, key: K, factory: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        self.get_or_insert_with(key, || Arc::new(factory()))
    }

    /// Like [`get_or_create`](Self::get_or_create) with a fallible factory.
    pub fn get_or_try_create<F, E>(&self, key: K, factory: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        self.get_or_try_insert_with(key, || factory().map(Arc::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_retention_keeps_value_alive() {
        let cache: KeyedCache<u32, String> = KeyedCache::with_config(CacheConfig {
            name: "pinned".into(),
            retention: Retention::Strong,
        });
        drop(cache.get_or_create(1, || "first".to_string()));
        let again = cache.get_or_create(1, || "second".to_string());
        assert_eq!(again.as_str(), "first");
        assert_eq!(cache.live_len(), 1);
    }

    #[test]
    fn test_get_evicts_dead_entry() {
        let cache: KeyedCache<u32, String> = KeyedCache::new();
        drop(cache.get_or_create(1, || "gone".to_string()));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&1).is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_factory_panic_leaves_no_marker() {
        let cache: KeyedCache<u32, String> = KeyedCache::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get_or_create(9, || panic!("factory blew up"));
        }));
        assert!(result.is_err());
        assert!(cache.is_empty());
        let value = cache.get_or_create(9, || "recovered".to_string());
        assert_eq!(value.as_str(), "recovered");
    }

    #[test]
    fn test_reentrant_factory_panics_instead_of_hanging() {
        let cache: KeyedCache<u32, String> = KeyedCache::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get_or_create(3, || {
                let inner = cache.get_or_create(3, || "inner".to_string());
                inner.as_str().to_owned()
            });
        }));
        assert!(result.is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_create(3, || "outer".to_string()).as_str(), "outer");
    }

    #[test]
    fn test_other_key_inside_factory_is_allowed() {
        let cache: KeyedCache<u32, String> = KeyedCache::with_config(CacheConfig {
            name: "nested".into(),
            retention: Retention::Strong,
        });
        let outer = cache.get_or_create(1, || {
            let inner = cache.get_or_create(2, || "two".to_string());
            format!("one+{}", inner)
        });
        assert_eq!(outer.as_str(), "one+two");
        assert_eq!(cache.len(), 2);
    }
}
