// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! One instance per type.
//!
//! The cache key is the requested type itself; construction arguments are
//! not part of it. The first `instance::<T>` call builds the value and every
//! later call for `T` returns that same value, even when it passes an
//! initializer that would build something different.
//!
//! Callers that expect argument-sensitive construction must not use this
//! store: a second call with new arguments silently gets the old instance.

use std::any::{type_name, TypeId};
use std::sync::Arc;

use super::keyed::Retention;
use super::typed::{PolicyError, TypedCaches};

/// Type-keyed singleton store.
pub struct SingletonStore {
    slots: TypedCaches,
}

impl SingletonStore {
    /// Store that keeps every instance alive for its own lifetime.
    pub fn new() -> Self {
        Self {
            slots: TypedCaches::new("singleton", Retention::Strong),
        }
    }

    /// Store whose instances live only while callers hold them.
    ///
    /// Once the last handle to an instance is dropped, the next
    /// `instance::<T>` call runs its initializer again.
    pub fn weak() -> Self {
        Self {
            slots: TypedCaches::new("singleton", Retention::Weak),
        }
    }

    pub fn retention(&self) -> Retention {
        self.slots.retention()
    }

    /// Return the instance of `T`, building it with `init` if none is alive.
    ///
    /// `init` is ignored whenever an instance already exists.
    pub fn instance<T, F>(&self, init: F) -> Result<Arc<T>, PolicyError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let slot = self.slots.slot::<T>(TypeId::of::<T>(), type_name::<T>())?;
        Ok(slot.get_or_create((), init))
    }

    /// Current instance of `T`, if one is alive.
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.slots.existing::<T>(TypeId::of::<T>())?.get(&())
    }

    pub fn contains<T>(&self) -> bool
    where
        T: Send + Sync + 'static,
    {
        self.get::<T>().is_some()
    }

    /// Number of types that have ever been requested.
    pub fn type_count(&self) -> usize {
        self.slots.len()
    }
}

impl Default for SingletonStore {
    fn default() -> Self {
        Self::new()
    }
}
