// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-type cache slots shared by the singleton stores.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use super::keyed::{CacheConfig, KeyedCache, Retention};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The slot registered for a type holds a different value type.
    /// Indicates a bug in the store, never a caller mistake.
    #[error("Singleton slot for {type_name} holds an unexpected value type")]
    TypeMismatch { type_name: &'static str },
}

/// One single-entry `KeyedCache` per `TypeId`, created on first use.
pub(crate) struct TypedCaches {
    caches: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
    retention: Retention,
    label: &'static str,
}

impl TypedCaches {
    pub(crate) fn new(label: &'static str, retention: Retention) -> Self {
        Self {
            caches: DashMap::new(),
            retention,
            label,
        }
    }

    pub(crate) fn retention(&self) -> Retention {
        self.retention
    }

    /// Fetch the cache slot registered under `id`, creating it on first use.
    pub(crate) fn slot<V>(
        &self,
        id: TypeId,
        type_name: &'static str,
    ) -> Result<Arc<KeyedCache<(), V>>, PolicyError>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        let entry = self.caches.entry(id).or_insert_with(|| {
            let config = CacheConfig {
                name: format!("{}:{}", self.label, type_name),
                retention: self.retention,
            };
            Box::new(Arc::new(KeyedCache::<(), V>::with_config(config))) as Box<dyn Any + Send + Sync>
        });
        (**entry)
            .downcast_ref::<Arc<KeyedCache<(), V>>>()
            .cloned()
            .ok_or(PolicyError::TypeMismatch { type_name })
    }

    /// Fetch the cache slot under `id` only if one exists.
    pub(crate) fn existing<V>(&self, id: TypeId) -> Option<Arc<KeyedCache<(), V>>>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        let entry = self.caches.get(&id)?;
        (**entry).downcast_ref::<Arc<KeyedCache<(), V>>>().cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.caches.len()
    }
}
