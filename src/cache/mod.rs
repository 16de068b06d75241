// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Identity-managed instance caching.
//!
//! [`KeyedCache`] is the general get-or-create cache keyed by any hashable
//! key, typically a [`CacheKey`] built from construction arguments.
//! [`SingletonStore`] and [`FamilyStore`] collapse the key to a type or to a
//! declared family of types.

mod family;
mod key;
mod keyed;
mod singleton;
mod typed;

pub use family::{Family, FamilyInstance, FamilyMember, FamilyStore};
pub use key::{CacheKey, KeyValue};
pub use keyed::{CacheConfig, CacheStats, KeyedCache, Retention};
pub use singleton::SingletonStore;
pub use typed::PolicyError;
