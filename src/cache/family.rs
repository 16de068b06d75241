// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! One instance per family of related types.
//!
//! Each member type names its family explicitly through
//! [`FamilyMember::Family`]. All members of a family resolve to a single
//! shared instance, typed as the family's interface; its concrete type is
//! whichever member asked first. Later members get that instance back and
//! their initializers are never run.
//!
//! Typical use is a capability with several mutually exclusive backends of
//! which only one may be active per store.

use std::any::{type_name, TypeId};
use std::sync::Arc;

use super::keyed::Retention;
use super::typed::{PolicyError, TypedCaches};

/// Marker for a family. `Instance` is the interface every member shares,
/// usually a trait object.
pub trait Family: 'static {
    type Instance: ?Sized + Send + Sync + 'static;
}

/// A concrete type that belongs to exactly one family.
pub trait FamilyMember: Sized + 'static {
    type Family: Family;

    /// Wrap `self` as the family's shared interface.
    fn into_instance(self) -> Arc<<Self::Family as Family>::Instance>;
}

/// Shared interface type a member resolves to.
pub type FamilyInstance<M> = <<M as FamilyMember>::Family as Family>::Instance;

/// Family-keyed singleton store.
pub struct FamilyStore {
    slots: TypedCaches,
}

impl FamilyStore {
    /// Store that keeps every family instance alive for its own lifetime,
    /// so the first member to ask stays the active one.
    pub fn new() -> Self {
        Self {
            slots: TypedCaches::new("family", Retention::Strong),
        }
    }

    /// Store whose family instances live only while callers hold them.
    /// After the last handle is dropped any member may become active again.
    pub fn weak() -> Self {
        Self {
            slots: TypedCaches::new("family", Retention::Weak),
        }
    }

    pub fn retention(&self) -> Retention {
        self.slots.retention()
    }

    /// Return the family instance for `M`, building it from `init` if the
    /// family has no live instance yet.
    pub fn instance<M, F>(&self, init: F) -> Result<Arc<FamilyInstance<M>>, PolicyError>
    where
        M: FamilyMember,
        F: FnOnce() -> M,
    {
        let slot = self
            .slots
            .slot::<FamilyInstance<M>>(TypeId::of::<M::Family>(), type_name::<M::Family>())?;
        Ok(slot.get_or_insert_with((), || init().into_instance()))
    }

    /// Current instance of family `F`, if one is alive.
    pub fn get<F: Family>(&self) -> Option<Arc<F::Instance>> {
        self.slots.existing::<F::Instance>(TypeId::of::<F>())?.get(&())
    }

    /// Number of families that have ever been requested.
    pub fn family_count(&self) -> usize {
        self.slots.len()
    }
}

impl Default for FamilyStore {
    fn default() -> Self {
        Self::new()
    }
}
