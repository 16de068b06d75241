// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Identity-managed instance cache and lazy monthly partition registry.
//!
//! # Components
//!
//! - [`cache::KeyedCache`]: get-or-create keyed by construction arguments,
//!   with non-owning entries
//! - [`cache::SingletonStore`]: one instance per type
//! - [`cache::FamilyStore`]: one instance per declared family of types
//! - [`partition::range_for`]: `YYYYMM` label to half-open month range
//! - [`partition::PartitionRegistry`]: exactly-once partition attachment,
//!   reported to an external [`partition::SchemaExecutor`]
//!
//! The crate never executes DDL. It decides which partitions must exist,
//! computes their bounds and hands statements to the executor.

pub mod cache;
pub mod cli;
pub mod config;
pub mod partition;
pub mod telemetry;

pub use cache::{CacheKey, FamilyStore, KeyedCache, SingletonStore};
pub use partition::{
    range_for, PartitionError, PartitionLabel, PartitionNode, PartitionRange, PartitionRegistry,
    PartitionStrategy, SchemaExecutor,
};
