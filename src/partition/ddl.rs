// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Schema instructions handed to the executor.

use serde::{Deserialize, Serialize};

use super::strategy::PartitionBounds;

/// When a deferred statement becomes runnable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DdlEvent {
    /// Once the parent table of the statement's partition exists.
    AfterParentCreated,
}

/// One unit of work for the schema executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaInstruction {
    /// `child` must not be created before `parent`.
    Dependency { child: String, parent: String },
    /// `table` must be created as a partitioned table, e.g. with
    /// `partition_by = "LIST (region)"`.
    PartitionedBy { table: String, partition_by: String },
    /// Statement to run once `event` has happened.
    DeferredDdl { event: DdlEvent, statement: String },
}

impl SchemaInstruction {
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::DeferredDdl { statement, .. } => Some(statement),
            Self::Dependency { .. } | Self::PartitionedBy { .. } => None,
        }
    }
}

/// `ALTER TABLE parent ATTACH PARTITION child` followed by the bound clause.
pub fn attach_statement(parent: &str, child: &str, bounds: &PartitionBounds) -> String {
    format!(
        "ALTER TABLE {} ATTACH PARTITION {}\n{};",
        parent,
        child,
        bounds.clause()
    )
}
