// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Table declarations loaded from a TOML schema file.
//!
//! ```toml
//! [[table]]
//! name = "events"
//! partition_by = "created"
//! partition_type = "RANGE"
//!
//! [[table]]
//! name = "messages"
//! partition_by = "created"
//! subpartition_by = "region"
//! subpartition_type = "LIST"
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::node::PartitionNode;
use super::strategy::{PartitionKind, PartitionStrategy};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read schema file: {0}")]
    Read(String),

    #[error("Invalid schema file: {0}")]
    Parse(String),

    #[error("Invalid table {table}: {reason}")]
    InvalidTable { table: String, reason: String },
}

fn default_kind() -> PartitionKind {
    PartitionKind::Range
}

/// One partitioned table declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    /// Column the table is partitioned on.
    pub partition_by: String,
    #[serde(default = "default_kind")]
    pub partition_type: PartitionKind,
    /// Column each partition is itself partitioned on, if any.
    #[serde(default)]
    pub subpartition_by: Option<String>,
    #[serde(default)]
    pub subpartition_type: Option<PartitionKind>,
}

impl TableDef {
    pub fn strategy(&self) -> PartitionStrategy {
        PartitionStrategy {
            kind: self.partition_type,
            column: self.partition_by.clone(),
        }
    }

    /// Strategy for partitions of this table, defaulting the kind to RANGE.
    pub fn sub_strategy(&self) -> Option<PartitionStrategy> {
        self.subpartition_by.as_ref().map(|column| PartitionStrategy {
            kind: self.subpartition_type.unwrap_or(PartitionKind::Range),
            column: column.clone(),
        })
    }

    /// Declare the root node for this table.
    pub fn declare(&self) -> Arc<PartitionNode> {
        PartitionNode::root(self.name.clone(), self.strategy())
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidTable {
            table: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if self.partition_by.trim().is_empty() {
            return Err(invalid("partition_by cannot be empty"));
        }
        if self.subpartition_type.is_some() && self.subpartition_by.is_none() {
            return Err(invalid("subpartition_type requires subpartition_by"));
        }
        Ok(())
    }
}

/// Parsed schema file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(rename = "table", default)]
    pub tables: Vec<TableDef>,
}

impl SchemaFile {
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Read(e.to_string()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, SchemaError> {
        let schema: SchemaFile =
            toml::from_str(content).map_err(|e| SchemaError::Parse(e.to_string()))?;
        for table in &schema.tables {
            table.validate()?;
        }
        Ok(schema)
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }
}
