// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Partitioning strategy descriptors and bound clauses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::LabelError;
use super::label::{validate_list_value, PartitionLabel};
use super::range::PartitionRange;

/// How a table splits its rows across partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartitionKind {
    /// One partition per calendar month, labelled `YYYYMM`.
    Range,
    /// One partition per discrete column value, labelled by the value.
    List,
}

impl PartitionKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Range => "RANGE",
            Self::List => "LIST",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for PartitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RANGE" => Ok(Self::Range),
            "LIST" => Ok(Self::List),
            other => Err(format!("unknown partition kind: {}", other)),
        }
    }
}

/// Partitioning scheme of a table: the kind and the column it keys on.
/// The column is passed through as given; its existence is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionStrategy {
    pub kind: PartitionKind,
    pub column: String,
}

impl PartitionStrategy {
    pub fn range(column: impl Into<String>) -> Self {
        Self {
            kind: PartitionKind::Range,
            column: column.into(),
        }
    }

    pub fn list(column: impl Into<String>) -> Self {
        Self {
            kind: PartitionKind::List,
            column: column.into(),
        }
    }

    /// Clause the partitioned table is declared with, e.g. `RANGE (created)`.
    pub fn partition_by_clause(&self) -> String {
        format!("{} ({})", self.kind.as_sql(), self.column)
    }

    /// Validate `label` for this strategy and compute its bounds.
    pub fn bounds_for(&self, label: &str) -> Result<PartitionBounds, LabelError> {
        match self.kind {
            PartitionKind::Range => {
                let label = PartitionLabel::parse(label)?;
                Ok(PartitionBounds::Range(label.range()))
            }
            PartitionKind::List => {
                validate_list_value(label)?;
                Ok(PartitionBounds::List {
                    values: vec![label.to_string()],
                })
            }
        }
    }
}

/// Bounds of one attached partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PartitionBounds {
    Range(PartitionRange),
    List { values: Vec<String> },
}

impl PartitionBounds {
    /// The `FOR VALUES ...` clause of an attach statement.
    pub fn clause(&self) -> String {
        match self {
            Self::Range(range) => range.bound_clause(),
            Self::List { values } => {
                let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
                format!("FOR VALUES IN ({})", quoted.join(", "))
            }
        }
    }

    pub fn range(&self) -> Option<PartitionRange> {
        match self {
            Self::Range(range) => Some(*range),
            Self::List { .. } => None,
        }
    }
}
