// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Partition error types.
//!
//! Every error here is reported before any state changes: a failed
//! `ensure_partition` leaves the table's children exactly as it found them.

use thiserror::Error;

/// Why a partition label was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("label {label:?} must be exactly 6 characters (YYYYMM), got {len}")]
    WrongLength { label: String, len: usize },

    #[error("label {label:?} must contain only ASCII digits")]
    NotNumeric { label: String },

    #[error("label {label:?} has month {month:02}, expected 01-12")]
    MonthOutOfRange { label: String, month: u32 },

    #[error("label {label:?} falls outside the representable calendar")]
    Unrepresentable { label: String },

    #[error("list value {label:?} must be non-empty ASCII letters, digits or '_'")]
    InvalidListValue { label: String },
}

impl LabelError {
    /// The rejected label text.
    pub fn label(&self) -> &str {
        match self {
            Self::WrongLength { label, .. }
            | Self::NotNumeric { label }
            | Self::MonthOutOfRange { label, .. }
            | Self::Unrepresentable { label }
            | Self::InvalidListValue { label } => label,
        }
    }
}

/// Failures reported by a schema executor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("{child} depends on {parent}, which is not available")]
    DependencyUnsatisfied { child: String, parent: String },

    #[error("Schema executor rejected instruction: {0}")]
    Rejected(String),
}

/// Errors returned by the partition registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("Invalid partition label: {0}")]
    InvalidLabel(#[from] LabelError),

    #[error("Table {table} has no partitioning strategy")]
    NotPartitioned { table: String },

    /// Passed through from the executor unchanged.
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("Gave up after {waited_ms}ms waiting for partition {label} of {table}")]
    WaitTimeout {
        table: String,
        label: String,
        waited_ms: u64,
    },
}

impl PartitionError {
    /// Returns true if this error should be logged as a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Executor(_) | Self::WaitTimeout { .. })
    }

    /// Returns true if the caller supplied bad input.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidLabel(_) | Self::NotPartitioned { .. })
    }
}
