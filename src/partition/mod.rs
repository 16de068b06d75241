// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Range-partition registry.
//!
//! Decides which partitions must exist, computes their bounds and hands the
//! resulting dependency and attach statement to a [`SchemaExecutor`].
//! Executing DDL is always the executor's job.

mod ddl;
mod error;
mod executor;
mod label;
mod node;
mod range;
mod registry;
pub mod schema;
mod strategy;

pub use ddl::{attach_statement, DdlEvent, SchemaInstruction};
pub use error::{ExecutorError, LabelError, PartitionError};
pub use executor::{RecordingExecutor, SchemaExecutor};
pub use label::{is_partition_table_name, labels_between, validate_list_value, PartitionLabel};
pub use node::{PartitionNode, PartitionedTable};
pub use range::{range_for, PartitionRange};
pub use registry::{PartitionRegistry, RegistryConfig};
pub use schema::{SchemaError, SchemaFile, TableDef};
pub use strategy::{PartitionBounds, PartitionKind, PartitionStrategy};
