// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! The schema executor seam.
//!
//! The registry never runs DDL. It reports what must exist and in which
//! order; an executor applies it, retrying however it sees fit.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::ddl::{DdlEvent, SchemaInstruction};
use super::error::ExecutorError;

/// Consumer of partition schema instructions.
#[async_trait]
pub trait SchemaExecutor: Send + Sync {
    /// Record that `child` must be created after `parent`.
    async fn emit_dependency(&self, child: &str, parent: &str) -> Result<(), ExecutorError>;

    /// Record that `table` is itself partitioned and must be declared with
    /// `PARTITION BY {partition_by}`. Only sent for sub-partitioned children,
    /// between the dependency and the attach statement.
    async fn emit_partitioned_by(&self, table: &str, partition_by: &str) -> Result<(), ExecutorError> {
        tracing::debug!(table, partition_by, "executor ignores sub-partitioning");
        Ok(())
    }

    /// Queue `statement` to run once `event` has happened.
    async fn emit_deferred_ddl(&self, event: DdlEvent, statement: &str) -> Result<(), ExecutorError>;
}

/// Executor that only records instructions, in emission order.
///
/// Used to plan DDL offline and as a test double.
#[derive(Default)]
pub struct RecordingExecutor {
    instructions: Mutex<Vec<SchemaInstruction>>,
    delay: Option<Duration>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every emission, to widen race windows.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            instructions: Mutex::new(Vec::new()),
            delay: Some(delay),
        }
    }

    /// Copy of everything recorded so far.
    pub fn instructions(&self) -> Vec<SchemaInstruction> {
        self.instructions.lock().clone()
    }

    /// Take everything recorded so far, leaving the log empty.
    pub fn drain(&self) -> Vec<SchemaInstruction> {
        std::mem::take(&mut *self.instructions.lock())
    }

    /// Recorded DDL statements, in order.
    pub fn statements(&self) -> Vec<String> {
        self.instructions
            .lock()
            .iter()
            .filter_map(|i| i.statement().map(str::to_string))
            .collect()
    }

    pub fn ddl_count(&self) -> usize {
        self.instructions
            .lock()
            .iter()
            .filter(|i| matches!(i, SchemaInstruction::DeferredDdl { .. }))
            .count()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SchemaExecutor for RecordingExecutor {
    async fn emit_dependency(&self, child: &str, parent: &str) -> Result<(), ExecutorError> {
        self.pause().await;
        self.instructions.lock().push(SchemaInstruction::Dependency {
            child: child.to_string(),
            parent: parent.to_string(),
        });
        Ok(())
    }

    async fn emit_partitioned_by(&self, table: &str, partition_by: &str) -> Result<(), ExecutorError> {
        self.pause().await;
        self.instructions.lock().push(SchemaInstruction::PartitionedBy {
            table: table.to_string(),
            partition_by: partition_by.to_string(),
        });
        Ok(())
    }

    async fn emit_deferred_ddl(&self, event: DdlEvent, statement: &str) -> Result<(), ExecutorError> {
        self.pause().await;
        self.instructions.lock().push(SchemaInstruction::DeferredDdl {
            event,
            statement: statement.to_string(),
        });
        Ok(())
    }
}
