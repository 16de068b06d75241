// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lazy, exactly-once partition attachment.
//!
//! `ensure_partition` moves each `(table, label)` through three states:
//! unknown, in progress, attached. The in-progress marker is placed under
//! the children map's shard lock and the lock is released before the
//! executor is called. Other callers for the same label wait on the marker
//! and receive whatever the first caller ends up with.
//!
//! If the first caller is cancelled mid-flight its marker is removed and the
//! waiters start over; nothing half-attached is ever left in the map.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tracing::Instrument;

use super::ddl::{attach_statement, DdlEvent};
use super::error::{LabelError, PartitionError};
use super::executor::SchemaExecutor;
use super::label::{labels_between, PartitionLabel};
use super::node::{AttachOutcome, Attempt, ChildSlot, PartitionNode, PartitionScheme};
use super::strategy::{PartitionBounds, PartitionStrategy};
use crate::telemetry::{self, PartitionSpan, SpanExt};

/// Configuration for the partition registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a caller waits on another caller's in-progress partition.
    pub wait_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(30),
        }
    }
}

enum Claim {
    Attached(Arc<PartitionNode>),
    Wait(Arc<Attempt>),
    Owner(AttachGuard, PartitionBounds),
}

/// Creates partitions on demand and reports them to a schema executor.
pub struct PartitionRegistry {
    executor: Arc<dyn SchemaExecutor>,
    config: RegistryConfig,
}

impl PartitionRegistry {
    pub fn new(executor: Arc<dyn SchemaExecutor>) -> Self {
        Self::with_config(executor, RegistryConfig::default())
    }

    pub fn with_config(executor: Arc<dyn SchemaExecutor>, config: RegistryConfig) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Return the partition of `table` for `label`, attaching it first if
    /// it does not exist yet.
    ///
    /// A new partition is named `{table}_{label}`; its dependency on `table`
    /// and its attach statement are emitted to the executor exactly once.
    /// With `sub_strategy` the new partition is itself partitioned.
    /// `sub_strategy` is ignored when the partition already exists.
    pub async fn ensure_partition(
        &self,
        table: &Arc<PartitionNode>,
        label: &str,
        sub_strategy: Option<PartitionStrategy>,
    ) -> Result<Arc<PartitionNode>, PartitionError> {
        let span = PartitionSpan::new(table.table_name(), label);
        let result = self
            .ensure_inner(table, label, sub_strategy)
            .instrument(span.clone())
            .await;
        span.record_result(&result);
        result
    }

    /// Ensure the monthly partition containing `date`.
    pub async fn ensure_for_date(
        &self,
        table: &Arc<PartitionNode>,
        date: NaiveDate,
    ) -> Result<Arc<PartitionNode>, PartitionError> {
        let label = PartitionLabel::for_date(date).ok_or_else(|| LabelError::Unrepresentable {
            label: date.to_string(),
        })?;
        self.ensure_partition(table, &label.to_string(), None).await
    }

    /// Ensure every month from `first` through `last`, in calendar order.
    /// Stops at the first failure.
    pub async fn ensure_months(
        &self,
        table: &Arc<PartitionNode>,
        first: PartitionLabel,
        last: PartitionLabel,
    ) -> Result<Vec<Arc<PartitionNode>>, PartitionError> {
        let mut nodes = Vec::new();
        for label in labels_between(first, last) {
            nodes.push(self.ensure_partition(table, &label.to_string(), None).await?);
        }
        Ok(nodes)
    }

    async fn ensure_inner(
        &self,
        table: &Arc<PartitionNode>,
        label: &str,
        sub_strategy: Option<PartitionStrategy>,
    ) -> Result<Arc<PartitionNode>, PartitionError> {
        let scheme = table.scheme().ok_or_else(|| PartitionError::NotPartitioned {
            table: table.table_name().to_string(),
        })?;

        loop {
            match claim(table, scheme, label)? {
                Claim::Attached(node) => return Ok(node),
                Claim::Wait(attempt) => {
                    if let Some(result) = self.wait_on(table, label, &attempt).await? {
                        return result;
                    }
                    tracing::debug!("in-progress attempt was abandoned, retrying");
                }
                Claim::Owner(guard, bounds) => {
                    return self.attach(table, label, bounds, sub_strategy, guard).await;
                }
            }
        }
    }

    async fn attach(
        &self,
        table: &Arc<PartitionNode>,
        label: &str,
        bounds: PartitionBounds,
        sub_strategy: Option<PartitionStrategy>,
        guard: AttachGuard,
    ) -> Result<Arc<PartitionNode>, PartitionError> {
        let node = PartitionNode::attached(table, label, bounds, sub_strategy);

        if let Err(err) = self.emit(table, &node).await {
            tracing::warn!(error = %err, "partition attachment rejected by executor");
            telemetry::record_partition_failed(table.table_name());
            guard.fail(err.clone());
            return Err(err);
        }

        tracing::info!(
            partition = %node.table_name(),
            bounds = ?node.bounds(),
            "partition attached"
        );
        telemetry::record_partition_attached(table.table_name());
        guard.finish(node.clone());
        Ok(node)
    }

    async fn emit(&self, table: &PartitionNode, node: &PartitionNode) -> Result<(), PartitionError> {
        self.executor
            .emit_dependency(node.table_name(), table.table_name())
            .await?;

        if let Some(partition_by) = node.partition_by_clause() {
            self.executor
                .emit_partitioned_by(node.table_name(), &partition_by)
                .await?;
        }

        if let Some(bounds) = node.bounds() {
            let statement = attach_statement(table.table_name(), node.table_name(), bounds);
            self.executor
                .emit_deferred_ddl(DdlEvent::AfterParentCreated, &statement)
                .await?;
        }
        Ok(())
    }

    /// Wait for another caller's attempt. `Ok(None)` means the attempt was
    /// abandoned and the caller should claim again.
    async fn wait_on(
        &self,
        table: &PartitionNode,
        label: &str,
        attempt: &Attempt,
    ) -> Result<Option<Result<Arc<PartitionNode>, PartitionError>>, PartitionError> {
        let mut outcome = attempt.outcome.clone();
        let waited = tokio::time::timeout(self.config.wait_timeout, outcome.wait_for(Option::is_some)).await;

        match waited {
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.wait_timeout.as_millis() as u64,
                    "timed out waiting for in-progress partition"
                );
                Err(PartitionError::WaitTimeout {
                    table: table.table_name().to_string(),
                    label: label.to_string(),
                    waited_ms: self.config.wait_timeout.as_millis() as u64,
                })
            }
            // Sender dropped without publishing: the owner was cancelled.
            Ok(Err(_)) => Ok(None),
            Ok(Ok(published)) => Ok((*published).clone()),
        }
    }
}

/// Check-then-mark for `label`. Validation happens before anything is
/// inserted, so a rejected label never touches the map.
fn claim(
    table: &Arc<PartitionNode>,
    scheme: &PartitionScheme,
    label: &str,
) -> Result<Claim, PartitionError> {
    if let Some(slot) = scheme.children.get(label) {
        return Ok(existing(slot.value()));
    }

    let bounds = scheme.strategy.bounds_for(label)?;

    match scheme.children.entry(label.to_string()) {
        Entry::Occupied(occupied) => Ok(existing(occupied.get())),
        Entry::Vacant(vacant) => {
            let (tx, rx) = watch::channel(None);
            let attempt = Arc::new(Attempt { outcome: rx });
            vacant.insert(ChildSlot::InProgress(attempt.clone()));
            let guard = AttachGuard {
                table: table.clone(),
                label: label.to_string(),
                attempt,
                tx,
                settled: false,
            };
            Ok(Claim::Owner(guard, bounds))
        }
    }
}

fn existing(slot: &ChildSlot) -> Claim {
    match slot {
        ChildSlot::Attached(node) => Claim::Attached(node.clone()),
        ChildSlot::InProgress(attempt) => Claim::Wait(attempt.clone()),
    }
}

/// Owns an in-progress marker until the attempt settles.
///
/// Dropping an unsettled guard removes the marker and closes the channel,
/// which sends waiters back to claim again.
struct AttachGuard {
    table: Arc<PartitionNode>,
    label: String,
    attempt: Arc<Attempt>,
    tx: watch::Sender<AttachOutcome>,
    settled: bool,
}

impl AttachGuard {
    fn finish(mut self, node: Arc<PartitionNode>) {
        if let Some(scheme) = self.table.scheme() {
            match scheme.children.get_mut(&self.label) {
                Some(mut slot) if slot.is_attempt(&self.attempt) => {
                    *slot = ChildSlot::Attached(node.clone());
                }
                _ => {
                    // Only the marker's owner replaces it; reaching this is a bug.
                    tracing::error!(label = %self.label, "in-progress marker replaced by another caller");
                    debug_assert!(false, "duplicate creation race on {}", self.label);
                }
            }
        }
        self.tx.send_replace(Some(Ok(node)));
        self.settled = true;
    }

    fn fail(mut self, err: PartitionError) {
        self.clear_marker();
        self.tx.send_replace(Some(Err(err)));
        self.settled = true;
    }

    fn clear_marker(&self) {
        if let Some(scheme) = self.table.scheme() {
            scheme
                .children
                .remove_if(&self.label, |_, slot| slot.is_attempt(&self.attempt));
        }
    }
}

impl Drop for AttachGuard {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(label = %self.label, "partition attempt abandoned");
            self.clear_marker();
        }
    }
}
