// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Partitioned tables and their attached partitions.
//!
//! A root table and a partition are the same type. A node with no parent is
//! a root; a node with a strategy is partitioned and owns a children map,
//! which is the only record of which partitions exist.

use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::sync::watch;

use super::error::PartitionError;
use super::range::PartitionRange;
use super::strategy::{PartitionBounds, PartitionStrategy};

/// Result published to callers waiting on an in-progress partition.
pub(crate) type AttachOutcome = Option<Result<Arc<PartitionNode>, PartitionError>>;

/// Marker for a label whose attachment is being emitted.
pub(crate) struct Attempt {
    pub(crate) outcome: watch::Receiver<AttachOutcome>,
}

pub(crate) enum ChildSlot {
    Attached(Arc<PartitionNode>),
    InProgress(Arc<Attempt>),
}

impl ChildSlot {
    pub(crate) fn is_attempt(&self, attempt: &Arc<Attempt>) -> bool {
        matches!(self, ChildSlot::InProgress(a) if Arc::ptr_eq(a, attempt))
    }
}

pub(crate) struct PartitionScheme {
    pub(crate) strategy: PartitionStrategy,
    pub(crate) children: DashMap<String, ChildSlot>,
}

struct Attachment {
    label: String,
    bounds: PartitionBounds,
    parent: Weak<PartitionNode>,
}

/// A partitioned table or one of its partitions.
pub struct PartitionNode {
    table_name: String,
    attachment: Option<Attachment>,
    scheme: Option<PartitionScheme>,
}

/// A root table declared with a partitioning strategy.
pub type PartitionedTable = PartitionNode;

impl PartitionNode {
    /// Declare a root partitioned table.
    pub fn root(table_name: impl Into<String>, strategy: PartitionStrategy) -> Arc<Self> {
        Arc::new(Self {
            table_name: table_name.into(),
            attachment: None,
            scheme: Some(PartitionScheme::new(strategy)),
        })
    }

    pub(crate) fn attached(
        parent: &Arc<PartitionNode>,
        label: &str,
        bounds: PartitionBounds,
        sub_strategy: Option<PartitionStrategy>,
    ) -> Arc<Self> {
        Arc::new(Self {
            table_name: parent.partition_name(label),
            attachment: Some(Attachment {
                label: label.to_string(),
                bounds,
                parent: Arc::downgrade(parent),
            }),
            scheme: sub_strategy.map(PartitionScheme::new),
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Name a partition of this table gets for `label`: `{table}_{label}`.
    pub fn partition_name(&self, label: &str) -> String {
        format!("{}_{}", self.table_name, label)
    }

    /// Label under which this node is attached to its parent.
    pub fn label(&self) -> Option<&str> {
        self.attachment.as_ref().map(|a| a.label.as_str())
    }

    pub fn bounds(&self) -> Option<&PartitionBounds> {
        self.attachment.as_ref().map(|a| &a.bounds)
    }

    /// Month covered by this node, for range partitions.
    pub fn range(&self) -> Option<PartitionRange> {
        self.bounds().and_then(PartitionBounds::range)
    }

    /// The owning table, if it is still alive.
    pub fn parent(&self) -> Option<Arc<PartitionNode>> {
        self.attachment.as_ref().and_then(|a| a.parent.upgrade())
    }

    pub fn is_root(&self) -> bool {
        self.attachment.is_none()
    }

    pub fn strategy(&self) -> Option<&PartitionStrategy> {
        self.scheme.as_ref().map(|s| &s.strategy)
    }

    pub fn is_partitioned(&self) -> bool {
        self.scheme.is_some()
    }

    /// `PARTITION BY` clause this table is declared with, if partitioned.
    pub fn partition_by_clause(&self) -> Option<String> {
        self.strategy().map(PartitionStrategy::partition_by_clause)
    }

    /// Attached child for `label`. In-progress children are not visible.
    pub fn child(&self, label: &str) -> Option<Arc<PartitionNode>> {
        let scheme = self.scheme.as_ref()?;
        match scheme.children.get(label)?.value() {
            ChildSlot::Attached(node) => Some(node.clone()),
            ChildSlot::InProgress(_) => None,
        }
    }

    /// Attached children in label order.
    pub fn children(&self) -> Vec<Arc<PartitionNode>> {
        let Some(scheme) = self.scheme.as_ref() else {
            return Vec::new();
        };
        let mut attached: Vec<(String, Arc<PartitionNode>)> = scheme
            .children
            .iter()
            .filter_map(|entry| match entry.value() {
                ChildSlot::Attached(node) => Some((entry.key().clone(), node.clone())),
                ChildSlot::InProgress(_) => None,
            })
            .collect();
        attached.sort_by(|a, b| a.0.cmp(&b.0));
        attached.into_iter().map(|(_, node)| node).collect()
    }

    pub fn child_labels(&self) -> Vec<String> {
        self.children()
            .iter()
            .filter_map(|c| c.label().map(str::to_string))
            .collect()
    }

    pub fn child_count(&self) -> usize {
        self.scheme.as_ref().map_or(0, |scheme| {
            scheme
                .children
                .iter()
                .filter(|entry| matches!(entry.value(), ChildSlot::Attached(_)))
                .count()
        })
    }

    pub(crate) fn scheme(&self) -> Option<&PartitionScheme> {
        self.scheme.as_ref()
    }
}

impl PartitionScheme {
    fn new(strategy: PartitionStrategy) -> Self {
        Self {
            strategy,
            children: DashMap::new(),
        }
    }
}

impl fmt::Debug for PartitionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionNode")
            .field("table_name", &self.table_name)
            .field("label", &self.label())
            .field("bounds", &self.bounds())
            .field("strategy", &self.strategy())
            .field("children", &self.child_count())
            .finish()
    }
}
