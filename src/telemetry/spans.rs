// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Span helpers for partition operations.

use tracing::{info_span, Span};

/// Extension trait for recording an operation's outcome on its span.
pub trait SpanExt {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for `ensure_partition` spans.
pub struct PartitionSpan;

impl PartitionSpan {
    /// Fields: `table`, `label`, plus `status` and `error.message` which are
    /// filled in by [`SpanExt::record_result`].
    pub fn new(table: &str, label: &str) -> Span {
        info_span!(
            "ensure_partition",
            table = %table,
            label = %label,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}
