// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structured logging, spans and metrics counters.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use metrics::{
    record_cache_hit, record_cache_miss, record_partition_attached, record_partition_failed,
};
pub use spans::{PartitionSpan, SpanExt};
