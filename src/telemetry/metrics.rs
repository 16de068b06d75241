// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Counters published through the `metrics` facade.
//!
//! Without an installed recorder these are no-ops.

use metrics::counter;

pub fn record_partition_attached(table: &str) {
    counter!("partition_attached_total", "table" => table.to_string()).increment(1);
}

pub fn record_partition_failed(table: &str) {
    counter!("partition_attach_failed_total", "table" => table.to_string()).increment(1);
}

pub fn record_cache_hit(cache: &str) {
    counter!("instance_cache_hits_total", "cache" => cache.to_string()).increment(1);
}

pub fn record_cache_miss(cache: &str) {
    counter!("instance_cache_misses_total", "cache" => cache.to_string()).increment(1);
}
